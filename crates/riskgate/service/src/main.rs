//! RiskGate CLI
//!
//! Runs the decision pipeline on a single text and prints the assessment
//! as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use riskgate_service::{RiskGateConfig, RiskPipeline};
use riskgate_types::{Domain, TextSample};

/// RiskGate CLI
#[derive(Parser)]
#[command(name = "riskgate")]
#[command(about = "RiskGate - calibrated risk decisions for text", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "RISKGATE_CONFIG", global = true)]
    config: Option<String>,

    /// Log level (overrides the configuration file)
    #[arg(long, env = "RISKGATE_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "RISKGATE_LOG_JSON", global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one text
    Evaluate {
        /// Text to evaluate
        #[arg(short, long, conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,

        /// Read the text from a file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Risk domain (political, defamation, misinformation, impersonation, general)
        #[arg(short, long)]
        domain: Option<String>,
    },

    /// Print the effective configuration
    Config,
}

fn init_tracing(level: &str, json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.to_string().into());

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = RiskGateConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    // Initialize tracing
    let level = cli.log_level.clone().unwrap_or_else(|| config.logging.level.clone());
    init_tracing(&level, cli.json || config.logging.json);

    match cli.command {
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Evaluate { text, file, domain } => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                (None, None) => anyhow::bail!("either --text or --file is required"),
            };
            let domain = match domain {
                Some(name) => name.parse::<Domain>()?,
                None => Domain::General,
            };

            let pipeline = RiskPipeline::from_config(config)?;
            let assessment = pipeline
                .evaluate(TextSample::new(text).with_domain(domain))
                .await?;
            println!("{}", serde_json::to_string_pretty(&assessment)?);
        }
    }

    Ok(())
}

//! # RiskGate Ensemble
//!
//! The only place multiple scoring models are invoked for a request.
//!
//! - [`members`]: the built-in [`EnsembleMember`] implementations
//! - [`semantic`]: a lightweight feature embedder and the reference-pattern
//!   similarity matcher that produces the semantic boost
//! - [`weights`]: [`AdaptiveWeights`], mutated only from the feedback path and
//!   published to readers as immutable snapshots
//! - [`coordinator`]: [`EnsembleCoordinator`], which combines member outputs
//!   with adaptive and confidence weighting and reports disagreement

pub mod coordinator;
pub mod members;
pub mod semantic;
pub mod weights;

pub use coordinator::{EnsembleCoordinator, EnsembleResult};
pub use members::{default_members, EnsembleMember, LinearModel, RulesModel, TransformerModel};
pub use semantic::{Embedding, SemanticEmbedder, SimilarityMatch, SimilarityMatcher};
pub use weights::{
    normalize, AdaptiveWeight, AdaptiveWeights, ModelWeightReport, WeightReport, WeightSnapshot,
    BASE_WEIGHTS,
};

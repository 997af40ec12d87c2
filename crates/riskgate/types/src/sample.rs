//! Request input.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Domain;

/// Where a sample was collected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Origin platform (X, TikTok, WordPress, ...).
    pub platform: Option<String>,
    pub url: Option<String>,
    /// Declared language code, e.g. `pt-br`.
    pub language: Option<String>,
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Immutable input to a single pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSample {
    text: String,
    domain: Option<Domain>,
    source: Option<SourceMetadata>,
}

impl TextSample {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            domain: None,
            source: None,
        }
    }

    pub fn with_domain(mut self, domain: Domain) -> Self {
        self.domain = Some(domain);
        self
    }

    /// Attach a free-form domain hint; unknown hints resolve to `General`.
    pub fn with_domain_hint(mut self, hint: Option<&str>) -> Self {
        self.domain = hint.map(|h| Domain::from_hint(Some(h)));
        self
    }

    pub fn with_source(mut self, source: SourceMetadata) -> Self {
        self.source = Some(source);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Domain hint as given, if any.
    pub fn domain_hint(&self) -> Option<Domain> {
        self.domain
    }

    /// Effective domain: the hint, or `General`.
    pub fn domain(&self) -> Domain {
        self.domain.unwrap_or_default()
    }

    pub fn source(&self) -> Option<&SourceMetadata> {
        self.source.as_ref()
    }

    /// Copy of this sample whose text is cut to at most `max_chars` characters.
    pub fn truncated(&self, max_chars: usize) -> Self {
        let text = match self.text.char_indices().nth(max_chars) {
            Some((byte_idx, _)) => self.text[..byte_idx].to_string(),
            None => self.text.clone(),
        };
        Self {
            text,
            domain: self.domain,
            source: self.source.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_respects_char_boundaries() {
        let sample = TextSample::new("não há corrupção");
        let cut = sample.truncated(3);
        assert_eq!(cut.text(), "não");
        assert_eq!(sample.truncated(100).text(), sample.text());
    }

    #[test]
    fn test_unknown_hint_resolves_to_general() {
        let sample = TextSample::new("text").with_domain_hint(Some("finance"));
        assert_eq!(sample.domain(), Domain::General);
        assert_eq!(TextSample::new("text").domain_hint(), None);
    }
}

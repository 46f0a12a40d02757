use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunables for extraction, transport timing and fallback scoring windows
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncOptions {
    /// How long a primary-preview click holds the processing lock
    pub click_lock_ms: u64,

    /// Quiet period before a content-editable edit is pushed to the host
    pub edit_debounce_ms: u64,

    /// Delay after loading a preview document before reading the DOM
    pub settle_ms: u64,

    /// Class and attribute names containing this marker are tooling-injected
    pub internal_class_marker: String,

    /// Characters of trimmed text content kept in a fingerprint
    pub text_snippet_chars: usize,

    /// Characters of the normalized open tag compared by the fallback
    pub open_tag_signature_chars: usize,

    /// Lines after a candidate searched for the element's text
    pub text_window_lines: usize,

    /// Lines before a candidate searched for the parent's open tag
    pub parent_window_lines: usize,

    /// Inline elements the extractor walks up past (upper-case DOM names)
    pub inline_tags: Vec<String>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            click_lock_ms: 100,
            edit_debounce_ms: 300,
            settle_ms: 100,
            internal_class_marker: "copilot".to_string(),
            text_snippet_chars: 50,
            open_tag_signature_chars: 50,
            text_window_lines: 3,
            parent_window_lines: 3,
            inline_tags: ["SPAN", "STRONG", "EM", "B", "I"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

impl SyncOptions {
    /// Create options with the default tunables
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the internal class marker
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.internal_class_marker = marker.into();
        self
    }

    /// Builder method: set the click processing lock
    pub fn with_click_lock_ms(mut self, ms: u64) -> Self {
        self.click_lock_ms = ms;
        self
    }

    /// Builder method: set the edit debounce interval
    pub fn with_edit_debounce_ms(mut self, ms: u64) -> Self {
        self.edit_debounce_ms = ms;
        self
    }

    pub fn click_lock(&self) -> Duration {
        Duration::from_millis(self.click_lock_ms)
    }

    pub fn edit_debounce(&self) -> Duration {
        Duration::from_millis(self.edit_debounce_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Whether a class or attribute name was injected by tooling
    pub fn is_internal(&self, name: &str) -> bool {
        name.contains(self.internal_class_marker.as_str())
    }

    /// Whether a DOM tag name is an inline wrapper the extractor skips
    pub fn is_inline_tag(&self, tag_name: &str) -> bool {
        self.inline_tags.iter().any(|t| t.eq_ignore_ascii_case(tag_name))
    }

    /// Reject option sets that would silently disable matching
    pub fn validate(&self) -> Result<()> {
        if self.internal_class_marker.is_empty() {
            // An empty marker is contained in every name.
            return Err(SyncError::InvalidConfig(
                "internal_class_marker must not be empty".to_string(),
            ));
        }
        if self.text_snippet_chars == 0 || self.open_tag_signature_chars == 0 {
            return Err(SyncError::InvalidConfig(
                "snippet lengths must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate options from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: SyncOptions = serde_json::from_str(json)
            .map_err(|e| SyncError::InvalidConfig(format!("Failed to parse options: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a JSON file; missing keys take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            SyncError::InvalidConfig(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = SyncOptions::default();
        assert_eq!(options.click_lock(), Duration::from_millis(100));
        assert_eq!(options.edit_debounce(), Duration::from_millis(300));
        assert_eq!(options.text_snippet_chars, 50);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let options = SyncOptions::from_json_str(r#"{"click_lock_ms": 250}"#).unwrap();
        assert_eq!(options.click_lock_ms, 250);
        assert_eq!(options.internal_class_marker, "copilot");
        assert_eq!(options.parent_window_lines, 3);
    }

    #[test]
    fn test_empty_marker_rejected() {
        let result = SyncOptions::from_json_str(r#"{"internal_class_marker": ""}"#);
        assert!(matches!(result, Err(SyncError::InvalidConfig(_))));
    }

    #[test]
    fn test_is_internal_and_inline() {
        let options = SyncOptions::default();
        assert!(options.is_internal("copilot-highlight-element"));
        assert!(!options.is_internal("nav-link"));
        assert!(options.is_inline_tag("STRONG"));
        assert!(options.is_inline_tag("em"));
        assert!(!options.is_inline_tag("P"));
    }
}

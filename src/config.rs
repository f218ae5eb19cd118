//! Document configuration.
//!
//! Resolved once when a [`Document`](crate::Document) is built.
//!
//! ```ignore
//! let config = DomConfig::from_json(r#"{ "repaint": "immediate", "reactive": true }"#)?;
//! let doc = Document::with_config(MemoryHost::new(80, 24), Screen::new(80, 24), config);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// When widget updates reach the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepaintMode {
    /// Coalesce repaint requests per surface until the next flush.
    #[default]
    Batched,
    /// Paint on every request.
    Immediate,
}

/// Document-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct DomConfig {
    pub repaint: RepaintMode,
    /// Follow screen-size signals reactively instead of only through
    /// [`Document::resize`](crate::Document::resize).
    pub reactive: bool,
    /// Shrink sizing reserves one cell per bordered edge.
    pub shrink_includes_border: bool,
}

impl Default for DomConfig {
    fn default() -> Self {
        Self {
            repaint: RepaintMode::Batched,
            reactive: false,
            shrink_includes_border: true,
        }
    }
}

impl DomConfig {
    /// Decode from JSON; missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DomConfig::default();
        assert_eq!(config.repaint, RepaintMode::Batched);
        assert!(!config.reactive);
        assert!(config.shrink_includes_border);
    }

    #[test]
    fn test_from_json_partial() {
        let config = DomConfig::from_json(r#"{"repaint": "immediate"}"#).unwrap();
        assert_eq!(config.repaint, RepaintMode::Immediate);
        assert!(config.shrink_includes_border);
    }

    #[test]
    fn test_from_json_rejects_bad_mode() {
        assert!(DomConfig::from_json(r#"{"repaint": "sometimes"}"#).is_err());
    }
}

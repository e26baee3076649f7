//! Shadow store configuration.

use serde::{Deserialize, Serialize};
use shadow_document::{MergeMode, Merger};

/// Bucket used when none is configured.
pub const DEFAULT_BUCKET: &str = "edge-shadow";

/// Settings for a [`ShadowStore`](crate::ShadowStore).
///
/// Deserializes from a partial object, with missing fields defaulted:
///
/// ```rust
/// use device_shadow::ShadowConfig;
///
/// let config: ShadowConfig = serde_json::from_str(r#"{"strict_merge": true}"#).unwrap();
/// assert_eq!(config.bucket, "edge-shadow");
/// assert!(config.strict_merge);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    /// Key-value bucket holding every shadow record.
    pub bucket: String,
    /// Reject patches that put a map where a scalar or list lives, instead
    /// of replacing the old value.
    pub strict_merge: bool,
    /// Maximum nesting depth of a merged document, root included.
    pub max_depth: Option<usize>,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            strict_merge: false,
            max_depth: None,
        }
    }
}

impl ShadowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn with_strict_merge(mut self, strict: bool) -> Self {
        self.strict_merge = strict;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub(crate) fn merger(&self) -> Merger {
        let mode = if self.strict_merge {
            MergeMode::Strict
        } else {
            MergeMode::Replace
        };
        Merger::new()
            .with_mode(mode)
            .with_max_depth(self.max_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ShadowConfig::default();
        assert_eq!(config.bucket, DEFAULT_BUCKET);
        assert_eq!(config.merger(), Merger::default());
    }

    #[test]
    fn builder_feeds_merger() {
        let config = ShadowConfig::new()
            .with_bucket("shadows")
            .with_strict_merge(true)
            .with_max_depth(Some(8));
        assert_eq!(config.bucket, "shadows");

        let merger = config.merger();
        assert_eq!(merger.mode(), MergeMode::Strict);
        assert_eq!(merger.max_depth(), Some(8));
    }

    #[test]
    fn serde_round_trip() {
        let config = ShadowConfig::new().with_max_depth(Some(3));
        let text = serde_json::to_string(&config).unwrap();
        assert_eq!(
            text,
            r#"{"bucket":"edge-shadow","strict_merge":false,"max_depth":3}"#
        );
        let back: ShadowConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}

//! JSON Merge Patch (RFC 7386) over documents.
//!
//! For every key in the patch:
//! - `null` deletes the key from the base (no-op if absent)
//! - a map is merged recursively into the base's map at that key, starting
//!   from an empty map when the key is absent
//! - anything else (scalar, list) replaces the base value wholesale
//!
//! Keys the patch does not mention are left alone. Nulls nested inside a
//! patch map are consumed as delete markers, so a merged document never
//! stores them. Nulls inside lists are ordinary list elements.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Document, DocumentError, Value};

/// What to do when a patch puts a map where the base holds a non-map value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// Replace the old value with the patch's map (merged into an empty
    /// map, so nested nulls are still dropped).
    #[default]
    Replace,
    /// Reject the whole patch with `DocumentError::TypeConflict`.
    Strict,
}

/// A merge with policy attached.
///
/// `Merger::default()` behaves exactly like [`merge`] and never fails.
///
/// ```rust
/// use shadow_document::{Document, MergeMode, Merger};
///
/// let base = Document::from_json_str(r#"{"mode": "eco"}"#).unwrap();
/// let patch = Document::from_json_str(r#"{"mode": {"level": 2}}"#).unwrap();
///
/// let strict = Merger::new().with_mode(MergeMode::Strict);
/// assert!(strict.merge(&base, &patch).is_err());
///
/// let merged = Merger::new().merge(&base, &patch).unwrap();
/// assert_eq!(merged, patch);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Merger {
    mode: MergeMode,
    max_depth: Option<usize>,
}

impl Merger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: MergeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Reject merges whose result nests maps deeper than `max_depth`
    /// (counting the root, see [`Document::depth`]).
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn mode(&self) -> MergeMode {
        self.mode
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Merge `patch` onto `base`, returning the new document.
    ///
    /// A patch holding a NaN or infinite float is rejected with
    /// `NonFiniteNumber`. Neither input is modified, and on error nothing
    /// has been applied.
    pub fn merge(&self, base: &Document, patch: &Document) -> Result<Document, DocumentError> {
        patch.check_finite()?;
        if self.mode == MergeMode::Strict {
            check_conflicts(base.as_map(), patch.as_map(), &mut Vec::new())?;
        }

        let merged = merge(base, patch);

        if let Some(max) = self.max_depth {
            if merged.depth() > max {
                return Err(DocumentError::DepthExceeded { max });
            }
        }

        Ok(merged)
    }
}

/// Merge `patch` onto `base` with the default (replacing) policy.
pub fn merge(base: &Document, patch: &Document) -> Document {
    let mut merged = base.clone();
    apply(merged.as_map_mut(), patch.as_map());
    merged
}

fn apply(base: &mut BTreeMap<String, Value>, patch: &BTreeMap<String, Value>) {
    for (key, value) in patch {
        match value {
            Value::Null => {
                base.remove(key);
            }
            Value::Map(patch_map) => {
                let slot = base.entry(key.clone()).or_insert_with(Value::map);
                if !slot.is_map() {
                    *slot = Value::map();
                }
                if let Value::Map(base_map) = slot {
                    apply(base_map, patch_map);
                }
            }
            other => {
                base.insert(key.clone(), other.clone());
            }
        }
    }
}

fn check_conflicts(
    base: &BTreeMap<String, Value>,
    patch: &BTreeMap<String, Value>,
    path: &mut Vec<String>,
) -> Result<(), DocumentError> {
    for (key, value) in patch {
        let Value::Map(patch_map) = value else {
            continue;
        };

        path.push(key.clone());
        match base.get(key) {
            None => {}
            Some(Value::Map(base_map)) => check_conflicts(base_map, patch_map, path)?,
            Some(other) => {
                return Err(DocumentError::TypeConflict {
                    path: path.join("/"),
                    found: other.kind(),
                });
            }
        }
        path.pop();
    }
    Ok(())
}

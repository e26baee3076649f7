//! Shadow documents: the data layer of device shadows.
//!
//! Everything here is pure, with no storage and no I/O:
//! - `Value`: a JSON-shaped tree (integers and floats kept apart)
//! - `Document`: a tree whose root is guaranteed to be a map
//! - `merge` / `Merger`: JSON Merge Patch (RFC 7386), `null` deletes
//! - `diff`: the desired fields the reported side has not caught up with
//!
//! # Example
//!
//! ```rust
//! use shadow_document::{diff, merge, Document};
//!
//! let desired = merge(
//!     &Document::from_json_str(r#"{"cfg": {"a": 1, "b": 2}}"#).unwrap(),
//!     &Document::from_json_str(r#"{"cfg": {"b": 3}, "temp": 22}"#).unwrap(),
//! );
//! let reported = Document::from_json_str(r#"{"cfg": {"a": 1, "b": 2}, "temp": 22}"#).unwrap();
//!
//! assert_eq!(diff(&desired, &reported).to_json(), serde_json::json!({"cfg": {"b": 3}}));
//! ```

mod convert;
pub mod diff;
mod document;
mod error;
pub mod merge;
mod value;

pub use convert::{json_to_value, value_to_json};
pub use diff::{diff, is_converged};
pub use document::Document;
pub use error::DocumentError;
pub use merge::{merge, MergeMode, Merger};
pub use value::Value;

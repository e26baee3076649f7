//! Device shadows: desired and reported state for remote entities.
//!
//! A shadow pairs two JSON documents for one identity (a name within a
//! namespace):
//! - the *desired* state, written by a controller
//! - the *reported* state, written by the device
//!
//! Both are updated with JSON Merge Patch, and every update returns the
//! *delta*: the desired fields the device has not yet reported back. Each
//! update is one read-merge-write transaction in a `shadow_kv_store`
//! store, so concurrent writers to the same shadow never lose updates.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use device_shadow::{Document, Shadow, ShadowStore};
//! use shadow_kv_store::InMemoryKv;
//!
//! let store = ShadowStore::new(Arc::new(InMemoryKv::new()));
//! let shadow = Shadow::new("default", "thermostat", store).unwrap();
//!
//! let patch = |s: &str| Document::from_json_str(s).unwrap();
//!
//! assert_eq!(shadow.desire(&patch(r#"{"temp": 22}"#)).unwrap(), patch(r#"{"temp": 22}"#));
//! assert!(shadow.report(&patch(r#"{"temp": 22}"#)).unwrap().is_empty());
//! assert_eq!(shadow.desire(&patch(r#"{"temp": 25}"#)).unwrap(), patch(r#"{"temp": 25}"#));
//! ```

mod config;
mod error;
mod record;
mod shadow;
mod store;

pub use config::{ShadowConfig, DEFAULT_BUCKET};
pub use error::{Result, ShadowError};
pub use record::{ShadowId, ShadowRecord};
pub use shadow::Shadow;
pub use store::ShadowStore;

// Re-export the document layer for convenience
pub use shadow_document::{diff, merge, Document, MergeMode, Merger, Value};

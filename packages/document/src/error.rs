//! Error types for documents.

/// Errors produced while parsing or merging documents.
#[derive(thiserror::Error, Debug)]
pub enum DocumentError {
    /// The JSON was valid but its root was not an object.
    #[error("document root must be a map, found {found}")]
    NotAMap { found: &'static str },

    /// Strict merge refused to replace a non-map value with a map.
    #[error("cannot merge a map into {found} at '{path}'")]
    TypeConflict { path: String, found: &'static str },

    /// The merged document nests maps deeper than allowed.
    #[error("document nesting exceeds the maximum depth of {max}")]
    DepthExceeded { max: usize },

    /// A float was NaN or infinite; JSON has no encoding for it.
    #[error("number at '{path}' is not finite")]
    NonFiniteNumber { path: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

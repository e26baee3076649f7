//! Error types for shadows.

use shadow_document::DocumentError;
use shadow_kv_store::KvError;

/// Errors from shadow operations.
#[derive(thiserror::Error, Debug)]
pub enum ShadowError {
    /// No shadow is stored for this identity.
    #[error("shadow {name}.{namespace} not found")]
    NotFound { namespace: String, name: String },

    /// A shadow is already stored for this identity.
    #[error("shadow {name}.{namespace} already exists")]
    AlreadyExists { namespace: String, name: String },

    /// The storage key of this identity holds another identity's record.
    /// Keys join name and namespace with a dot, so `b.c`/`a` and `c`/`a.b`
    /// share the key `a.b.c`.
    #[error("shadow {name}.{namespace} collides with stored shadow {stored}")]
    IdentityConflict {
        namespace: String,
        name: String,
        stored: String,
    },

    /// A record could not be encoded, or stored bytes could not be decoded.
    #[error("shadow encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// A strict merge tried to put a map where a non-map value lives.
    #[error("merge type conflict at '{path}'")]
    MergeTypeConflict { path: String },

    /// A patch held a NaN or infinite number.
    #[error("number at '{path}' is not finite")]
    NonFiniteNumber { path: String },

    /// The merged document nests deeper than the configured limit.
    #[error("document nesting exceeds the maximum depth of {max}")]
    DepthExceeded { max: usize },

    /// The key-value store failed.
    #[error("store error: {0}")]
    Store(#[from] KvError),
}

impl ShadowError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ShadowError::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, ShadowError::AlreadyExists { .. })
    }
}

impl From<DocumentError> for ShadowError {
    fn from(e: DocumentError) -> Self {
        match e {
            DocumentError::TypeConflict { path, .. } => ShadowError::MergeTypeConflict { path },
            DocumentError::DepthExceeded { max } => ShadowError::DepthExceeded { max },
            DocumentError::NonFiniteNumber { path } => ShadowError::NonFiniteNumber { path },
            DocumentError::Json(e) => ShadowError::Encoding(e),
            // Parsed documents are maps already; a non-map root can only
            // come from a malformed stored record.
            DocumentError::NotAMap { found } => ShadowError::Encoding(
                <serde_json::Error as serde::de::Error>::custom(format!(
                    "document root must be a map, found {found}"
                )),
            ),
        }
    }
}

/// Result type for shadow operations.
pub type Result<T> = std::result::Result<T, ShadowError>;

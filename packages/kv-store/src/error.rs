//! Error types for the key-value layer.
//!
//! Errors at this level are storage-focused. Nothing here knows about
//! shadows or documents - a missing record is just `Ok(None)`.

use std::io;
use std::path::PathBuf;

use bytes::Bytes;

/// Errors raised by key-value stores and their transactions.
#[derive(thiserror::Error, Debug)]
pub enum KvError {
    /// The bucket was never created in this store.
    #[error("bucket not found: {}", String::from_utf8_lossy(bucket))]
    BucketNotFound { bucket: Bytes },

    /// Buckets and keys must be non-empty byte strings.
    #[error("bucket and key names must not be empty")]
    EmptyName,

    /// The on-disk root could not be used.
    #[error("invalid store root {}: {source}", path.display())]
    InvalidRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An on-disk entry could not be mapped back to a bucket or key.
    #[error("corrupt store entry {}: {message}", path.display())]
    Corrupt { path: PathBuf, message: String },

    /// Generic I/O failure while persisting or loading.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A thread panicked while holding a store lock.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Result type alias for key-value operations.
pub type Result<T> = std::result::Result<T, KvError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn bucket_not_found_display() {
        let e = KvError::BucketNotFound {
            bucket: Bytes::from_static(b"edge-shadow"),
        };
        assert_eq!(e.to_string(), "bucket not found: edge-shadow");
    }

    #[test]
    fn invalid_root_keeps_source() {
        let e = KvError::InvalidRoot {
            path: PathBuf::from("/nope"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert!(e.to_string().contains("/nope"));
        assert!(StdError::source(&e).is_some());
    }

    #[test]
    fn io_error_converts() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let e: KvError = io_err.into();
        assert!(matches!(e, KvError::Io(_)));
    }
}

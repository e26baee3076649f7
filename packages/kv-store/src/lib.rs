//! Transactional, bucketed key-value stores.
//!
//! This is the storage floor underneath device shadows. Everything at this
//! level is pure bytes - no record shapes, no documents, no encodings:
//! - `KvStore`: opens read and write transactions
//! - `ReadTxn`: snapshot reads of `bucket/key → bytes`
//! - `WriteTxn`: buffered writes, committed or aborted as a unit
//! - `KvStoreExt`: `view`/`update` helpers that scope a closure to one
//!   transaction
//!
//! Two engines are provided:
//! - `InMemoryKv`: process-local, for tests and ephemeral shadows
//! - `LocalDiskKv`: persisted under a directory, loaded at open
//!
//! Both serialize writers (one write transaction at a time) and give
//! readers a stable snapshot that never blocks and is never blocked.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use shadow_kv_store::{Bytes, InMemoryKv, KvError, KvStore, KvStoreExt, ReadTxn, WriteTxn};
//!
//! let store: Arc<dyn KvStore> = Arc::new(InMemoryKv::new());
//!
//! store
//!     .update(|txn| -> Result<(), KvError> {
//!         txn.create_bucket_if_absent(b"users")?;
//!         txn.put(b"users", b"123", Bytes::from_static(b"Alice"))
//!     })
//!     .unwrap();
//!
//! let snapshot = store.begin_read().unwrap();
//! assert_eq!(snapshot.get(b"users", b"123").unwrap(), Some(Bytes::from_static(b"Alice")));
//! ```

pub use bytes::Bytes;

mod engine;
mod error;
mod ext;
mod in_memory;
mod local_disk;
mod traits;

pub use error::{KvError, Result};
pub use ext::KvStoreExt;
pub use in_memory::InMemoryKv;
pub use local_disk::LocalDiskKv;
pub use traits::{KvStore, ReadTxn, WriteTxn};

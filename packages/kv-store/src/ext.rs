//! Closure-scoped transaction helpers.

use crate::{KvError, KvStore, ReadTxn, WriteTxn};

/// Extension trait that runs a closure inside one transaction.
///
/// This trait is automatically implemented for all `KvStore`
/// implementations, including `dyn KvStore`.
///
/// # Example
///
/// ```rust
/// use shadow_kv_store::{Bytes, InMemoryKv, KvStoreExt, ReadTxn, WriteTxn};
///
/// let store = InMemoryKv::new();
///
/// store
///     .update(|txn| {
///         txn.create_bucket_if_absent(b"counters")?;
///         txn.put(b"counters", b"hits", Bytes::from_static(b"1"))
///     })
///     .unwrap();
///
/// let hits = store
///     .view(|txn| txn.get(b"counters", b"hits"))
///     .unwrap();
/// assert_eq!(hits, Some(Bytes::from_static(b"1")));
/// ```
pub trait KvStoreExt: KvStore {
    /// Run `f` against a fresh snapshot read transaction.
    fn view<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&dyn ReadTxn) -> Result<T, E>,
        E: From<KvError>,
    {
        let txn = self.begin_read()?;
        f(&*txn)
    }

    /// Run `f` inside a write transaction.
    ///
    /// The transaction commits when `f` returns `Ok` and aborts when it
    /// returns `Err`, so a failed closure never leaves partial writes.
    fn update<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn WriteTxn) -> Result<T, E>,
        E: From<KvError>,
    {
        let mut txn = self.begin_write()?;
        match f(&mut *txn) {
            Ok(value) => {
                txn.commit()?;
                Ok(value)
            }
            Err(err) => {
                txn.abort();
                Err(err)
            }
        }
    }
}

impl<S: KvStore + ?Sized> KvStoreExt for S {}

//! Core traits: KvStore, ReadTxn, WriteTxn.

use std::sync::Arc;

use bytes::Bytes;

use crate::KvError;

/// A read-only view of the store.
///
/// A read transaction observes the state committed when it began. Later
/// commits by writers are not visible through it.
pub trait ReadTxn {
    /// Read the value stored under `key` in `bucket`.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - The key does not exist (not an error condition).
    /// * `Ok(Some(bytes))` - The stored value.
    /// * `Err(KvError::BucketNotFound)` - The bucket was never created.
    fn get(&self, bucket: &[u8], key: &[u8]) -> Result<Option<Bytes>, KvError>;

    /// Check whether `bucket` exists in this transaction's view.
    fn has_bucket(&self, bucket: &[u8]) -> bool;
}

/// A read-write transaction.
///
/// Writes are buffered until `commit`. Reads through the transaction see
/// its own uncommitted writes. Dropping a transaction without committing
/// discards everything it wrote.
pub trait WriteTxn: ReadTxn {
    /// Create `bucket` unless it already exists.
    fn create_bucket_if_absent(&mut self, bucket: &[u8]) -> Result<(), KvError>;

    /// Store `value` under `key` in an existing bucket.
    fn put(&mut self, bucket: &[u8], key: &[u8], value: Bytes) -> Result<(), KvError>;

    /// Remove `key` from an existing bucket, returning the previous value.
    fn delete(&mut self, bucket: &[u8], key: &[u8]) -> Result<Option<Bytes>, KvError>;

    /// Make every buffered write visible to later transactions.
    fn commit(self: Box<Self>) -> Result<(), KvError>;

    /// Discard every buffered write.
    fn abort(self: Box<Self>);
}

/// A transactional, bucketed key-value store.
///
/// Write transactions are serialized: `begin_write` blocks while another
/// write transaction is open. Read transactions never block and are never
/// blocked by writers.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Arc<dyn KvStore>`.
pub trait KvStore: Send + Sync {
    /// Open a snapshot read transaction.
    fn begin_read(&self) -> Result<Box<dyn ReadTxn + '_>, KvError>;

    /// Open a write transaction, waiting for any other writer to finish.
    fn begin_write(&self) -> Result<Box<dyn WriteTxn + '_>, KvError>;
}

// Blanket implementations for references, boxes and shared handles

impl<T: KvStore + ?Sized> KvStore for &T {
    fn begin_read(&self) -> Result<Box<dyn ReadTxn + '_>, KvError> {
        (**self).begin_read()
    }

    fn begin_write(&self) -> Result<Box<dyn WriteTxn + '_>, KvError> {
        (**self).begin_write()
    }
}

impl<T: KvStore + ?Sized> KvStore for Box<T> {
    fn begin_read(&self) -> Result<Box<dyn ReadTxn + '_>, KvError> {
        self.as_ref().begin_read()
    }

    fn begin_write(&self) -> Result<Box<dyn WriteTxn + '_>, KvError> {
        self.as_ref().begin_write()
    }
}

impl<T: KvStore + ?Sized> KvStore for Arc<T> {
    fn begin_read(&self) -> Result<Box<dyn ReadTxn + '_>, KvError> {
        self.as_ref().begin_read()
    }

    fn begin_write(&self) -> Result<Box<dyn WriteTxn + '_>, KvError> {
        self.as_ref().begin_write()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryKv;

    #[test]
    fn object_safety_works() {
        let store: Arc<dyn KvStore> = Arc::new(InMemoryKv::new());

        let mut txn = store.begin_write().unwrap();
        txn.create_bucket_if_absent(b"bucket").unwrap();
        txn.put(b"bucket", b"key", Bytes::from_static(b"value"))
            .unwrap();
        txn.commit().unwrap();

        let read = store.begin_read().unwrap();
        assert_eq!(
            read.get(b"bucket", b"key").unwrap(),
            Some(Bytes::from_static(b"value"))
        );
    }

    #[test]
    fn ref_blanket_impl_works() {
        let store = InMemoryKv::new();
        let by_ref: &InMemoryKv = &store;

        let mut txn = by_ref.begin_write().unwrap();
        txn.create_bucket_if_absent(b"bucket").unwrap();
        txn.commit().unwrap();

        assert!(store.begin_read().unwrap().has_bucket(b"bucket"));
    }

    #[test]
    fn box_dyn_works() {
        let boxed: Box<dyn KvStore> = Box::new(InMemoryKv::new());

        let mut txn = boxed.begin_write().unwrap();
        txn.create_bucket_if_absent(b"b").unwrap();
        txn.put(b"b", b"k", Bytes::from_static(b"v")).unwrap();
        txn.commit().unwrap();

        let read = boxed.begin_read().unwrap();
        assert_eq!(read.get(b"b", b"k").unwrap(), Some(Bytes::from_static(b"v")));
    }
}

//! In-memory key-value store.

use crate::engine::{TxnEngine, Volatile};
use crate::{KvError, KvStore, ReadTxn, WriteTxn};

/// A process-local store whose committed state lives only in memory.
///
/// Useful in tests and for shadows that do not need to survive a restart.
/// Each instance is fully isolated from every other instance.
///
/// # Example
///
/// ```rust
/// use shadow_kv_store::{Bytes, InMemoryKv, KvStore, ReadTxn, WriteTxn};
///
/// let store = InMemoryKv::new();
///
/// let mut txn = store.begin_write().unwrap();
/// txn.create_bucket_if_absent(b"things").unwrap();
/// txn.put(b"things", b"one", Bytes::from_static(b"1")).unwrap();
/// txn.commit().unwrap();
///
/// let read = store.begin_read().unwrap();
/// assert_eq!(read.get(b"things", b"one").unwrap(), Some(Bytes::from_static(b"1")));
/// ```
pub struct InMemoryKv {
    engine: TxnEngine<Volatile>,
}

impl InMemoryKv {
    /// Create a new empty store with no buckets.
    pub fn new() -> Self {
        Self {
            engine: TxnEngine::new(Default::default(), Volatile),
        }
    }
}

impl Default for InMemoryKv {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for InMemoryKv {
    fn begin_read(&self) -> Result<Box<dyn ReadTxn + '_>, KvError> {
        Ok(Box::new(self.engine.begin_read()?))
    }

    fn begin_write(&self) -> Result<Box<dyn WriteTxn + '_>, KvError> {
        Ok(Box::new(self.engine.begin_write()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn basic_put_get() {
        let store = InMemoryKv::new();

        let mut txn = store.begin_write().unwrap();
        txn.create_bucket_if_absent(b"bucket").unwrap();
        txn.put(b"bucket", b"foo", Bytes::from_static(b"bar"))
            .unwrap();
        txn.commit().unwrap();

        let read = store.begin_read().unwrap();
        assert_eq!(
            read.get(b"bucket", b"foo").unwrap(),
            Some(Bytes::from_static(b"bar"))
        );
        assert_eq!(read.get(b"bucket", b"missing").unwrap(), None);
    }

    #[test]
    fn aborted_write_is_invisible() {
        let store = InMemoryKv::new();

        let mut txn = store.begin_write().unwrap();
        txn.create_bucket_if_absent(b"bucket").unwrap();
        txn.abort();

        assert!(!store.begin_read().unwrap().has_bucket(b"bucket"));
    }

    #[test]
    fn create_bucket_is_idempotent() {
        let store = InMemoryKv::new();

        for _ in 0..2 {
            let mut txn = store.begin_write().unwrap();
            txn.create_bucket_if_absent(b"bucket").unwrap();
            txn.put(b"bucket", b"k", Bytes::from_static(b"v")).unwrap();
            txn.commit().unwrap();
        }

        let read = store.begin_read().unwrap();
        assert_eq!(read.get(b"bucket", b"k").unwrap(), Some(Bytes::from_static(b"v")));
    }

    #[test]
    fn stores_are_isolated() {
        let a = InMemoryKv::new();
        let b = InMemoryKv::new();

        let mut txn = a.begin_write().unwrap();
        txn.create_bucket_if_absent(b"bucket").unwrap();
        txn.commit().unwrap();

        assert!(a.begin_read().unwrap().has_bucket(b"bucket"));
        assert!(!b.begin_read().unwrap().has_bucket(b"bucket"));
    }
}

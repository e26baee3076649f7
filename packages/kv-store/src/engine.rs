//! Copy-on-write snapshot engine shared by the in-memory and on-disk stores.
//!
//! Committed state lives behind an `Arc<Snapshot>`. Readers clone the `Arc`
//! and keep reading that snapshot for as long as they like. A writer takes
//! the single writer lock, works on a private copy, and on commit first hands
//! its change set to the store's `Durability` and then swaps the new snapshot
//! in. Buckets are themselves behind `Arc`s so a commit only copies the
//! buckets it touched.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use bytes::Bytes;

use crate::{KvError, ReadTxn, WriteTxn};

pub(crate) type Bucket = BTreeMap<Bytes, Bytes>;

/// Immutable committed state.
#[derive(Clone, Debug, Default)]
pub(crate) struct Snapshot {
    buckets: BTreeMap<Bytes, Arc<Bucket>>,
}

impl Snapshot {
    fn bucket(&self, name: &[u8]) -> Result<&Bucket, KvError> {
        self.buckets
            .get(name)
            .map(|bucket| &**bucket)
            .ok_or_else(|| KvError::BucketNotFound {
                bucket: Bytes::copy_from_slice(name),
            })
    }

    fn bucket_mut(&mut self, name: &[u8]) -> Result<&mut Bucket, KvError> {
        self.buckets
            .get_mut(name)
            .map(Arc::make_mut)
            .ok_or_else(|| KvError::BucketNotFound {
                bucket: Bytes::copy_from_slice(name),
            })
    }

    pub(crate) fn get(&self, bucket: &[u8], key: &[u8]) -> Result<Option<Bytes>, KvError> {
        Ok(self.bucket(bucket)?.get(key).cloned())
    }

    pub(crate) fn has_bucket(&self, bucket: &[u8]) -> bool {
        self.buckets.contains_key(bucket)
    }

    /// Returns `true` when the bucket was newly created.
    pub(crate) fn create_bucket(&mut self, bucket: &[u8]) -> Result<bool, KvError> {
        if bucket.is_empty() {
            return Err(KvError::EmptyName);
        }
        if self.has_bucket(bucket) {
            return Ok(false);
        }
        self.buckets
            .insert(Bytes::copy_from_slice(bucket), Arc::default());
        Ok(true)
    }

    pub(crate) fn put(&mut self, bucket: &[u8], key: &[u8], value: Bytes) -> Result<(), KvError> {
        if key.is_empty() {
            return Err(KvError::EmptyName);
        }
        self.bucket_mut(bucket)?
            .insert(Bytes::copy_from_slice(key), value);
        Ok(())
    }

    pub(crate) fn delete(&mut self, bucket: &[u8], key: &[u8]) -> Result<Option<Bytes>, KvError> {
        Ok(self.bucket_mut(bucket)?.remove(key))
    }

    pub(crate) fn key_count(&self) -> usize {
        self.buckets.values().map(|bucket| bucket.len()).sum()
    }
}

/// Everything a write transaction changed, in the order-free form a
/// `Durability` needs. `None` marks a deleted key.
#[derive(Debug, Default)]
pub(crate) struct ChangeSet {
    pub(crate) buckets: BTreeSet<Bytes>,
    pub(crate) entries: BTreeMap<(Bytes, Bytes), Option<Bytes>>,
}

impl ChangeSet {
    pub(crate) fn is_empty(&self) -> bool {
        self.buckets.is_empty() && self.entries.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.buckets.len() + self.entries.len()
    }
}

/// Where committed changes go before they become visible.
pub(crate) trait Durability: Send + Sync {
    fn persist(&self, changes: &ChangeSet) -> Result<(), KvError>;
}

/// Keeps nothing; commits are visible only to this process.
pub(crate) struct Volatile;

impl Durability for Volatile {
    fn persist(&self, _changes: &ChangeSet) -> Result<(), KvError> {
        Ok(())
    }
}

pub(crate) struct TxnEngine<D> {
    committed: RwLock<Arc<Snapshot>>,
    writer: Mutex<()>,
    durability: D,
}

impl<D: Durability> TxnEngine<D> {
    pub(crate) fn new(initial: Snapshot, durability: D) -> Self {
        Self {
            committed: RwLock::new(Arc::new(initial)),
            writer: Mutex::new(()),
            durability,
        }
    }

    fn current(&self) -> Result<Arc<Snapshot>, KvError> {
        self.committed
            .read()
            .map(|snapshot| snapshot.clone())
            .map_err(|_| KvError::Poisoned)
    }

    pub(crate) fn begin_read(&self) -> Result<SnapshotTxn, KvError> {
        Ok(SnapshotTxn {
            snapshot: self.current()?,
        })
    }

    pub(crate) fn begin_write(&self) -> Result<EngineWriteTxn<'_, D>, KvError> {
        let writer = self.writer.lock().map_err(|_| KvError::Poisoned)?;
        // Read the snapshot only after winning the writer lock so the copy
        // includes the previous writer's commit.
        let working = Snapshot::clone(&*self.current()?);
        Ok(EngineWriteTxn {
            engine: self,
            _writer: writer,
            working,
            changes: ChangeSet::default(),
        })
    }

    fn publish(&self, snapshot: Snapshot) -> Result<(), KvError> {
        let mut committed = self.committed.write().map_err(|_| KvError::Poisoned)?;
        *committed = Arc::new(snapshot);
        Ok(())
    }
}

/// A read transaction pinned to one committed snapshot.
pub(crate) struct SnapshotTxn {
    snapshot: Arc<Snapshot>,
}

impl ReadTxn for SnapshotTxn {
    fn get(&self, bucket: &[u8], key: &[u8]) -> Result<Option<Bytes>, KvError> {
        self.snapshot.get(bucket, key)
    }

    fn has_bucket(&self, bucket: &[u8]) -> bool {
        self.snapshot.has_bucket(bucket)
    }
}

/// A write transaction holding the engine's writer lock until it ends.
pub(crate) struct EngineWriteTxn<'a, D> {
    engine: &'a TxnEngine<D>,
    _writer: MutexGuard<'a, ()>,
    working: Snapshot,
    changes: ChangeSet,
}

impl<D: Durability> ReadTxn for EngineWriteTxn<'_, D> {
    fn get(&self, bucket: &[u8], key: &[u8]) -> Result<Option<Bytes>, KvError> {
        self.working.get(bucket, key)
    }

    fn has_bucket(&self, bucket: &[u8]) -> bool {
        self.working.has_bucket(bucket)
    }
}

impl<D: Durability> WriteTxn for EngineWriteTxn<'_, D> {
    fn create_bucket_if_absent(&mut self, bucket: &[u8]) -> Result<(), KvError> {
        if self.working.create_bucket(bucket)? {
            self.changes.buckets.insert(Bytes::copy_from_slice(bucket));
        }
        Ok(())
    }

    fn put(&mut self, bucket: &[u8], key: &[u8], value: Bytes) -> Result<(), KvError> {
        self.working.put(bucket, key, value.clone())?;
        self.changes.entries.insert(
            (Bytes::copy_from_slice(bucket), Bytes::copy_from_slice(key)),
            Some(value),
        );
        Ok(())
    }

    fn delete(&mut self, bucket: &[u8], key: &[u8]) -> Result<Option<Bytes>, KvError> {
        let previous = self.working.delete(bucket, key)?;
        if previous.is_some() {
            self.changes.entries.insert(
                (Bytes::copy_from_slice(bucket), Bytes::copy_from_slice(key)),
                None,
            );
        }
        Ok(previous)
    }

    fn commit(self: Box<Self>) -> Result<(), KvError> {
        let EngineWriteTxn {
            engine,
            _writer,
            working,
            changes,
        } = *self;

        if changes.is_empty() {
            return Ok(());
        }

        engine.durability.persist(&changes)?;
        engine.publish(working)?;
        log::debug!(
            "Committed write transaction ({} change(s), {} key(s) total)",
            changes.len(),
            engine.current()?.key_count()
        );
        Ok(())
    }

    fn abort(self: Box<Self>) {
        log::debug!(
            "Aborted write transaction ({} change(s) discarded)",
            self.changes.len()
        );
    }
}

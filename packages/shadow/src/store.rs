//! Transactional persistence of shadow records.

use std::fmt;
use std::sync::Arc;

use shadow_document::{Document, Merger};
use shadow_kv_store::{Bytes, KvStore, KvStoreExt, ReadTxn};

use crate::{Result, Shadow, ShadowConfig, ShadowError, ShadowId, ShadowRecord};

/// Which half of a shadow a patch applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Desire,
    Report,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Desire => f.write_str("desired"),
            Side::Report => f.write_str("reported"),
        }
    }
}

/// Shadow records kept in one bucket of a key-value store.
///
/// Every operation runs in exactly one storage transaction, so an update
/// is a single read-merge-write step: concurrent updates to the same
/// shadow are applied one after another and never lose each other's
/// changes. Cloning is cheap and clones share the underlying store.
///
/// ```rust
/// use std::sync::Arc;
/// use device_shadow::{Document, ShadowId, ShadowRecord, ShadowStore};
/// use shadow_kv_store::InMemoryKv;
///
/// let store = ShadowStore::new(Arc::new(InMemoryKv::new()));
/// let id = ShadowId::new("default", "thermostat");
/// store.create_if_absent(&id, &ShadowRecord::new(&id)).unwrap();
///
/// let patch = Document::from_json_str(r#"{"temp": 22}"#).unwrap();
/// let delta = store.update_desired(&id, &patch).unwrap();
/// assert_eq!(delta, patch);
/// ```
#[derive(Clone)]
pub struct ShadowStore {
    kv: Arc<dyn KvStore>,
    bucket: Bytes,
    merger: Merger,
}

impl fmt::Debug for ShadowStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShadowStore")
            .field("bucket", &String::from_utf8_lossy(&self.bucket))
            .field("merger", &self.merger)
            .finish_non_exhaustive()
    }
}

impl ShadowStore {
    /// A store with the default configuration.
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self::with_config(kv, &ShadowConfig::default())
    }

    pub fn with_config(kv: Arc<dyn KvStore>, config: &ShadowConfig) -> Self {
        Self {
            kv,
            bucket: Bytes::from(config.bucket.clone()),
            merger: config.merger(),
        }
    }

    /// Name of the bucket holding the records.
    pub fn bucket(&self) -> &[u8] {
        &self.bucket
    }

    /// Open a handle to a shadow, creating it if needed.
    pub fn shadow(&self, namespace: impl Into<String>, name: impl Into<String>) -> Result<Shadow> {
        Shadow::new(namespace, name, self.clone())
    }

    /// Store `record` under `id` unless something is already there.
    ///
    /// Creates the bucket on first use. Fails with `AlreadyExists` (and
    /// writes nothing) when the key holds this identity's record, and with
    /// `IdentityConflict` when it holds another identity's.
    pub fn create_if_absent(&self, id: &ShadowId, record: &ShadowRecord) -> Result<()> {
        let key = id.key();
        let bytes = record.encode()?;

        self.kv.update(|txn| -> Result<()> {
            txn.create_bucket_if_absent(&self.bucket)?;
            if self.stored_record(&*txn, id)?.is_some() {
                return Err(ShadowError::AlreadyExists {
                    namespace: id.namespace.clone(),
                    name: id.name.clone(),
                });
            }
            txn.put(&self.bucket, &key, bytes)?;
            Ok(())
        })?;

        log::debug!("Stored new shadow record {}", id);
        Ok(())
    }

    /// Read the current record.
    pub fn load(&self, id: &ShadowId) -> Result<ShadowRecord> {
        self.kv.view(|txn| self.read_record(txn, id))
    }

    /// Merge `patch` into the desired state and return the new delta.
    pub fn update_desired(&self, id: &ShadowId, patch: &Document) -> Result<Document> {
        self.update(id, Side::Desire, patch)
    }

    /// Merge `patch` into the reported state and return the new delta.
    pub fn update_reported(&self, id: &ShadowId, patch: &Document) -> Result<Document> {
        self.update(id, Side::Report, patch)
    }

    /// The delta of the stored record, without changing anything.
    pub fn delta(&self, id: &ShadowId) -> Result<Document> {
        self.load(id).map(|record| record.delta())
    }

    fn update(&self, id: &ShadowId, side: Side, patch: &Document) -> Result<Document> {
        let delta = self.kv.update(|txn| -> Result<Document> {
            let mut record = self.read_record(&*txn, id)?;

            let target = match side {
                Side::Desire => &mut record.desire,
                Side::Report => &mut record.report,
            };
            let merged = self.merger.merge(target, patch)?;
            *target = merged;

            txn.put(&self.bucket, &id.key(), record.encode()?)?;
            Ok(record.delta())
        })?;

        log::debug!(
            "Updated {} state of shadow {}, delta has {} top-level keys",
            side,
            id,
            delta.len()
        );
        Ok(delta)
    }

    fn read_record<T: ReadTxn + ?Sized>(&self, txn: &T, id: &ShadowId) -> Result<ShadowRecord> {
        self.stored_record(txn, id)?
            .ok_or_else(|| ShadowError::NotFound {
                namespace: id.namespace.clone(),
                name: id.name.clone(),
            })
    }

    /// The record under `id`'s key, if any. A missing bucket or an empty
    /// value counts as no record.
    fn stored_record<T: ReadTxn + ?Sized>(
        &self,
        txn: &T,
        id: &ShadowId,
    ) -> Result<Option<ShadowRecord>> {
        if !txn.has_bucket(&self.bucket) {
            return Ok(None);
        }
        let bytes = match txn.get(&self.bucket, &id.key())? {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => return Ok(None),
        };

        let record = ShadowRecord::decode(&bytes).map_err(|e| {
            log::warn!("Failed to decode shadow record {}: {}", id, e);
            ShadowError::Encoding(e)
        })?;

        if record.namespace != id.namespace || record.name != id.name {
            log::warn!(
                "Key of shadow {} holds the record of {}/{}",
                id,
                record.namespace,
                record.name
            );
            return Err(ShadowError::IdentityConflict {
                namespace: id.namespace.clone(),
                name: id.name.clone(),
                stored: format!("{}/{}", record.namespace, record.name),
            });
        }
        Ok(Some(record))
    }
}

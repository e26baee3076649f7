//! Per-identity shadow handles.

use shadow_document::Document;

use crate::{Result, ShadowId, ShadowRecord, ShadowStore};

/// A handle to one shadow.
///
/// The handle holds only the identity and a store; all state lives in the
/// store. Clones (and handles opened elsewhere for the same identity) see
/// the same shadow.
///
/// ```rust
/// use std::sync::Arc;
/// use device_shadow::{Document, Shadow, ShadowStore};
/// use shadow_kv_store::InMemoryKv;
///
/// let store = ShadowStore::new(Arc::new(InMemoryKv::new()));
/// let shadow = Shadow::new("default", "thermostat", store).unwrap();
///
/// let delta = shadow.desire(&Document::from_json_str(r#"{"temp": 22}"#).unwrap()).unwrap();
/// assert!(delta.contains_key("temp"));
///
/// let delta = shadow.report(&Document::from_json_str(r#"{"temp": 22}"#).unwrap()).unwrap();
/// assert!(delta.is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct Shadow {
    id: ShadowId,
    store: ShadowStore,
}

impl Shadow {
    /// Open the shadow `name` in `namespace`, creating an empty record if
    /// none exists. An existing record is left as it is.
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        store: ShadowStore,
    ) -> Result<Self> {
        let id = ShadowId::new(namespace, name);
        match store.create_if_absent(&id, &ShadowRecord::new(&id)) {
            Ok(()) => log::info!("Created shadow {}", id),
            Err(e) if e.is_already_exists() => {
                log::debug!("Shadow {} already exists", id);
            }
            Err(e) => return Err(e),
        }
        Ok(Self { id, store })
    }

    pub fn id(&self) -> &ShadowId {
        &self.id
    }

    /// The whole stored record.
    pub fn get(&self) -> Result<ShadowRecord> {
        self.store.load(&self.id)
    }

    /// Merge `patch` into the desired state; returns the resulting delta.
    pub fn desire(&self, patch: &Document) -> Result<Document> {
        self.store.update_desired(&self.id, patch)
    }

    /// Merge `patch` into the reported state; returns the resulting delta.
    pub fn report(&self, patch: &Document) -> Result<Document> {
        self.store.update_reported(&self.id, patch)
    }

    pub fn delta(&self) -> Result<Document> {
        self.store.delta(&self.id)
    }
}

//! Shadow identities and persisted records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use shadow_document::{diff, Document};
use shadow_kv_store::Bytes;

/// Identity of a shadow: a name within a namespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShadowId {
    pub namespace: String,
    pub name: String,
}

impl ShadowId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Storage key: `name.namespace`.
    pub fn key(&self) -> Bytes {
        Bytes::from(format!("{}.{}", self.name, self.namespace))
    }
}

impl fmt::Display for ShadowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.name, self.namespace)
    }
}

/// The persisted state of one shadow.
///
/// Encoded as a JSON object:
///
/// ```json
/// {
///   "namespace": "default",
///   "name": "thermostat",
///   "creationTimestamp": "2024-05-01T12:00:00Z",
///   "report": {"temp": 22},
///   "desire": {"temp": 25}
/// }
/// ```
///
/// A `null` (or missing) `report`/`desire` decodes as an empty document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowRecord {
    pub namespace: String,
    pub name: String,
    pub creation_timestamp: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub report: Document,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub desire: Document,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Document, D::Error> {
    Ok(Option::<Document>::deserialize(deserializer)?.unwrap_or_default())
}

impl ShadowRecord {
    /// A fresh record with empty desired and reported state, created now.
    pub fn new(id: &ShadowId) -> Self {
        Self::created_at(id, Utc::now())
    }

    pub fn created_at(id: &ShadowId, creation_timestamp: DateTime<Utc>) -> Self {
        Self {
            namespace: id.namespace.clone(),
            name: id.name.clone(),
            creation_timestamp,
            report: Document::new(),
            desire: Document::new(),
        }
    }

    pub fn id(&self) -> ShadowId {
        ShadowId::new(self.namespace.clone(), self.name.clone())
    }

    /// Desired fields the reported state has not caught up with.
    pub fn delta(&self) -> Document {
        diff(&self.desire, &self.report)
    }

    /// JSON bytes of the record. Fails if either side holds a NaN or
    /// infinite number, which JSON would otherwise turn into `null`.
    pub fn encode(&self) -> Result<Bytes, serde_json::Error> {
        self.report
            .check_finite()
            .and_then(|()| self.desire.check_finite())
            .map_err(<serde_json::Error as serde::ser::Error>::custom)?;
        serde_json::to_vec(self).map(Bytes::from)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

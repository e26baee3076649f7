//! Map-rooted documents.

use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{DocumentError, Value};

/// A document whose root is always a map.
///
/// Desired state, reported state and deltas are all `Document`s. Wrapping
/// the map (rather than using a bare `Value`) makes "the root is a map" a
/// property of the type: a scalar or list can never be stored as a side of
/// a shadow, and a patch with a non-map root is rejected when it is parsed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "serde_json::Value")]
pub struct Document(BTreeMap<String, Value>);

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Insert a top-level entry, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }

    pub fn keys(&self) -> btree_map::Keys<'_, String, Value> {
        self.0.keys()
    }

    pub fn as_map(&self) -> &BTreeMap<String, Value> {
        &self.0
    }

    pub(crate) fn as_map_mut(&mut self) -> &mut BTreeMap<String, Value> {
        &mut self.0
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }

    /// Nesting depth of maps, counting the root: an empty or flat document
    /// has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.0.values().map(Value::depth).max().unwrap_or(0)
    }

    /// Look up a nested value with a JSON Pointer (RFC 6901), e.g.
    /// `/cfg/limits/0`.
    ///
    /// `~1` decodes to `/` and `~0` to `~`. List elements are addressed by
    /// index. Returns `None` when any step is missing, or when the pointer
    /// does not start with `/`.
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        let mut tokens = pointer.strip_prefix('/')?.split('/');
        let first = unescape(tokens.next()?);
        let mut current = self.0.get(first.as_str())?;
        for token in tokens {
            let token = unescape(token);
            current = match current {
                Value::Map(map) => map.get(token.as_str())?,
                Value::List(items) => items.get(token.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

impl From<BTreeMap<String, Value>> for Document {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Document {
    type Error = DocumentError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Map(map) => Ok(Self(map)),
            other => Err(DocumentError::NotAMap {
                found: other.kind(),
            }),
        }
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Map(doc.0)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(json: serde_json::Value) -> Document {
        Document::try_from(json).unwrap()
    }

    #[test]
    fn pointer_walks_maps_and_arrays() {
        let d = doc(json!({
            "cfg": {"limits": [10, 20], "a/b": 1, "t~x": 2},
            "temp": 22
        }));

        assert_eq!(d.pointer("/temp"), Some(&Value::Integer(22)));
        assert_eq!(d.pointer("/cfg/limits/1"), Some(&Value::Integer(20)));
        assert_eq!(d.pointer("/cfg/a~1b"), Some(&Value::Integer(1)));
        assert_eq!(d.pointer("/cfg/t~0x"), Some(&Value::Integer(2)));
        assert_eq!(d.pointer("/cfg/limits/7"), None);
        assert_eq!(d.pointer("/temp/deeper"), None);
        assert_eq!(d.pointer("temp"), None);
        assert_eq!(d.pointer(""), None);
    }

    #[test]
    fn depth_counts_root() {
        assert_eq!(Document::new().depth(), 1);
        assert_eq!(doc(json!({"a": 1})).depth(), 1);
        assert_eq!(doc(json!({"a": {"b": {"c": 1}}})).depth(), 3);
    }

    #[test]
    fn insert_and_remove() {
        let mut d = Document::new();
        assert_eq!(d.insert("temp", 22), None);
        assert_eq!(d.insert("temp", 25), Some(Value::Integer(22)));
        assert_eq!(d.len(), 1);
        assert_eq!(d.remove("temp"), Some(Value::Integer(25)));
        assert!(d.is_empty());
    }

    #[test]
    fn collects_from_pairs() {
        let d: Document = [("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(d.keys().cloned().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(d, doc(json!({"a": 1, "b": 2})));
    }

    #[test]
    fn only_maps_become_documents() {
        assert!(Document::try_from(Value::map()).is_ok());
        assert!(matches!(
            Document::try_from(Value::from(3)),
            Err(DocumentError::NotAMap { found: "integer" })
        ));
    }
}

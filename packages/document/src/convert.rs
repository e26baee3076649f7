//! JSON conversions.
//!
//! `Value` and `Document` serialize through `serde_json::Value`, so what
//! goes over the wire or into storage is always plain JSON.

use serde_json::Value as Json;

use crate::{Document, DocumentError, Value};

/// Render a value as JSON. Non-finite floats have no JSON form and become
/// `null`; see [`Document::check_finite`] for keeping them out of documents.
pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Integer(i) => Json::from(*i),
        Value::Unsigned(u) => Json::from(*u),
        Value::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
        Value::String(s) => Json::String(s.clone()),
        Value::List(items) => items.iter().map(value_to_json).collect(),
        Value::Map(map) => Json::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), value_to_json(value)))
                .collect(),
        ),
    }
}

/// Read a value from JSON.
pub fn json_to_value(json: Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => number_to_value(&n),
        Json::String(s) => Value::String(s),
        Json::Array(items) => Value::List(items.into_iter().map(json_to_value).collect()),
        Json::Object(object) => Value::Map(
            object
                .into_iter()
                .map(|(key, value)| (key, json_to_value(value)))
                .collect(),
        ),
    }
}

fn number_to_value(n: &serde_json::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Integer(i)
    } else if let Some(u) = n.as_u64() {
        Value::Unsigned(u)
    } else {
        n.as_f64().map_or_else(|| Value::String(n.to_string()), Value::Float)
    }
}

/// Path ("a/b/0") of the first NaN or infinite float under `value`.
fn find_non_finite(value: &Value, path: &mut Vec<String>) -> Option<String> {
    match value {
        Value::Float(f) if !f.is_finite() => Some(path.join("/")),
        Value::List(items) => items.iter().enumerate().find_map(|(index, item)| {
            path.push(index.to_string());
            let found = find_non_finite(item, path);
            path.pop();
            found
        }),
        Value::Map(map) => map.iter().find_map(|(key, item)| {
            path.push(key.clone());
            let found = find_non_finite(item, path);
            path.pop();
            found
        }),
        _ => None,
    }
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        json_to_value(json)
    }
}

impl From<Value> for Json {
    fn from(value: Value) -> Self {
        value_to_json(&value)
    }
}

impl TryFrom<Json> for Document {
    type Error = DocumentError;

    fn try_from(json: Json) -> Result<Self, Self::Error> {
        match json {
            Json::Object(object) => Ok(object.into()),
            other => Err(DocumentError::NotAMap {
                found: json_to_value(other).kind(),
            }),
        }
    }
}

impl From<serde_json::Map<String, Json>> for Document {
    fn from(object: serde_json::Map<String, Json>) -> Self {
        object
            .into_iter()
            .map(|(key, value)| (key, json_to_value(value)))
            .collect()
    }
}

impl From<Document> for Json {
    fn from(doc: Document) -> Self {
        doc.to_json()
    }
}

impl Document {
    /// Parse a JSON object from bytes.
    ///
    /// Valid JSON whose root is not an object fails with `NotAMap`.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, DocumentError> {
        Document::try_from(serde_json::from_slice::<Json>(bytes)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, DocumentError> {
        Self::from_json_slice(s.as_bytes())
    }

    /// Compact JSON encoding, keys sorted.
    pub fn to_json_vec(&self) -> Result<Vec<u8>, DocumentError> {
        Ok(serde_json::to_vec(&self.to_json())?)
    }

    /// Fail with `NonFiniteNumber` if any float in the document is NaN or
    /// infinite. JSON cannot carry such a number, so storing one would
    /// silently turn it into `null`.
    pub fn check_finite(&self) -> Result<(), DocumentError> {
        let mut path = Vec::new();
        for (key, value) in self.iter() {
            path.push(key.clone());
            if let Some(found) = find_non_finite(value, &mut path) {
                return Err(DocumentError::NonFiniteNumber { path: found });
            }
            path.pop();
        }
        Ok(())
    }

    pub fn to_json(&self) -> Json {
        Json::Object(
            self.iter()
                .map(|(key, value)| (key.clone(), value_to_json(value)))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_keep_their_kind() {
        assert_eq!(json_to_value(json!(-3)), Value::Integer(-3));
        assert_eq!(json_to_value(json!(21.5)), Value::Float(21.5));
    }

    #[test]
    fn large_unsigned_integers_are_exact() {
        assert_eq!(json_to_value(json!(u64::MAX)), Value::Unsigned(u64::MAX));
        assert_eq!(json_to_value(json!(i64::MAX)), Value::Integer(i64::MAX));

        let doc = Document::from_json_str("{\"serial\": 18446744073709551615}").unwrap();
        assert_eq!(doc.get("serial"), Some(&Value::Unsigned(u64::MAX)));
        assert_eq!(doc.to_json_vec().unwrap(), b"{\"serial\":18446744073709551615}");
    }

    #[test]
    fn non_finite_floats_render_as_null() {
        assert_eq!(value_to_json(&Value::Float(f64::INFINITY)), Json::Null);
        assert_eq!(value_to_json(&Value::Float(f64::NAN)), Json::Null);
    }

    #[test]
    fn check_finite_names_the_offending_path() {
        let mut doc = Document::from_json_str(r#"{"cfg": {"zones": [1.5, 2.5]}, "temp": 21.5}"#).unwrap();
        assert!(doc.check_finite().is_ok());

        doc.insert(
            "cfg",
            Value::Map([("zones".to_string(), Value::from(vec![1.5, f64::NAN]))].into()),
        );
        match doc.check_finite() {
            Err(DocumentError::NonFiniteNumber { path }) => assert_eq!(path, "cfg/zones/1"),
            other => panic!("expected NonFiniteNumber, got {other:?}"),
        }

        doc.remove("cfg");
        doc.insert("temp", f64::NEG_INFINITY);
        assert!(matches!(
            doc.check_finite(),
            Err(DocumentError::NonFiniteNumber { ref path }) if path == "temp"
        ));
    }

    #[test]
    fn nested_json_survives_conversion() {
        let json = json!({"zones": [1, "two", {"three": null}], "on": true});
        assert_eq!(value_to_json(&json_to_value(json.clone())), json);
    }

    #[test]
    fn only_objects_are_documents() {
        let cases = [
            (json!(null), "null"),
            (json!(false), "bool"),
            (json!(1), "integer"),
            (json!("x"), "string"),
            (json!([1, 2]), "list"),
        ];
        for (json, kind) in cases {
            match Document::try_from(json) {
                Err(DocumentError::NotAMap { found }) => assert_eq!(found, kind),
                other => panic!("expected NotAMap, got {other:?}"),
            }
        }
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            Document::from_json_slice(b"{\"temp\":"),
            Err(DocumentError::Json(_))
        ));
        assert!(matches!(
            Document::from_json_str("[22]"),
            Err(DocumentError::NotAMap { found: "list" })
        ));
    }

    #[test]
    fn serde_encodes_sorted_json() {
        let doc = Document::from_json_str(r#"{"temp": 22, "cfg": {"mode": "eco"}}"#).unwrap();
        let text = serde_json::to_string(&doc).unwrap();
        assert_eq!(text, r#"{"cfg":{"mode":"eco"},"temp":22}"#);
        assert_eq!(doc.to_json_vec().unwrap(), text.as_bytes());

        assert_eq!(serde_json::from_str::<Document>(&text).unwrap(), doc);
        let err = serde_json::from_str::<Document>("42").unwrap_err();
        assert!(err.to_string().contains("root must be a map"));
    }
}

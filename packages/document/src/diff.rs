//! Delta computation between desired and reported state.
//!
//! The delta holds the desired fields the reported side has not yet caught
//! up with. It only ever looks at keys of the desired side: a field the
//! device reports but nobody asked for is not part of the delta.

use std::collections::BTreeMap;

use crate::{Document, Value};

/// Compute `desired - reported`.
///
/// For every key of `desired`:
/// - missing from `reported`: the whole desired subtree is included
/// - a map on both sides: recurse, and include the result if non-empty
/// - anything else: included when the two values are not deep-equal
///
/// An empty result means the two sides have converged.
///
/// ```rust
/// use shadow_document::{diff, Document};
///
/// let desired = Document::from_json_str(r#"{"temp": 25, "cfg": {"a": 1, "b": 3}}"#).unwrap();
/// let reported = Document::from_json_str(r#"{"temp": 22, "cfg": {"a": 1, "b": 3}, "fw": "1.2"}"#).unwrap();
///
/// let delta = diff(&desired, &reported);
/// assert_eq!(delta.to_json(), serde_json::json!({"temp": 25}));
/// ```
pub fn diff(desired: &Document, reported: &Document) -> Document {
    diff_maps(desired.as_map(), reported.as_map()).into()
}

/// Whether `diff(desired, reported)` would be empty.
pub fn is_converged(desired: &Document, reported: &Document) -> bool {
    maps_converged(desired.as_map(), reported.as_map())
}

fn diff_maps(
    desired: &BTreeMap<String, Value>,
    reported: &BTreeMap<String, Value>,
) -> BTreeMap<String, Value> {
    let mut delta = BTreeMap::new();
    for (key, want) in desired {
        match (want, reported.get(key)) {
            (_, None) => {
                delta.insert(key.clone(), want.clone());
            }
            (Value::Map(want_map), Some(Value::Map(have_map))) => {
                let nested = diff_maps(want_map, have_map);
                if !nested.is_empty() {
                    delta.insert(key.clone(), Value::Map(nested));
                }
            }
            (_, Some(have)) => {
                if want != have {
                    delta.insert(key.clone(), want.clone());
                }
            }
        }
    }
    delta
}

fn maps_converged(desired: &BTreeMap<String, Value>, reported: &BTreeMap<String, Value>) -> bool {
    desired
        .iter()
        .all(|(key, want)| match (want, reported.get(key)) {
            (_, None) => false,
            (Value::Map(want_map), Some(Value::Map(have_map))) => {
                maps_converged(want_map, have_map)
            }
            (_, Some(have)) => want == have,
        })
}

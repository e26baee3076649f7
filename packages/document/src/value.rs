//! Nodes of a shadow document.
//!
//! A document is a JSON object, so a node is one of the JSON kinds. Numbers
//! are split: integers that fit `i64` are `Integer`, larger unsigned
//! integers are `Unsigned`, everything else a `Float`. Integers and floats
//! never compare equal (`22` and `22.0` differ).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One node of a document tree.
///
/// Maps are `BTreeMap`s, so iteration order and the encoded form are
/// sorted by key and equality is plain structural equality. Lists are
/// opaque to merge and diff: they are replaced and compared whole.
///
/// A key that does not exist is represented by its absence from the
/// enclosing map. `Null` is a value; inside a merge patch it marks the key
/// for deletion.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    /// Only for integers above `i64::MAX`; smaller ones are `Integer`.
    Unsigned(u64),
    /// Always finite when part of a stored document.
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// An empty map node.
    pub fn map() -> Self {
        Self::Map(BTreeMap::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        if let Self::Map(map) = self {
            Some(map)
        } else {
            None
        }
    }

    /// Name of the node's kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) | Self::Unsigned(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// How many maps deep this node goes: 0 for anything that is not a
    /// map, otherwise one more than the deepest child. Maps inside lists
    /// are not counted.
    pub fn depth(&self) -> usize {
        self.as_map().map_or(0, |map| {
            1 + map.values().map(Value::depth).max().unwrap_or(0)
        })
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i64 => Integer,
    i32 => Integer,
    u32 => Integer,
    f64 => Float,
    String => String,
    &str => String,
    BTreeMap<String, Value> => Map,
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        i64::try_from(v).map_or(Self::Unsigned(v), Self::Integer)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

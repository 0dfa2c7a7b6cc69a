//! Purpose: Classify document fragments by outer shape and declare which shapes a type accepts.
//! Exports: `Shape`, `Accepts`, `Record`.
//! Role: Static replacement for runtime inspection of a generic decode target.
//! Invariants: `Shape::of` is total over `serde_json::Value`; shape names are stable.
//! Invariants: `Record::ACCEPTS` defaults to `Accepts::Object` (aggregate-only decode).
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Outer shape of a document fragment.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Shape {
    Null,
    Object,
    Array,
    String,
    Number,
    Bool,
}

impl Shape {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Shape::Null,
            Value::Object(_) => Shape::Object,
            Value::Array(_) => Shape::Array,
            Value::String(_) => Shape::String,
            Value::Number(_) => Shape::Number,
            Value::Bool(_) => Shape::Bool,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Shape::Null => "null",
            Shape::Object => "object",
            Shape::Array => "array",
            Shape::String => "string",
            Shape::Number => "number",
            Shape::Bool => "bool",
        }
    }
}

/// Non-null shapes a `Record` may be decoded from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Accepts {
    /// Only object-shaped fragments reach the codec; anything else is a type mismatch.
    Object,
    /// Every non-null fragment is handed to the codec, which rejects mismatches itself.
    Any,
}

impl Accepts {
    pub fn admits(self, shape: Shape) -> bool {
        match self {
            Accepts::Object => shape == Shape::Object,
            Accepts::Any => shape != Shape::Null,
        }
    }
}

/// A value type that can live inside a [`Nullable`](crate::core::nullable::Nullable)
/// and round-trip through the document and storage bindings.
///
/// Most aggregates only need an empty impl:
///
/// ```
/// use nullable::api::Record;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Default, Serialize, Deserialize)]
/// struct Dummy {
///     value: i64,
/// }
///
/// impl Record for Dummy {}
/// ```
///
/// Types whose natural encoding is not an object (newtypes over strings,
/// sequences) opt in with `const ACCEPTS: Accepts = Accepts::Any;`.
pub trait Record: Serialize + DeserializeOwned + Default {
    const ACCEPTS: Accepts = Accepts::Object;

    /// Short type name used in mismatch errors.
    fn type_label() -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    let head = full.split('<').next().unwrap_or(full);
    match head.rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}

impl Record for Map<String, Value> {}

impl<V> Record for BTreeMap<String, V> where V: Serialize + DeserializeOwned {}

impl<V, S> Record for HashMap<String, V, S>
where
    V: Serialize + DeserializeOwned,
    S: BuildHasher + Default,
{
}

impl Record for Value {
    const ACCEPTS: Accepts = Accepts::Any;

    fn type_label() -> &'static str {
        "Value"
    }
}

#[cfg(test)]
mod tests {
    use super::{Accepts, Record, Shape, short_type_name};
    use serde_json::{Map, Value, json};
    use std::collections::BTreeMap;

    #[test]
    fn shape_classifies_every_variant() {
        let cases = [
            (json!(null), Shape::Null),
            (json!({"a": 1}), Shape::Object),
            (json!([1, 2]), Shape::Array),
            (json!("text"), Shape::String),
            (json!(10), Shape::Number),
            (json!(true), Shape::Bool),
        ];
        for (value, shape) in cases {
            assert_eq!(Shape::of(&value), shape);
        }
    }

    #[test]
    fn object_policy_admits_only_objects() {
        assert!(Accepts::Object.admits(Shape::Object));
        assert!(!Accepts::Object.admits(Shape::String));
        assert!(!Accepts::Object.admits(Shape::Array));
        assert!(Accepts::Any.admits(Shape::Number));
        assert!(!Accepts::Any.admits(Shape::Null));
    }

    #[test]
    fn type_labels_drop_module_paths() {
        assert_eq!(short_type_name("crate::model::Dummy"), "Dummy");
        assert_eq!(short_type_name("Dummy"), "Dummy");
        assert_eq!(
            short_type_name("alloc::collections::btree::map::BTreeMap<alloc::string::String, i64>"),
            "BTreeMap<alloc::string::String, i64>"
        );
        assert_eq!(<Map<String, Value> as Record>::ACCEPTS, Accepts::Object);
        assert_eq!(<BTreeMap<String, i64> as Record>::ACCEPTS, Accepts::Object);
        assert_eq!(<Value as Record>::ACCEPTS, Accepts::Any);
    }
}

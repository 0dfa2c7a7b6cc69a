//! Purpose: The `Nullable<T>` container and its JSON document binding.
//! Exports: `Nullable`.
//! Role: Gives record types without a native null state an explicit presence flag.
//! Invariants: `valid` is the only presence signal; `value` is unspecified when it is false.
//! Invariants: Every failed decode leaves the container absent with `value = T::default()`.
//! Invariants: Encoding an absent container yields exactly `null`; a present one yields the
//! inner value's own encoding with no envelope.
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use serde::de::value::MapAccessDeserializer;
use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde::{Serialize, Serializer};

use crate::core::error::{Error, ErrorKind};
use crate::core::shape::{Accepts, Record, Shape};
use crate::json::parse;

const NULL_LITERAL: &[u8] = b"null";

/// A value that may be absent.
///
/// Unlike `Option<T>`, the slot for `T` always exists; absence is carried by a
/// separate flag so the container can be filled in place by decoders and
/// storage scans.
///
/// Equality and hashing look only at the present value: two absent
/// containers are equal whatever their inner slots hold.
#[derive(Clone, Debug)]
pub struct Nullable<T> {
    value: T,
    valid: bool,
}

impl<T> Nullable<T> {
    pub fn new(value: T, valid: bool) -> Self {
        Self { value, valid }
    }

    /// A present container; never null.
    pub fn from_value(value: T) -> Self {
        Self::new(value, true)
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// True for absent containers. A present container holding a default
    /// `T` is not zero.
    pub fn is_zero(&self) -> bool {
        !self.valid
    }

    pub fn as_option(&self) -> Option<&T> {
        if self.valid { Some(&self.value) } else { None }
    }

    pub fn as_option_mut(&mut self) -> Option<&mut T> {
        if self.valid {
            Some(&mut self.value)
        } else {
            None
        }
    }

    pub fn into_option(self) -> Option<T> {
        if self.valid { Some(self.value) } else { None }
    }

    /// Raw access to the inner slot, whether or not the container is valid.
    pub fn inner(&self) -> &T {
        &self.value
    }

    pub fn set_valid(&mut self, value: T) {
        self.value = value;
        self.valid = true;
    }
}

impl<T: Default> Nullable<T> {
    /// The absent container: `T::default()` with `valid = false`.
    pub fn null() -> Self {
        Self::new(T::default(), false)
    }

    pub fn set_null(&mut self) {
        self.value = T::default();
        self.valid = false;
    }

    /// Builds a container from an optional borrow, copying the referent.
    pub fn from_ref(value: Option<&T>) -> Self
    where
        T: Clone,
    {
        match value {
            Some(value) => Self::from_value(value.clone()),
            None => Self::null(),
        }
    }

    pub fn value_or_zero(&self) -> T
    where
        T: Clone,
    {
        if self.valid {
            self.value.clone()
        } else {
            T::default()
        }
    }

    pub fn into_value_or_zero(self) -> T {
        if self.valid { self.value } else { T::default() }
    }

    /// Stores the outcome of a decode or scan in one step. `Ok(None)` and
    /// every error leave the container absent.
    pub(crate) fn apply(&mut self, outcome: Result<Option<T>, Error>) -> Result<(), Error> {
        match outcome {
            Ok(Some(value)) => {
                self.set_valid(value);
                Ok(())
            }
            Ok(None) => {
                self.set_null();
                Ok(())
            }
            Err(err) => {
                self.set_null();
                Err(err)
            }
        }
    }
}

impl<T: PartialEq> PartialEq for Nullable<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_option() == other.as_option()
    }
}

impl<T: Eq> Eq for Nullable<T> {}

impl<T: Hash> Hash for Nullable<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_option().hash(state);
    }
}

impl<T: Default> Default for Nullable<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: Default> From<Option<T>> for Nullable<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::from_value(value),
            None => Self::null(),
        }
    }
}

impl<T> From<Nullable<T>> for Option<T> {
    fn from(value: Nullable<T>) -> Self {
        value.into_option()
    }
}

impl<T: Record> Nullable<T> {
    /// Decodes a JSON fragment into this container in place.
    ///
    /// `null` always succeeds and leaves the container absent. Other shapes
    /// are checked against `T::ACCEPTS` before the codec runs.
    pub fn unmarshal_json(&mut self, data: &[u8]) -> Result<(), Error> {
        self.apply(decode_document::<T>(data))
    }

    pub fn from_json_slice(data: &[u8]) -> Result<Self, Error> {
        let mut out = Self::null();
        out.unmarshal_json(data)?;
        Ok(out)
    }

    pub fn marshal_json(&self) -> Result<Vec<u8>, Error> {
        if !self.valid {
            return Ok(NULL_LITERAL.to_vec());
        }
        serde_json::to_vec(&self.value).map_err(|err| {
            Error::new(ErrorKind::Encode)
                .with_message("failed to encode value")
                .with_type(T::type_label())
                .with_source(err)
        })
    }
}

fn decode_document<T: Record>(data: &[u8]) -> Result<Option<T>, Error> {
    // The parsed tree only decides the shape; the codec reads the original
    // bytes so wide integers and duplicate keys behave as in `serde_json`.
    let document = parse::probe(data).map_err(|err| {
        tracing::debug!(record = T::type_label(), "malformed document");
        Error::new(ErrorKind::Decode)
            .with_message("malformed document")
            .with_type(T::type_label())
            .with_hint(parse::hint_for_error(&err, "document"))
            .with_source(err)
    })?;

    let shape = Shape::of(&document);
    if shape == Shape::Null {
        return Ok(None);
    }
    if !T::ACCEPTS.admits(shape) {
        tracing::debug!(record = T::type_label(), shape = shape.name(), "document shape rejected");
        return Err(Error::new(ErrorKind::TypeMismatch)
            .with_message(format!(
                "cannot decode {} into {}",
                shape.name(),
                T::type_label()
            ))
            .with_type(T::type_label())
            .with_found(shape.name()));
    }

    serde_json::from_slice::<T>(data).map(Some).map_err(|err| {
        tracing::debug!(record = T::type_label(), shape = shape.name(), "document decode failed");
        Error::new(ErrorKind::Decode)
            .with_message("failed to decode document")
            .with_type(T::type_label())
            .with_found(shape.name())
            .with_hint(parse::hint_for_error(&err, "document"))
            .with_source(err)
    })
}

impl<T: Serialize> Serialize for Nullable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.valid {
            self.value.serialize(serializer)
        } else {
            serializer.serialize_none()
        }
    }
}

impl<'de, T: Record> Deserialize<'de> for Nullable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match T::ACCEPTS {
            Accepts::Object => deserializer.deserialize_any(ObjectVisitor(PhantomData)),
            Accepts::Any => Option::<T>::deserialize(deserializer).map(Self::from),
        }
    }
}

// Mirrors `decode_document` for nested containers: null is absent, maps go
// to `T`, every other shape falls through to serde's invalid-type error.
struct ObjectVisitor<T>(PhantomData<T>);

impl<'de, T: Record> Visitor<'de> for ObjectVisitor<T> {
    type Value = Nullable<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "an object for {} or null", T::type_label())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Nullable::null())
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Nullable::null())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        Nullable::<T>::deserialize(deserializer)
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
        T::deserialize(MapAccessDeserializer::new(map)).map(Nullable::from_value)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    use super::Nullable;
    use crate::core::error::ErrorKind;
    use crate::core::shape::Record;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    struct Dummy {
        value: i64,
    }

    impl Record for Dummy {}

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Wide {
        value: u128,
    }

    impl Record for Wide {}

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("refused"))
        }
    }

    impl<'de> Deserialize<'de> for Unencodable {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            serde::de::IgnoredAny::deserialize(deserializer).map(|_| Unencodable)
        }
    }

    impl Record for Unencodable {}

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn from_value_is_valid() {
        let s = Nullable::from_value(Dummy { value: 10 });
        assert!(s.is_valid());
        assert_eq!(s.value_or_zero(), Dummy { value: 10 });
    }

    #[test]
    fn new_respects_flag() {
        let valid = Nullable::new(Dummy { value: 10 }, true);
        assert_eq!(valid.as_option(), Some(&Dummy { value: 10 }));

        let invalid = Nullable::new(Dummy { value: 10 }, false);
        assert!(!invalid.is_valid());
        assert_eq!(invalid.as_option(), None);
        assert_eq!(invalid.value_or_zero(), Dummy::default());
    }

    #[test]
    fn from_ref_copies_or_nulls() {
        let source = Dummy { value: 10 };
        let s = Nullable::from_ref(Some(&source));
        assert_eq!(s, Nullable::new(Dummy { value: 10 }, true));

        let n = Nullable::<Dummy>::from_ref(None);
        assert_eq!(n, Nullable::new(Dummy::default(), false));
    }

    #[test]
    fn default_is_absent() {
        let s = Nullable::<Dummy>::default();
        assert!(s.is_zero());
        assert_eq!(s, Nullable::null());
    }

    #[test]
    fn set_valid_and_is_zero() {
        let mut s = Nullable::new(Dummy::default(), false);
        assert!(s.is_zero());
        s.set_valid(Dummy::default());
        assert!(!s.is_zero(), "present default value is not zero");
        s.set_valid(Dummy { value: 10 });
        assert_eq!(s, Nullable::new(Dummy { value: 10 }, true));
    }

    #[test]
    fn option_conversions() {
        let s: Nullable<Dummy> = Some(Dummy { value: 3 }).into();
        assert_eq!(s.clone().into_option(), Some(Dummy { value: 3 }));
        let n: Nullable<Dummy> = None.into();
        let back: Option<Dummy> = n.into();
        assert_eq!(back, None);

        let mut m = Nullable::from_value(Dummy { value: 1 });
        if let Some(inner) = m.as_option_mut() {
            inner.value = 2;
        }
        assert_eq!(m.into_value_or_zero(), Dummy { value: 2 });
    }

    #[test]
    fn unmarshal_object_null_and_scalar() {
        let mut s = Nullable::<Dummy>::null();
        s.unmarshal_json(br#"{"value": 10}"#).expect("object");
        assert_eq!(s, Nullable::from_value(Dummy { value: 10 }));

        s.unmarshal_json(b"null").expect("null");
        assert!(!s.is_valid());
        assert_eq!(s.inner(), &Dummy::default());

        s.set_valid(Dummy { value: 7 });
        let err = s.unmarshal_json(br#""not an object""#).expect_err("scalar");
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert_eq!(err.found(), Some("string"));
        assert_eq!(err.type_name(), Some("Dummy"));
        assert!(!s.is_valid());
        assert_eq!(s.inner(), &Dummy::default());
    }

    #[test]
    fn unmarshal_codec_failure_is_decode_error() {
        let mut s = Nullable::from_value(Dummy { value: 1 });
        let err = s.unmarshal_json(br#"{"value": "string"}"#).expect_err("bad field");
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(!s.is_valid());

        let err = s.unmarshal_json(b"invalid").expect_err("malformed");
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(err.hint().is_some_and(|hint| hint.contains("parse category: syntax")));
    }

    #[test]
    fn marshal_matches_inner_encoding() {
        let s = Nullable::from_value(Dummy { value: 10 });
        assert_eq!(s.marshal_json().expect("encode"), br#"{"value":10}"#.to_vec());
        let n = Nullable::new(Dummy { value: 10 }, false);
        assert_eq!(n.marshal_json().expect("encode"), b"null".to_vec());
    }

    #[test]
    fn wide_integers_round_trip() {
        let s = Nullable::from_value(Wide { value: u128::MAX });
        let encoded = s.marshal_json().expect("encode");
        assert_eq!(
            encoded,
            br#"{"value":340282366920938463463374607431768211455}"#.to_vec()
        );
        let decoded = Nullable::<Wide>::from_json_slice(&encoded).expect("decode");
        assert_eq!(decoded, s);
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let mut s = Nullable::from_value(Dummy { value: 5 });
        let err = s
            .unmarshal_json(br#"{"value": 1, "value": 2}"#)
            .expect_err("duplicate field");
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(!s.is_valid());
        assert_eq!(s.inner(), &Dummy::default());
    }

    #[test]
    fn field_error_hint_carries_position() {
        let err = Nullable::<Dummy>::from_json_slice(br#"{"value": "string"}"#)
            .expect_err("bad field");
        let hint = err.hint().expect("hint");
        assert!(hint.contains("parse category: data"), "{hint}");
        assert!(hint.contains("line 1 column"), "{hint}");
        assert!(!hint.contains("line 0"), "{hint}");
    }

    #[test]
    fn encode_failure_is_encode_error() {
        let err = Nullable::from_value(Unencodable)
            .marshal_json()
            .expect_err("serializer refuses");
        assert_eq!(err.kind(), ErrorKind::Encode);
        assert_eq!(err.type_name(), Some("Unencodable"));
        assert!(std::error::Error::source(&err).is_some());

        let absent = Nullable::<Unencodable>::null();
        assert_eq!(absent.marshal_json().expect("absent"), b"null".to_vec());
    }

    #[test]
    fn absent_containers_are_equal_regardless_of_slot() {
        let stale = Nullable::new(Dummy { value: 10 }, false);
        let null = Nullable::<Dummy>::null();
        assert_eq!(stale, null);
        assert_eq!(hash_of(&stale), hash_of(&null));

        let present = Nullable::from_value(Dummy::default());
        assert_ne!(present, null, "present default value differs from absent");
    }
}

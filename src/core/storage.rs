//! Purpose: Relational-storage binding for `Nullable<T>` (parameter production and column scan).
//! Exports: `StorageValue`, `StorageKind`, `StorageBinding`.
//! Role: Driver-neutral contract; `core::sqlite` adapts it to rusqlite.
//! Invariants: Absent containers always produce `StorageValue::Null`; present ones produce JSON text.
//! Invariants: Scans apply their outcome in one step; any error leaves the container absent.
use std::fmt;

use crate::core::error::{Error, ErrorKind};
use crate::core::nullable::Nullable;
use crate::core::shape::Record;
use crate::json::parse;

/// A value as exchanged with a storage driver.
#[derive(Clone, Debug, PartialEq)]
pub enum StorageValue {
    Null,
    Text(String),
    Blob(Vec<u8>),
    Integer(i64),
    Real(f64),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StorageKind {
    Null,
    Text,
    Blob,
    Integer,
    Real,
}

impl StorageKind {
    pub fn name(self) -> &'static str {
        match self {
            StorageKind::Null => "null",
            StorageKind::Text => "text",
            StorageKind::Blob => "blob",
            StorageKind::Integer => "integer",
            StorageKind::Real => "real",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl StorageValue {
    pub fn kind(&self) -> StorageKind {
        match self {
            StorageValue::Null => StorageKind::Null,
            StorageValue::Text(_) => StorageKind::Text,
            StorageValue::Blob(_) => StorageKind::Blob,
            StorageValue::Integer(_) => StorageKind::Integer,
            StorageValue::Real(_) => StorageKind::Real,
        }
    }

    /// Raw bytes for text and blob values.
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            StorageValue::Text(text) => Some(text.as_bytes()),
            StorageValue::Blob(bytes) => Some(bytes.as_slice()),
            _ => None,
        }
    }
}

/// Two-way binding between a value and a storage parameter/column slot.
pub trait StorageBinding {
    fn to_storage_value(&self) -> Result<StorageValue, Error>;

    fn scan_storage_value(&mut self, value: &StorageValue) -> Result<(), Error>;
}

impl<T: Record> StorageBinding for Nullable<T> {
    fn to_storage_value(&self) -> Result<StorageValue, Error> {
        let Some(value) = self.as_option() else {
            return Ok(StorageValue::Null);
        };
        serde_json::to_string(value)
            .map(StorageValue::Text)
            .map_err(|err| {
                Error::new(ErrorKind::StorageEncode)
                    .with_message("failed to encode value for storage")
                    .with_type(T::type_label())
                    .with_source(err)
            })
    }

    fn scan_storage_value(&mut self, value: &StorageValue) -> Result<(), Error> {
        self.apply(scan_value::<T>(value))
    }
}

fn scan_value<T: Record>(value: &StorageValue) -> Result<Option<T>, Error> {
    if let StorageValue::Null = value {
        return Ok(None);
    }
    let Some(payload) = value.payload() else {
        let kind = value.kind();
        tracing::debug!(record = T::type_label(), kind = kind.name(), "unexpected storage kind");
        return Err(Error::new(ErrorKind::StorageType)
            .with_message(format!("cannot scan {kind} into Nullable<{}>", T::type_label()))
            .with_type(T::type_label())
            .with_found(kind.name()));
    };
    serde_json::from_slice(payload).map(Some).map_err(|err| {
        tracing::debug!(record = T::type_label(), kind = value.kind().name(), "stored payload decode failed");
        Error::new(ErrorKind::StorageDecode)
            .with_message("failed to decode stored payload")
            .with_type(T::type_label())
            .with_found(value.kind().name())
            .with_hint(parse::hint_for_error(&err, "storage"))
            .with_source(err)
    })
}

impl<T: Record> Nullable<T> {
    pub fn from_storage_value(value: &StorageValue) -> Result<Self, Error> {
        let mut out = Self::null();
        out.scan_storage_value(value)?;
        Ok(out)
    }
}

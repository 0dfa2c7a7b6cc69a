//! Purpose: Adapt the storage binding to rusqlite parameters and column reads.
//! Exports: `ToSql`/`FromSql` impls for `Nullable<T>` and `StorageValue` conversions.
//! Role: Concrete driver seam; keeps rusqlite types out of `core::storage`.
//! Invariants: Present values bind as TEXT; absent values bind as NULL.
//! Invariants: INTEGER/REAL columns surface as `InvalidType`; other failures carry the crate error.
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Value, ValueRef};

use crate::core::error::ErrorKind;
use crate::core::nullable::Nullable;
use crate::core::shape::Record;
use crate::core::storage::{StorageBinding, StorageValue};

impl From<ValueRef<'_>> for StorageValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => StorageValue::Null,
            ValueRef::Integer(int) => StorageValue::Integer(int),
            ValueRef::Real(real) => StorageValue::Real(real),
            ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => StorageValue::Text(text.to_owned()),
                Err(_) => StorageValue::Blob(bytes.to_vec()),
            },
            ValueRef::Blob(bytes) => StorageValue::Blob(bytes.to_vec()),
        }
    }
}

impl From<StorageValue> for Value {
    fn from(value: StorageValue) -> Self {
        match value {
            StorageValue::Null => Value::Null,
            StorageValue::Text(text) => Value::Text(text),
            StorageValue::Blob(bytes) => Value::Blob(bytes),
            StorageValue::Integer(int) => Value::Integer(int),
            StorageValue::Real(real) => Value::Real(real),
        }
    }
}

impl ToSql for StorageValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let out = match self {
            StorageValue::Null => ToSqlOutput::Owned(Value::Null),
            StorageValue::Text(text) => ToSqlOutput::Borrowed(ValueRef::Text(text.as_bytes())),
            StorageValue::Blob(bytes) => ToSqlOutput::Borrowed(ValueRef::Blob(bytes.as_slice())),
            StorageValue::Integer(int) => ToSqlOutput::Owned(Value::Integer(*int)),
            StorageValue::Real(real) => ToSqlOutput::Owned(Value::Real(*real)),
        };
        Ok(out)
    }
}

impl FromSql for StorageValue {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(StorageValue::from(value))
    }
}

impl<T: Record> ToSql for Nullable<T> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = self
            .to_storage_value()
            .map_err(|err| rusqlite::Error::ToSqlConversionFailure(Box::new(err)))?;
        Ok(ToSqlOutput::Owned(Value::from(value)))
    }
}

impl<T: Record> FromSql for Nullable<T> {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Self::from_storage_value(&StorageValue::from(value)).map_err(|err| match err.kind() {
            ErrorKind::StorageType => FromSqlError::InvalidType,
            _ => FromSqlError::Other(Box::new(err)),
        })
    }
}

//! Purpose: Error modeling shared by the document and storage bindings.
//! Exports: `Error`, `ErrorKind`.
//! Role: One error type for every fallible `Nullable` operation.
//! Invariants: Kind labels (`ErrorKind::as_str`) are stable; runners match on them.
//! Invariants: Sources are `Send + Sync` so errors can cross into storage drivers.
use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Document shape is not one the target type accepts.
    TypeMismatch,
    /// Document codec rejected an accepted-shape fragment (or malformed input).
    Decode,
    /// Document codec failed to encode the inner value.
    Encode,
    StorageEncode,
    StorageDecode,
    /// Storage layer supplied a value kind the binding cannot interpret.
    StorageType,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::TypeMismatch => "type-mismatch",
            ErrorKind::Decode => "decode",
            ErrorKind::Encode => "encode",
            ErrorKind::StorageEncode => "storage-encode",
            ErrorKind::StorageDecode => "storage-decode",
            ErrorKind::StorageType => "storage-type",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "type-mismatch" => Some(ErrorKind::TypeMismatch),
            "decode" => Some(ErrorKind::Decode),
            "encode" => Some(ErrorKind::Encode),
            "storage-encode" => Some(ErrorKind::StorageEncode),
            "storage-decode" => Some(ErrorKind::StorageDecode),
            "storage-type" => Some(ErrorKind::StorageType),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    type_name: Option<&'static str>,
    found: Option<String>,
    hint: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            type_name: None,
            found: None,
            hint: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Label of the type the caller tried to decode into.
    pub fn type_name(&self) -> Option<&'static str> {
        self.type_name
    }

    /// Shape or storage kind that was actually supplied.
    pub fn found(&self) -> Option<&str> {
        self.found.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_type(mut self, type_name: &'static str) -> Self {
        self.type_name = Some(type_name);
        self
    }

    pub fn with_found(mut self, found: impl Into<String>) -> Self {
        self.found = Some(found.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(type_name) = self.type_name {
            write!(f, " (type: {type_name})")?;
        }
        if let Some(found) = &self.found {
            write!(f, " (found: {found})")?;
        }
        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " [{hint}]")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind};
    use std::error::Error as StdError;

    #[test]
    fn kind_labels_are_stable() {
        let cases = [
            (ErrorKind::TypeMismatch, "type-mismatch"),
            (ErrorKind::Decode, "decode"),
            (ErrorKind::Encode, "encode"),
            (ErrorKind::StorageEncode, "storage-encode"),
            (ErrorKind::StorageDecode, "storage-decode"),
            (ErrorKind::StorageType, "storage-type"),
        ];

        for (kind, label) in cases {
            assert_eq!(kind.as_str(), label);
            assert_eq!(ErrorKind::from_label(label), Some(kind));
        }
        assert_eq!(ErrorKind::from_label("other"), None);
    }

    #[test]
    fn display_includes_context_fields() {
        let err = Error::new(ErrorKind::TypeMismatch)
            .with_message("cannot decode document")
            .with_type("Dummy")
            .with_found("string");
        let text = err.to_string();
        assert!(text.starts_with("type-mismatch: cannot decode document"));
        assert!(text.contains("(type: Dummy)"));
        assert!(text.contains("(found: string)"));
    }

    #[test]
    fn source_is_exposed() {
        let inner = serde_json::from_str::<u8>("\"x\"").expect_err("should fail");
        let err = Error::new(ErrorKind::Decode).with_source(inner);
        assert!(err.source().is_some());
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}

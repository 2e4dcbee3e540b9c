//! Error types for serde_feedxml.

use std::fmt;

use feedxml_tree::BuildError;

use crate::path::{CodingPath, PathSegment};

/// Error type for serde_feedxml operations.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    /// Unset until the error passes through an accessor that knows where it is.
    path: Option<Vec<PathSegment>>,
    message: String,
}

/// Kind of decode error.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    /// An expected value, child or sequence slot was not present.
    ValueNotFound,
    /// A keyed lookup matched nothing.
    KeyNotFound { key: String },
    /// Text could not be coerced to the requested type.
    TypeMismatch { expected: String },
    /// The value was present but failed deeper validation.
    DataCorrupted,
    /// The document could not be turned into a tree.
    Malformed(BuildError),
    /// Raised by a record's own `Deserialize` impl.
    Custom,
}

impl Error {
    fn new(kind: ErrorKind, path: Option<Vec<PathSegment>>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path,
            message: message.into(),
        }
    }

    pub(crate) fn value_not_found(path: &[PathSegment], message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValueNotFound, Some(path.to_vec()), message)
    }

    pub(crate) fn key_not_found(path: &[PathSegment], key: &str) -> Self {
        Self::new(
            ErrorKind::KeyNotFound {
                key: key.to_string(),
            },
            Some(path.to_vec()),
            format!("no value associated with key `{key}`"),
        )
    }

    pub(crate) fn type_mismatch(path: &[PathSegment], expected: &str, found: &str) -> Self {
        Self::new(
            ErrorKind::TypeMismatch {
                expected: expected.to_string(),
            },
            Some(path.to_vec()),
            format!("expected {expected}, found {found:?}"),
        )
    }

    pub(crate) fn data_corrupted(path: &[PathSegment], message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataCorrupted, Some(path.to_vec()), message)
    }

    /// Attach `path` unless the error already carries one.
    pub(crate) fn at(mut self, path: &[PathSegment]) -> Self {
        if self.path.is_none() {
            self.path = Some(path.to_vec());
        }
        self
    }

    /// What went wrong.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Where in the document it went wrong.
    pub fn path(&self) -> &[PathSegment] {
        self.path.as_deref().unwrap_or_default()
    }

    /// The message without path information.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<BuildError> for Error {
    fn from(err: BuildError) -> Self {
        let message = err.to_string();
        Self::new(ErrorKind::Malformed(err), Some(Vec::new()), message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        let path = self.path();
        if !path.is_empty() {
            write!(f, " at `{}`", CodingPath(path))?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Malformed(err) => Some(err),
            _ => None,
        }
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::new(ErrorKind::Custom, None, msg.to_string())
    }

    fn invalid_type(unexp: serde::de::Unexpected<'_>, exp: &dyn serde::de::Expected) -> Self {
        Self::new(
            ErrorKind::TypeMismatch {
                expected: exp.to_string(),
            },
            None,
            format!("invalid type: {unexp}, expected {exp}"),
        )
    }

    fn invalid_value(unexp: serde::de::Unexpected<'_>, exp: &dyn serde::de::Expected) -> Self {
        Self::new(
            ErrorKind::TypeMismatch {
                expected: exp.to_string(),
            },
            None,
            format!("invalid value: {unexp}, expected {exp}"),
        )
    }

    fn missing_field(field: &'static str) -> Self {
        Self::new(
            ErrorKind::KeyNotFound {
                key: field.to_string(),
            },
            None,
            format!("missing field `{field}`"),
        )
    }
}

/// Result type for serde_feedxml operations.
pub type Result<T> = std::result::Result<T, Error>;

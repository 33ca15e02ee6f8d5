//! Error types for the treasury ledger.
//!
//! Internally everything is an `anyhow::Error` (`Res<T>`). At the public boundary errors are
//! wrapped in `Error`, which carries an `ErrorType` so that callers can tell a store failure from
//! a validation failure or a referential violation.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// The internal result type.
pub(crate) type Res<T> = std::result::Result<T, anyhow::Error>;

/// The public result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies a failure.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The store could not be reached or rejected the request.
    Store,
    /// Input was rejected before it was submitted.
    Validation,
    /// The operation would leave a dangling reference, e.g. deleting a category in use.
    Referential,
    /// The configuration or the home directory is missing or invalid.
    Config,
    /// The request refers to something that does not exist.
    Request,
    #[default]
    Internal,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// The public error type.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub fn new(error_type: ErrorType, inner: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            inner: inner.into(),
        }
    }

    pub(crate) fn validation(message: impl Display) -> Self {
        Self::new(ErrorType::Validation, anyhow::anyhow!("{message}"))
    }

    pub(crate) fn referential(message: impl Display) -> Self {
        Self::new(ErrorType::Referential, anyhow::anyhow!("{message}"))
    }

    pub(crate) fn request(message: impl Display) -> Self {
        Self::new(ErrorType::Request, anyhow::anyhow!("{message}"))
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    pub fn inner(&self) -> &anyhow::Error {
        &self.inner
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.inner)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:?}", self.error_type, self.inner)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Self::new(ErrorType::Internal, value)
    }
}

/// Converts an internal result into a public `Result` tagged with an `ErrorType`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_pub_result_tags_error_type() {
        let res: Res<()> = Err(anyhow::anyhow!("connection refused")).context("Unable to list");
        let err = res.pub_result(ErrorType::Store).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Store);
        let message = err.to_string();
        assert!(message.contains("Unable to list"), "{message}");
        assert!(message.contains("connection refused"), "{message}");
    }

    #[test]
    fn test_anyhow_converts_to_internal() {
        let err: Error = anyhow::anyhow!("boom").into();
        assert_eq!(err.error_type(), ErrorType::Internal);
    }

    #[test]
    fn test_error_type_display() {
        assert_eq!(ErrorType::Referential.to_string(), "referential");
        assert_eq!(
            "validation".parse::<ErrorType>().unwrap(),
            ErrorType::Validation
        );
    }
}

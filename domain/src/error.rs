//! Error types for the `domain` layer.
use sse::error::{Error as SseError, ErrorKind as SseErrorKind};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors from lower layers (currently only `sse`) are translated into a
/// `DomainErrorKind` while the original error is kept in `source`. `web`
/// depends on these kinds, never on the lower layer's own error types, to
/// pick HTTP status codes.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    /// The caller's input was unusable.
    Invalid(String),
    Internal(InternalErrorKind),
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Broadcast,
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {self:?}")
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// This is where we translate errors from the `sse` layer to the `domain` layer.
impl From<SseError> for Error {
    fn from(err: SseError) -> Self {
        let error_kind = match &err.error_kind {
            SseErrorKind::MalformedEventDescriptor(reason) => {
                DomainErrorKind::Invalid(reason.clone())
            }
            SseErrorKind::Serialization | SseErrorKind::ConnectionClosed => {
                DomainErrorKind::Internal(InternalErrorKind::Broadcast)
            }
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_descriptor_becomes_invalid() {
        let err: Error = SseError::malformed("missing `type` field").into();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Invalid("missing `type` field".to_string())
        );
        assert!(err.source().is_some());
    }
}

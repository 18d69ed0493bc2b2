//! Error types for the `sse` layer.
use std::error::Error as StdError;
use std::fmt;

/// Failure to push a frame into a single subscriber's sink.
///
/// These never leave the registry: a failed push prunes the subscriber and is
/// otherwise only visible as a smaller recipient count on later broadcasts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The underlying connection has already gone away.
    Closed,
    /// The write itself failed for another reason.
    Write(String),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::Closed => write!(f, "sink closed"),
            SinkError::Write(reason) => write!(f, "sink write failed: {reason}"),
        }
    }
}

impl StdError for SinkError {}

/// Errors that can escape the `sse` layer to its callers.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    /// The trigger caller sent an event descriptor without a usable `type`.
    MalformedEventDescriptor(String),
    /// A broadcast message could not be turned into JSON.
    Serialization,
    /// The connection went away before its handshake could be written.
    ConnectionClosed,
}

impl Error {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Error {
            source: None,
            error_kind: ErrorKind::MalformedEventDescriptor(reason.into()),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::MalformedEventDescriptor(reason) => {
                write!(f, "Malformed event descriptor: {reason}")
            }
            ErrorKind::Serialization => write!(f, "Failed to serialize broadcast message"),
            ErrorKind::ConnectionClosed => write!(f, "Connection closed before handshake"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Serialization,
        }
    }
}

impl From<SinkError> for Error {
    fn from(err: SinkError) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::ConnectionClosed,
        }
    }
}

use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use domain::error::{DomainErrorKind, Error as DomainError, InternalErrorKind};
use log::*;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(DomainError);

impl Error {
    /// A caller-input problem detected in the web layer itself, such as a
    /// request body that is not JSON.
    pub(crate) fn bad_request(reason: impl Into<String>) -> Self {
        Self(DomainError {
            source: None,
            error_kind: DomainErrorKind::Invalid(reason.into()),
        })
    }
}

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

// Error bodies share the `success` flag with the broadcast trigger's
// success response so clients can check one field.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match self.0.error_kind {
            DomainErrorKind::Invalid(reason) => (StatusCode::BAD_REQUEST, reason),
            DomainErrorKind::Internal(internal_error_kind) => {
                error!("Internal error handling request: {internal_error_kind:?}");
                match internal_error_kind {
                    InternalErrorKind::Broadcast | InternalErrorKind::Other(_) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL SERVER ERROR".to_string(),
                    ),
                }
            }
        };

        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

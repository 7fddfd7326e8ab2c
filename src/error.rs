use std::io;
use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Failures that stop negotiation before any range logic runs.
///
/// These come from the metadata lookup of a [`crate::Resource`] and are
/// handed to the host unchanged.
#[derive(Debug, Error)]
pub enum NegotiateError {
    #[error("resource not found: {}", path.display())]
    ResourceNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read metadata of {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl NegotiateError {
    pub(crate) fn stat(path: PathBuf, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => NegotiateError::ResourceNotFound { path, source },
            _ => NegotiateError::Io { path, source },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            NegotiateError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            NegotiateError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for NegotiateError {
    fn into_response(self) -> Response {
        let status = self.status();
        let reason = status.canonical_reason().unwrap_or_default();
        (status, reason).into_response()
    }
}

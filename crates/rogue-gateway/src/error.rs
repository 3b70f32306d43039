//! Error types for the gateway API.
//!
//! [`GatewayError`] has two tiers. Client errors (bad credentials shape,
//! unparsable parameters, bodies that do not match the resolved save
//! variant) become `400`; everything the client cannot fix (identity
//! lookup, store, response encoding) becomes `500`. The error text is the
//! plain-text response body.
//!
//! Errors are logged when converted into a response. The conversion runs
//! inside the per-request span opened by the router's `TraceLayer`, so
//! every log line carries the request path.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rogue_db::DbError;

use crate::token::TokenError;

/// Errors that can occur while handling a gateway request.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The request itself is invalid.
    #[error("{0}")]
    BadRequest(String),

    /// The `Authorization` header is not a well-formed token.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// A well-formed token could not be resolved to an account.
    #[error("failed to validate token: {0}")]
    Identity(DbError),

    /// The store rejected or failed an operation.
    #[error(transparent)]
    Store(#[from] DbError),

    /// The response body could not be encoded.
    #[error("failed to encode response json: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other server-side failure.
    #[error("{0}")]
    Internal(String),
}

impl GatewayError {
    /// The HTTP status this error is surfaced with.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Token(_) => StatusCode::BAD_REQUEST,
            Self::Identity(_) | Self::Store(_) | Self::Serialization(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Shorthand for [`GatewayError::BadRequest`].
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %message, "request rejected");
        }

        (status, message).into_response()
    }
}

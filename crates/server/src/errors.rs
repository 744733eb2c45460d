use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fletia::{access::AccessError, ErrorKind, MarketError};
use serde_json::json;
use tracing::{error, warn};

/// A custom error type for the server application.
///
/// Every variant renders as `{"error": {"status": "<CODE>", "message": "..."}}`
/// where `<CODE>` follows the callable-function status names
/// (`INVALID_ARGUMENT`, `UNAUTHENTICATED`, `PERMISSION_DENIED`, ...).
#[derive(Debug)]
pub enum AppError {
    /// Errors originating from the marketplace domain.
    Market(MarketError),
    /// The request carried no valid session.
    Unauthenticated(String),
    /// The session is valid but the role or account state forbids the action.
    Forbidden(String),
    /// A malformed request the domain never saw.
    BadRequest(String),
    /// Generic internal server errors.
    Internal(anyhow::Error),
}

impl From<MarketError> for AppError {
    fn from(err: MarketError) -> Self {
        AppError::Market(err)
    }
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        AppError::Market(err.into())
    }
}

/// Conversion from `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

fn status_for(kind: ErrorKind) -> (StatusCode, &'static str) {
    match kind {
        ErrorKind::InvalidArgument => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
        ErrorKind::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
        ErrorKind::PermissionDenied => (StatusCode::FORBIDDEN, "PERMISSION_DENIED"),
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        ErrorKind::AlreadyExists => (StatusCode::CONFLICT, "ALREADY_EXISTS"),
        ErrorKind::FailedPrecondition => (StatusCode::BAD_REQUEST, "FAILED_PRECONDITION"),
        ErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Market(err) => {
                let (status, code) = status_for(err.kind());
                let message = if err.kind() == ErrorKind::Internal {
                    "Error interno del servidor".to_string()
                } else {
                    err.to_string()
                };
                (status, code, message)
            }
            AppError::Unauthenticated(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", msg.clone())
            }
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "PERMISSION_DENIED", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", msg.clone()),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Error interno del servidor".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, status, message) = self.parts();
        match &self {
            AppError::Internal(err) => error!("Internal server error: {:?}", err),
            AppError::Market(err) if err.kind() == ErrorKind::Internal => {
                error!("Marketplace error: {:?}", err)
            }
            other => warn!(status, "Request failed: {:?}", other),
        }

        let body = Json(json!({
            "error": {
                "status": status,
                "message": message,
            },
        }));

        (status_code, body).into_response()
    }
}

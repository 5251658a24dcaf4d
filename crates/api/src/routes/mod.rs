//! API route definitions.

use axum::{Json, Router, http::StatusCode, response::IntoResponse, response::Response};
use cuadra_core::register::{RegisterError, RegisterStore, SalesFeed};
use cuadra_shared::AppError;
use serde_json::json;
use tracing::error;

use crate::AppState;

pub mod health;
pub mod ledger_entries;
pub mod register_sessions;

/// Creates the API router with all routes.
pub fn api_routes<S, F>() -> Router<AppState<S, F>>
where
    S: RegisterStore + 'static,
    F: SalesFeed + 'static,
{
    Router::new()
        .merge(health::routes())
        .merge(register_sessions::routes())
        .merge(ledger_entries::routes())
}

/// Maps a register error to its JSON error response.
///
/// Status and code come from the workspace `AppError`. Non-retryable storage
/// failures are logged and answered with a generic message; every other
/// message is safe to show the operator.
pub(crate) fn error_response(err: &RegisterError) -> Response {
    let app = AppError::from(err.clone());
    let status =
        StatusCode::from_u16(app.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let message = match err {
        RegisterError::Validation(msg)
        | RegisterError::Conflict(msg)
        | RegisterError::InvalidState(msg)
        | RegisterError::NotFound(msg) => msg.clone(),
        RegisterError::Storage {
            message,
            retryable: true,
        } => message.clone(),
        RegisterError::Storage { message, .. } => {
            error!(error = %message, "Register storage failure");
            "An error occurred".to_string()
        }
    };

    (
        status,
        Json(json!({
            "error": app.error_code(),
            "message": message
        })),
    )
        .into_response()
}

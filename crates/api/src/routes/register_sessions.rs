//! Register session routes.
//!
//! Open, inspect and close sessions, record entries against them, and review
//! closed sessions.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::{DateTime, Utc};
use cuadra_core::register::{
    CloseSessionInput, OpenSessionInput, RecordEntryInput, RegisterStore, ReviewInput,
    ReviewStatus, SalesFeed, SessionFilter, SessionStatus,
};
use cuadra_shared::types::{PageRequest, RegisterSessionId};
use serde::Deserialize;
use serde_json::json;

use super::error_response;
use crate::AppState;

/// Creates the register session routes.
pub fn routes<S, F>() -> Router<AppState<S, F>>
where
    S: RegisterStore + 'static,
    F: SalesFeed + 'static,
{
    Router::new()
        .route(
            "/register-sessions",
            post(open_session::<S, F>).get(list_sessions::<S, F>),
        )
        .route(
            "/register-sessions/opening-hint",
            get(opening_hint::<S, F>),
        )
        .route("/register-sessions/{session_id}", get(get_session::<S, F>))
        .route(
            "/register-sessions/{session_id}/summary",
            post(preview_summary::<S, F>),
        )
        .route(
            "/register-sessions/{session_id}/close",
            post(close_session::<S, F>),
        )
        .route(
            "/register-sessions/{session_id}/entries",
            post(record_entry::<S, F>).get(list_entries::<S, F>),
        )
        .route(
            "/register-sessions/{session_id}/approve",
            put(approve_session::<S, F>),
        )
        .route(
            "/register-sessions/{session_id}/reject",
            put(reject_session::<S, F>),
        )
}

// ============================================================================
// Query Types
// ============================================================================

/// Query parameters for listing sessions.
#[derive(Debug, Default, Deserialize)]
pub struct ListSessionsQuery {
    /// Filter by status (`open` or `closed`).
    pub status: Option<SessionStatus>,
    /// Filter by review outcome (`pending`, `approved` or `rejected`).
    pub review_status: Option<ReviewStatus>,
    /// Filter by register.
    pub register_id: Option<String>,
    /// Filter by responsible operator.
    pub responsible: Option<String>,
    /// Opened at or after.
    pub opened_from: Option<DateTime<Utc>>,
    /// Opened before.
    pub opened_to: Option<DateTime<Utc>>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

impl ListSessionsQuery {
    fn into_parts(self) -> (SessionFilter, PageRequest) {
        let defaults = PageRequest::default();
        let page = PageRequest {
            page: self.page.unwrap_or(defaults.page).max(1),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        };
        let filter = SessionFilter {
            status: self.status,
            review_status: self.review_status,
            register_id: self.register_id,
            responsible: self.responsible,
            opened_from: self.opened_from,
            opened_to: self.opened_to,
        };
        (filter, page)
    }
}

/// Query parameters for the opening hint.
#[derive(Debug, Default, Deserialize)]
pub struct OpeningHintQuery {
    /// Register to suggest a float for.
    #[serde(default)]
    pub register_id: String,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/register-sessions` - Open a session.
async fn open_session<S: RegisterStore, F: SalesFeed>(
    State(state): State<AppState<S, F>>,
    Json(payload): Json<OpenSessionInput>,
) -> Response {
    match state.register.open_session(payload).await {
        Ok(session) => (StatusCode::CREATED, Json(session)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET `/register-sessions` - List sessions, newest first.
async fn list_sessions<S: RegisterStore, F: SalesFeed>(
    State(state): State<AppState<S, F>>,
    Query(query): Query<ListSessionsQuery>,
) -> Response {
    let (filter, page) = query.into_parts();
    match state.register.list_sessions(filter, page).await {
        Ok(sessions) => (StatusCode::OK, Json(sessions)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET `/register-sessions/opening-hint` - Suggest the next opening float.
async fn opening_hint<S: RegisterStore, F: SalesFeed>(
    State(state): State<AppState<S, F>>,
    Query(query): Query<OpeningHintQuery>,
) -> Response {
    match state.register.opening_hint(&query.register_id).await {
        Ok(hint) => (StatusCode::OK, Json(hint)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET `/register-sessions/{session_id}` - Fetch a session.
async fn get_session<S: RegisterStore, F: SalesFeed>(
    State(state): State<AppState<S, F>>,
    Path(session_id): Path<RegisterSessionId>,
) -> Response {
    match state.register.get_session(session_id).await {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST `/register-sessions/{session_id}/summary` - Preview the closing summary.
async fn preview_summary<S: RegisterStore, F: SalesFeed>(
    State(state): State<AppState<S, F>>,
    Path(session_id): Path<RegisterSessionId>,
    Json(payload): Json<CloseSessionInput>,
) -> Response {
    match state.register.compute_summary(session_id, &payload).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST `/register-sessions/{session_id}/close` - Close with counted totals.
async fn close_session<S: RegisterStore, F: SalesFeed>(
    State(state): State<AppState<S, F>>,
    Path(session_id): Path<RegisterSessionId>,
    Json(payload): Json<CloseSessionInput>,
) -> Response {
    match state.register.close_session(session_id, payload).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST `/register-sessions/{session_id}/entries` - Record an income or expense.
async fn record_entry<S: RegisterStore, F: SalesFeed>(
    State(state): State<AppState<S, F>>,
    Path(session_id): Path<RegisterSessionId>,
    Json(payload): Json<RecordEntryInput>,
) -> Response {
    match state.register.record_entry(session_id, payload).await {
        Ok(entry) => (StatusCode::CREATED, Json(entry)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET `/register-sessions/{session_id}/entries` - Entries of a session.
async fn list_entries<S: RegisterStore, F: SalesFeed>(
    State(state): State<AppState<S, F>>,
    Path(session_id): Path<RegisterSessionId>,
) -> Response {
    match state.register.list_entries(session_id).await {
        Ok(entries) => (StatusCode::OK, Json(json!({ "entries": entries }))).into_response(),
        Err(e) => error_response(&e),
    }
}

/// PUT `/register-sessions/{session_id}/approve` - Approve a closed session.
async fn approve_session<S: RegisterStore, F: SalesFeed>(
    State(state): State<AppState<S, F>>,
    Path(session_id): Path<RegisterSessionId>,
    Json(payload): Json<ReviewInput>,
) -> Response {
    match state.register.approve_session(session_id, payload).await {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// PUT `/register-sessions/{session_id}/reject` - Reject a closed session.
async fn reject_session<S: RegisterStore, F: SalesFeed>(
    State(state): State<AppState<S, F>>,
    Path(session_id): Path<RegisterSessionId>,
    Json(payload): Json<ReviewInput>,
) -> Response {
    match state.register.reject_session(session_id, payload).await {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(e) => error_response(&e),
    }
}

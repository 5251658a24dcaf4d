//! Ledger entry routes across sessions.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use chrono::{DateTime, Utc};
use cuadra_core::register::{RegisterStore, SalesFeed};
use cuadra_shared::types::LedgerEntryId;
use serde::Deserialize;
use serde_json::json;

use super::error_response;
use crate::AppState;

/// Creates the ledger entry routes.
pub fn routes<S, F>() -> Router<AppState<S, F>>
where
    S: RegisterStore + 'static,
    F: SalesFeed + 'static,
{
    Router::new()
        .route("/ledger-entries", get(list_entries_between::<S, F>))
        .route("/ledger-entries/{entry_id}", delete(delete_entry::<S, F>))
}

/// Query parameters for a date range, `start <= recorded_at < end`.
#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    /// Inclusive lower bound.
    pub start: DateTime<Utc>,
    /// Exclusive upper bound.
    pub end: DateTime<Utc>,
}

/// GET `/ledger-entries` - Entries recorded in a date range.
async fn list_entries_between<S: RegisterStore, F: SalesFeed>(
    State(state): State<AppState<S, F>>,
    Query(query): Query<DateRangeQuery>,
) -> Response {
    match state
        .register
        .list_entries_between(query.start, query.end)
        .await
    {
        Ok(entries) => (StatusCode::OK, Json(json!({ "entries": entries }))).into_response(),
        Err(e) => error_response(&e),
    }
}

/// DELETE `/ledger-entries/{entry_id}` - Remove an entry of an open session.
async fn delete_entry<S: RegisterStore, F: SalesFeed>(
    State(state): State<AppState<S, F>>,
    Path(entry_id): Path<LedgerEntryId>,
) -> Response {
    match state.register.delete_entry(entry_id).await {
        Ok(entry) => (StatusCode::OK, Json(entry)).into_response(),
        Err(e) => error_response(&e),
    }
}

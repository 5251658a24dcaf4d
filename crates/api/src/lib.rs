//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST routes for register sessions and the cash ledger
//! - Mapping of register errors to JSON error bodies
//!
//! The state is generic over the store and feed so the same router serves
//! PostgreSQL in production and the in-memory store in tests.

pub mod routes;

use axum::Router;
use cuadra_core::register::{RegisterService, RegisterStore, SalesFeed};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
pub struct AppState<S: RegisterStore, F: SalesFeed> {
    /// Register service.
    pub register: RegisterService<S, F>,
}

impl<S: RegisterStore, F: SalesFeed> Clone for AppState<S, F> {
    fn clone(&self) -> Self {
        Self {
            register: self.register.clone(),
        }
    }
}

impl<S: RegisterStore, F: SalesFeed> AppState<S, F> {
    /// Wraps a register service.
    #[must_use]
    pub fn new(register: RegisterService<S, F>) -> Self {
        Self { register }
    }
}

/// Creates the main application router.
pub fn create_router<S, F>(state: AppState<S, F>) -> Router
where
    S: RegisterStore + 'static,
    F: SalesFeed + 'static,
{
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

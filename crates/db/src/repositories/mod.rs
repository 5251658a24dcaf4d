//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod register;
pub mod sales_feed;

pub use register::RegisterRepository;
pub use sales_feed::SalesFeedRepository;

use cuadra_core::register::RegisterError;
use sea_orm::DbErr;

/// Maps a database error onto the register taxonomy.
///
/// Connection and pool failures are retryable; everything else is not.
pub(crate) fn storage_error(err: DbErr) -> RegisterError {
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => RegisterError::transient(err.to_string()),
        other => RegisterError::storage(other.to_string()),
    }
}

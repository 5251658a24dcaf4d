//! `SeaORM` entity definitions.

pub mod prelude;

pub mod cash_ledger_entries;
pub mod operating_expenses;
pub mod register_sessions;
pub mod sea_orm_active_enums;
pub mod settled_sales;

//! Entity re-exports.

pub use super::cash_ledger_entries::Entity as CashLedgerEntries;
pub use super::operating_expenses::Entity as OperatingExpenses;
pub use super::register_sessions::Entity as RegisterSessions;
pub use super::settled_sales::Entity as SettledSales;

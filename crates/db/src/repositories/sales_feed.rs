//! Sales feed repository.
//!
//! Reads the `settled_sales` and `operating_expenses` read models, grouped by
//! the raw payment method. Raw keys are normalized afterwards, so "Cash" and
//! "cash " fold into one line and rows without a method land in `other`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};

use cuadra_core::register::payment::accumulate;
use cuadra_core::register::{Breakdown, FeedTotals, PaymentMethod, RegisterError, SalesFeed};

use super::storage_error;
use crate::entities::{operating_expenses, settled_sales};

/// Sales feed repository implementation.
#[derive(Debug, Clone)]
pub struct SalesFeedRepository {
    db: DatabaseConnection,
}

impl SalesFeedRepository {
    /// Creates a new sales feed repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn fold(rows: Vec<(Option<String>, Option<Decimal>)>) -> Result<Breakdown, RegisterError> {
    let mut totals = Breakdown::new();
    for (method, amount) in rows {
        accumulate(
            &mut totals,
            PaymentMethod::from_feed(method.as_deref()),
            amount.unwrap_or(Decimal::ZERO),
        )?;
    }
    Ok(totals)
}

impl SalesFeed for SalesFeedRepository {
    async fn totals(
        &self,
        register_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<FeedTotals, RegisterError> {
        let sales: Vec<(Option<String>, Option<Decimal>)> = settled_sales::Entity::find()
            .select_only()
            .column(settled_sales::Column::PaymentMethod)
            .column_as(Expr::col(settled_sales::Column::Amount).sum(), "total")
            .filter(settled_sales::Column::RegisterId.eq(register_id))
            .filter(settled_sales::Column::SettledAt.gte(start))
            .filter(settled_sales::Column::SettledAt.lt(end))
            .group_by(settled_sales::Column::PaymentMethod)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(storage_error)?;

        let expenses: Vec<(Option<String>, Option<Decimal>)> = operating_expenses::Entity::find()
            .select_only()
            .column(operating_expenses::Column::PaymentMethod)
            .column_as(Expr::col(operating_expenses::Column::Amount).sum(), "total")
            .filter(operating_expenses::Column::RegisterId.eq(register_id))
            .filter(operating_expenses::Column::PaidAt.gte(start))
            .filter(operating_expenses::Column::PaidAt.lt(end))
            .group_by(operating_expenses::Column::PaymentMethod)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(storage_error)?;

        Ok(FeedTotals {
            sales: fold(sales)?,
            external_expenses: fold(expenses)?,
        })
    }
}

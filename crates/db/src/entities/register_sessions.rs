//! `SeaORM` Entity for register_sessions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{RegisterReviewStatus, RegisterSessionStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "register_sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub register_id: String,
    pub name: String,
    pub responsible: String,
    pub opened_at: DateTimeWithTimeZone,
    pub closed_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub opening_float: Decimal,
    #[sea_orm(column_type = "JsonBinary")]
    pub opening_float_breakdown: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub cashiers: Json,
    pub status: RegisterSessionStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub revision: i64,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub declared_amounts: Option<Json>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub closing_summary: Option<Json>,
    pub review_status: RegisterReviewStatus,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "Text", nullable)]
    pub review_notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cash_ledger_entries::Entity")]
    CashLedgerEntries,
}

impl Related<super::cash_ledger_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CashLedgerEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

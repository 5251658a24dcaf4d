//! `SeaORM` Entity for cash_ledger_entries table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::LedgerEntryKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "cash_ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub session_id: Uuid,
    pub kind: LedgerEntryKind,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
    pub payment_method: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub recorded_by: Option<String>,
    pub recorded_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::register_sessions::Entity",
        from = "Column::SessionId",
        to = "super::register_sessions::Column::Id",
        on_delete = "Cascade"
    )]
    RegisterSessions,
}

impl Related<super::register_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RegisterSessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

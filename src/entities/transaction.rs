use chrono::Utc;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A completed transfer between two accounts.
///
/// Times are Unix epoch milliseconds. Registration and execution happen in
/// the same step, so both carry the same value.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub registered_time: i64,
    pub executed_time: i64,
    pub success: bool,
    pub cash_amount: f64,
    pub source_account_id: i32,
    pub destination_account_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::SourceAccountId",
        to = "super::account::Column::Id"
    )]
    SourceAccount,
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::DestinationAccountId",
        to = "super::account::Column::Id"
    )]
    DestinationAccount,
}

impl ActiveModelBehavior for ActiveModel {}

/// Current time as Unix epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A named account holding a spendable balance.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub available_cash: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether the account can cover a debit of `amount`.
    pub fn can_cover(&self, amount: f64) -> bool {
        self.available_cash >= amount
    }
}

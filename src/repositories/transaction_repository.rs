use sea_orm::{ConnectionTrait, DatabaseConnection, EntityTrait, Set};
use std::sync::Arc;

use crate::entities::transaction::{
    self, ActiveModel as TransactionActiveModel, Entity as Transaction,
    Model as TransactionModel,
};
use crate::errors::AppError;

use super::BaseRepository;

/// Repository for the append-only transfer log
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    base: BaseRepository,
}

impl TransactionRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Record a successful transfer and return its new ID
    pub async fn create(
        &self,
        source_account_id: i32,
        destination_account_id: i32,
        amount: f64,
    ) -> Result<i32, AppError> {
        Self::create_in(
            self.base.get_db(),
            source_account_id,
            destination_account_id,
            amount,
        )
        .await
    }

    /// Find a transaction by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<TransactionModel>, AppError> {
        Self::get_by_id_in(self.base.get_db(), id).await
    }

    pub async fn create_in<C: ConnectionTrait>(
        conn: &C,
        source_account_id: i32,
        destination_account_id: i32,
        amount: f64,
    ) -> Result<i32, AppError> {
        let now = transaction::now_millis();
        let model = TransactionActiveModel {
            registered_time: Set(now),
            executed_time: Set(now),
            success: Set(true),
            cash_amount: Set(amount),
            source_account_id: Set(source_account_id),
            destination_account_id: Set(destination_account_id),
            ..Default::default()
        };

        let inserted = Transaction::insert(model)
            .exec(conn)
            .await
            .map_err(AppError::DatabaseError)?;

        Ok(inserted.last_insert_id)
    }

    pub async fn get_by_id_in<C: ConnectionTrait>(
        conn: &C,
        id: i32,
    ) -> Result<Option<TransactionModel>, AppError> {
        Transaction::find_by_id(id)
            .one(conn)
            .await
            .map_err(AppError::DatabaseError)
    }
}

use sea_orm::{
    sea_query::Expr, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use std::sync::Arc;

use crate::entities::account::{Column, Entity as Account, Model as AccountModel};
use crate::errors::AppError;

use super::BaseRepository;

/// Repository for account reads and balance adjustments
#[derive(Debug, Clone)]
pub struct AccountRepository {
    base: BaseRepository,
}

impl AccountRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// All accounts in insertion order
    pub async fn get_all(&self) -> Result<Vec<AccountModel>, AppError> {
        Self::get_all_in(self.base.get_db()).await
    }

    /// Find an account by ID
    pub async fn find_by_id(&self, id: i32) -> Result<Option<AccountModel>, AppError> {
        Account::find_by_id(id)
            .one(self.base.get_db())
            .await
            .map_err(AppError::DatabaseError)
    }

    /// Apply `balance += delta`; returns the number of rows touched
    pub async fn adjust_balance(&self, account_id: i32, delta: f64) -> Result<u64, AppError> {
        Self::adjust_balance_in(self.base.get_db(), account_id, delta).await
    }

    /// Number of stored accounts
    pub async fn count(&self) -> Result<u64, AppError> {
        Self::count_in(self.base.get_db()).await
    }

    pub async fn get_all_in<C: ConnectionTrait>(conn: &C) -> Result<Vec<AccountModel>, AppError> {
        Account::find()
            .order_by_asc(Column::Id)
            .all(conn)
            .await
            .map_err(AppError::DatabaseError)
    }

    /// No bounds check: keeping balances non-negative is the caller's policy.
    pub async fn adjust_balance_in<C: ConnectionTrait>(
        conn: &C,
        account_id: i32,
        delta: f64,
    ) -> Result<u64, AppError> {
        let result = Account::update_many()
            .col_expr(
                Column::AvailableCash,
                Expr::col(Column::AvailableCash).add(delta),
            )
            .filter(Column::Id.eq(account_id))
            .exec(conn)
            .await
            .map_err(AppError::DatabaseError)?;

        Ok(result.rows_affected)
    }

    pub async fn count_in<C: ConnectionTrait>(conn: &C) -> Result<u64, AppError> {
        Account::find()
            .count(conn)
            .await
            .map_err(AppError::DatabaseError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, seed};

    async fn seeded_repository() -> AccountRepository {
        let pool = db::establish_connection_with_config(&db::DbConfig::single_connection(
            "sqlite::memory:",
        ))
        .await
        .unwrap();
        db::run_migrations(&pool).await.unwrap();
        seed::seed_accounts(&pool).await.unwrap();
        AccountRepository::new(Arc::new(pool))
    }

    #[tokio::test]
    async fn get_all_returns_accounts_in_insertion_order() {
        let repo = seeded_repository().await;
        let accounts = repo.get_all().await.unwrap();

        let ids: Vec<i32> = accounts.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(accounts[0].name, "Sanna");
    }

    #[tokio::test]
    async fn adjust_balance_applies_delta_and_may_go_negative() {
        let repo = seeded_repository().await;

        assert_eq!(repo.adjust_balance(5, -2000.0).await.unwrap(), 1);
        let travel = repo.find_by_id(5).await.unwrap().unwrap();
        assert_eq!(travel.available_cash, -500.0);
    }

    #[tokio::test]
    async fn adjust_balance_on_unknown_account_touches_nothing() {
        let repo = seeded_repository().await;
        assert_eq!(repo.adjust_balance(404, 10.0).await.unwrap(), 0);
        assert_eq!(repo.count().await.unwrap(), 5);
    }
}

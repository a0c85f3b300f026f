use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub mod account_repository;
pub mod transaction_repository;

pub use account_repository::AccountRepository;
pub use transaction_repository::TransactionRepository;

#[derive(Debug, Clone)]
pub struct BaseRepository {
    db: Arc<DatabaseConnection>,
}

impl BaseRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}

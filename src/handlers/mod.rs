pub mod accounts;
pub mod common;
pub mod health;
pub mod transactions;

use crate::db::DbPool;
use crate::repositories::{AccountRepository, TransactionRepository};
use crate::services::TransferService;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub accounts: Arc<AccountRepository>,
    pub transactions: Arc<TransactionRepository>,
    pub transfers: Arc<TransferService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            accounts: Arc::new(AccountRepository::new(db_pool.clone())),
            transactions: Arc::new(TransactionRepository::new(db_pool.clone())),
            transfers: Arc::new(TransferService::new(db_pool)),
        }
    }
}

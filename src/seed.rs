//! Seed data for a fresh ledger.
//!
//! Seeding is keyed on the store itself: accounts are inserted only while the
//! accounts table is empty, so restarts never duplicate them.

use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionError, TransactionTrait};
use tracing::info;

use crate::entities::account;
use crate::errors::AppError;
use crate::repositories::AccountRepository;

/// Accounts created on first startup, in insertion order.
pub const SEED_ACCOUNTS: [(&str, f64); 5] = [
    ("Sanna", 5000.0),
    ("Checking Account", 2500.0),
    ("Investment Account", 10000.0),
    ("Emergency Fund", 3000.0),
    ("Travel Savings", 1500.0),
];

/// Inserts [`SEED_ACCOUNTS`] if no account exists yet. Returns how many were inserted.
pub async fn seed_accounts(db: &DatabaseConnection) -> Result<u64, AppError> {
    let inserted = db
        .transaction::<_, u64, AppError>(|txn| {
            Box::pin(async move {
                if AccountRepository::count_in(txn).await? > 0 {
                    return Ok(0);
                }

                for (name, available_cash) in SEED_ACCOUNTS {
                    account::ActiveModel {
                        name: Set(name.to_string()),
                        available_cash: Set(available_cash),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;
                }

                Ok(SEED_ACCOUNTS.len() as u64)
            })
        })
        .await
        .map_err(|e| match e {
            TransactionError::Connection(db_err) => AppError::DatabaseError(db_err),
            TransactionError::Transaction(err) => err,
        })?;

    if inserted > 0 {
        info!(accounts = inserted, "Database seeded with initial accounts");
    } else {
        info!("Accounts already present, skipping seed");
    }

    Ok(inserted)
}

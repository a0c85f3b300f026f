use sea_orm::{TransactionError, TransactionTrait};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::{
    db::DbPool,
    entities::transaction::Model as TransactionModel,
    errors::ServiceError,
    repositories::{AccountRepository, TransactionRepository},
};

/// Moves cash between two accounts and records the transfer.
///
/// The balance check, both balance updates and the transaction record run in
/// one database transaction; any failure rolls the whole transfer back.
/// Transfers are additionally serialized through `gate`, so the funds check
/// and the debit are linearizable even on engines whose deferred
/// transactions would let two readers pass the check together.
#[derive(Clone)]
pub struct TransferService {
    db_pool: Arc<DbPool>,
    gate: Arc<Mutex<()>>,
}

impl TransferService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            db_pool,
            gate: Arc::new(Mutex::new(())),
        }
    }

    #[instrument(skip(self))]
    pub async fn transfer(
        &self,
        source_account_id: i32,
        destination_account_id: i32,
        amount: f64,
    ) -> Result<TransactionModel, ServiceError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ServiceError::InvalidInput(
                "Amount must be a positive number".to_string(),
            ));
        }

        let _guard = self.gate.lock().await;

        let record = self
            .db_pool
            .transaction::<_, TransactionModel, ServiceError>(move |txn| {
                Box::pin(async move {
                    let accounts = AccountRepository::get_all_in(txn).await?;
                    let source = accounts.iter().find(|a| a.id == source_account_id);
                    let destination = accounts.iter().find(|a| a.id == destination_account_id);

                    let (source, _destination) = match (source, destination) {
                        (Some(source), Some(destination)) => (source, destination),
                        _ => return Err(ServiceError::InvalidAccount),
                    };

                    if !source.can_cover(amount) {
                        return Err(ServiceError::InsufficientFunds);
                    }

                    let debited =
                        AccountRepository::adjust_balance_in(txn, source_account_id, -amount)
                            .await?;
                    let credited =
                        AccountRepository::adjust_balance_in(txn, destination_account_id, amount)
                            .await?;
                    if debited != 1 || credited != 1 {
                        return Err(ServiceError::InvalidAccount);
                    }

                    let id = TransactionRepository::create_in(
                        txn,
                        source_account_id,
                        destination_account_id,
                        amount,
                    )
                    .await?;

                    TransactionRepository::get_by_id_in(txn, id)
                        .await?
                        .ok_or(ServiceError::RetrievalInconsistency(id))
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                TransactionError::Transaction(service_err) => service_err,
            });

        match &record {
            Ok(transaction) => info!(
                transaction_id = transaction.id,
                source_account_id,
                destination_account_id,
                amount,
                "Transfer completed"
            ),
            Err(err) => warn!(
                source_account_id,
                destination_account_id,
                amount,
                error = %err,
                "Transfer rejected"
            ),
        }

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, seed};
    use assert_matches::assert_matches;
    use sea_orm::ConnectionTrait;

    const SANNA: i32 = 1;
    const CHECKING: i32 = 2;

    async fn seeded_pool() -> Arc<DbPool> {
        let pool = db::establish_connection_with_config(&db::DbConfig::single_connection(
            "sqlite::memory:",
        ))
        .await
        .unwrap();
        db::run_migrations(&pool).await.unwrap();
        seed::seed_accounts(&pool).await.unwrap();
        Arc::new(pool)
    }

    async fn setup() -> (TransferService, AccountRepository, TransactionRepository) {
        let pool = seeded_pool().await;
        (
            TransferService::new(pool.clone()),
            AccountRepository::new(pool.clone()),
            TransactionRepository::new(pool),
        )
    }

    async fn balance(accounts: &AccountRepository, id: i32) -> f64 {
        accounts
            .find_by_id(id)
            .await
            .unwrap()
            .expect("seeded account")
            .available_cash
    }

    #[tokio::test]
    async fn transfer_moves_cash_and_conserves_the_total() {
        let (service, accounts, _) = setup().await;

        let record = service.transfer(SANNA, CHECKING, 1000.0).await.unwrap();

        assert_eq!(record.cash_amount, 1000.0);
        assert_eq!(record.source_account_id, SANNA);
        assert_eq!(record.destination_account_id, CHECKING);
        assert_eq!(balance(&accounts, SANNA).await, 4000.0);
        assert_eq!(balance(&accounts, CHECKING).await, 3500.0);
    }

    #[tokio::test]
    async fn transfer_of_the_full_balance_is_allowed() {
        let (service, accounts, _) = setup().await;

        service.transfer(SANNA, CHECKING, 5000.0).await.unwrap();
        assert_eq!(balance(&accounts, SANNA).await, 0.0);
    }

    #[tokio::test]
    async fn overdraft_is_rejected_without_mutation() {
        let (service, accounts, _) = setup().await;

        let result = service.transfer(CHECKING, SANNA, 2500.01).await;

        assert_matches!(result, Err(ServiceError::InsufficientFunds));
        assert_eq!(balance(&accounts, CHECKING).await, 2500.0);
        assert_eq!(balance(&accounts, SANNA).await, 5000.0);
    }

    #[tokio::test]
    async fn unknown_account_is_rejected_without_mutation() {
        let (service, accounts, _) = setup().await;

        assert_matches!(
            service.transfer(SANNA, 42, 10.0).await,
            Err(ServiceError::InvalidAccount)
        );
        assert_matches!(
            service.transfer(42, SANNA, 10.0).await,
            Err(ServiceError::InvalidAccount)
        );
        assert_eq!(balance(&accounts, SANNA).await, 5000.0);
    }

    #[tokio::test]
    async fn non_positive_amounts_are_invalid_input() {
        let (service, accounts, _) = setup().await;

        for amount in [0.0, -100.0, f64::NAN, f64::INFINITY] {
            assert_matches!(
                service.transfer(SANNA, CHECKING, amount).await,
                Err(ServiceError::InvalidInput(_))
            );
        }
        assert_eq!(balance(&accounts, SANNA).await, 5000.0);
        assert_eq!(balance(&accounts, CHECKING).await, 2500.0);
    }

    #[tokio::test]
    async fn recorded_transaction_is_retrievable() {
        let (service, _, transactions) = setup().await;

        let record = service.transfer(3, 4, 123.45).await.unwrap();
        let stored = transactions.get_by_id(record.id).await.unwrap().unwrap();

        assert_eq!(stored, record);
    }

    #[tokio::test]
    async fn transfer_to_the_same_account_is_recorded_without_changing_the_balance() {
        let (service, accounts, transactions) = setup().await;

        let record = service.transfer(SANNA, SANNA, 750.0).await.unwrap();

        assert_eq!(balance(&accounts, SANNA).await, 5000.0);
        let stored = transactions.get_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(stored.source_account_id, SANNA);
        assert_eq!(stored.destination_account_id, SANNA);
        assert_eq!(stored.cash_amount, 750.0);
    }

    #[tokio::test]
    async fn same_account_transfer_still_needs_cover() {
        let (service, accounts, _) = setup().await;

        assert_matches!(
            service.transfer(SANNA, SANNA, 5000.01).await,
            Err(ServiceError::InsufficientFunds)
        );
        assert_eq!(balance(&accounts, SANNA).await, 5000.0);
    }

    #[tokio::test]
    async fn failed_insert_rolls_back_both_balances() {
        let pool = seeded_pool().await;
        pool.execute_unprepared(
            "CREATE TRIGGER reject_transfers BEFORE INSERT ON transactions \
             BEGIN SELECT RAISE(ABORT, 'transfers disabled'); END;",
        )
        .await
        .unwrap();
        let service = TransferService::new(pool.clone());
        let accounts = AccountRepository::new(pool.clone());

        let result = service.transfer(SANNA, CHECKING, 1000.0).await;

        assert_matches!(result, Err(ServiceError::DatabaseError(_)));
        assert_eq!(balance(&accounts, SANNA).await, 5000.0);
        assert_eq!(balance(&accounts, CHECKING).await, 2500.0);
    }

    #[tokio::test]
    async fn concurrent_transfers_never_overdraw() {
        let (service, accounts, _) = setup().await;

        let mut tasks = Vec::new();
        for _ in 0..10 {
            let service = service.clone();
            tasks.push(tokio::spawn(async move {
                service.transfer(SANNA, CHECKING, 1000.0).await.is_ok()
            }));
        }

        let mut succeeded = 0;
        for task in tasks {
            if task.await.unwrap() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 5);
        assert_eq!(balance(&accounts, SANNA).await, 0.0);
        assert_eq!(balance(&accounts, CHECKING).await, 7500.0);
    }
}

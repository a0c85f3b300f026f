use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::instrument;
use validator::{Validate, ValidationError};

use crate::{
    entities::transaction::Model as TransactionModel,
    errors::{ApiError, ServiceError},
    handlers::common::{json_body, map_service_error, success_response, validate_input},
    AppState,
};

pub const TRANSFER_SUCCESS_MESSAGE: &str = "Transaction successful";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransferRequest {
    /// `None` when the body carries something that can never match an
    /// account id (text, fractions, out-of-range numbers, null or nothing).
    #[serde(default, deserialize_with = "account_ref")]
    pub source_account_id: Option<i32>,
    #[serde(default, deserialize_with = "account_ref")]
    pub destination_account_id: Option<i32>,
    #[validate(custom = "validate_amount")]
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResponse {
    pub message: String,
    pub transaction: TransactionModel,
}

fn account_ref<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let id = value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|n| n.fract() == 0.0 && n.abs() <= i64::MAX as f64)
            .map(|n| n as i64)
    });
    Ok(id.and_then(|id| i32::try_from(id).ok()))
}

fn validate_amount(amount: f64) -> Result<(), ValidationError> {
    if !amount.is_finite() || amount <= 0.0 {
        let mut err = ValidationError::new("amount");
        err.message = Some("Amount must be a positive number".into());
        return Err(err);
    }
    Ok(())
}

#[instrument(skip(state, payload))]
async fn create_transaction(
    State(state): State<AppState>,
    payload: Result<Json<CreateTransferRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = json_body(payload)?;
    validate_input(&request)?;

    let (source_account_id, destination_account_id) =
        match (request.source_account_id, request.destination_account_id) {
            (Some(source), Some(destination)) => (source, destination),
            _ => return Err(ServiceError::InvalidAccount.into()),
        };

    let transaction = state
        .services
        .transfers
        .transfer(source_account_id, destination_account_id, request.amount)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(TransferResponse {
        message: TRANSFER_SUCCESS_MESSAGE.to_string(),
        transaction,
    }))
}

#[instrument(skip(state))]
async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let transaction = state
        .services
        .transactions
        .get_by_id(id)
        .await
        .map_err(map_service_error)?
        .ok_or_else(|| ServiceError::NotFound("Transaction not found".to_string()))?;
    Ok(success_response(transaction))
}

pub fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_transaction))
        .route("/:id", get(get_transaction))
}

//! HTTP client for the ledger API, used by `bank-cli`.

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{
    entities::{AccountModel, TransactionModel},
    errors::ErrorResponse,
    handlers::transactions::{CreateTransferRequest, TransferResponse},
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx answer; `message` is the server's `error` field when present.
    #[error("{message}")]
    Api { status: StatusCode, message: String },
}

#[derive(Clone, Debug)]
pub struct BankClient {
    client: reqwest::Client,
    base_url: String,
}

impl BankClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[instrument(skip(self))]
    pub async fn list_accounts(&self) -> Result<Vec<AccountModel>, ClientError> {
        let response = self
            .client
            .get(format!("{}/api/accounts", self.base_url))
            .send()
            .await?;
        decode(response).await
    }

    #[instrument(skip(self))]
    pub async fn transfer(
        &self,
        source_account_id: i32,
        destination_account_id: i32,
        amount: f64,
    ) -> Result<TransferResponse, ClientError> {
        let request = CreateTransferRequest {
            source_account_id: Some(source_account_id),
            destination_account_id: Some(destination_account_id),
            amount,
        };
        let response = self
            .client
            .post(format!("{}/api/transactions", self.base_url))
            .json(&request)
            .send()
            .await?;
        decode(response).await
    }

    #[instrument(skip(self))]
    pub async fn get_transaction(&self, id: i32) -> Result<TransactionModel, ClientError> {
        let response = self
            .client
            .get(format!("{}/api/transactions/{}", self.base_url, id))
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body = response.text().await.unwrap_or_default();
    debug!(%status, body = %body, "API returned an error");
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("Unexpected response")
                .to_string()
        });

    Err(ClientError::Api { status, message })
}

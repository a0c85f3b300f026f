use axum::{extract::State, response::IntoResponse, routing::get, Router};
use tracing::instrument;

use crate::{
    errors::ApiError,
    handlers::common::{map_service_error, success_response},
    AppState,
};

/// List every account with its current balance
#[instrument(skip(state))]
async fn list_accounts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let accounts = state
        .services
        .accounts
        .get_all()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(accounts))
}

pub fn account_routes() -> Router<AppState> {
    Router::new().route("/", get(list_accounts))
}

use super::AppState;
use crate::{
    error::PayRequestError,
    models::{Amount, ApiResponse, TransactionFilter, WalletSummary},
};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct WalletQuery {
    #[serde(default)]
    pub filter: TransactionFilter,
}

#[derive(Debug, Deserialize)]
pub struct AddFundsBody {
    pub amount: String,
}

pub async fn wallet_summary(
    State(state): State<AppState>,
    Query(query): Query<WalletQuery>,
) -> Result<Json<ApiResponse<WalletSummary>>, PayRequestError> {
    let summary = state.wallet.summary(query.filter).await?;
    Ok(Json(ApiResponse::ok(summary)))
}

pub async fn add_funds(
    State(state): State<AppState>,
    Json(body): Json<AddFundsBody>,
) -> Result<Json<ApiResponse<WalletSummary>>, PayRequestError> {
    let amount = Amount::parse(&body.amount)?;
    let summary = state.wallet.add_funds(amount).await?;
    Ok(Json(ApiResponse::ok(summary)))
}

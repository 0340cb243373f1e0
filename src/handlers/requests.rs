use super::AppState;
use crate::{
    error::PayRequestError,
    models::{ApiResponse, PaymentRequest, RequestView},
};
use axum::{extract::State, Json};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct OpenRequestBody {
    /// Kept as text so the two-decimal rule is checked on what the user typed.
    pub amount: String,
}

pub async fn open_request(
    State(state): State<AppState>,
    Json(body): Json<OpenRequestBody>,
) -> Result<Json<ApiResponse<PaymentRequest>>, PayRequestError> {
    let request = state.coordinator.open(&body.amount).await?;
    Ok(Json(ApiResponse::ok(request)))
}

pub async fn current_request(State(state): State<AppState>) -> Json<ApiResponse<RequestView>> {
    Json(ApiResponse::ok(state.coordinator.view()))
}

pub async fn confirm_request(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<RequestView>>, PayRequestError> {
    let outcome = state.coordinator.confirm().await?;
    tracing::debug!(?outcome, "Manual confirmation check");
    Ok(Json(ApiResponse::ok(state.coordinator.view())))
}

pub async fn cancel_request(State(state): State<AppState>) -> Json<ApiResponse<RequestView>> {
    if !state.coordinator.cancel().await {
        tracing::debug!("Cancel ignored, no pending request");
    }
    Json(ApiResponse::ok(state.coordinator.view()))
}

pub async fn reset_request(State(state): State<AppState>) -> Json<ApiResponse<RequestView>> {
    state.coordinator.reset().await;
    Json(ApiResponse::ok(state.coordinator.view()))
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum PayRequestError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Payment request could not be issued: {0}")]
    RequestIssuanceFailed(String),

    #[error("Balance refresh failed: {0}")]
    BalanceRefreshFailed(String),

    #[error("Wallet session is not authorized")]
    Unauthorized,

    #[error("No payment request is active")]
    NoActiveRequest,

    #[error("A payment request is pending, try again once it resolves")]
    RequestPending,

    #[error("Wallet request failed: {0}")]
    WalletRequestFailed(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

pub type Result<T> = std::result::Result<T, PayRequestError>;

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub timestamp: chrono::DateTime<Utc>,
    pub request_id: String,
}

impl PayRequestError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            PayRequestError::InvalidAmount(_) => (StatusCode::BAD_REQUEST, "INVALID_AMOUNT"),
            PayRequestError::RequestIssuanceFailed(_) => {
                (StatusCode::BAD_GATEWAY, "REQUEST_ISSUANCE_FAILED")
            }
            PayRequestError::BalanceRefreshFailed(_) => {
                (StatusCode::BAD_GATEWAY, "BALANCE_REFRESH_FAILED")
            }
            PayRequestError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            PayRequestError::NoActiveRequest => (StatusCode::NOT_FOUND, "NO_ACTIVE_REQUEST"),
            PayRequestError::RequestPending => (StatusCode::CONFLICT, "REQUEST_PENDING"),
            PayRequestError::WalletRequestFailed(_) => {
                (StatusCode::BAD_GATEWAY, "WALLET_REQUEST_FAILED")
            }
            PayRequestError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

impl IntoResponse for PayRequestError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();
        let (status, error_code) = self.status_and_code();

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            error_code: error_code.to_string(),
            timestamp: Utc::now(),
            request_id,
        };

        tracing::error!(
            error = ?self,
            error_code = error_code,
            "Request failed"
        );

        (status, Json(body)).into_response()
    }
}

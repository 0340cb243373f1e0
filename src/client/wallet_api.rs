use crate::error::{PayRequestError, Result};
use crate::models::{Amount, Balance, IssuedRequest, Transaction};
use crate::services::ports::{BalanceSource, HealthCheck, RequestIssuer, WalletLedger};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ISSUE_REQUEST_PATH: &str = "/api/payments/request";
pub const BALANCE_PATH: &str = "/api/wallet/balance";
pub const HEALTH_PATH: &str = "/api/health";
pub const TRANSACTIONS_PATH: &str = "/api/transactions";
pub const ADD_FUNDS_PATH: &str = "/api/wallet/add-funds";

/// HTTP client for the wallet backend.
///
/// Implements every backend port over one `reqwest::Client`.
#[derive(Clone)]
pub struct WalletApiClient {
    base_url: String,
    client: Client,
}

/// Body shared by issuance and top-up. Amounts are bounded to fifteen
/// significant digits, so the JSON number carries them exactly.
#[derive(Serialize)]
struct AmountBody {
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
}

#[derive(Deserialize)]
struct BalanceBody {
    balance: Balance,
}

#[derive(Deserialize)]
struct TransactionsBody {
    transactions: Vec<Transaction>,
}

#[derive(Deserialize)]
struct HealthBody {
    status: String,
}

impl WalletApiClient {
    pub fn new(base_url: &str, token: Option<&str>, timeout: Duration) -> anyhow::Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = token {
            let mut value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .context("WALLET_API_TOKEN is not a valid header value")?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("Failed to build wallet API client")?;

        tracing::info!("Wallet API base URL is {}", base_url);

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        tracing::debug!("API Request: {} {}", method, path);
        self.client
            .request(method, format!("{}{}", self.base_url, path))
    }

    /// Sends the request and turns transport failures and non-2xx statuses
    /// into errors built by `fail`.
    async fn send<F>(&self, builder: RequestBuilder, path: &str, fail: F) -> Result<Response>
    where
        F: Fn(String) -> PayRequestError,
    {
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                tracing::error!("API Error: no response from {} before timeout", path);
            } else {
                tracing::error!("API Error: {}: {}", path, e);
            }
            fail(e.to_string())
        })?;

        let status = response.status();
        tracing::debug!("API Response: {} {}", status.as_u16(), path);

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!("API Error {}: {} {}", status.as_u16(), path, body);

        match status {
            StatusCode::UNAUTHORIZED => Err(PayRequestError::Unauthorized),
            StatusCode::NOT_FOUND => Err(fail(format!("endpoint {} does not exist", path))),
            _ => Err(fail(format!("{} responded {}: {}", path, status, body))),
        }
    }
}

#[async_trait]
impl RequestIssuer for WalletApiClient {
    async fn create_request(&self, amount: Amount) -> Result<IssuedRequest> {
        let builder = self
            .request(Method::POST, ISSUE_REQUEST_PATH)
            .json(&AmountBody {
                amount: amount.value(),
            });
        let response = self
            .send(builder, ISSUE_REQUEST_PATH, PayRequestError::RequestIssuanceFailed)
            .await?;

        response
            .json::<IssuedRequest>()
            .await
            .map_err(|e| PayRequestError::RequestIssuanceFailed(format!("malformed response: {}", e)))
    }
}

#[async_trait]
impl BalanceSource for WalletApiClient {
    async fn refresh_balance(&self) -> Result<Balance> {
        let builder = self.request(Method::GET, BALANCE_PATH);
        let response = self
            .send(builder, BALANCE_PATH, PayRequestError::BalanceRefreshFailed)
            .await?;

        let body = response
            .json::<BalanceBody>()
            .await
            .map_err(|e| PayRequestError::BalanceRefreshFailed(format!("malformed response: {}", e)))?;
        Ok(body.balance)
    }
}

#[async_trait]
impl WalletLedger for WalletApiClient {
    async fn recent_transactions(&self) -> Result<Vec<Transaction>> {
        let builder = self.request(Method::GET, TRANSACTIONS_PATH);
        let response = self
            .send(builder, TRANSACTIONS_PATH, PayRequestError::WalletRequestFailed)
            .await?;

        let body = response
            .json::<TransactionsBody>()
            .await
            .map_err(|e| PayRequestError::WalletRequestFailed(format!("malformed response: {}", e)))?;
        Ok(body.transactions)
    }

    async fn add_funds(&self, amount: Amount) -> Result<()> {
        let builder = self
            .request(Method::POST, ADD_FUNDS_PATH)
            .json(&AmountBody {
                amount: amount.value(),
            });
        self.send(builder, ADD_FUNDS_PATH, PayRequestError::WalletRequestFailed)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for WalletApiClient {
    async fn is_healthy(&self) -> bool {
        let builder = self.request(Method::GET, HEALTH_PATH);
        let response = match self
            .send(builder, HEALTH_PATH, PayRequestError::InternalError)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("API Health Check Failed: {}", e);
                return false;
            }
        };

        match response.json::<HealthBody>().await {
            Ok(body) => body.status == "ok",
            Err(e) => {
                tracing::warn!("API Health Check Failed: {}", e);
                false
            }
        }
    }
}

//! Seams to the wallet backend. The coordinator only ever talks to these
//! traits; `client::wallet_api` is the HTTP implementation.

use crate::error::Result;
use crate::models::{Amount, Balance, IssuedRequest, Transaction};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait RequestIssuer: Send + Sync {
    /// Allocates a trackable payment request. Has no side effect when it fails.
    async fn create_request(&self, amount: Amount) -> Result<IssuedRequest>;
}

#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Latest known balance of the authenticated account.
    async fn refresh_balance(&self) -> Result<Balance>;
}

#[async_trait]
pub trait WalletLedger: Send + Sync {
    async fn recent_transactions(&self) -> Result<Vec<Transaction>>;

    /// Credits the account. The new balance is read back through
    /// [`BalanceSource`].
    async fn add_funds(&self, amount: Amount) -> Result<()>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn is_healthy(&self) -> bool;
}

pub type RequestIssuerRef = Arc<dyn RequestIssuer>;
pub type BalanceSourceRef = Arc<dyn BalanceSource>;
pub type HealthCheckRef = Arc<dyn HealthCheck>;
pub type WalletLedgerRef = Arc<dyn WalletLedger>;

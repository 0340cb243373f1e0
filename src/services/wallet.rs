use super::coordinator::RequestCoordinator;
use super::ports::{BalanceSourceRef, WalletLedgerRef};
use crate::error::{PayRequestError, Result};
use crate::models::{Amount, TransactionFilter, WalletSummary};
use std::sync::Arc;

/// Account screen operations: balance with recent history, and top-ups.
pub struct WalletService {
    ledger: WalletLedgerRef,
    balance: BalanceSourceRef,
    coordinator: Arc<RequestCoordinator>,
}

impl WalletService {
    pub fn new(
        ledger: WalletLedgerRef,
        balance: BalanceSourceRef,
        coordinator: Arc<RequestCoordinator>,
    ) -> Self {
        Self {
            ledger,
            balance,
            coordinator,
        }
    }

    pub async fn summary(&self, filter: TransactionFilter) -> Result<WalletSummary> {
        let (balance, transactions) = tokio::try_join!(
            self.balance.refresh_balance(),
            self.ledger.recent_transactions()
        )?;

        Ok(WalletSummary {
            balance,
            transactions: transactions
                .into_iter()
                .filter(|tx| filter.matches(tx))
                .collect(),
        })
    }

    /// Tops the account up and returns the refreshed summary.
    ///
    /// Refused while a payment request is pending: the credit would raise the
    /// balance past the request's target and confirm it.
    pub async fn add_funds(&self, amount: Amount) -> Result<WalletSummary> {
        if self.coordinator.has_pending() {
            tracing::warn!(amount = %amount, "Top-up refused while a payment request is pending");
            return Err(PayRequestError::RequestPending);
        }

        self.ledger.add_funds(amount).await?;
        tracing::info!(amount = %amount, "Funds added to wallet");

        self.summary(TransactionFilter::All).await
    }
}

#![allow(dead_code)]

use async_trait::async_trait;
use payband_requests::error::{PayRequestError, Result};
use payband_requests::models::{
    Amount, Balance, IssuedRequest, RequestStatus, RequestView, Transaction, TransactionKind,
};
use payband_requests::services::{
    BalanceSource, CoordinatorSettings, EventBus, HealthCheck, RequestCoordinator, RequestIssuer,
    WalletLedger,
};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory stand-in for the wallet backend.
pub struct StubWallet {
    balance: Mutex<Decimal>,
    refresh_calls: AtomicUsize,
    issue_calls: AtomicUsize,
    failing_refreshes: AtomicUsize,
    fail_issuance: AtomicBool,
    healthy: AtomicBool,
    transactions: Mutex<Vec<Transaction>>,
}

impl StubWallet {
    pub fn new(balance: Decimal) -> Arc<Self> {
        Arc::new(Self {
            balance: Mutex::new(balance),
            refresh_calls: AtomicUsize::new(0),
            issue_calls: AtomicUsize::new(0),
            failing_refreshes: AtomicUsize::new(0),
            fail_issuance: AtomicBool::new(false),
            healthy: AtomicBool::new(true),
            transactions: Mutex::new(Vec::new()),
        })
    }

    pub fn set_balance(&self, balance: Decimal) {
        *self.balance.lock().unwrap() = balance;
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn issue_calls(&self) -> usize {
        self.issue_calls.load(Ordering::SeqCst)
    }

    pub fn fail_next_refreshes(&self, count: usize) {
        self.failing_refreshes.store(count, Ordering::SeqCst);
    }

    pub fn fail_issuance(&self, fail: bool) {
        self.fail_issuance.store(fail, Ordering::SeqCst);
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn record(&self, kind: TransactionKind, amount: Decimal) {
        let mut transactions = self.transactions.lock().unwrap();
        let id = format!("tx-{}", transactions.len() + 1);
        transactions.push(Transaction {
            id,
            kind,
            amount,
            other_party: None,
            status: Some("completed".to_string()),
            created_at: None,
        });
    }

    pub fn balance(&self) -> Decimal {
        *self.balance.lock().unwrap()
    }
}

#[async_trait]
impl RequestIssuer for StubWallet {
    async fn create_request(&self, _amount: Amount) -> Result<IssuedRequest> {
        let n = self.issue_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_issuance.load(Ordering::SeqCst) {
            return Err(PayRequestError::RequestIssuanceFailed(
                "backend unavailable".to_string(),
            ));
        }
        Ok(IssuedRequest {
            request_id: format!("req-{}", n),
            qr_payload: format!("payband://pay/req-{}", n),
            payment_link: Some(format!("https://pay.example.com/req-{}", n)),
        })
    }
}

#[async_trait]
impl BalanceSource for StubWallet {
    async fn refresh_balance(&self) -> Result<Balance> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self.failing_refreshes.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_refreshes.store(failing - 1, Ordering::SeqCst);
            return Err(PayRequestError::BalanceRefreshFailed(
                "connection reset".to_string(),
            ));
        }
        Ok(Balance::new(*self.balance.lock().unwrap()))
    }
}

#[async_trait]
impl WalletLedger for StubWallet {
    async fn recent_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.transactions.lock().unwrap().clone())
    }

    async fn add_funds(&self, amount: Amount) -> Result<()> {
        *self.balance.lock().unwrap() += amount.value();
        self.record(TransactionKind::Deposit, amount.value());
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for StubWallet {
    async fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }
}

pub fn settings() -> CoordinatorSettings {
    CoordinatorSettings::default()
}

pub fn setup(
    wallet: Arc<StubWallet>,
    settings: CoordinatorSettings,
) -> (Arc<RequestCoordinator>, EventBus) {
    let events = EventBus::new(16);
    let coordinator = Arc::new(RequestCoordinator::new(
        wallet.clone(),
        wallet,
        events.clone(),
        settings,
    ));
    (coordinator, events)
}

/// Waits (on the tokio clock) until the view reports `status`.
pub async fn wait_for_status(coordinator: &RequestCoordinator, status: RequestStatus) -> RequestView {
    let mut rx = coordinator.subscribe();
    let view = tokio::time::timeout(
        Duration::from_millis(500),
        rx.wait_for(|view| view.status() == Some(status)),
    )
    .await
    .unwrap_or_else(|_| panic!("request never reached {:?}", status))
    .expect("view channel closed")
    .clone();
    view
}

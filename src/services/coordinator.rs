use super::detection::{DetectionGroup, Trigger};
use super::event_bus::EventBus;
use super::ports::{BalanceSourceRef, RequestIssuerRef};
use super::tracker::{CheckOutcome, RequestTracker};
use crate::config::Config;
use crate::error::{PayRequestError, Result};
use crate::models::{Amount, PaymentRequest, RequestStatus, RequestView, Resolution};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex};

#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub request_ttl: Duration,
    pub poll_interval: Duration,
    /// Run the first balance check as soon as the request is armed instead
    /// of one poll interval later.
    pub poll_immediately: bool,
    pub refresh_failure_warn_threshold: u32,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            request_ttl: Duration::from_secs(120),
            poll_interval: Duration::from_secs(3),
            poll_immediately: true,
            refresh_failure_warn_threshold: 5,
        }
    }
}

impl From<&Config> for CoordinatorSettings {
    fn from(config: &Config) -> Self {
        Self {
            request_ttl: config.request_ttl,
            poll_interval: config.poll_interval,
            poll_immediately: config.poll_immediately,
            refresh_failure_warn_threshold: config.refresh_failure_warn_threshold,
        }
    }
}

struct ActiveRequest {
    tracker: Arc<RequestTracker>,
    detection: DetectionGroup,
}

impl ActiveRequest {
    fn tear_down(mut self) {
        self.tracker.cancel();
        self.detection.disarm();
    }
}

/// Drives the one outstanding payment request from creation to a terminal
/// outcome.
///
/// Opening a new request always tears down the previous one first, so at
/// most one countdown, one poll loop and one push subscription exist at a
/// time.
pub struct RequestCoordinator {
    issuer: RequestIssuerRef,
    balance: BalanceSourceRef,
    events: EventBus,
    settings: CoordinatorSettings,
    active: Mutex<Option<ActiveRequest>>,
    view_tx: watch::Sender<RequestView>,
    resolutions: broadcast::Sender<Resolution>,
}

impl RequestCoordinator {
    pub fn new(
        issuer: RequestIssuerRef,
        balance: BalanceSourceRef,
        events: EventBus,
        settings: CoordinatorSettings,
    ) -> Self {
        let (view_tx, _) = watch::channel(RequestView::idle());
        let (resolutions, _) = broadcast::channel(16);
        Self {
            issuer,
            balance,
            events,
            settings,
            active: Mutex::new(None),
            view_tx,
            resolutions,
        }
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    /// Parses form input and opens a request for it.
    pub async fn open(&self, amount: &str) -> Result<PaymentRequest> {
        let amount = Amount::parse(amount)?;
        self.open_amount(amount).await
    }

    pub async fn open_amount(&self, amount: Amount) -> Result<PaymentRequest> {
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            tracing::info!(
                request_id = %previous.tracker.request_id(),
                "Superseding payment request"
            );
            previous.tear_down();
            self.view_tx.send_replace(RequestView::idle());
        }

        // subscribe before issuing so notifications sent meanwhile are queued
        let events = self.events.subscribe();

        let baseline = self.balance.refresh_balance().await.map_err(|e| {
            tracing::warn!("Could not sample baseline balance: {}", e);
            match e {
                PayRequestError::BalanceRefreshFailed(_) => e,
                other => PayRequestError::BalanceRefreshFailed(other.to_string()),
            }
        })?;

        let issued = self.issuer.create_request(amount).await.map_err(|e| {
            tracing::warn!(amount = %amount, "Payment request issuance failed: {}", e);
            match e {
                PayRequestError::RequestIssuanceFailed(_) => e,
                other => PayRequestError::RequestIssuanceFailed(other.to_string()),
            }
        })?;

        let request = PaymentRequest::new(
            issued,
            amount,
            baseline,
            Utc::now(),
            self.settings.request_ttl,
        );
        let tracker = Arc::new(RequestTracker::new(
            request.clone(),
            self.settings.request_ttl.as_secs(),
            self.view_tx.clone(),
            self.resolutions.clone(),
        ));
        let detection =
            DetectionGroup::arm(tracker.clone(), self.balance.clone(), events, &self.settings);
        *active = Some(ActiveRequest { tracker, detection });

        tracing::info!(
            request_id = %request.request_id,
            amount = %request.amount,
            baseline = %request.baseline_balance,
            deadline = %request.deadline,
            "Payment request opened"
        );

        Ok(request)
    }

    /// Re-reads the balance and confirms the active request if it is paid.
    ///
    /// Unlike the background paths, a failed refresh is returned to the caller.
    pub async fn confirm(&self) -> Result<CheckOutcome> {
        let tracker = self.active_tracker().await?;
        if !tracker.is_pending() {
            return Ok(CheckOutcome::NotPending(tracker.status()));
        }

        let observed = match self.balance.refresh_balance().await {
            Ok(observed) => observed,
            Err(e) => {
                tracker.record_refresh_failure();
                return Err(e);
            }
        };

        let outcome = tracker.confirm(observed);
        if outcome == CheckOutcome::Confirmed {
            tracing::info!(trigger = %Trigger::Manual, balance = %observed, "Payment detected");
            self.disarm_if_current(&tracker).await;
        }
        Ok(outcome)
    }

    /// Times the active request out. No-op unless it is pending.
    pub async fn expire(&self) -> bool {
        let mut active = self.active.lock().await;
        let Some(current) = active.as_mut() else {
            return false;
        };
        if !current.tracker.expire() {
            return false;
        }
        current.detection.disarm();
        true
    }

    /// Abandons the active request. No-op unless it is pending.
    pub async fn cancel(&self) -> bool {
        let mut active = self.active.lock().await;
        let Some(current) = active.as_mut() else {
            return false;
        };
        if !current.tracker.cancel() {
            return false;
        }
        current.detection.disarm();
        tracing::info!(request_id = %current.tracker.request_id(), "Payment request cancelled");
        *active = None;
        true
    }

    /// Drops the current request whatever its state, cancelling it first if
    /// it is still pending, and returns the view to idle.
    pub async fn reset(&self) {
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            previous.tear_down();
        }
        self.view_tx.send_replace(RequestView::idle());
    }

    pub async fn current(&self) -> Option<PaymentRequest> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|active| active.tracker.snapshot())
    }

    pub fn has_pending(&self) -> bool {
        self.view_tx.borrow().status() == Some(RequestStatus::Pending)
    }

    pub fn view(&self) -> RequestView {
        self.view_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestView> {
        self.view_tx.subscribe()
    }

    pub fn resolutions(&self) -> broadcast::Receiver<Resolution> {
        self.resolutions.subscribe()
    }

    async fn active_tracker(&self) -> Result<Arc<RequestTracker>> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|active| active.tracker.clone())
            .ok_or(PayRequestError::NoActiveRequest)
    }

    async fn disarm_if_current(&self, tracker: &Arc<RequestTracker>) {
        let mut active = self.active.lock().await;
        if let Some(current) = active.as_mut() {
            if Arc::ptr_eq(&current.tracker, tracker) {
                current.detection.disarm();
            }
        }
    }
}

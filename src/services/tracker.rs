use crate::models::{Balance, PaymentRequest, RequestStatus, RequestView, Resolution};
use chrono::Utc;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::{broadcast, watch};

/// Result of evaluating the confirmation condition once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Confirmed,
    BelowTarget { observed: Balance, target: Balance },
    NotPending(RequestStatus),
}

struct TrackerState {
    request: PaymentRequest,
    time_remaining: u64,
    last_failure: Option<String>,
    refresh_failures: u32,
}

/// Owns the mutable state of one payment request.
///
/// Every trigger (push, poll, countdown, user) goes through the guarded
/// methods here. Each one checks `Pending` and applies its transition while
/// holding the same lock, so whichever trigger gets the lock first decides
/// the outcome and the rest become no-ops.
pub struct RequestTracker {
    state: Mutex<TrackerState>,
    view_tx: watch::Sender<RequestView>,
    resolutions: broadcast::Sender<Resolution>,
    stop_tx: watch::Sender<bool>,
}

impl RequestTracker {
    pub fn new(
        request: PaymentRequest,
        time_remaining: u64,
        view_tx: watch::Sender<RequestView>,
        resolutions: broadcast::Sender<Resolution>,
    ) -> Self {
        let (stop_tx, _) = watch::channel(false);
        let tracker = Self {
            state: Mutex::new(TrackerState {
                request,
                time_remaining,
                last_failure: None,
                refresh_failures: 0,
            }),
            view_tx,
            resolutions,
            stop_tx,
        };
        {
            let state = tracker.lock();
            tracker.publish(&state);
        }
        tracker
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        // transitions are single field writes, a poisoned lock is still consistent
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, state: &TrackerState) {
        self.view_tx.send_replace(RequestView {
            request: Some(state.request.clone()),
            time_remaining: state.time_remaining,
            last_failure: state.last_failure.clone(),
            refresh_failures: state.refresh_failures,
            updated_at: Utc::now(),
        });
    }

    fn finish(&self, state: &mut TrackerState, status: RequestStatus, observed: Option<Balance>) {
        state.request.status = status;
        state.request.resolved_balance = observed;
        if status == RequestStatus::TimedOut {
            state.time_remaining = 0;
        }
        self.publish(state);

        let resolution = Resolution {
            request_id: state.request.request_id.clone(),
            status,
            amount: state.request.amount,
            observed_balance: observed,
            resolved_at: Utc::now(),
        };
        // no listeners is fine
        let _ = self.resolutions.send(resolution);
        self.stop_tx.send_replace(true);

        tracing::info!(
            request_id = %state.request.request_id,
            status = ?status,
            amount = %state.request.amount,
            "Payment request resolved"
        );
    }

    pub fn snapshot(&self) -> PaymentRequest {
        self.lock().request.clone()
    }

    pub fn status(&self) -> RequestStatus {
        self.lock().request.status
    }

    pub fn request_id(&self) -> String {
        self.lock().request.request_id.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.status() == RequestStatus::Pending
    }

    /// Applies a freshly sampled balance. The caller must have refreshed the
    /// balance right before, push events carry no balance of their own.
    pub fn confirm(&self, observed: Balance) -> CheckOutcome {
        let mut state = self.lock();
        if state.request.status != RequestStatus::Pending {
            return CheckOutcome::NotPending(state.request.status);
        }

        let had_failures = state.refresh_failures != 0;
        state.refresh_failures = 0;
        let target = state
            .request
            .baseline_balance
            .target_for(state.request.amount)
            .unwrap_or(Balance::MAX);
        if state.request.is_satisfied_by(observed) {
            self.finish(&mut state, RequestStatus::Succeeded, Some(observed));
            CheckOutcome::Confirmed
        } else {
            if had_failures {
                self.publish(&state);
            }
            CheckOutcome::BelowTarget { observed, target }
        }
    }

    pub fn expire(&self) -> bool {
        let mut state = self.lock();
        if state.request.status != RequestStatus::Pending {
            return false;
        }
        self.finish(&mut state, RequestStatus::TimedOut, None);
        true
    }

    pub fn cancel(&self) -> bool {
        let mut state = self.lock();
        if state.request.status != RequestStatus::Pending {
            return false;
        }
        self.finish(&mut state, RequestStatus::Cancelled, None);
        true
    }

    /// Countdown display update. Ignored once the request is terminal.
    pub fn set_time_remaining(&self, seconds: u64) {
        let mut state = self.lock();
        if state.request.status != RequestStatus::Pending {
            return;
        }
        state.time_remaining = seconds;
        self.publish(&state);
    }

    /// Returns the number of consecutive failures so far.
    pub fn record_refresh_failure(&self) -> u32 {
        let mut state = self.lock();
        if state.request.status != RequestStatus::Pending {
            return state.refresh_failures;
        }
        state.refresh_failures += 1;
        self.publish(&state);
        state.refresh_failures
    }

    pub fn record_payment_failure(&self, message: String) {
        let mut state = self.lock();
        if state.request.status != RequestStatus::Pending {
            return;
        }
        state.last_failure = Some(message);
        self.publish(&state);
    }

    /// Resolves once the request has left `Pending`.
    pub async fn stopped(&self) {
        let mut rx = self.stop_tx.subscribe();
        // the sender lives as long as `self`, so this cannot fail while we wait
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

//! Background detection for one armed payment request.
//!
//! Three tasks are spawned together when a request opens and live in a single
//! [`DetectionGroup`]:
//! - a countdown that ticks once per second and expires the request at zero,
//! - a poll loop that re-reads the balance every poll interval,
//! - a push listener that re-reads the balance on backend notifications.
//!
//! Every task also waits on the tracker's stop signal, so the whole group
//! winds down as soon as any trigger resolves the request. Dropping or
//! disarming the group aborts whatever is still running.

use super::coordinator::CoordinatorSettings;
use super::ports::{BalanceSource, BalanceSourceRef};
use super::tracker::{CheckOutcome, RequestTracker};
use crate::models::PushEvent;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinSet;
use tokio::time::{self, Instant, MissedTickBehavior};

pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Push,
    Poll,
    Manual,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Trigger::Push => "push",
            Trigger::Poll => "poll",
            Trigger::Manual => "manual",
        };
        f.write_str(name)
    }
}

pub struct DetectionGroup {
    tasks: JoinSet<()>,
}

impl DetectionGroup {
    pub fn arm(
        tracker: Arc<RequestTracker>,
        balance: BalanceSourceRef,
        events: broadcast::Receiver<PushEvent>,
        settings: &CoordinatorSettings,
    ) -> Self {
        let mut tasks = JoinSet::new();
        let threshold = settings.refresh_failure_warn_threshold;

        tasks.spawn(until_stopped(
            tracker.clone(),
            run_countdown(tracker.clone(), settings.request_ttl),
        ));
        tasks.spawn(until_stopped(
            tracker.clone(),
            run_poll(
                tracker.clone(),
                balance.clone(),
                settings.poll_interval,
                settings.poll_immediately,
                threshold,
            ),
        ));
        tasks.spawn(until_stopped(
            tracker.clone(),
            run_push(tracker, balance, events, threshold),
        ));

        Self { tasks }
    }

    /// Aborts every task in the group. Safe to call more than once.
    pub fn disarm(&mut self) {
        self.tasks.abort_all();
    }
}

async fn until_stopped<F>(tracker: Arc<RequestTracker>, work: F)
where
    F: Future<Output = ()>,
{
    tokio::select! {
        _ = tracker.stopped() => {}
        _ = work => {}
    }
}

async fn run_countdown(tracker: Arc<RequestTracker>, ttl: Duration) {
    let start = Instant::now();
    let deadline = start + ttl;
    let mut ticker = time::interval_at(start + COUNTDOWN_TICK, COUNTDOWN_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

    loop {
        ticker.tick().await;
        let remaining = deadline.saturating_duration_since(Instant::now());
        let seconds = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
        tracker.set_time_remaining(seconds);

        if seconds == 0 {
            if tracker.expire() {
                tracing::info!(request_id = %tracker.request_id(), "Payment request timed out");
            }
            return;
        }
    }
}

async fn run_poll(
    tracker: Arc<RequestTracker>,
    balance: BalanceSourceRef,
    period: Duration,
    immediately: bool,
    warn_threshold: u32,
) {
    let first = if immediately {
        Instant::now()
    } else {
        Instant::now() + period
    };
    let mut ticker = time::interval_at(first, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if check_once(&tracker, balance.as_ref(), Trigger::Poll, warn_threshold).await {
            return;
        }
    }
}

async fn run_push(
    tracker: Arc<RequestTracker>,
    balance: BalanceSourceRef,
    mut events: broadcast::Receiver<PushEvent>,
    warn_threshold: u32,
) {
    loop {
        match events.recv().await {
            Ok(event) if event.signals_balance_change() => {
                tracing::debug!(event = event.name(), "Balance change notification received");
                if check_once(&tracker, balance.as_ref(), Trigger::Push, warn_threshold).await {
                    return;
                }
            }
            Ok(PushEvent::PaymentFailed(notice)) => {
                let message = notice
                    .message
                    .unwrap_or_else(|| "Payment failed".to_string());
                tracing::warn!(request_id = %tracker.request_id(), "Payment failure reported: {}", message);
                tracker.record_payment_failure(message);
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Push listener lagged, checking balance");
                if check_once(&tracker, balance.as_ref(), Trigger::Push, warn_threshold).await {
                    return;
                }
            }
            Err(RecvError::Closed) => {
                tracing::debug!("Push channel closed, relying on polling");
                return;
            }
        }
    }
}

/// Refreshes the balance and runs the guarded confirmation once.
///
/// Returns `true` when the request is no longer pending and the caller's
/// loop should stop. Refresh failures are counted and skipped.
pub(crate) async fn check_once(
    tracker: &RequestTracker,
    balance: &dyn BalanceSource,
    trigger: Trigger,
    warn_threshold: u32,
) -> bool {
    if !tracker.is_pending() {
        return true;
    }

    match balance.refresh_balance().await {
        Ok(observed) => match tracker.confirm(observed) {
            CheckOutcome::Confirmed => {
                tracing::info!(%trigger, balance = %observed, "Payment detected");
                true
            }
            CheckOutcome::BelowTarget { observed, target } => {
                tracing::debug!(
                    %trigger,
                    balance = %observed,
                    expected = %target,
                    "Payment not received yet"
                );
                false
            }
            CheckOutcome::NotPending(_) => true,
        },
        Err(e) => {
            let failures = tracker.record_refresh_failure();
            if failures >= warn_threshold {
                tracing::warn!(%trigger, failures, "Balance refresh keeps failing: {}", e);
            } else {
                tracing::debug!(%trigger, failures, "Balance refresh failed, skipping check: {}", e);
            }
            !tracker.is_pending()
        }
    }
}

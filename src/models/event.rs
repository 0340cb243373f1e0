use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Notification pushed by the wallet backend.
///
/// None of the variants are guaranteed to carry the new balance, so every
/// confirming path re-reads the balance before deciding anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum PushEvent {
    #[serde(rename = "payment:completed")]
    PaymentCompleted(PaymentNotice),
    #[serde(rename = "balance:updated")]
    BalanceUpdated(BalanceNotice),
    #[serde(rename = "payment:failed")]
    PaymentFailed(FailureNotice),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentNotice {
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default, rename = "type")]
    pub direction: Option<String>,
    #[serde(default)]
    pub other_party: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceNotice {
    #[serde(default)]
    pub balance: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FailureNotice {
    #[serde(default)]
    pub message: Option<String>,
}

impl PushEvent {
    /// Whether the event may mean money arrived.
    pub fn signals_balance_change(&self) -> bool {
        matches!(
            self,
            PushEvent::PaymentCompleted(_) | PushEvent::BalanceUpdated(_)
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            PushEvent::PaymentCompleted(_) => "payment:completed",
            PushEvent::BalanceUpdated(_) => "balance:updated",
            PushEvent::PaymentFailed(_) => "payment:failed",
        }
    }
}

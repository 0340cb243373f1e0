use super::money::{Amount, Balance};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Succeeded,
    TimedOut,
    Cancelled,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

/// What the wallet backend hands back when it allocates a payment request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedRequest {
    pub request_id: String,
    #[serde(rename = "qrData")]
    pub qr_payload: String,
    #[serde(default)]
    pub payment_link: Option<String>,
}

/// One in-flight request for incoming funds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub request_id: String,
    pub amount: Amount,
    pub baseline_balance: Balance,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub qr_payload: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_link: Option<String>,
    /// Balance seen by the check that confirmed the payment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_balance: Option<Balance>,
}

impl PaymentRequest {
    pub fn new(
        issued: IssuedRequest,
        amount: Amount,
        baseline_balance: Balance,
        created_at: DateTime<Utc>,
        ttl: std::time::Duration,
    ) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::zero());
        Self {
            request_id: issued.request_id,
            amount,
            baseline_balance,
            status: RequestStatus::Pending,
            created_at,
            deadline: created_at + ttl,
            qr_payload: issued.qr_payload,
            payment_link: issued.payment_link,
            resolved_balance: None,
        }
    }

    /// Threshold confirmation: any balance at or above `baseline + amount`
    /// counts as paid, even if other credits landed in the meantime. A target
    /// past the representable range is never met.
    pub fn is_satisfied_by(&self, balance: Balance) -> bool {
        self.baseline_balance
            .target_for(self.amount)
            .is_some_and(|target| balance >= target)
    }
}

/// Emitted once when a request reaches a terminal status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub request_id: String,
    pub status: RequestStatus,
    pub amount: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_balance: Option<Balance>,
    pub resolved_at: DateTime<Utc>,
}

/// Snapshot published to whatever renders the request screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestView {
    pub request: Option<PaymentRequest>,
    pub time_remaining: u64,
    pub last_failure: Option<String>,
    pub refresh_failures: u32,
    pub updated_at: DateTime<Utc>,
}

impl RequestView {
    pub fn idle() -> Self {
        Self {
            request: None,
            time_remaining: 0,
            last_failure: None,
            refresh_failures: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn status(&self) -> Option<RequestStatus> {
        self.request.as_ref().map(|r| r.status)
    }

    /// `mm:ss` rendering of the countdown.
    pub fn formatted_time_remaining(&self) -> String {
        format!("{}:{:02}", self.time_remaining / 60, self.time_remaining % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn issued() -> IssuedRequest {
        IssuedRequest {
            request_id: "req-1".to_string(),
            qr_payload: "payband://pay/req-1".to_string(),
            payment_link: None,
        }
    }

    #[test]
    fn test_issued_request_wire_names() {
        let json = r#"{"requestId":"r9","qrData":"{\"id\":\"r9\"}","paymentLink":"https://pay/r9"}"#;
        let issued: IssuedRequest = serde_json::from_str(json).unwrap();
        assert_eq!(issued.request_id, "r9");
        assert_eq!(issued.qr_payload, "{\"id\":\"r9\"}");
        assert_eq!(issued.payment_link.as_deref(), Some("https://pay/r9"));

        let without_link: IssuedRequest =
            serde_json::from_str(r#"{"requestId":"r1","qrData":"x"}"#).unwrap();
        assert!(without_link.payment_link.is_none());
    }

    #[test]
    fn test_new_request_is_pending_with_deadline() {
        let now = Utc::now();
        let request = PaymentRequest::new(
            issued(),
            Amount::parse("50.00").unwrap(),
            Balance::new(dec!(200.00)),
            now,
            Duration::from_secs(120),
        );
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.deadline - now, chrono::Duration::seconds(120));
    }

    #[test]
    fn test_threshold_confirmation() {
        let request = PaymentRequest::new(
            issued(),
            Amount::parse("50.00").unwrap(),
            Balance::new(dec!(200.00)),
            Utc::now(),
            Duration::from_secs(120),
        );
        assert!(!request.is_satisfied_by(Balance::new(dec!(249.99))));
        assert!(request.is_satisfied_by(Balance::new(dec!(250.00))));
        assert!(request.is_satisfied_by(Balance::new(dec!(400.00))));
    }

    #[test]
    fn test_unrepresentable_target_is_never_met() {
        let request = PaymentRequest::new(
            issued(),
            Amount::parse("9999999999999.99").unwrap(),
            Balance::MAX,
            Utc::now(),
            Duration::from_secs(120),
        );
        assert!(!request.is_satisfied_by(Balance::MAX));
    }

    #[test]
    fn test_status_wire_format_and_terminality() {
        assert_eq!(
            serde_json::to_string(&RequestStatus::TimedOut).unwrap(),
            "\"timed_out\""
        );
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(RequestStatus::Succeeded.is_terminal());
        assert!(RequestStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_formatted_time_remaining() {
        let mut view = RequestView::idle();
        view.time_remaining = 120;
        assert_eq!(view.formatted_time_remaining(), "2:00");
        view.time_remaining = 65;
        assert_eq!(view.formatted_time_remaining(), "1:05");
        view.time_remaining = 9;
        assert_eq!(view.formatted_time_remaining(), "0:09");
    }
}

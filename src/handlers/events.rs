use super::AppState;
use crate::models::PushEvent;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct EventAccepted {
    pub event: &'static str,
    pub receivers: usize,
}

/// Webhook ingress for backend push notifications.
pub async fn receive_event(
    State(state): State<AppState>,
    Json(event): Json<PushEvent>,
) -> (StatusCode, Json<EventAccepted>) {
    let name = event.name();
    tracing::info!(event = name, "Push event received");
    let receivers = state.events.publish(event);
    (
        StatusCode::ACCEPTED,
        Json(EventAccepted {
            event: name,
            receivers,
        }),
    )
}

pub mod dashboard;
pub mod events;
pub mod health;
pub mod requests;
pub mod wallet;

pub use dashboard::*;
pub use events::*;
pub use health::*;
pub use requests::*;
pub use wallet::*;

use crate::services::{ports::HealthCheckRef, EventBus, RequestCoordinator, WalletService};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<RequestCoordinator>,
    pub events: EventBus,
    pub wallet: Arc<WalletService>,
    pub backend: HealthCheckRef,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        coordinator: Arc<RequestCoordinator>,
        events: EventBus,
        wallet: Arc<WalletService>,
        backend: HealthCheckRef,
    ) -> Self {
        Self {
            coordinator,
            events,
            wallet,
            backend,
            started_at: Instant::now(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/requests", post(open_request))
        .route(
            "/api/requests/current",
            get(current_request).delete(cancel_request),
        )
        .route("/api/requests/current/confirm", post(confirm_request))
        .route("/api/requests/current/reset", post(reset_request))
        .route("/api/wallet", get(wallet_summary))
        .route("/api/wallet/add-funds", post(add_funds))
        .route("/events", post(receive_event))
        .route("/ws/request", get(websocket_handler))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
}

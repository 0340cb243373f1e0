use super::AppState;
use crate::models::RequestView;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use tokio::sync::watch;

/// Streams the request view to the screen rendering it, one JSON message per
/// change, starting with the current state.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let views = state.coordinator.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, views))
}

async fn handle_socket(socket: WebSocket, mut views: watch::Receiver<RequestView>) {
    let (mut sender, mut receiver) = socket.split();

    let initial = views.borrow_and_update().clone();
    if send_view(&mut sender, &initial).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                if send_view(&mut sender, &view).await.is_err() {
                    break;
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    tracing::debug!("WebSocket connection closed");
}

async fn send_view(
    sender: &mut SplitSink<WebSocket, Message>,
    view: &RequestView,
) -> Result<(), axum::Error> {
    match serde_json::to_string(view) {
        Ok(msg) => sender.send(Message::Text(msg)).await,
        Err(e) => {
            tracing::warn!("Could not serialize request view: {}", e);
            Ok(())
        }
    }
}

//! WebSocket Handler - 投影推送

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::domain::Projection;
use crate::infrastructure::http::state::AppState;

/// 投影流 WebSocket
pub async fn projection_socket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_projection_socket(socket, state))
}

fn to_message(projection: &Projection) -> Option<Message> {
    match serde_json::to_string(projection) {
        Ok(json) => Some(Message::Text(json)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize projection");
            None
        }
    }
}

async fn handle_projection_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // 先订阅再取快照，避免两者之间的迁移丢失
    let mut projection_rx = state.publisher.subscribe();
    let snapshot = state.submitter.current();

    tracing::info!(token = snapshot.token, "Projection WebSocket connected");

    let mut forward_task = tokio::spawn(async move {
        if let Some(msg) = to_message(&snapshot) {
            if sender.send(msg).await.is_err() {
                return;
            }
        }

        loop {
            let projection = match projection_rx.recv().await {
                Ok(p) => p,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped = skipped, "Projection subscriber lagged");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let Some(msg) = to_message(&projection) else {
                continue;
            };
            if let Err(e) = sender.send(msg).await {
                tracing::debug!(error = %e, "Failed to send WebSocket message");
                break;
            }
        }
    });

    let mut receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!("Projection WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Projection WebSocket error");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut forward_task => receive_task.abort(),
        _ = &mut receive_task => forward_task.abort(),
    }

    tracing::info!("Projection WebSocket disconnected");
}

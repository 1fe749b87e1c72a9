// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Extension,
    },
    response::Response,
};
use futures::{Sink, SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::infrastructure::progress_hub::{HubMessage, ProgressHub};

/// `/ws` 进度推送通道
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Extension(hub): Extension<Arc<ProgressHub>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

async fn handle_socket(socket: WebSocket, hub: Arc<ProgressHub>) {
    let mut subscription = hub.subscribe();
    let id = subscription.id;
    let (mut sender, mut receiver) = socket.split();

    if send(&mut sender, &HubMessage::connected()).await.is_err() {
        hub.unsubscribe(id);
        return;
    }

    loop {
        tokio::select! {
            outgoing = subscription.receiver.recv() => {
                let Some(message) = outgoing else { break };
                if send(&mut sender, &message).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) if text.trim() == "ping" => {
                        if send(&mut sender, &HubMessage::Pong).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(subscriber = id, "WebSocket receive error: {}", e);
                        break;
                    }
                }
            }
        }
    }

    hub.unsubscribe(id);
    debug!(subscriber = id, "WebSocket connection closed");
}

async fn send<S>(sender: &mut S, message: &HubMessage) -> Result<(), ()>
where
    S: Sink<Message> + Unpin,
{
    let text = match serde_json::to_string(message) {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to serialise hub message: {}", e);
            return Ok(());
        }
    };
    sender.send(Message::Text(text.into())).await.map_err(|_| ())
}

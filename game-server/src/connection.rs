//! Per-connection plumbing, in place of the transport collaborator this
//! crate otherwise treats as out of scope: registers a freshly opened socket
//! as a new player in `"global"`, relays outbound envelopes from its send
//! sink onto the wire as JSON text frames, deserializes inbound frames into
//! the dispatcher, and runs disconnect cleanup once either side closes.
//!
//! The write side owns the socket for the life of the connection — the
//! "send-sink serialization" the engine relies on — by draining a private
//! mpsc channel that every handler reaches through [`crate::player::Player::send`].

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use protocol::Envelope;
use tokio::sync::mpsc;

use crate::dispatcher;
use crate::game;
use crate::ids::{self, UserId};
use crate::registry::AppState;

pub async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();

    let user_id: UserId = ids::new_user_id();
    game::register_new_connection(&state, user_id.clone(), tx).await;
    tracing::info!(%user_id, "player connected");

    let mut send_task = tokio::spawn(async move {
        while let Some(envelope) = rx.recv().await {
            let text = match serde_json::to_string(&envelope) {
                Ok(text) => text,
                Err(error) => {
                    tracing::error!(?error, "failed to serialize outbound envelope");
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let dispatch_state = Arc::clone(&state);
    let dispatch_user = user_id.clone();
    let mut receive_task = tokio::spawn(async move {
        while let Some(message) = receiver.next().await {
            match message {
                Ok(Message::Text(text)) => match serde_json::from_str::<Envelope>(&text) {
                    Ok(envelope) => dispatcher::dispatch(&dispatch_state, &dispatch_user, envelope).await,
                    Err(error) => {
                        tracing::debug!(?error, "ignoring malformed client message");
                    }
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {} // Ping/pong/binary frames carry nothing in this protocol.
                Err(_) => break,
            }
        }
    });

    // If either task runs to completion (read error, closed socket, or the
    // send sink dying because the game side dropped the player), abort the
    // other and fall through to cleanup.
    tokio::select! {
        _ = &mut send_task => receive_task.abort(),
        _ = &mut receive_task => send_task.abort(),
    }

    game::disconnect(&state, &user_id).await;
    tracing::info!(%user_id, "player disconnected");
}

//! Token stream endpoint
//!
//! Each WebSocket client sends one token per text frame. Tokens found in the
//! library are relayed to every other client; anything else is dropped.
//! Outbound, tokens that piled up while the client's writer was busy go out
//! together in one frame, newline-delimited.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use jukebox_common::protocol::join_batch;
use jukebox_common::Token;
use tracing::{debug, info, warn};

use crate::hub::ClientId;
use crate::AppState;

/// GET /ws
pub async fn stream_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let mut subscription = state.hub.join();
    let id = subscription.id();
    info!("Client {} connected ({} online)", id, state.hub.client_count());

    let (mut sink, mut stream) = socket.split();

    let mut writer = tokio::spawn(async move {
        while let Some(batch) = subscription.next_batch().await {
            if sink.send(Message::Text(join_batch(&batch))).await.is_err() {
                break;
            }
        }
    });

    let reader_state = state.clone();
    let mut reader = tokio::spawn(async move {
        while let Some(Ok(message)) = stream.next().await {
            match message {
                Message::Text(text) => relay(&reader_state, id, text),
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut writer => reader.abort(),
        _ = &mut reader => writer.abort(),
    }

    info!("Client {} disconnected", id);
}

fn relay(state: &AppState, from: ClientId, text: String) {
    let token = Token::from(text);
    if !state.library.contains_key(&token) {
        warn!("Rejected unknown token {:?} from client {}", token.as_str(), from);
        return;
    }

    let receivers = state.hub.publish(from, token.clone());
    debug!("Client {} sent '{}' ({} receivers)", from, token, receivers);
}

pub fn stream_routes() -> Router<AppState> {
    Router::new().route("/ws", get(stream_socket))
}

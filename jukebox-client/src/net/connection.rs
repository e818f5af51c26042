//! Streaming connection task
//!
//! Owns the WebSocket. Inbound text frames are forwarded to the session as
//! deliveries; tokens the session activates locally arrive on the outbound
//! channel and go out as one text frame each. Exactly one
//! `ConnectionClosed` is reported, whatever ends the connection.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

use crate::events::{CloseReason, EventSender, SessionEvent};

/// Connect to `url` and pump frames until either side ends
pub async fn run_connection(
    url: Url,
    events: EventSender,
    mut outbound: mpsc::UnboundedReceiver<String>,
) {
    info!("Connecting to {}", url);

    let socket = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((socket, _response)) => socket,
        Err(e) => {
            warn!("Connection to {} failed: {}", url, e);
            let _ = events.send(SessionEvent::ConnectionClosed(CloseReason::Error(e.to_string())));
            return;
        }
    };

    let _ = events.send(SessionEvent::ConnectionOpened);
    let (mut sink, mut stream) = socket.split();

    let reason = loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(payload))) => {
                    let _ = events.send(SessionEvent::TokenReceived(payload));
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!("Peer sent close: {:?}", frame);
                    break CloseReason::Normal;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => break CloseReason::Error(e.to_string()),
                None => break CloseReason::Normal,
            },
            token = outbound.recv() => match token {
                Some(token) => {
                    if let Err(e) = sink.send(Message::Text(token)).await {
                        break CloseReason::Error(e.to_string());
                    }
                }
                None => {
                    // Session is gone; nobody to report to
                    let _ = sink.send(Message::Close(None)).await;
                    break CloseReason::Normal;
                }
            },
        }
    };

    let _ = events.send(SessionEvent::ConnectionClosed(reason));
}

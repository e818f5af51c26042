//! Stream dispatcher
//!
//! Tracks the lifecycle of the streaming connection and routes tokens from
//! it (and from local activation) into the playback queue and transcript.
//!
//! **State machine:** `Connecting → Open → Closed`, or `Connecting → Closed`
//! when the connection never comes up. `Closed` is terminal.

use jukebox_common::protocol::split_delivery;
use jukebox_common::Token;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::events::CloseReason;
use crate::playback::PlaybackQueue;
use crate::transcript::Transcript;

/// Outbound half of the streaming connection
pub type OutboundSender = mpsc::UnboundedSender<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

#[derive(Debug)]
pub struct StreamDispatcher {
    state: ConnectionState,
    outbound: Option<OutboundSender>,
}

impl StreamDispatcher {
    /// Dispatcher for a connection that is being established.
    ///
    /// `outbound` is `None` when no connection task exists; activation then
    /// has nowhere to send and the dispatcher never opens.
    pub fn new(outbound: Option<OutboundSender>) -> Self {
        Self {
            state: ConnectionState::Connecting,
            outbound,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    pub fn is_closed(&self) -> bool {
        self.state == ConnectionState::Closed
    }

    /// Connection established
    pub fn on_open(&mut self, transcript: &mut Transcript) {
        match self.state {
            ConnectionState::Connecting => {
                info!("Streaming connection open");
                self.state = ConnectionState::Open;
                transcript.notice("connected");
            }
            state => debug!("Ignoring open while {:?}", state),
        }
    }

    /// One inbound delivery.
    ///
    /// Every newline-delimited piece is appended to the queue and the
    /// transcript in order, empty pieces included. Returns the number of
    /// tokens appended; zero unless the connection is open.
    pub fn on_delivery(
        &mut self,
        payload: &str,
        queue: &mut PlaybackQueue,
        transcript: &mut Transcript,
    ) -> usize {
        if !self.is_open() {
            debug!("Dropping delivery while {:?}: {:?}", self.state, payload);
            return 0;
        }

        let mut appended = 0;
        for token in split_delivery(payload) {
            transcript.inbound(&token);
            queue.append(token);
            appended += 1;
        }

        debug!("Delivery queued {} token(s)", appended);
        appended
    }

    /// Connection ended. Only the first close is recorded and logged.
    pub fn on_close(&mut self, reason: &CloseReason, transcript: &mut Transcript) {
        if self.is_closed() {
            debug!("Ignoring repeated close ({})", reason);
            return;
        }

        self.state = ConnectionState::Closed;
        self.outbound = None;

        match reason.to_error() {
            None => info!("Streaming connection closed"),
            Some(e) => warn!("{}", e),
        }
        transcript.notice(format!("connection closed ({})", reason));
    }

    /// Local activation of `token`.
    ///
    /// While open the token is queued locally, sent to the peer once and
    /// recorded. Otherwise nothing happens. Returns whether it was accepted.
    pub fn on_user_activation(
        &mut self,
        token: Token,
        queue: &mut PlaybackQueue,
        transcript: &mut Transcript,
    ) -> bool {
        if !self.is_open() {
            debug!("Ignoring activation of '{}' while {:?}", token, self.state);
            return false;
        }

        if let Some(outbound) = &self.outbound {
            if outbound.send(token.as_str().to_string()).is_err() {
                warn!("Connection task gone; '{}' not sent", token);
            }
        }

        transcript.outbound(&token);
        queue.append(token);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::EntryKind;

    fn open_dispatcher() -> (StreamDispatcher, mpsc::UnboundedReceiver<String>, Transcript) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut transcript = Transcript::new();
        let mut dispatcher = StreamDispatcher::new(Some(tx));
        dispatcher.on_open(&mut transcript);
        (dispatcher, rx, transcript)
    }

    #[test]
    fn test_delivery_before_open_is_dropped() {
        let mut dispatcher = StreamDispatcher::new(None);
        let mut queue = PlaybackQueue::new();
        let mut transcript = Transcript::new();

        assert_eq!(dispatcher.on_delivery("bell", &mut queue, &mut transcript), 0);
        assert!(queue.is_empty());
        assert!(transcript.is_empty());
    }

    #[test]
    fn test_delivery_splits_and_keeps_empty_pieces() {
        let (mut dispatcher, _rx, mut transcript) = open_dispatcher();
        let mut queue = PlaybackQueue::new();
        let before = transcript.len();

        let appended = dispatcher.on_delivery("bell\n\nchime\r", &mut queue, &mut transcript);

        assert_eq!(appended, 3);
        let queued: Vec<&str> = queue.iter().map(Token::as_str).collect();
        assert_eq!(queued, vec!["bell", "", "chime\r"]);
        assert_eq!(transcript.len() - before, 3);
    }

    #[test]
    fn test_close_recorded_once() {
        let (mut dispatcher, _rx, mut transcript) = open_dispatcher();
        let before = transcript.len();

        dispatcher.on_close(&CloseReason::Normal, &mut transcript);
        dispatcher.on_close(&CloseReason::Error("reset".into()), &mut transcript);

        assert!(dispatcher.is_closed());
        assert_eq!(transcript.len() - before, 1);
        assert!(matches!(
            &transcript.entries()[before].kind,
            EntryKind::Notice(text) if text.contains("closed by peer")
        ));
    }

    #[test]
    fn test_open_after_close_stays_closed() {
        let mut dispatcher = StreamDispatcher::new(None);
        let mut transcript = Transcript::new();

        dispatcher.on_close(&CloseReason::Unsupported("no ws".into()), &mut transcript);
        dispatcher.on_open(&mut transcript);

        assert_eq!(dispatcher.state(), ConnectionState::Closed);
    }

    #[test]
    fn test_activation_while_open_sends_once() {
        let (mut dispatcher, mut rx, mut transcript) = open_dispatcher();
        let mut queue = PlaybackQueue::new();

        assert!(dispatcher.on_user_activation(Token::from("bell"), &mut queue, &mut transcript));

        assert_eq!(rx.try_recv().unwrap(), "bell");
        assert!(rx.try_recv().is_err());
        assert_eq!(queue.len(), 1);
        assert!(matches!(
            transcript.entries().last().map(|e| &e.kind),
            Some(EntryKind::Outbound(t)) if t.as_str() == "bell"
        ));
    }

    #[test]
    fn test_activation_while_closed_is_noop() {
        let (mut dispatcher, mut rx, mut transcript) = open_dispatcher();
        let mut queue = PlaybackQueue::new();
        dispatcher.on_close(&CloseReason::Normal, &mut transcript);
        let before = transcript.len();

        assert!(!dispatcher.on_user_activation(Token::from("bell"), &mut queue, &mut transcript));

        assert!(queue.is_empty());
        assert!(rx.try_recv().is_err());
        assert_eq!(transcript.len(), before);
    }
}

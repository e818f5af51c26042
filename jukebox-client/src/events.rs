//! Session events
//!
//! Every asynchronous source (manifest fetch, streaming connection, stdin,
//! clip loaders, audio callback) talks to the session through one unbounded
//! MPSC channel of [`SessionEvent`]s. The session handles them one at a time,
//! each to completion, so no session state is shared between threads.

use std::fmt;

use jukebox_common::{Manifest, Token};
use tokio::sync::mpsc;

use crate::error::Error;

/// Identifies one play request
///
/// Completion events carry the id of the request they belong to, so a late
/// completion can never clear a newer current track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlaybackId(pub u64);

impl fmt::Display for PlaybackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why the streaming connection ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Peer closed the connection or the stream ended
    Normal,
    /// Transport or protocol error
    Error(String),
    /// No usable streaming endpoint in this environment
    Unsupported(String),
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::Normal => f.write_str("closed by peer"),
            CloseReason::Error(e) => write!(f, "error: {}", e),
            CloseReason::Unsupported(e) => write!(f, "unsupported: {}", e),
        }
    }
}

impl CloseReason {
    /// The failure behind an abnormal close; `None` for a normal close
    pub fn to_error(&self) -> Option<Error> {
        match self {
            CloseReason::Normal => None,
            CloseReason::Error(e) => Some(Error::ConnectionClosed(e.clone())),
            CloseReason::Unsupported(e) => Some(Error::StreamUnsupported(e.clone())),
        }
    }
}

/// Events consumed by the session loop
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Manifest fetched and parsed
    ManifestLoaded(Manifest),

    /// Manifest request failed; the registry stays empty
    ManifestFailed(String),

    /// Streaming connection established
    ConnectionOpened,

    /// One inbound delivery, possibly several delimited tokens
    TokenReceived(String),

    /// Streaming connection ended (terminal)
    ConnectionClosed(CloseReason),

    /// First frame of a clip reached the output device
    PlaybackStarted(PlaybackId),

    /// Last frame of a clip reached the output device
    PlaybackEnded(PlaybackId),

    /// Clip could not be fetched, decoded or played
    PlaybackFailed { id: PlaybackId, reason: String },

    /// User activated a token locally
    UserActivated(Token),
}

/// Sending half handed to every event source
pub type EventSender = mpsc::UnboundedSender<SessionEvent>;

/// Receiving half owned by the session loop
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

/// Create the session event channel
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_reason_to_error() {
        assert!(CloseReason::Normal.to_error().is_none());
        assert!(matches!(
            CloseReason::Error("reset".into()).to_error(),
            Some(Error::ConnectionClosed(e)) if e == "reset"
        ));
        assert!(matches!(
            CloseReason::Unsupported("no ws".into()).to_error(),
            Some(Error::StreamUnsupported(e)) if e == "no ws"
        ));
    }
}

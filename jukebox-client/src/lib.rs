//! # Jukebox Client Library
//!
//! Plays sounds named by tokens arriving over a shared stream, one at a
//! time and in arrival order.
//!
//! **Architecture:** one [`session::Session`] task owns all playback state and
//! consumes [`events::SessionEvent`]s from the manifest fetch, the streaming
//! connection, local input and the audio backend.

pub mod audio;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod input;
pub mod net;
pub mod playback;
pub mod session;
pub mod transcript;

pub use error::{Error, Result};
pub use session::{Session, SessionSummary};

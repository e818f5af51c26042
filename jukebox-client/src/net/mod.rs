//! Network tasks feeding the session
//!
//! Each task runs independently and reports only through the session event
//! channel; none of them touch session state.

pub mod connection;
pub mod manifest;

pub use connection::run_connection;
pub use manifest::{fetch_manifest, load_manifest};

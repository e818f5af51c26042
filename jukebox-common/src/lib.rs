//! # Jukebox Common Library
//!
//! Shared code for the jukebox client and relay server:
//! - Token and manifest types
//! - Wire framing for the token stream
//! - Configuration loading (TOML bootstrap + defaults)
//! - Common error type

pub mod config;
pub mod error;
pub mod protocol;

pub use error::{Error, Result};
pub use protocol::{Manifest, Token};

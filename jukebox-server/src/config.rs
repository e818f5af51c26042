//! Configuration for the relay server
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (`--port`, `--library`, `--sounds`)
//! 2. Environment variables (`JUKEBOX_PORT`, `JUKEBOX_SOUNDS`)
//! 3. TOML configuration file (`--config` or `<config dir>/jukebox/server.toml`)
//! 4. Built-in defaults

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use jukebox_common::config::LoggingConfig;
use jukebox_common::{Error, Result};
use serde::Deserialize;

/// Config file stem under the platform config dir
pub const MODULE_NAME: &str = "server";

/// Command-line arguments for jukebox-server
#[derive(Parser, Debug, Default)]
#[command(name = "jukebox-server")]
#[command(about = "Serves the sound library and relays tokens between clients")]
#[command(version)]
pub struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Port to listen on (keeps the configured bind address)
    #[arg(short, long, env = "JUKEBOX_PORT")]
    pub port: Option<u16>,

    /// Library file mapping tokens to sound URLs
    #[arg(short, long)]
    pub library: Option<PathBuf>,

    /// Directory served under /sounds
    #[arg(short, long, env = "JUKEBOX_SOUNDS")]
    pub sounds: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Server configuration as read from TOML
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub library_path: PathBuf,
    pub sounds_dir: PathBuf,
    pub broadcast_capacity: usize,
    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            library_path: PathBuf::from("sounds.json"),
            sounds_dir: PathBuf::from("sounds"),
            broadcast_capacity: 256,
            logging: LoggingConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from `--config` or the default location, then apply flags
    pub fn load(args: &Args) -> Result<Self> {
        let config: Self = jukebox_common::config::load_config(args.config.as_deref(), MODULE_NAME)?;
        Ok(config.apply_args(args))
    }

    pub fn apply_args(mut self, args: &Args) -> Self {
        if let Some(library) = &args.library {
            self.library_path = library.clone();
        }
        if let Some(sounds) = &args.sounds {
            self.sounds_dir = sounds.clone();
        }
        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
        }
        if let Some(port) = args.port {
            // Port flag wins over the configured one, address is kept
            let host = match self.bind_addr.rsplit_once(':') {
                Some((host, _)) => host.to_string(),
                None => self.bind_addr.clone(),
            };
            self.bind_addr = format!("{}:{}", host, port);
        }
        self
    }

    /// Parsed listen address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind_addr
            .parse()
            .map_err(|e| Error::Config(format!("invalid bind_addr '{}': {}", self.bind_addr, e)))
    }
}

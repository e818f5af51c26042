//! Configuration for the jukebox client
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (`--server`, `--stream`, ...)
//! 2. Environment variables (`JUKEBOX_SERVER`, `JUKEBOX_STREAM`)
//! 3. TOML configuration file (`--config` or `<config dir>/jukebox/client.toml`)
//! 4. Built-in defaults
//!
//! [`ClientConfig`] is the raw, serde-facing form. [`ClientConfig::into_settings`]
//! validates it into [`Settings`], which the rest of the client consumes.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use jukebox_common::config::LoggingConfig;
use jukebox_common::protocol::{is_stream_url, stream_url};
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::session::SessionConfig;

/// Config file stem under the platform config dir
pub const MODULE_NAME: &str = "client";

/// Command-line arguments for the jukebox client
#[derive(Parser, Debug, Default)]
#[command(name = "jukebox")]
#[command(about = "Plays sounds requested over a shared token stream")]
#[command(version)]
pub struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Base URL of the jukebox server
    #[arg(short, long, env = "JUKEBOX_SERVER")]
    pub server: Option<String>,

    /// Streaming endpoint (default: derived from the server URL)
    #[arg(long, env = "JUKEBOX_STREAM")]
    pub stream: Option<String>,

    /// Milliseconds between queue drain checks
    #[arg(long)]
    pub drain_interval_ms: Option<u64>,

    /// Fetch clips on first play instead of when the manifest arrives
    #[arg(long)]
    pub no_preload: bool,

    /// Master volume (0.0-1.0)
    #[arg(long)]
    pub volume: Option<f32>,

    /// Output device name
    #[arg(short, long)]
    pub device: Option<String>,

    /// Do not connect to the token stream
    #[arg(long)]
    pub no_stream: bool,

    /// List output devices and exit
    #[arg(long)]
    pub list_devices: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Client configuration as read from TOML
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
    pub stream_url: Option<String>,
    pub drain_interval_ms: u64,
    pub preload: bool,
    pub volume: f32,
    pub audio_device: Option<String>,
    pub stream_enabled: bool,
    pub logging: LoggingConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080/".to_string(),
            stream_url: None,
            drain_interval_ms: 100,
            preload: true,
            volume: 1.0,
            audio_device: None,
            stream_enabled: true,
            logging: LoggingConfig::default(),
        }
    }
}

/// Where the token stream comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamTarget {
    Connect(Url),
    /// No usable streaming endpoint; the reason is reported once
    Unsupported(String),
}

/// Output device selection
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSettings {
    pub device: Option<String>,
    pub volume: f32,
}

/// Validated client settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub server_url: Url,
    pub stream: StreamTarget,
    pub drain_interval: Duration,
    pub preload: bool,
    pub audio: AudioSettings,
}

impl Settings {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            base_url: self.server_url.clone(),
            drain_interval: self.drain_interval,
            preload: self.preload,
        }
    }
}

impl ClientConfig {
    /// Load from `--config` or the default location
    pub fn load(args: &Args) -> Result<Self> {
        let config: Self = jukebox_common::config::load_config(args.config.as_deref(), MODULE_NAME)?;
        Ok(config.apply_args(args))
    }

    /// Overlay command-line values
    pub fn apply_args(mut self, args: &Args) -> Self {
        if let Some(server) = &args.server {
            self.server_url = server.clone();
        }
        if let Some(stream) = &args.stream {
            self.stream_url = Some(stream.clone());
        }
        if let Some(ms) = args.drain_interval_ms {
            self.drain_interval_ms = ms;
        }
        if args.no_preload {
            self.preload = false;
        }
        if let Some(volume) = args.volume {
            self.volume = volume;
        }
        if let Some(device) = &args.device {
            self.audio_device = Some(device.clone());
        }
        if args.no_stream {
            self.stream_enabled = false;
        }
        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
        }
        self
    }

    /// Validate into typed settings
    ///
    /// A stream endpoint that cannot carry the token stream is not an
    /// error; it yields [`StreamTarget::Unsupported`].
    pub fn into_settings(self) -> Result<Settings> {
        let server_url = Url::parse(&self.server_url)
            .map_err(|e| Error::Config(format!("Invalid server URL '{}': {}", self.server_url, e)))?;

        if self.drain_interval_ms == 0 {
            return Err(Error::Config("drain_interval_ms must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(Error::Config(format!(
                "volume must be between 0.0 and 1.0, got {}",
                self.volume
            )));
        }

        let stream = if !self.stream_enabled {
            StreamTarget::Unsupported("streaming disabled".to_string())
        } else {
            match &self.stream_url {
                Some(raw) => match Url::parse(raw) {
                    Ok(url) if is_stream_url(&url) => StreamTarget::Connect(url),
                    Ok(url) => StreamTarget::Unsupported(format!("'{}' is not a ws:// or wss:// URL", url)),
                    Err(e) => StreamTarget::Unsupported(format!("invalid stream URL '{}': {}", raw, e)),
                },
                None => match stream_url(&server_url) {
                    Ok(url) => StreamTarget::Connect(url),
                    Err(e) => StreamTarget::Unsupported(e.to_string()),
                },
            }
        };

        Ok(Settings {
            server_url,
            stream,
            drain_interval: Duration::from_millis(self.drain_interval_ms),
            preload: self.preload,
            audio: AudioSettings {
                device: self.audio_device,
                volume: self.volume,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ClientConfig::default().into_settings().unwrap();

        assert_eq!(settings.server_url.as_str(), "http://127.0.0.1:8080/");
        assert_eq!(
            settings.stream,
            StreamTarget::Connect(Url::parse("ws://127.0.0.1:8080/ws").unwrap())
        );
        assert_eq!(settings.drain_interval, Duration::from_millis(100));
        assert!(settings.preload);
        assert_eq!(settings.audio.volume, 1.0);
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            server_url = "https://sounds.example.com/room/"
            drain_interval_ms = 250

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.drain_interval_ms, 250);
        assert_eq!(config.logging.level, "debug");
        assert!(config.preload);

        let settings = config.into_settings().unwrap();
        assert_eq!(
            settings.stream,
            StreamTarget::Connect(Url::parse("wss://sounds.example.com/room/ws").unwrap())
        );
    }

    #[test]
    fn test_args_override_config() {
        let args = Args::try_parse_from([
            "jukebox",
            "--server",
            "http://10.0.0.5:9000",
            "--drain-interval-ms",
            "50",
            "--no-preload",
            "--volume",
            "0.5",
            "--device",
            "USB Audio",
        ])
        .unwrap();

        let settings = ClientConfig::default().apply_args(&args).into_settings().unwrap();

        assert_eq!(settings.server_url.as_str(), "http://10.0.0.5:9000/");
        assert_eq!(settings.drain_interval, Duration::from_millis(50));
        assert!(!settings.preload);
        assert_eq!(settings.audio.device.as_deref(), Some("USB Audio"));
        assert_eq!(settings.audio.volume, 0.5);
    }

    #[test]
    fn test_non_ws_stream_is_unsupported() {
        let config = ClientConfig {
            stream_url: Some("http://127.0.0.1:8080/ws".to_string()),
            ..Default::default()
        };

        let settings = config.into_settings().unwrap();
        assert!(matches!(settings.stream, StreamTarget::Unsupported(_)));
    }

    #[test]
    fn test_stream_disabled_is_unsupported() {
        let args = Args::try_parse_from(["jukebox", "--no-stream"]).unwrap();
        let settings = ClientConfig::default().apply_args(&args).into_settings().unwrap();

        assert_eq!(
            settings.stream,
            StreamTarget::Unsupported("streaming disabled".to_string())
        );
    }

    #[test]
    fn test_invalid_server_url_is_error() {
        let config = ClientConfig {
            server_url: "not a url".to_string(),
            ..Default::default()
        };

        assert!(matches!(config.into_settings(), Err(Error::Config(_))));
    }

    #[test]
    fn test_out_of_range_volume_is_error() {
        let config = ClientConfig {
            volume: 1.5,
            ..Default::default()
        };

        assert!(matches!(config.into_settings(), Err(Error::Config(_))));
    }
}

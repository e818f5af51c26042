//! Client configuration tests
//!
//! Tests that touch `JUKEBOX_*` environment variables run serially.

use std::time::Duration;

use clap::Parser;
use jukebox_client::config::{Args, ClientConfig, StreamTarget};
use serial_test::serial;
use url::Url;

fn clear_env() {
    std::env::remove_var("JUKEBOX_SERVER");
    std::env::remove_var("JUKEBOX_STREAM");
}

#[test]
#[serial]
fn test_config_file_then_flags() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("client.toml");
    std::fs::write(
        &path,
        r#"
        server_url = "http://sounds.lan:8080/"
        volume = 0.25
        preload = false
        "#,
    )
    .unwrap();

    let args = Args::try_parse_from([
        "jukebox",
        "--config",
        path.to_str().unwrap(),
        "--volume",
        "0.75",
    ])
    .unwrap();
    let settings = ClientConfig::load(&args).unwrap().into_settings().unwrap();

    assert_eq!(settings.server_url.as_str(), "http://sounds.lan:8080/");
    assert_eq!(settings.audio.volume, 0.75);
    assert!(!settings.preload);
    assert_eq!(settings.drain_interval, Duration::from_millis(100));
}

#[test]
#[serial]
fn test_env_supplies_server_and_stream() {
    clear_env();
    std::env::set_var("JUKEBOX_SERVER", "http://10.1.1.1:8080/");
    std::env::set_var("JUKEBOX_STREAM", "ws://10.1.1.2:9001/tokens");

    let args = Args::try_parse_from(["jukebox"]).unwrap();
    let settings = ClientConfig::default().apply_args(&args).into_settings().unwrap();
    clear_env();

    assert_eq!(settings.server_url.as_str(), "http://10.1.1.1:8080/");
    assert_eq!(
        settings.stream,
        StreamTarget::Connect(Url::parse("ws://10.1.1.2:9001/tokens").unwrap())
    );
}

#[test]
#[serial]
fn test_flag_beats_env() {
    clear_env();
    std::env::set_var("JUKEBOX_SERVER", "http://10.1.1.1:8080/");

    let args = Args::try_parse_from(["jukebox", "--server", "http://127.0.0.1:9999/"]).unwrap();
    clear_env();

    assert_eq!(args.server.as_deref(), Some("http://127.0.0.1:9999/"));
}

#[test]
#[serial]
fn test_missing_explicit_config_is_error() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let args = Args::try_parse_from([
        "jukebox",
        "--config",
        dir.path().join("absent.toml").to_str().unwrap(),
    ])
    .unwrap();

    assert!(ClientConfig::load(&args).is_err());
}

//! Configuration loading tests
//!
//! - Explicit config path must exist
//! - Malformed TOML is an error, not a silent fallback
//! - Missing sections fall back to serde defaults

use std::io::Write;

use jukebox_common::config::{load_config, LoggingConfig};
use jukebox_common::Error;
use serde::Deserialize;
use tempfile::NamedTempFile;

#[derive(Debug, Deserialize, PartialEq)]
struct TestConfig {
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    logging: LoggingConfig,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_port() -> u16 {
    8080
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_explicit_file_is_parsed() {
    let file = write_config("port = 9000\n[logging]\nlevel = \"debug\"\n");

    let config: TestConfig = load_config(Some(file.path()), "test-module").unwrap();

    assert_eq!(config.port, 9000);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_missing_sections_use_defaults() {
    let file = write_config("");

    let config: TestConfig = load_config(Some(file.path()), "test-module").unwrap();

    assert_eq!(config, TestConfig::default());
}

#[test]
fn test_explicit_missing_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let result: Result<TestConfig, Error> = load_config(Some(&path), "test-module");

    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_malformed_file_is_error() {
    let file = write_config("port = \"not a number\"");

    let result: Result<TestConfig, Error> = load_config(Some(file.path()), "test-module");

    match result {
        Err(Error::Config(msg)) => assert!(msg.contains("failed to parse")),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
fn test_no_explicit_file_never_fails_for_unknown_module() {
    // No file exists for this module name in any user config dir
    let config: TestConfig =
        load_config(None, "jukebox-test-module-that-does-not-exist").unwrap();
    assert_eq!(config, TestConfig::default());
}

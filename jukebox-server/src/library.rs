//! Sound library loading
//!
//! The library is a JSON object mapping each token to the URL its sound is
//! served from, usually a path under `/sounds/`:
//!
//! ```json
//! { "bell": "/sounds/bell.mp3", "chime": "/sounds/chime.ogg" }
//! ```

use std::path::Path;

use jukebox_common::protocol::parse_manifest;
use jukebox_common::{Error, Manifest, Result};
use tracing::{info, warn};

/// Read the library file
pub fn load_library(path: &Path) -> Result<Manifest> {
    let body = std::fs::read(path).map_err(|e| {
        Error::Config(format!("cannot read library {}: {}", path.display(), e))
    })?;
    let library = parse_manifest(&body)?;

    if library.is_empty() {
        warn!("Library {} is empty", path.display());
    } else {
        info!("Loaded {} sounds from {}", library.len(), path.display());
    }
    Ok(library)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_library() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sounds.json");
        std::fs::write(&path, r#"{"bell": "/sounds/bell.mp3", "gong": "/sounds/gong.wav"}"#).unwrap();

        let library = load_library(&path).unwrap();
        assert_eq!(library.len(), 2);
        assert_eq!(library.get("gong").map(String::as_str), Some("/sounds/gong.wav"));
    }

    #[test]
    fn test_missing_library_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_library(&dir.path().join("nope.json"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_malformed_library() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sounds.json");
        std::fs::write(&path, r#"{"bell": 7}"#).unwrap();

        assert!(matches!(load_library(&path), Err(Error::Manifest(_))));
    }
}

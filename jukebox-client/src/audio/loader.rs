//! Clip fetching and the per-asset clip slot
//!
//! Each asset owns one [`ClipSlot`]. The slot is filled at most once, by
//! whichever comes first: the background preload started when the manifest
//! arrives, or the first play request. A failed load leaves the slot empty so
//! a later play request retries.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info};
use url::Url;

use crate::audio::decoder::ClipDecoder;
use crate::audio::resampler::Resampler;
use crate::audio::types::Clip;
use crate::error::{Error, Result};

/// Lazily-filled decoded clip for one asset
#[derive(Debug, Default)]
pub struct ClipSlot {
    cell: OnceCell<Arc<Clip>>,
}

impl ClipSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clip if already loaded
    pub fn get(&self) -> Option<Arc<Clip>> {
        self.cell.get().cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// Return the loaded clip, loading it first if needed.
    ///
    /// Concurrent callers share one load.
    pub async fn get_or_load(&self, loader: &ClipLoader, url: &Url) -> Result<Arc<Clip>> {
        self.cell
            .get_or_try_init(|| async { loader.load(url).await.map(Arc::new) })
            .await
            .cloned()
    }
}

/// Fetches and decodes clips for a fixed output sample rate
#[derive(Debug, Clone)]
pub struct ClipLoader {
    http: reqwest::Client,
    output_rate: u32,
}

impl ClipLoader {
    pub fn new(http: reqwest::Client, output_rate: u32) -> Self {
        Self { http, output_rate }
    }

    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    /// Fetch, decode and resample one clip.
    ///
    /// `http(s)` URLs are fetched with reqwest; `file` URLs are read from disk.
    pub async fn load(&self, url: &Url) -> Result<Clip> {
        let bytes = self.fetch(url).await?;
        let extension = Path::new(url.path())
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_string);
        let output_rate = self.output_rate;

        debug!("Decoding {} ({} bytes)", url, bytes.len());

        let clip = tokio::task::spawn_blocking(move || {
            let clip = ClipDecoder::decode(bytes, extension.as_deref())?;
            Resampler::to_rate(clip, output_rate)
        })
        .await
        .map_err(|e| Error::Decode(format!("Decode task failed: {}", e)))??;

        info!("Loaded clip {} ({}ms)", url, clip.duration_ms());
        Ok(clip)
    }

    async fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| Error::Decode(format!("Invalid file URL: {}", url)))?;
                Ok(tokio::fs::read(path).await?)
            }
            "http" | "https" => {
                let response = self.http.get(url.clone()).send().await?.error_for_status()?;
                Ok(response.bytes().await?.to_vec())
            }
            other => Err(Error::Decode(format!(
                "Unsupported clip URL scheme '{}': {}",
                other, url
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::decoder::tests::wav_bytes;

    fn file_url(path: &Path) -> Url {
        Url::from_file_path(path).unwrap()
    }

    #[tokio::test]
    async fn test_load_file_url_resamples_to_output_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bell.wav");
        std::fs::write(&path, wav_bytes(22050, 1, &vec![0i16; 2205])).unwrap();

        let loader = ClipLoader::new(reqwest::Client::new(), 44100);
        let clip = loader.load(&file_url(&path)).await.unwrap();

        assert_eq!(clip.sample_rate, 44100);
        assert!(clip.frame_count() > 4000);
    }

    #[tokio::test]
    async fn test_slot_loads_once_and_caches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chime.wav");
        std::fs::write(&path, wav_bytes(44100, 2, &vec![0i16; 200])).unwrap();

        let loader = ClipLoader::new(reqwest::Client::new(), 44100);
        let slot = ClipSlot::new();
        let url = file_url(&path);
        assert!(!slot.is_loaded());

        let first = slot.get_or_load(&loader, &url).await.unwrap();

        // Removing the file proves the second call does not reload
        std::fs::remove_file(&path).unwrap();
        let second = slot.get_or_load(&loader, &url).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(slot.get().is_some());
    }

    #[tokio::test]
    async fn test_failed_load_leaves_slot_empty() {
        let dir = tempfile::tempdir().unwrap();
        let url = file_url(&dir.path().join("missing.wav"));

        let loader = ClipLoader::new(reqwest::Client::new(), 44100);
        let slot = ClipSlot::new();

        assert!(slot.get_or_load(&loader, &url).await.is_err());
        assert!(!slot.is_loaded());
    }

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let loader = ClipLoader::new(reqwest::Client::new(), 44100);
        let url = Url::parse("ftp://example.com/bell.mp3").unwrap();

        assert!(matches!(loader.load(&url).await, Err(Error::Decode(_))));
    }
}

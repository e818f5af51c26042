//! Manifest fetch
//!
//! One GET per session. There is no retry: a failure leaves the registry
//! empty for the rest of the session.

use jukebox_common::protocol::{manifest_url, parse_manifest};
use jukebox_common::Manifest;
use tracing::{debug, info};
use url::Url;

use crate::error::{Error, Result};
use crate::events::{EventSender, SessionEvent};

/// Fetch and parse the manifest from `server`
pub async fn fetch_manifest(http: &reqwest::Client, server: &Url) -> Result<Manifest> {
    let url = manifest_url(server)?;
    debug!("Fetching manifest from {}", url);

    let response = http
        .get(url.clone())
        .send()
        .await
        .map_err(|e| Error::ManifestFetch(format!("{}: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::ManifestFetch(format!("{} returned {}", url, status)));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| Error::ManifestFetch(format!("{}: {}", url, e)))?;

    let manifest = parse_manifest(&body)?;
    info!("Manifest lists {} sounds", manifest.len());
    Ok(manifest)
}

/// Fetch the manifest and report the outcome to the session
pub async fn load_manifest(http: reqwest::Client, server: Url, events: EventSender) {
    let event = match fetch_manifest(&http, &server).await {
        Ok(manifest) => SessionEvent::ManifestLoaded(manifest),
        Err(e) => SessionEvent::ManifestFailed(e.to_string()),
    };
    let _ = events.send(event);
}

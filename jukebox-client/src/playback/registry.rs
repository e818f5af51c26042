//! Asset registry
//!
//! Maps each token from the manifest to its [`AudioAsset`]. The registry is
//! populated at most once per session; until the manifest request settles
//! every lookup answers [`Lookup::Pending`].

use std::collections::HashMap;
use std::sync::Arc;

use jukebox_common::{Manifest, Token};
use tracing::{debug, info, warn};
use url::Url;

use crate::audio::ClipSlot;

/// Playback state of a single asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetState {
    Idle,
    Playing,
}

/// A playable sound bound to a token
#[derive(Debug)]
pub struct AudioAsset {
    token: Token,
    url: Url,
    preload: bool,
    state: AssetState,
    clip: Arc<ClipSlot>,
}

impl AudioAsset {
    pub fn new(token: Token, url: Url, preload: bool) -> Self {
        Self {
            token,
            url,
            preload,
            state: AssetState::Idle,
            clip: Arc::new(ClipSlot::new()),
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn preload(&self) -> bool {
        self.preload
    }

    pub fn state(&self) -> AssetState {
        self.state
    }

    /// Shared handle to the decoded clip cache
    pub fn clip_slot(&self) -> Arc<ClipSlot> {
        Arc::clone(&self.clip)
    }
}

/// Manifest load status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryStatus {
    /// Manifest request still outstanding
    Pending,
    Loaded,
    /// Manifest request failed; registry stays empty for the session
    Failed,
}

/// Result of resolving a token
#[derive(Debug)]
pub enum Lookup<'a> {
    Found(&'a AudioAsset),
    /// Manifest not loaded yet; ask again later
    Pending,
    NotFound,
}

#[derive(Debug)]
pub struct AssetRegistry {
    assets: HashMap<Token, AudioAsset>,
    status: RegistryStatus,
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self {
            assets: HashMap::new(),
            status: RegistryStatus::Pending,
        }
    }

    pub fn status(&self) -> RegistryStatus {
        self.status
    }

    /// Build one asset per manifest entry.
    ///
    /// Relative URLs resolve against `base`. Entries whose URL cannot be
    /// resolved are skipped. Only the first call populates the registry;
    /// returns the number of assets created.
    pub fn populate(&mut self, manifest: &Manifest, base: &Url, preload: bool) -> usize {
        if self.status != RegistryStatus::Pending {
            warn!("Ignoring manifest: registry already {:?}", self.status);
            return 0;
        }

        for (token, location) in manifest {
            match base.join(location) {
                Ok(url) => {
                    debug!("Registered '{}' -> {}", token, url);
                    self.assets
                        .insert(token.clone(), AudioAsset::new(token.clone(), url, preload));
                }
                Err(e) => {
                    warn!("Skipping '{}': cannot resolve '{}': {}", token, location, e);
                }
            }
        }

        self.status = RegistryStatus::Loaded;
        info!("Asset registry loaded with {} assets", self.assets.len());
        self.assets.len()
    }

    /// Manifest request failed; the registry stays empty
    pub fn mark_failed(&mut self) {
        if self.status == RegistryStatus::Pending {
            self.status = RegistryStatus::Failed;
        }
    }

    pub fn lookup(&self, token: &str) -> Lookup<'_> {
        match self.assets.get(token) {
            Some(asset) => Lookup::Found(asset),
            None if self.status == RegistryStatus::Pending => Lookup::Pending,
            None => Lookup::NotFound,
        }
    }

    pub fn get(&self, token: &str) -> Option<&AudioAsset> {
        self.assets.get(token)
    }

    pub fn set_state(&mut self, token: &str, state: AssetState) {
        if let Some(asset) = self.assets.get_mut(token) {
            asset.state = state;
        }
    }

    /// Assets marked for preloading
    pub fn preloadable(&self) -> impl Iterator<Item = &AudioAsset> {
        self.assets.values().filter(|a| a.preload)
    }

    /// Registered tokens in sorted order
    pub fn tokens(&self) -> Vec<&Token> {
        let mut tokens: Vec<&Token> = self.assets.keys().collect();
        tokens.sort();
        tokens
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

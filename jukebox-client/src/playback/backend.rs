//! Seam between the session and whatever produces sound

use crate::error::Result;
use crate::events::PlaybackId;
use crate::playback::registry::AudioAsset;

/// Something that can play audio assets
///
/// Implementations report progress asynchronously through the session event
/// channel: `PlaybackStarted(id)` once audible, `PlaybackEnded(id)` once
/// finished, `PlaybackFailed { id, .. }` if the clip never plays. An `Err`
/// from [`play`](PlaybackBackend::play) means nothing was started and no
/// event for `id` will follow.
pub trait PlaybackBackend: Send {
    /// Begin fetching and decoding ahead of the first play
    fn preload(&mut self, asset: &AudioAsset);

    /// Start playing `asset` under `id`
    fn play(&mut self, id: PlaybackId, asset: &AudioAsset) -> Result<()>;
}

//! Asset registry, pending queue and the playback backend seam

pub mod backend;
pub mod queue;
pub mod registry;

pub use backend::PlaybackBackend;
pub use queue::PlaybackQueue;
pub use registry::{AssetRegistry, AssetState, AudioAsset, Lookup, RegistryStatus};

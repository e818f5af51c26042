//! Audio layer: clip loading, decoding and device output
//!
//! **Pipeline:** HTTP/file bytes → symphonia decode → rubato resample to the
//! device rate → cpal output stream on a dedicated thread.

pub mod decoder;
pub mod loader;
pub mod output;
pub mod player;
pub mod resampler;
pub mod types;

pub use loader::{ClipLoader, ClipSlot};
pub use output::AudioOutput;
pub use player::AudioPlayer;
pub use types::{AudioFrame, Clip};

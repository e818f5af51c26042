//! Core audio data types

/// Decoded clip ready for output
///
/// **Format:**
/// - Samples are f32 (floating point -1.0 to 1.0)
/// - Stereo interleaved: [L, R, L, R, ...]
#[derive(Debug, Clone)]
pub struct Clip {
    /// PCM audio samples (interleaved stereo)
    pub samples: Vec<f32>,

    /// Sample rate of `samples`
    pub sample_rate: u32,
}

impl Clip {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Number of stereo frames
    pub fn frame_count(&self) -> usize {
        self.samples.len() / 2
    }

    /// Get duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.frame_count() as u64 * 1000) / self.sample_rate as u64
    }

    /// Get audio frame at specific frame index
    pub fn frame(&self, frame_index: usize) -> Option<AudioFrame> {
        let sample_index = frame_index * 2;
        if sample_index + 1 < self.samples.len() {
            Some(AudioFrame {
                left: self.samples[sample_index],
                right: self.samples[sample_index + 1],
            })
        } else {
            None
        }
    }
}

/// AudioFrame represents a single stereo sample (one frame of audio).
///
/// Used for passing audio data to the output device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioFrame {
    /// Left channel sample
    pub left: f32,

    /// Right channel sample
    pub right: f32,
}

impl AudioFrame {
    /// Create a silent frame (0.0, 0.0)
    pub fn zero() -> Self {
        AudioFrame { left: 0.0, right: 0.0 }
    }

    /// Create a frame from left and right samples
    pub fn from_stereo(left: f32, right: f32) -> Self {
        AudioFrame { left, right }
    }

    /// Apply volume scaling and clamp to [-1.0, 1.0]
    pub fn scaled(self, volume: f32) -> Self {
        AudioFrame {
            left: (self.left * volume).clamp(-1.0, 1.0),
            right: (self.right * volume).clamp(-1.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_duration() {
        // 44100 frames = 1 second at 44.1kHz
        let clip = Clip::new(vec![0.0; 44100 * 2], 44100);
        assert_eq!(clip.frame_count(), 44100);
        assert_eq!(clip.duration_ms(), 1000);
    }

    #[test]
    fn test_clip_frame() {
        let clip = Clip::new(vec![0.1, 0.2, 0.3, 0.4], 48000);

        assert_eq!(clip.frame(0), Some(AudioFrame::from_stereo(0.1, 0.2)));
        assert_eq!(clip.frame(1), Some(AudioFrame::from_stereo(0.3, 0.4)));

        // Out of bounds
        assert!(clip.frame(2).is_none());
    }

    #[test]
    fn test_audio_frame_scaled_clamps() {
        let frame = AudioFrame::from_stereo(0.5, -0.5).scaled(0.5);
        assert_eq!(frame, AudioFrame::from_stereo(0.25, -0.25));

        let loud = AudioFrame::from_stereo(0.8, -0.8).scaled(2.0);
        assert_eq!(loud, AudioFrame::from_stereo(1.0, -1.0));
    }
}

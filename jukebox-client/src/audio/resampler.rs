//! Audio resampling using rubato
//!
//! Converts decoded clips to the output device's sample rate.

use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};
use tracing::debug;

use crate::audio::types::Clip;
use crate::error::{Error, Result};

/// Clips are always stereo after decoding
const CHANNELS: usize = 2;

/// Audio resampler using rubato for sample rate conversion.
pub struct Resampler;

impl Resampler {
    /// Resample a clip to `output_rate`.
    ///
    /// Returns the clip unchanged if it is already at the target rate.
    pub fn to_rate(clip: Clip, output_rate: u32) -> Result<Clip> {
        if clip.sample_rate == output_rate {
            debug!("Sample rate already at {}Hz, skipping resample", output_rate);
            return Ok(clip);
        }

        debug!(
            "Resampling from {}Hz to {}Hz",
            clip.sample_rate, output_rate
        );

        let planar_input = Self::deinterleave(&clip.samples);
        let input_frames = planar_input[0].len();
        if input_frames == 0 {
            return Ok(Clip::new(Vec::new(), output_rate));
        }

        let ratio = output_rate as f64 / clip.sample_rate as f64;

        // One chunk covering the whole clip
        let mut resampler = FastFixedIn::<f32>::new(
            ratio,
            1.0,
            PolynomialDegree::Septic,
            input_frames,
            CHANNELS,
        )
        .map_err(|e| Error::Decode(format!("Failed to create resampler: {}", e)))?;

        let mut planar_output = resampler
            .process(&planar_input, None)
            .map_err(|e| Error::Decode(format!("Resampling failed: {}", e)))?;

        // Output lags the input by the filter delay; flush with silence
        // until the tail is out, then drop the leading delay
        let delay = resampler.output_delay();
        let expected = (input_frames as f64 * ratio).ceil() as usize;
        while planar_output[0].len() < delay + expected {
            let tail = resampler
                .process_partial(None::<&[Vec<f32>]>, None)
                .map_err(|e| Error::Decode(format!("Resampling flush failed: {}", e)))?;
            if tail[0].is_empty() {
                break;
            }
            for (channel, flushed) in planar_output.iter_mut().zip(tail) {
                channel.extend(flushed);
            }
        }
        for channel in planar_output.iter_mut() {
            channel.drain(..delay.min(channel.len()));
            channel.truncate(expected);
        }

        let samples = Self::interleave(planar_output);

        debug!(
            "Resampled {} input frames to {} output frames",
            input_frames,
            samples.len() / CHANNELS
        );

        Ok(Clip::new(samples, output_rate))
    }

    /// Convert interleaved stereo samples to planar format.
    ///
    /// Input:  [L, R, L, R, L, R, ...]
    /// Output: [[L, L, L, ...], [R, R, R, ...]]
    fn deinterleave(samples: &[f32]) -> Vec<Vec<f32>> {
        let num_frames = samples.len() / CHANNELS;
        let mut planar = vec![Vec::with_capacity(num_frames); CHANNELS];

        for frame in samples.chunks_exact(CHANNELS) {
            for (ch, sample) in frame.iter().enumerate() {
                planar[ch].push(*sample);
            }
        }

        planar
    }

    /// Convert planar samples to interleaved format.
    ///
    /// Input:  [[L, L, L, ...], [R, R, R, ...]]
    /// Output: [L, R, L, R, L, R, ...]
    fn interleave(planar: Vec<Vec<f32>>) -> Vec<f32> {
        if planar.is_empty() {
            return Vec::new();
        }

        let num_channels = planar.len();
        let num_frames = planar[0].len();
        let mut interleaved = Vec::with_capacity(num_frames * num_channels);

        for frame_idx in 0..num_frames {
            for channel in &planar {
                interleaved.push(channel[frame_idx]);
            }
        }

        interleaved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deinterleave() {
        let interleaved = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]; // 3 stereo frames
        let planar = Resampler::deinterleave(&interleaved);

        assert_eq!(planar.len(), 2);
        assert_eq!(planar[0], vec![1.0, 3.0, 5.0]); // Left channel
        assert_eq!(planar[1], vec![2.0, 4.0, 6.0]); // Right channel
    }

    #[test]
    fn test_interleave() {
        let planar = vec![vec![1.0, 3.0, 5.0], vec![2.0, 4.0, 6.0]];
        let interleaved = Resampler::interleave(planar);

        assert_eq!(interleaved, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_resample_same_rate_is_identity() {
        let clip = Clip::new(vec![0.1, 0.2, 0.3, 0.4], 48000);
        let out = Resampler::to_rate(clip, 48000).unwrap();

        assert_eq!(out.samples, vec![0.1, 0.2, 0.3, 0.4]);
        assert_eq!(out.sample_rate, 48000);
    }

    #[test]
    fn test_resample_changes_rate_and_length() {
        // 0.1s of silence at 22.05kHz
        let clip = Clip::new(vec![0.0; 2205 * 2], 22050);
        let out = Resampler::to_rate(clip, 44100).unwrap();

        assert_eq!(out.sample_rate, 44100);
        assert_eq!(out.frame_count(), 4410);
    }

    #[test]
    fn test_resample_keeps_head_and_tail() {
        let clip = Clip::new(vec![0.5; 1000 * 2], 22050);
        let out = Resampler::to_rate(clip, 44100).unwrap();

        assert_eq!(out.frame_count(), 2000);

        // No leading silence from the filter delay
        let head = (0..4)
            .map(|i| out.samples[i * 2].abs())
            .fold(0.0f32, f32::max);
        assert!(head > 0.25, "head peak {}", head);

        // Tail is signal, not flushed padding
        assert!((out.samples[1900 * 2] - 0.5).abs() < 0.05);
    }
}

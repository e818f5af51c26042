//! Audio decoder using symphonia
//!
//! Decodes whole clips (MP3, FLAC, Vorbis, WAV, AAC) from memory into
//! interleaved stereo f32 samples. Clips are short, so the full decode
//! happens up front and playback never touches the codec.

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::audio::types::Clip;
use crate::error::{Error, Result};

/// Stateless clip decoder
pub struct ClipDecoder;

impl ClipDecoder {
    /// Decode an entire encoded clip held in memory.
    ///
    /// # Arguments
    /// - `bytes`: Encoded audio file contents
    /// - `extension`: Optional file extension used as a format hint
    ///
    /// # Returns
    /// Clip at the source sample rate, converted to stereo
    pub fn decode(bytes: Vec<u8>, extension: Option<&str>) -> Result<Clip> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = extension {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| Error::Decode(format!("Failed to probe format: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;

        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| Error::Decode("Sample rate not found".to_string()))?;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

        let mut samples = Vec::new();
        let mut scratch: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => {
                    warn!("Error reading packet: {}", e);
                    break;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    let channels = spec.channels.count();
                    let needed = decoded.capacity() as u64;

                    let too_small = scratch
                        .as_ref()
                        .map_or(true, |buf| (buf.capacity() as u64) < needed * channels as u64);
                    if too_small {
                        scratch = Some(SampleBuffer::<f32>::new(needed, spec));
                    }
                    if let Some(buf) = scratch.as_mut() {
                        buf.copy_interleaved_ref(decoded);
                        push_stereo(buf.samples(), channels, &mut samples);
                    }
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Decode error: {}", e);
                    continue;
                }
                Err(e) => {
                    return Err(Error::Decode(format!("Decoder failed: {}", e)));
                }
            }
        }

        if samples.is_empty() {
            return Err(Error::Decode("Clip contains no audio".to_string()));
        }

        debug!(
            "Decoded clip: {} frames at {}Hz",
            samples.len() / 2,
            sample_rate
        );

        Ok(Clip::new(samples, sample_rate))
    }
}

/// Append interleaved samples with any channel count as stereo.
///
/// Mono is duplicated to both channels; beyond two channels only the
/// front left/right pair is kept.
fn push_stereo(interleaved: &[f32], channels: usize, output: &mut Vec<f32>) {
    match channels {
        0 => {}
        1 => {
            output.reserve(interleaved.len() * 2);
            for &sample in interleaved {
                output.push(sample);
                output.push(sample);
            }
        }
        _ => {
            output.reserve(interleaved.len() / channels * 2);
            for frame in interleaved.chunks_exact(channels) {
                output.push(frame[0]);
                output.push(frame[1]);
            }
        }
    }
}

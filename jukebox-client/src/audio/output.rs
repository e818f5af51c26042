//! Audio output using cpal
//!
//! Manages the output device and its callback-driven stream. The stream
//! object is not `Send`, so [`AudioOutput`] must stay on the thread that
//! created it; see [`crate::audio::player`] for the dedicated output thread.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use tracing::{debug, error, info, warn};

use crate::audio::types::AudioFrame;
use crate::error::{Error, Result};

/// Fills one device buffer worth of frames
pub type FillCallback = dyn FnMut(&mut [AudioFrame]) + Send + 'static;

/// One output device and, once started, its stream
pub struct AudioOutput {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    stream: Option<Stream>,
    volume: f32,
}

impl AudioOutput {
    /// Names of the output devices on the default host
    pub fn list_devices() -> Result<Vec<String>> {
        let names: Vec<String> = cpal::default_host()
            .output_devices()
            .map_err(|e| Error::AudioOutput(format!("Cannot enumerate output devices: {}", e)))?
            .filter_map(|device| device.name().ok())
            .collect();

        debug!("{} output device(s) available", names.len());
        Ok(names)
    }

    /// Open `device_name`, or the default output device when `None` or
    /// when no device by that name exists.
    ///
    /// `volume` is clamped to 0.0-1.0 and applied to every frame.
    pub fn open(device_name: Option<&str>, volume: f32) -> Result<Self> {
        let device = Self::select_device(device_name)?;

        let supported = device
            .default_output_config()
            .map_err(|e| Error::AudioOutput(format!("No usable output config: {}", e)))?;
        let sample_format = supported.sample_format();
        let config = supported.config();

        info!(
            "Output device '{}': {}Hz, {} channel(s), {:?}",
            device.name().unwrap_or_else(|_| "unknown".to_string()),
            config.sample_rate.0,
            config.channels,
            sample_format
        );

        Ok(Self {
            device,
            config,
            sample_format,
            stream: None,
            volume: volume.clamp(0.0, 1.0),
        })
    }

    fn select_device(device_name: Option<&str>) -> Result<Device> {
        let host = cpal::default_host();

        if let Some(name) = device_name {
            let named = host
                .output_devices()
                .map_err(|e| Error::AudioOutput(format!("Cannot enumerate output devices: {}", e)))?
                .find(|d| d.name().ok().as_deref() == Some(name));
            match named {
                Some(device) => return Ok(device),
                None => warn!("Output device '{}' not found, using default", name),
            }
        }

        host.default_output_device()
            .ok_or_else(|| Error::AudioOutput("No default output device".to_string()))
    }

    /// Start the output stream.
    ///
    /// `fill` is called on the real-time audio thread once per device
    /// buffer and must write every frame it is given (silence when idle).
    /// Volume and clamping are applied after `fill`.
    pub fn start<F>(&mut self, fill: F) -> Result<()>
    where
        F: FnMut(&mut [AudioFrame]) + Send + 'static,
    {
        let fill: Box<FillCallback> = Box::new(fill);

        let stream = match self.sample_format {
            SampleFormat::F32 => self.build_stream::<f32>(fill, |s| s)?,
            SampleFormat::I16 => self.build_stream::<i16>(fill, |s| (s * i16::MAX as f32) as i16)?,
            SampleFormat::U16 => {
                // [-1.0, 1.0] to [0, 65535]
                self.build_stream::<u16>(fill, |s| ((s + 1.0) * 32767.5) as u16)?
            }
            sample_format => {
                return Err(Error::AudioOutput(format!(
                    "Unsupported sample format: {:?}",
                    sample_format
                )));
            }
        };

        stream
            .play()
            .map_err(|e| Error::AudioOutput(format!("Cannot start stream: {}", e)))?;

        self.stream = Some(stream);

        Ok(())
    }

    fn build_stream<T>(
        &self,
        mut fill: Box<FillCallback>,
        convert: fn(f32) -> T,
    ) -> Result<Stream>
    where
        T: cpal::SizedSample + Send + 'static,
    {
        let channels = self.config.channels as usize;
        let volume = self.volume;
        let mut frames: Vec<AudioFrame> = Vec::new();

        self.device
            .build_output_stream(
                &self.config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let frame_count = data.len() / channels;
                    frames.clear();
                    frames.resize(frame_count, AudioFrame::zero());

                    fill(&mut frames);

                    for (out, frame) in data.chunks_mut(channels).zip(frames.iter()) {
                        let frame = frame.scaled(volume);
                        out[0] = convert(frame.left);
                        if channels > 1 {
                            out[1] = convert(frame.right);
                        }
                        for extra in out.iter_mut().skip(2) {
                            *extra = convert(0.0);
                        }
                    }
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| Error::AudioOutput(format!("Cannot build stream: {}", e)))
    }

    /// Pause and release the stream
    pub fn stop(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            debug!("Stopping output stream");
            stream
                .pause()
                .map_err(|e| Error::AudioOutput(format!("Cannot pause stream: {}", e)))?;
        }
        Ok(())
    }

    /// Device frame rate; clips are resampled to this
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("{}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_devices_does_not_panic() {
        // Outcome depends on the machine's audio hardware
        let _ = AudioOutput::list_devices();
    }
}

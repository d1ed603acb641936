//! cpal-backed output device.

use chirp_core::{AudioError, NegotiatedFormat, Result, StreamRequest};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{
    BufferSize, Device, SampleFormat, SampleRate, Stream, StreamConfig, SupportedBufferSize,
    SupportedStreamConfig,
};
use tracing::{debug, error, warn};

use super::{AudioCallback, AudioDevice};

/// Output through the platform's default cpal host.
///
/// The stream is not `Send` on every platform, so a `CpalDevice` stays on the
/// thread that created it (the producer thread).
pub struct CpalDevice {
    device: Option<Device>,
    config: Option<StreamConfig>,
    stream: Option<Stream>,
}

impl CpalDevice {
    /// Use the default output device, resolved at negotiation time.
    pub fn new() -> Self {
        Self {
            device: None,
            config: None,
            stream: None,
        }
    }

    /// Use a specific cpal device.
    pub fn with_device(device: Device) -> Self {
        Self {
            device: Some(device),
            config: None,
            stream: None,
        }
    }

    fn device(&mut self) -> Result<&Device> {
        if self.device.is_none() {
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or_else(|| AudioError::Device("No audio output device found".into()))?;
            self.device = Some(device);
        }
        self.device.as_ref().ok_or(AudioError::NotInitialized)
    }

    fn stream(&self) -> Result<&Stream> {
        self.stream.as_ref().ok_or(AudioError::NotInitialized)
    }
}

impl Default for CpalDevice {
    fn default() -> Self {
        Self::new()
    }
}

/// Find an f32 config for the request, falling back to the device default
/// and then to any f32 config at its highest rate.
fn choose_config(device: &Device, request: &StreamRequest) -> Result<SupportedStreamConfig> {
    let ranges = device
        .supported_output_configs()
        .map_err(|e| AudioError::Device(format!("Failed to query output configs: {}", e)))?;

    let mut fallback = None;
    for range in ranges {
        if range.sample_format() != SampleFormat::F32 {
            continue;
        }
        if range.channels() == request.channels
            && range.min_sample_rate().0 <= request.sample_rate
            && range.max_sample_rate().0 >= request.sample_rate
        {
            return Ok(range.with_sample_rate(SampleRate(request.sample_rate)));
        }
        if fallback.is_none() {
            fallback = Some(range.with_max_sample_rate());
        }
    }

    let default_config = device
        .default_output_config()
        .map_err(|e| AudioError::Device(format!("No default output config: {}", e)))?;
    if default_config.sample_format() == SampleFormat::F32 {
        return Ok(default_config);
    }

    fallback.ok_or_else(|| {
        AudioError::UnsupportedFormat(format!(
            "device offers no f32 output (default is {:?})",
            default_config.sample_format()
        ))
    })
}

impl AudioDevice for CpalDevice {
    fn negotiate(&mut self, request: &StreamRequest) -> Result<NegotiatedFormat> {
        let device = self.device()?;
        let supported = choose_config(device, request)?;

        // Clamp the period into what the device accepts. When the range is
        // unknown the backend picks, and the request is our best estimate.
        let (buffer_size, frames) = match supported.buffer_size() {
            SupportedBufferSize::Range { min, max } => {
                let frames = request.buffer_size.clamp(*min, (*max).max(*min));
                (BufferSize::Fixed(frames), frames)
            }
            SupportedBufferSize::Unknown => (BufferSize::Default, request.buffer_size),
        };

        let config = StreamConfig {
            channels: supported.channels(),
            sample_rate: supported.sample_rate(),
            buffer_size,
        };
        debug!("Negotiated cpal config: {:?}", config);

        let format = NegotiatedFormat {
            sample_rate: config.sample_rate.0,
            channels: config.channels,
            buffer_size: frames,
        };
        self.config = Some(config);
        Ok(format)
    }

    fn open(&mut self, mut callback: AudioCallback) -> Result<()> {
        let config = self.config.clone().ok_or(AudioError::NotInitialized)?;
        let device = self.device()?;

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    callback.render(data);
                },
                |err| {
                    error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| AudioError::Device(format!("Failed to build output stream: {}", e)))?;

        // Some backends start streams as soon as they are built.
        if let Err(e) = stream.pause() {
            warn!("Could not pause new stream: {}", e);
        }

        self.stream = Some(stream);
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        self.stream()?
            .play()
            .map_err(|e| AudioError::Device(format!("Failed to start stream: {}", e)))
    }

    fn pause(&mut self) -> Result<()> {
        self.stream()?
            .pause()
            .map_err(|e| AudioError::Device(format!("Failed to pause stream: {}", e)))
    }

    fn close(&mut self) {
        // Dropping the stream joins/stops the backend's callback thread.
        self.stream = None;
        self.config = None;
    }

    fn name(&self) -> String {
        self.device
            .as_ref()
            .and_then(|d| d.name().ok())
            .unwrap_or_else(|| "default output".to_string())
    }
}

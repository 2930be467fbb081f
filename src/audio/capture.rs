//! Microphone capture through cpal.
//!
//! The [`CaptureContext`] owns everything the driver callback touches: the
//! ring writer and the partial period being assembled. It is moved into the
//! callback closure, so there is no global audio state.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, FromSample, Sample, SampleFormat, SizedSample, SupportedBufferSize};

use super::ring::{RingReader, RingWriter, SampleRing};
use crate::error::AudioError;
use crate::params::CaptureConfig;

/// What the driver actually agreed to. Nothing downstream may assume a
/// sample rate or period before this is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u16,
    /// Samples per ring write. Deliveries of any other size are re-chunked
    /// to this before reaching the ring.
    pub period: usize,
}

/// A capture device listed by [`list_input_devices`].
#[derive(Debug, Clone)]
pub struct InputDeviceInfo {
    pub name: String,
    pub is_default: bool,
}

/// Open input stream plus the reader side of its sample history.
pub struct AudioCapture {
    reader: RingReader,
    format: StreamFormat,
    device_name: String,
    /// Input stream (kept alive; dropping it closes the device)
    stream: cpal::Stream,
}

impl AudioCapture {
    /// Open the default input device and allocate the sample history for
    /// the negotiated period. The stream is created paused.
    pub fn open(config: &CaptureConfig) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(AudioError::NoInputDevice)?;
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let default_config = device.default_input_config()?;
        let sample_rate = default_config.sample_rate();

        // Prefer a native mono config at the default rate; otherwise take the
        // first channel of the default layout (no downmixing).
        let supported = device
            .supported_input_configs()?
            .find(|range| {
                range.channels() == 1
                    && range.sample_format() == default_config.sample_format()
                    && range.min_sample_rate() <= sample_rate
                    && sample_rate <= range.max_sample_rate()
            })
            .map(|range| range.with_sample_rate(sample_rate))
            .unwrap_or(default_config);

        let (period, buffer_size) = negotiate_period(supported.buffer_size(), config.requested_period);
        let format = StreamFormat {
            sample_rate: supported.sample_rate().0,
            channels: supported.channels(),
            period: period as usize,
        };

        let mut stream_config = supported.config();
        stream_config.buffer_size = buffer_size;

        let (writer, reader) =
            SampleRing::with_history(config.min_history_samples, format.period).split();

        let stream = match supported.sample_format() {
            SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, writer, format)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, writer, format)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, writer, format)?,
            other => return Err(AudioError::UnsupportedFormat(other)),
        };
        // Some hosts start streams eagerly
        stream.pause().ok();

        log::info!(
            "Audio: {} @ {}Hz, {} channel(s), period {} ({} history samples)",
            device_name,
            format.sample_rate,
            format.channels,
            format.period,
            reader.len()
        );

        Ok(Self {
            reader,
            format,
            device_name,
            stream,
        })
    }

    pub fn start(&self) -> Result<(), AudioError> {
        self.stream.play()?;
        Ok(())
    }

    pub fn stop(&self) -> Result<(), AudioError> {
        self.stream.pause()?;
        Ok(())
    }

    pub fn reader(&self) -> &RingReader {
        &self.reader
    }

    pub fn format(&self) -> StreamFormat {
        self.format
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

/// Pick the period to request: the configured value clamped into the
/// driver's range, or the driver default when it reports no range.
fn negotiate_period(supported: &SupportedBufferSize, requested: u32) -> (u32, BufferSize) {
    match *supported {
        SupportedBufferSize::Range { min, max } if min <= max => {
            let period = requested.clamp(min.max(1), max.max(1));
            (period, BufferSize::Fixed(period))
        }
        // Deliveries of whatever size the driver picks are re-chunked
        _ => (requested.max(1), BufferSize::Default),
    }
}

/// Callback-side state: first-channel selection, sample conversion and
/// re-chunking into whole periods.
///
/// The ring only ever receives exact `period`-sized writes, whatever the
/// driver delivers per callback; a partial period is held until the next
/// delivery completes it. Nothing here allocates after construction.
pub struct CaptureContext {
    writer: RingWriter,
    channels: usize,
    pending: Vec<f32>,
}

impl CaptureContext {
    pub fn new(writer: RingWriter, channels: u16) -> Self {
        let period = writer.period();
        Self {
            writer,
            channels: channels.max(1) as usize,
            pending: Vec::with_capacity(period),
        }
    }

    /// Handle one interleaved delivery from the driver.
    pub fn on_data<T>(&mut self, data: &[T])
    where
        T: Sample,
        f32: FromSample<T>,
    {
        let period = self.writer.period();
        for &sample in data.iter().step_by(self.channels) {
            self.pending.push(f32::from_sample(sample));
            if self.pending.len() == period {
                self.writer.write(&self.pending);
                self.pending.clear();
            }
        }
    }

    /// Samples held back waiting for the rest of their period
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    writer: RingWriter,
    format: StreamFormat,
) -> Result<cpal::Stream, AudioError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let mut context = CaptureContext::new(writer, format.channels);

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| context.on_data(data),
        |err| log::error!("Audio stream error: {}", err),
        None,
    )?;
    Ok(stream)
}

/// All capture devices on the default host, flagging the default one.
pub fn list_input_devices() -> Result<Vec<InputDeviceInfo>, AudioError> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let devices = host
        .input_devices()?
        .map(|device| {
            let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
            let is_default = default_name.as_deref() == Some(name.as_str());
            InputDeviceInfo { name, is_default }
        })
        .collect();
    Ok(devices)
}

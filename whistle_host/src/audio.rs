use anyhow::{Context, Result};
use portaudio as pa;

/// Runs in the audio callback. Must not block, allocate or log.
pub trait AudioProcessor {
    /// Return false to stop the audio stream, true otherwise.
    fn process(&mut self, in_buffer: &[f32], out_buffer: &mut [f32]) -> bool;
}

const FRAMES_PER_BUFFER: u32 = 256;

/// The sample rate of the default input device.
pub fn default_input_sample_rate() -> Result<f32> {
    let pa = pa::PortAudio::new().context("Failed to initialize PortAudio")?;
    let default_input = pa.default_input_device().context("No default audio input device")?;
    let input_info = pa.device_info(default_input)?;
    Ok(input_info.default_sample_rate as f32)
}

/// A mono duplex stream on the default input and output devices.
pub struct AudioEngine {
    pa_stream: pa::Stream<pa::NonBlocking, pa::Duplex<f32, f32>>,
}

impl AudioEngine {
    pub fn new<T: AudioProcessor + Send + 'static>(sample_rate: f32, mut processor: T) -> Result<Self> {
        let pa = pa::PortAudio::new().context("Failed to initialize PortAudio")?;
        let default_input = pa.default_input_device().context("No default audio input device")?;
        let default_output = pa
            .default_output_device()
            .context("No default audio output device")?;
        let input_info = pa.device_info(default_input)?;
        let output_info = pa.device_info(default_output)?;
        log::info!("Using audio input device \"{}\"", input_info.name);
        log::info!("Using audio output device \"{}\"", output_info.name);

        let latency = input_info.default_low_input_latency;
        let input_params = pa::StreamParameters::<f32>::new(default_input, 1, true, latency);
        let output_params = pa::StreamParameters::new(default_output, 1, true, latency);
        let settings = pa::DuplexStreamSettings::new(
            input_params,
            output_params,
            sample_rate as f64,
            FRAMES_PER_BUFFER,
        );
        log::info!(
            "Opening stream at {} Hz, {} frames per buffer",
            sample_rate,
            FRAMES_PER_BUFFER
        );

        let pa_callback = move |pa::DuplexStreamCallbackArgs {
                                    in_buffer,
                                    out_buffer,
                                    ..
                                }| {
            match processor.process(in_buffer, out_buffer) {
                true => pa::Continue,
                false => pa::Complete,
            }
        };
        let mut stream = pa
            .open_non_blocking_stream(settings, pa_callback)
            .context("Failed to open audio stream")?;
        stream.start().context("Failed to start audio stream")?;
        Ok(AudioEngine { pa_stream: stream })
    }

    pub fn is_active(&self) -> bool {
        self.pa_stream.is_active().unwrap_or(false)
    }

    pub fn stop(&mut self) -> Result<()> {
        if self.is_active() {
            self.pa_stream.stop().context("Failed to stop audio stream")?;
        }
        Ok(())
    }
}

//! Command line front end: whistle into a microphone to play a MIDI instrument or to hear
//! sub-harmonic tones, or run the same processing on WAV files.

mod audio;
mod config;
mod midi_out;
mod wav;

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::{Parser, Subcommand};
use micro_whistle::common::ChromaticTable;
use micro_whistle::midi::{MidiEvent, NoteEmitter, NoteMonitor};
use micro_whistle::resynth::SubHarmonicResynth;
use micro_whistle::zc::{Detector, FrequencyQuantizer};
use rtrb::RingBuffer;

use audio::{AudioEngine, AudioProcessor};
use config::HostConfig;
use midi_out::{describe, note_name, EventPort, MidiPort};

const EVENT_QUEUE_CAPACITY: usize = 1024;
const COMMAND_QUEUE_CAPACITY: usize = 16;
const POLL_INTERVAL: Duration = Duration::from_millis(2);
const STATUS_INTERVAL: Duration = Duration::from_secs(1);
const STOP_TIMEOUT: Duration = Duration::from_millis(500);

/// Whistle to MIDI and sub-harmonic resynthesis
#[derive(Parser)]
#[command(name = "whistle")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file with "emitter" and "resynth" options. Missing fields keep their defaults.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a MIDI instrument by whistling into the default audio input
    LiveMidi {
        /// Use the first MIDI output port whose name contains this string
        #[arg(short, long)]
        port: Option<String>,

        /// Sample rate in Hz (default: that of the input device)
        #[arg(long)]
        sample_rate: Option<f32>,
    },

    /// Play sub-harmonic tones following the pitch of the default audio input
    LiveResynth {
        /// Sample rate in Hz (default: that of the input device)
        #[arg(long)]
        sample_rate: Option<f32>,
    },

    /// Process a WAV file. Prints MIDI events, or writes the resynthesized signal to --output
    Offline {
        /// Input WAV file. Only the first channel is used
        input: PathBuf,

        /// Output WAV file for the resynthesized signal
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the available MIDI output ports
    ListPorts,
}

enum AudioCommand {
    /// Release the sounding note and stop the stream.
    Stop,
}

struct MidiProcessor {
    detector: Detector<NoteEmitter<'static, rtrb::Producer<MidiEvent>>>,
    commands: rtrb::Consumer<AudioCommand>,
    dropped_events: Arc<AtomicUsize>,
}

impl AudioProcessor for MidiProcessor {
    fn process(&mut self, in_buffer: &[f32], out_buffer: &mut [f32]) -> bool {
        for value in out_buffer.iter_mut() {
            *value = 0.0;
        }
        for sample in in_buffer.iter() {
            if self.detector.process_sample(*sample).is_err() {
                self.dropped_events.fetch_add(1, Ordering::Relaxed);
            }
        }
        match self.commands.pop() {
            Ok(AudioCommand::Stop) => {
                if self.detector.consumer_mut().release().is_err() {
                    self.dropped_events.fetch_add(1, Ordering::Relaxed);
                }
                false
            }
            Err(_) => true,
        }
    }
}

struct ResynthProcessor {
    detector: Detector<SubHarmonicResynth<'static>>,
    commands: rtrb::Consumer<AudioCommand>,
}

impl AudioProcessor for ResynthProcessor {
    fn process(&mut self, in_buffer: &[f32], out_buffer: &mut [f32]) -> bool {
        self.detector.process_into(in_buffer, out_buffer);
        !matches!(self.commands.pop(), Ok(AudioCommand::Stop))
    }
}

/// Returns a flag that is raised when a line is read from stdin. A closed or
/// unreadable stdin never raises it.
fn stop_on_enter() -> Arc<AtomicBool> {
    let stop_requested = Arc::new(AtomicBool::new(false));
    let flag = stop_requested.clone();
    thread::spawn(move || {
        let mut line = String::new();
        if is_enter(std::io::stdin().lock().read_line(&mut line)) {
            flag.store(true, Ordering::Relaxed);
        } else {
            log::debug!("stdin closed, stop the process to end the session");
        }
    });
    stop_requested
}

fn is_enter(read_result: std::io::Result<usize>) -> bool {
    matches!(read_result, Ok(byte_count) if byte_count > 0)
}

fn stream_sample_rate(sample_rate: Option<f32>) -> Result<f32> {
    match sample_rate {
        Some(sample_rate) => Ok(sample_rate),
        None => audio::default_input_sample_rate(),
    }
}

/// Sends all queued events to `port`. A failed send is logged and the remaining
/// events are still sent. Returns the number of failed sends.
fn forward_events<P: EventPort>(events: &mut rtrb::Consumer<MidiEvent>, port: &mut P) -> usize {
    let mut failures = 0;
    while let Ok(event) = events.pop() {
        if let Err(error) = port.send(&event) {
            log::warn!("{}: {:#}", describe(&event), error);
            failures += 1;
            continue;
        }
        match event {
            MidiEvent::ControlChange { .. } => log::trace!("{}", describe(&event)),
            _ => log::info!("{}", describe(&event)),
        }
    }
    failures
}

fn run_live_midi(config: &HostConfig, port_name: Option<&str>, sample_rate: Option<f32>) -> Result<()> {
    let mut port = MidiPort::connect(port_name)?;
    let sample_rate = stream_sample_rate(sample_rate)?;
    let quantizer = FrequencyQuantizer::new(sample_rate, ChromaticTable::whistle())?;

    let (event_producer, mut event_consumer) = RingBuffer::<MidiEvent>::new(EVENT_QUEUE_CAPACITY).split();
    let (mut command_producer, command_consumer) =
        RingBuffer::<AudioCommand>::new(COMMAND_QUEUE_CAPACITY).split();
    let monitor = Arc::new(NoteMonitor::new());
    let dropped_events = Arc::new(AtomicUsize::new(0));

    let emitter =
        NoteEmitter::from_options(quantizer, config.emitter, event_producer)?.with_monitor(monitor.clone());
    let processor = MidiProcessor {
        detector: Detector::new(emitter),
        commands: command_consumer,
        dropped_events: dropped_events.clone(),
    };
    let mut engine = AudioEngine::new(sample_rate, processor)?;

    log::info!("Sending MIDI to \"{}\". Press enter to stop.", port.name());
    let stop_requested = stop_on_enter();
    let mut last_status = Instant::now();
    let mut send_failures = 0;
    while !stop_requested.load(Ordering::Relaxed) && engine.is_active() {
        send_failures += forward_events(&mut event_consumer, &mut port);
        if last_status.elapsed() >= STATUS_INTERVAL {
            last_status = Instant::now();
            log::debug!(
                "Sounding {}, loudness {}",
                monitor.note().map(note_name).unwrap_or_else(|| "-".to_string()),
                monitor.loudness()
            );
        }
        thread::sleep(POLL_INTERVAL);
    }

    // Let the audio callback release the sounding note before the stream goes away
    if command_producer.push(AudioCommand::Stop).is_err() {
        log::warn!("Audio command queue full, the last note may keep sounding");
    }
    let deadline = Instant::now() + STOP_TIMEOUT;
    while engine.is_active() && Instant::now() < deadline {
        thread::sleep(POLL_INTERVAL);
    }
    send_failures += forward_events(&mut event_consumer, &mut port);
    engine.stop()?;

    let dropped = dropped_events.load(Ordering::Relaxed);
    if dropped > 0 {
        log::warn!("MIDI events were dropped in {} cycles, the event queue was full", dropped);
    }
    if send_failures > 0 {
        log::warn!("{} MIDI messages could not be sent to \"{}\"", send_failures, port.name());
    }
    Ok(())
}

fn run_live_resynth(config: &HostConfig, sample_rate: Option<f32>) -> Result<()> {
    let sample_rate = stream_sample_rate(sample_rate)?;
    let quantizer = FrequencyQuantizer::new(sample_rate, ChromaticTable::whistle())?;
    let resynth: SubHarmonicResynth = SubHarmonicResynth::from_options(quantizer, config.resynth)?;
    let (mut command_producer, command_consumer) =
        RingBuffer::<AudioCommand>::new(COMMAND_QUEUE_CAPACITY).split();
    let processor = ResynthProcessor {
        detector: Detector::new(resynth),
        commands: command_consumer,
    };
    let mut engine = AudioEngine::new(sample_rate, processor)?;

    log::info!("Resynthesizing. Press enter to stop.");
    let stop_requested = stop_on_enter();
    while !stop_requested.load(Ordering::Relaxed) && engine.is_active() {
        thread::sleep(Duration::from_millis(50));
    }
    let _ = command_producer.push(AudioCommand::Stop);
    engine.stop()
}

fn print_events(events: &mut Vec<MidiEvent>, sample_index: u64, sample_rate: u32) {
    let time = sample_index as f64 / sample_rate as f64;
    for event in events.drain(..) {
        println!("{:9.3} s  {}", time, describe(&event));
    }
}

fn run_offline(config: &HostConfig, input: &Path, output: Option<&Path>) -> Result<()> {
    let (sample_rate, samples) = wav::read_wav(input)?;
    let quantizer = FrequencyQuantizer::new(sample_rate as f32, ChromaticTable::whistle())?;

    match output {
        Some(output) => {
            let resynth: SubHarmonicResynth =
                SubHarmonicResynth::from_options(quantizer, config.resynth)?;
            let mut detector = Detector::new(resynth);
            let mut buffer = vec![0.0; samples.len()];
            detector.process_into(&samples, &mut buffer);
            wav::write_wav(output, sample_rate, &buffer)?;
            log::info!("Wrote {} samples to {}", buffer.len(), output.display());
        }
        None => {
            let emitter = NoteEmitter::from_options(quantizer, config.emitter, Vec::<MidiEvent>::new())?;
            let mut detector = Detector::new(emitter);
            for sample in samples.iter() {
                if let Err(never) = detector.process_sample(*sample) {
                    match never {}
                }
                let sample_index = detector.processed_sample_count();
                print_events(detector.consumer_mut().sink_mut(), sample_index, sample_rate);
            }
            if let Err(never) = detector.consumer_mut().release() {
                match never {}
            }
            let sample_index = detector.processed_sample_count();
            print_events(detector.consumer_mut().sink_mut(), sample_index, sample_rate);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = HostConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::LiveMidi { port, sample_rate } => run_live_midi(&config, port.as_deref(), sample_rate),
        Commands::LiveResynth { sample_rate } => run_live_resynth(&config, sample_rate),
        Commands::Offline { input, output } => run_offline(&config, &input, output.as_deref()),
        Commands::ListPorts => {
            for name in MidiPort::port_names()? {
                println!("{}", name);
            }
            Ok(())
        }
    }
}

use alloc::sync::Arc;

use crate::common::ChromaticTable;
use crate::midi::envelope::{WindowedEnvelope, DEFAULT_ENVELOPE_DIVISOR, DEFAULT_ENVELOPE_WINDOW_SIZE};
use crate::midi::event::{EventSink, MidiEvent, EXPRESSION_CONTROLLER};
use crate::midi::monitor::NoteMonitor;
use crate::midi::note_state::{CycleEvents, NoteStateMachine, DEFAULT_GATE_THRESHOLD};
use crate::zc::{CycleConsumer, CycleResult, FrequencyQuantizer, ZeroCrossingTracker};
use crate::Error;

/// Note-on velocity used unless configured otherwise.
pub const DEFAULT_VELOCITY: u8 = 100;
/// Moves whistled notes two octaves down, into the range of most instruments.
pub const DEFAULT_TRANSPOSE: i8 = -24;

/// How note-on velocities are chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Velocity {
    /// Every note-on uses the same velocity.
    Fixed(u8),
    /// The loudness of the cycle starting the note.
    Loudness,
}

/// [`NoteEmitter`] options. The defaults are tuned for whistling into a
/// typical microphone, but depend on input gain and the target instrument.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EmitterConfig {
    /// MIDI channel, `0..=15`.
    pub channel: u8,
    /// Semitones added to detected notes before sending them.
    pub transpose: i8,
    pub velocity: Velocity,
    /// Cycles with a loudness below this value never start notes.
    pub gate_threshold: u8,
    /// The number of cycles the loudness is averaged over.
    pub envelope_window_size: usize,
    /// Loudness is `mean energy / envelope_divisor * 127`.
    pub envelope_divisor: f32,
    /// The controller receiving loudness updates.
    pub expression_controller: u8,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        EmitterConfig {
            channel: 0,
            transpose: DEFAULT_TRANSPOSE,
            velocity: Velocity::Fixed(DEFAULT_VELOCITY),
            gate_threshold: DEFAULT_GATE_THRESHOLD,
            envelope_window_size: DEFAULT_ENVELOPE_WINDOW_SIZE,
            envelope_divisor: DEFAULT_ENVELOPE_DIVISOR,
            expression_controller: EXPRESSION_CONTROLLER,
        }
    }
}

impl EmitterConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.channel > 15 {
            return Err(Error::InvalidChannel(self.channel));
        }
        if self.expression_controller > 127 {
            return Err(Error::InvalidDataByte(self.expression_controller));
        }
        if self.gate_threshold > 127 {
            return Err(Error::InvalidDataByte(self.gate_threshold));
        }
        if let Velocity::Fixed(velocity) = self.velocity {
            if velocity == 0 || velocity > 127 {
                return Err(Error::InvalidVelocity(velocity));
            }
        }
        if self.envelope_window_size == 0 {
            return Err(Error::InvalidWindowSize);
        }
        if !self.envelope_divisor.is_finite() || !(self.envelope_divisor > 0.0) {
            return Err(Error::InvalidEnvelopeDivisor(self.envelope_divisor));
        }
        Ok(())
    }
}

/// Turns tracked cycles into MIDI note and expression events.
///
/// For every completed cycle the emitter
/// 1. quantizes the period to a note and transposes it,
/// 2. updates the [windowed loudness envelope](WindowedEnvelope),
/// 3. sends an expression controller change if the loudness changed,
/// 4. sends note-off / note-on if a loud enough cycle has a new note.
///
/// Sink errors do not affect the emitter state. All events of a cycle are
/// attempted and the first error is returned.
pub struct NoteEmitter<'a, S> {
    quantizer: FrequencyQuantizer<'a>,
    envelope: WindowedEnvelope,
    state: NoteStateMachine,
    config: EmitterConfig,
    sink: S,
    monitor: Option<Arc<NoteMonitor>>,
    last_detected_note: Option<u8>,
}

impl<S: EventSink> NoteEmitter<'static, S> {
    /// Creates an emitter using the whistle range table and default options.
    pub fn new(sample_rate: f32, sink: S) -> Result<Self, Error> {
        let quantizer = FrequencyQuantizer::new(sample_rate, ChromaticTable::whistle())?;
        NoteEmitter::from_options(quantizer, EmitterConfig::default(), sink)
    }
}

impl<'a, S: EventSink> NoteEmitter<'a, S> {
    pub fn from_options(
        quantizer: FrequencyQuantizer<'a>,
        config: EmitterConfig,
        sink: S,
    ) -> Result<Self, Error> {
        config.validate()?;
        let envelope =
            WindowedEnvelope::from_options(config.envelope_window_size, config.envelope_divisor)?;
        log::debug!(
            "Note emitter on channel {}, transpose {}, gate {}, periods {:.2}..{:.2} samples",
            config.channel,
            config.transpose,
            config.gate_threshold,
            quantizer.min_period(),
            quantizer.max_period()
        );
        Ok(NoteEmitter {
            quantizer,
            envelope,
            state: NoteStateMachine::new(config.gate_threshold),
            config,
            sink,
            monitor: None,
            last_detected_note: None,
        })
    }

    /// Publishes the sounding note and loudness to `monitor` after every cycle.
    pub fn with_monitor(mut self, monitor: Arc<NoteMonitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    /// Processes a completed cycle.
    pub fn on_cycle(&mut self, cycle: CycleResult) -> Result<(), S::Error> {
        self.last_detected_note = self.quantizer.quantize(cycle.period);
        let note = self.last_detected_note.and_then(|note| self.transpose(note));
        let loudness = self.envelope.update(cycle.energy);
        let events = self.state.on_cycle(note, loudness);

        if let Some(monitor) = &self.monitor {
            monitor.publish(self.state.sounding_note(), loudness);
        }

        self.send(events, self.velocity(loudness))
    }

    /// Sends a note-off for the sounding note, if any. Call this before
    /// tearing down the stream to avoid hanging notes.
    pub fn release(&mut self) -> Result<(), S::Error> {
        let note = self.state.release();
        if let Some(monitor) = &self.monitor {
            monitor.publish(None, self.envelope.loudness());
        }
        match note {
            Some(note) => {
                log::debug!("Releasing note {}", note);
                self.sink.send(MidiEvent::NoteOff {
                    channel: self.config.channel,
                    note,
                    velocity: 0,
                })
            }
            None => Ok(()),
        }
    }

    fn transpose(&self, note: u8) -> Option<u8> {
        let transposed = i16::from(note) + i16::from(self.config.transpose);
        if (0..=127).contains(&transposed) {
            Some(transposed as u8)
        } else {
            None
        }
    }

    fn velocity(&self, loudness: u8) -> u8 {
        match self.config.velocity {
            Velocity::Fixed(velocity) => velocity,
            // A note-on with velocity 0 would be read as a note-off.
            Velocity::Loudness => loudness.max(1),
        }
    }

    fn send(&mut self, events: CycleEvents, velocity: u8) -> Result<(), S::Error> {
        let channel = self.config.channel;
        let controller = self.config.expression_controller;
        let messages = [
            events.expression.map(|value| MidiEvent::ControlChange {
                channel,
                controller,
                value,
            }),
            events.note_off.map(|note| MidiEvent::NoteOff {
                channel,
                note,
                velocity: 0,
            }),
            events.note_on.map(|note| MidiEvent::NoteOn {
                channel,
                note,
                velocity,
            }),
        ];

        let mut result = Ok(());
        for message in messages.iter().flatten() {
            if let Err(error) = self.sink.send(*message) {
                if result.is_ok() {
                    result = Err(error);
                }
            }
        }
        result
    }

    /// The untransposed note quantized from the most recent cycle.
    pub fn last_detected_note(&self) -> Option<u8> {
        self.last_detected_note
    }

    /// The transmitted note number of the sounding note.
    pub fn sounding_note(&self) -> Option<u8> {
        self.state.sounding_note()
    }

    pub fn loudness(&self) -> u8 {
        self.envelope.loudness()
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    pub fn quantizer(&self) -> &FrequencyQuantizer<'a> {
        &self.quantizer
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<'a, S: EventSink> CycleConsumer for NoteEmitter<'a, S> {
    type Output = Result<(), S::Error>;

    fn consume(&mut self, _: &ZeroCrossingTracker, cycle: Option<CycleResult>) -> Self::Output {
        match cycle {
            Some(cycle) => self.on_cycle(cycle),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::vec::Vec;
    use crate::zc::Detector;
    use core::f32::consts::PI;

    const SAMPLE_RATE: f32 = 44100.0;

    fn note_ons(events: &[MidiEvent]) -> Vec<MidiEvent> {
        events
            .iter()
            .filter(|event| matches!(event, MidiEvent::NoteOn { .. }))
            .cloned()
            .collect()
    }

    fn loud_cycle(period: f32) -> CycleResult {
        CycleResult {
            period,
            energy: 100.0,
        }
    }

    /// Accepts a limited number of events, then fails.
    struct FlakySink {
        events: Vec<MidiEvent>,
        capacity: usize,
    }

    impl EventSink for FlakySink {
        type Error = MidiEvent;

        fn send(&mut self, event: MidiEvent) -> Result<(), MidiEvent> {
            if self.events.len() < self.capacity {
                self.events.push(event);
                Ok(())
            } else {
                Err(event)
            }
        }
    }

    #[test]
    fn test_note_change_scenario() {
        let mut emitter = NoteEmitter::new(SAMPLE_RATE, Vec::<MidiEvent>::new()).unwrap();
        // 44100 / 60 = 735 Hz, F#5
        emitter.on_cycle(loud_cycle(60.0)).unwrap();
        assert_eq!(emitter.last_detected_note(), Some(78));
        assert_eq!(
            emitter.sink().as_slice(),
            &[
                MidiEvent::ControlChange {
                    channel: 0,
                    controller: 11,
                    value: 127
                },
                MidiEvent::NoteOn {
                    channel: 0,
                    note: 54,
                    velocity: 100
                },
            ]
        );
        emitter.sink_mut().clear();

        // 44100 / 56.25 = 784 Hz, G5. The loudness is saturated, so no expression update.
        emitter.on_cycle(loud_cycle(56.25)).unwrap();
        assert_eq!(emitter.last_detected_note(), Some(79));
        assert_eq!(
            emitter.sink().as_slice(),
            &[
                MidiEvent::NoteOff {
                    channel: 0,
                    note: 54,
                    velocity: 0
                },
                MidiEvent::NoteOn {
                    channel: 0,
                    note: 55,
                    velocity: 100
                },
            ]
        );
        emitter.sink_mut().clear();

        emitter.on_cycle(loud_cycle(56.25)).unwrap();
        assert!(emitter.sink().is_empty());
    }

    #[test]
    fn test_sine_gives_single_stable_note() {
        let emitter = NoteEmitter::new(SAMPLE_RATE, Vec::<MidiEvent>::new()).unwrap();
        let mut detector = Detector::new(emitter);
        let mut post_transient_notes = Vec::new();
        for i in 0..(SAMPLE_RATE as usize / 2) {
            let sample = 1.5 * (2.0 * PI * 735.0 * (i as f32) / SAMPLE_RATE).sin();
            detector.process_sample(sample).unwrap();
            if detector.tracker().cycle_count() > 1 && detector.tracker().samples_since_crossing() < 1.0 {
                post_transient_notes.push(detector.consumer().last_detected_note());
            }
        }
        assert!(post_transient_notes.len() > 300);
        assert!(post_transient_notes.iter().all(|note| *note == Some(78)));
        assert_eq!(
            note_ons(detector.consumer().sink()),
            &[MidiEvent::NoteOn {
                channel: 0,
                note: 54,
                velocity: 100
            }]
        );
        assert_eq!(detector.consumer().sounding_note(), Some(54));
    }

    #[test]
    fn test_silence_and_noise_floor_never_start_notes() {
        let emitter = NoteEmitter::new(SAMPLE_RATE, Vec::<MidiEvent>::new()).unwrap();
        let mut detector = Detector::new(emitter);
        for _ in 0..SAMPLE_RATE as usize {
            detector.process_sample(0.0).unwrap();
        }
        assert!(detector.consumer().sink().is_empty());

        // A quiet in-range tone is detected, but stays below the gate
        for i in 0..SAMPLE_RATE as usize {
            let sample = 0.01 * (2.0 * PI * 1000.0 * (i as f32) / SAMPLE_RATE).sin();
            detector.process_sample(sample).unwrap();
        }
        // 1000 Hz is closer to B5 than to C6
        assert_eq!(detector.consumer().last_detected_note(), Some(83));
        assert!(note_ons(detector.consumer().sink()).is_empty());
        assert_eq!(detector.consumer().sounding_note(), None);
    }

    #[test]
    fn test_out_of_range_notes_are_ignored() {
        let mut emitter = NoteEmitter::new(SAMPLE_RATE, Vec::<MidiEvent>::new()).unwrap();
        // 300 Hz and 4000 Hz
        emitter.on_cycle(loud_cycle(147.0)).unwrap();
        emitter.on_cycle(loud_cycle(11.025)).unwrap();
        assert_eq!(emitter.last_detected_note(), None);
        assert!(note_ons(emitter.sink()).is_empty());
    }

    #[test]
    fn test_expression_values_are_bounded() {
        let mut emitter = NoteEmitter::new(SAMPLE_RATE, Vec::<MidiEvent>::new()).unwrap();
        for energy in [0.0, 1e6, f32::MAX, 0.3, -1.0].iter() {
            emitter
                .on_cycle(CycleResult {
                    period: 60.0,
                    energy: *energy,
                })
                .unwrap();
        }
        for event in emitter.sink().iter() {
            if let MidiEvent::ControlChange { value, .. } = event {
                assert!(*value <= 127);
            }
        }
    }

    #[test]
    fn test_loudness_velocity_and_transpose() {
        let config = EmitterConfig {
            transpose: 0,
            velocity: Velocity::Loudness,
            gate_threshold: 0,
            channel: 2,
            ..EmitterConfig::default()
        };
        let quantizer = FrequencyQuantizer::new(SAMPLE_RATE, ChromaticTable::whistle()).unwrap();
        let mut emitter = NoteEmitter::from_options(quantizer, config, Vec::<MidiEvent>::new()).unwrap();
        emitter
            .on_cycle(CycleResult {
                period: 60.0,
                energy: 0.0,
            })
            .unwrap();
        assert_eq!(
            note_ons(emitter.sink()),
            &[MidiEvent::NoteOn {
                channel: 2,
                note: 78,
                velocity: 1
            }]
        );
    }

    #[test]
    fn test_transpose_out_of_midi_range() {
        let config = EmitterConfig {
            transpose: 127,
            ..EmitterConfig::default()
        };
        let quantizer = FrequencyQuantizer::new(SAMPLE_RATE, ChromaticTable::whistle()).unwrap();
        let mut emitter = NoteEmitter::from_options(quantizer, config, Vec::<MidiEvent>::new()).unwrap();
        emitter.on_cycle(loud_cycle(60.0)).unwrap();
        assert_eq!(emitter.last_detected_note(), Some(78));
        assert!(note_ons(emitter.sink()).is_empty());
    }

    #[test]
    fn test_sink_failure_does_not_corrupt_state() {
        let quantizer = FrequencyQuantizer::new(SAMPLE_RATE, ChromaticTable::whistle()).unwrap();
        let sink = FlakySink {
            events: Vec::new(),
            capacity: 0,
        };
        let mut emitter = NoteEmitter::from_options(quantizer, EmitterConfig::default(), sink).unwrap();
        let error = emitter.on_cycle(loud_cycle(60.0)).unwrap_err();
        // The first failing event is reported
        assert!(matches!(error, MidiEvent::ControlChange { .. }));
        assert_eq!(emitter.sounding_note(), Some(54));

        // Once the sink recovers, the same note is not sent again
        emitter.sink_mut().capacity = 100;
        emitter.on_cycle(loud_cycle(60.0)).unwrap();
        assert!(note_ons(&emitter.sink().events).is_empty());
        emitter.on_cycle(loud_cycle(56.25)).unwrap();
        assert_eq!(note_ons(&emitter.sink().events).len(), 1);
    }

    #[test]
    fn test_release_and_monitor() {
        let monitor = Arc::new(NoteMonitor::new());
        let mut emitter = NoteEmitter::new(SAMPLE_RATE, Vec::<MidiEvent>::new())
            .unwrap()
            .with_monitor(monitor.clone());
        emitter.on_cycle(loud_cycle(60.0)).unwrap();
        assert_eq!(monitor.note(), Some(54));
        assert_eq!(monitor.loudness(), emitter.loudness());

        emitter.sink_mut().clear();
        emitter.release().unwrap();
        assert_eq!(
            emitter.sink().as_slice(),
            &[MidiEvent::NoteOff {
                channel: 0,
                note: 54,
                velocity: 0
            }]
        );
        assert_eq!(monitor.note(), None);
        assert_eq!(emitter.sounding_note(), None);

        emitter.sink_mut().clear();
        emitter.release().unwrap();
        assert!(emitter.sink().is_empty());
    }

    #[test]
    fn test_invalid_config() {
        let quantizer = FrequencyQuantizer::new(SAMPLE_RATE, ChromaticTable::whistle()).unwrap();
        let invalid = [
            (
                EmitterConfig {
                    channel: 16,
                    ..EmitterConfig::default()
                },
                Error::InvalidChannel(16),
            ),
            (
                EmitterConfig {
                    velocity: Velocity::Fixed(0),
                    ..EmitterConfig::default()
                },
                Error::InvalidVelocity(0),
            ),
            (
                EmitterConfig {
                    expression_controller: 128,
                    ..EmitterConfig::default()
                },
                Error::InvalidDataByte(128),
            ),
            (
                EmitterConfig {
                    envelope_window_size: 0,
                    ..EmitterConfig::default()
                },
                Error::InvalidWindowSize,
            ),
        ];
        for (config, expected) in invalid.iter() {
            assert_eq!(config.validate(), Err(*expected));
            assert!(NoteEmitter::from_options(quantizer, *config, Vec::<MidiEvent>::new()).is_err());
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_from_partial_json() {
        let config: EmitterConfig =
            serde_json::from_str(r#"{ "gate_threshold": 20, "velocity": "loudness" }"#).unwrap();
        assert_eq!(config.gate_threshold, 20);
        assert_eq!(config.velocity, Velocity::Loudness);
        assert_eq!(config.transpose, DEFAULT_TRANSPOSE);

        let fixed: EmitterConfig = serde_json::from_str(r#"{ "velocity": { "fixed": 64 } }"#).unwrap();
        assert_eq!(fixed.velocity, Velocity::Fixed(64));
    }
}

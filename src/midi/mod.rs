//! Whistle to MIDI conversion.
//!
//! A [`NoteEmitter`] is a [`CycleConsumer`](crate::zc::CycleConsumer) that, on every completed
//! cycle, quantizes the period to a note, tracks a [windowed loudness](WindowedEnvelope) and
//! sends note and expression events to an [`EventSink`].
//!
//! Events are sent in the order expression change, note-off, note-on. A new note is only
//! started by a cycle at least as loud as the gate threshold with a note different from the
//! sounding one. Quiet or unpitched cycles never stop notes, call
//! [`NoteEmitter::release`] for that.
//!
//! # Examples
//! ```
//! use micro_whistle::midi::{MidiEvent, NoteEmitter};
//! use micro_whistle::zc::Detector;
//!
//! let sample_rate = 44100.0;
//! let emitter = NoteEmitter::new(sample_rate, Vec::<MidiEvent>::new()).unwrap();
//! let mut detector = Detector::new(emitter);
//!
//! // 200 ms of whistling at 735 Hz, F#5
//! for i in 0..(sample_rate as usize / 5) {
//!     let phase = 2.0 * std::f32::consts::PI * 735.0 * (i as f32) / sample_rate;
//!     detector.process_sample(1.5 * phase.sin()).unwrap();
//! }
//!
//! let note_ons: Vec<MidiEvent> = detector
//!     .consumer()
//!     .sink()
//!     .iter()
//!     .filter(|event| matches!(event, MidiEvent::NoteOn { .. }))
//!     .cloned()
//!     .collect();
//! // Transposed two octaves down
//! assert_eq!(
//!     note_ons,
//!     vec![MidiEvent::NoteOn { channel: 0, note: 78 - 24, velocity: 100 }]
//! );
//! ```

mod emitter;
mod envelope;
mod event;
mod monitor;
mod note_state;

pub use emitter::{EmitterConfig, NoteEmitter, Velocity, DEFAULT_TRANSPOSE, DEFAULT_VELOCITY};
pub use envelope::{WindowedEnvelope, DEFAULT_ENVELOPE_DIVISOR, DEFAULT_ENVELOPE_WINDOW_SIZE};
pub use event::{EventSink, MidiEvent, EXPRESSION_CONTROLLER};
pub use monitor::NoteMonitor;
pub use note_state::{CycleEvents, NoteState, NoteStateMachine, DEFAULT_GATE_THRESHOLD};

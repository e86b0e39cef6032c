//! A zero crossing [pitch](https://en.wikipedia.org/wiki/Pitch_%28music%29) tracker, for turning
//! whistling or humming into MIDI notes, or into sub-harmonic tones three to four octaves
//! below the input.
//!
//! The tracker consumes one sample at a time and closes a cycle on every falling
//! (positive to negative) zero crossing. The crossing time is linearly interpolated between
//! the last positive and the first negative sample, and the fractional remainder is carried into
//! the next cycle, so the measured period does not drift over long tones. Each closed cycle is
//! handed to a [cycle consumer](zc::CycleConsumer):
//! * [`midi::NoteEmitter`] quantizes the period to a chromatic table, tracks a windowed loudness
//! envelope and emits note on, note off and expression events to an [event sink](midi::EventSink).
//! * [`resynth::SubHarmonicResynth`] produces an output sample for every input sample by summing
//! sines locked to 1/8, 1/12 and 1/16 of the detected frequency.
//!
//! Features
//! * `no_std`. Buffers are allocated on construction only, nothing is allocated while processing.
//! * No locks, no I/O and bounded work per sample, suitable for real time audio callbacks.
//!
//! Zero crossing detection is cheap and has a latency of a single cycle, but it needs a clean,
//! nearly sinusoidal input. Whistling is about as close to a pure tone as the human voice gets.
//! It is not meant for polyphonic or noisy input.

#![no_std]

extern crate alloc;
#[cfg(test)]
extern crate std;

pub mod common;
mod error;
pub mod midi;
pub mod resynth;
pub mod zc;

pub use error::Error;

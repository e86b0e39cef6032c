//! Common tables and utilities.

mod chromatic;
mod midi;
mod sine_table;

pub use chromatic::{ChromaticEntry, ChromaticTable, WHISTLE_RANGE};
pub use midi::{cents_off_nearest, freq_to_midi_note, midi_note_to_freq};
pub use sine_table::{SineTable, DEFAULT_SINE_TABLE_SIZE};

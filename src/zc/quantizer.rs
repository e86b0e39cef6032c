use crate::common::{ChromaticEntry, ChromaticTable};
use crate::Error;

/// Maps measured periods to notes of a [`ChromaticTable`].
///
/// Quantization uses the arithmetic midpoint between neighboring table
/// frequencies as the decision boundary. Since the table entries are
/// semitones, this is close enough to snapping on a logarithmic scale.
#[derive(Clone, Copy, Debug)]
pub struct FrequencyQuantizer<'a> {
    sample_rate: f32,
    table: ChromaticTable<'a>,
}

impl<'a> FrequencyQuantizer<'a> {
    pub fn new(sample_rate: f32, table: ChromaticTable<'a>) -> Result<Self, Error> {
        if !sample_rate.is_finite() || !(sample_rate > 0.0) {
            return Err(Error::InvalidSampleRate(sample_rate));
        }
        Ok(FrequencyQuantizer { sample_rate, table })
    }

    /// Converts a period in samples to a frequency in Hz. Returns `None` for
    /// periods that are not positive and finite.
    pub fn frequency(&self, period: f32) -> Option<f32> {
        if !period.is_finite() || !(period > 0.0) {
            return None;
        }
        Some(self.sample_rate / period)
    }

    /// The table entry nearest to the frequency of `period`, if it is within the table range.
    pub fn quantize_entry(&self, period: f32) -> Option<&'a ChromaticEntry> {
        self.frequency(period)
            .and_then(|frequency| self.table.nearest(frequency))
    }

    /// The MIDI note number nearest to the frequency of `period`, if it is within the table range.
    pub fn quantize(&self, period: f32) -> Option<u8> {
        self.quantize_entry(period).map(|entry| entry.note_number)
    }

    /// The period of the highest note in the table.
    pub fn min_period(&self) -> f32 {
        self.sample_rate / self.table.highest().frequency
    }

    /// The period of the lowest note in the table.
    pub fn max_period(&self) -> f32 {
        self.sample_rate / self.table.lowest().frequency
    }

    /// Returns true if `period` lies strictly between [`min_period`](Self::min_period)
    /// and [`max_period`](Self::max_period).
    pub fn is_in_range(&self, period: f32) -> bool {
        self.min_period() < period && period < self.max_period()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn table(&self) -> &ChromaticTable<'a> {
        &self.table
    }
}

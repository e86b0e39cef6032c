//! Chromatic reference tables, used for snapping a detected frequency to a note.

use crate::Error;

/// A single note of a [`ChromaticTable`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChromaticEntry {
    /// The center frequency of the note in Hz.
    pub frequency: f32,
    /// Note name, e.g `"F#5"`.
    pub name: &'static str,
    /// The [MIDI note number](https://newt.phys.unsw.edu.au/jw/notes.html) of the note.
    pub note_number: u8,
}

impl ChromaticEntry {
    pub const fn new(frequency: f32, name: &'static str, note_number: u8) -> Self {
        ChromaticEntry {
            frequency,
            name,
            note_number,
        }
    }
}

/// Equal tempered semitones from Eb5 to F7, roughly the range of a whistle.
pub const WHISTLE_RANGE: [ChromaticEntry; 27] = [
    ChromaticEntry::new(622.2540, "Eb5", 75),
    ChromaticEntry::new(659.2551, "E5", 76),
    ChromaticEntry::new(698.4565, "F5", 77),
    ChromaticEntry::new(739.9888, "F#5", 78),
    ChromaticEntry::new(783.9909, "G5", 79),
    ChromaticEntry::new(830.6094, "Ab5", 80),
    ChromaticEntry::new(880.0000, "A5", 81),
    ChromaticEntry::new(932.3275, "Bb5", 82),
    ChromaticEntry::new(987.7666, "B5", 83),
    ChromaticEntry::new(1046.502, "C6", 84),
    ChromaticEntry::new(1108.731, "Db6", 85),
    ChromaticEntry::new(1174.659, "D6", 86),
    ChromaticEntry::new(1244.508, "Eb6", 87),
    ChromaticEntry::new(1318.510, "E6", 88),
    ChromaticEntry::new(1396.913, "F6", 89),
    ChromaticEntry::new(1479.978, "F#6", 90),
    ChromaticEntry::new(1567.982, "G6", 91),
    ChromaticEntry::new(1661.219, "Ab6", 92),
    ChromaticEntry::new(1760.000, "A6", 93),
    ChromaticEntry::new(1864.655, "Bb6", 94),
    ChromaticEntry::new(1975.533, "B6", 95),
    ChromaticEntry::new(2093.005, "C7", 96),
    ChromaticEntry::new(2217.461, "Db7", 97),
    ChromaticEntry::new(2349.318, "D7", 98),
    ChromaticEntry::new(2489.016, "Eb7", 99),
    ChromaticEntry::new(2637.020, "E7", 100),
    ChromaticEntry::new(2793.826, "F7", 101),
];

/// An ordered, validated list of notes. Frequencies are strictly increasing
/// and there are at least two entries, so there is always a midpoint
/// between neighboring notes.
#[derive(Clone, Copy, Debug)]
pub struct ChromaticTable<'a> {
    entries: &'a [ChromaticEntry],
}

impl ChromaticTable<'static> {
    /// The [`WHISTLE_RANGE`] table.
    pub fn whistle() -> Self {
        ChromaticTable {
            entries: &WHISTLE_RANGE,
        }
    }
}

impl Default for ChromaticTable<'static> {
    fn default() -> Self {
        ChromaticTable::whistle()
    }
}

impl<'a> ChromaticTable<'a> {
    pub fn new(entries: &'a [ChromaticEntry]) -> Result<Self, Error> {
        if entries.len() < 2 {
            return Err(Error::TableTooShort(entries.len()));
        }
        for (index, entry) in entries.iter().enumerate() {
            if !entry.frequency.is_finite() || !(entry.frequency > 0.0) {
                return Err(Error::InvalidTableFrequency(index));
            }
        }
        for (index, pair) in entries.windows(2).enumerate() {
            if !(pair[0].frequency < pair[1].frequency) {
                return Err(Error::TableNotAscending(index + 1));
            }
        }
        Ok(ChromaticTable { entries })
    }

    pub fn entries(&self) -> &'a [ChromaticEntry] {
        self.entries
    }

    /// The entry with the lowest frequency.
    pub fn lowest(&self) -> &'a ChromaticEntry {
        &self.entries[0]
    }

    /// The entry with the highest frequency.
    pub fn highest(&self) -> &'a ChromaticEntry {
        &self.entries[self.entries.len() - 1]
    }

    /// Looks up an entry by MIDI note number.
    pub fn entry(&self, note_number: u8) -> Option<&'a ChromaticEntry> {
        self.entries
            .iter()
            .find(|entry| entry.note_number == note_number)
    }

    /// Returns the entry closest to `frequency`, using the arithmetic midpoint
    /// between neighboring entries as the decision boundary, or `None` if
    /// `frequency` is outside the table.
    pub fn nearest(&self, frequency: f32) -> Option<&'a ChromaticEntry> {
        if !frequency.is_finite()
            || frequency < self.lowest().frequency
            || frequency > self.highest().frequency
        {
            return None;
        }
        for pair in self.entries.windows(2) {
            let midpoint = 0.5 * (pair[0].frequency + pair[1].frequency);
            if frequency < midpoint {
                return Some(&pair[0]);
            }
        }
        Some(self.highest())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whistle_range_is_valid() {
        let table = ChromaticTable::new(&WHISTLE_RANGE).unwrap();
        assert_eq!(table.lowest().name, "Eb5");
        assert_eq!(table.highest().note_number, 101);
        for pair in WHISTLE_RANGE.windows(2) {
            assert_eq!(pair[0].note_number + 1, pair[1].note_number);
        }
    }

    #[test]
    fn test_invalid_tables() {
        let single = [ChromaticEntry::new(440.0, "A4", 69)];
        assert_eq!(ChromaticTable::new(&single).unwrap_err(), Error::TableTooShort(1));
        assert_eq!(ChromaticTable::new(&[]).unwrap_err(), Error::TableTooShort(0));

        let descending = [
            ChromaticEntry::new(440.0, "A4", 69),
            ChromaticEntry::new(466.1638, "Bb4", 70),
            ChromaticEntry::new(466.1638, "Bb4", 70),
        ];
        assert_eq!(
            ChromaticTable::new(&descending).unwrap_err(),
            Error::TableNotAscending(2)
        );

        let infinite_top = [
            ChromaticEntry::new(440.0, "A4", 69),
            ChromaticEntry::new(f32::INFINITY, "Bb4", 70),
        ];
        assert_eq!(
            ChromaticTable::new(&infinite_top).unwrap_err(),
            Error::InvalidTableFrequency(1)
        );

        let zero_bottom = [
            ChromaticEntry::new(0.0, "A4", 69),
            ChromaticEntry::new(466.1638, "Bb4", 70),
        ];
        assert_eq!(
            ChromaticTable::new(&zero_bottom).unwrap_err(),
            Error::InvalidTableFrequency(0)
        );
        let nan = [
            ChromaticEntry::new(440.0, "A4", 69),
            ChromaticEntry::new(f32::NAN, "Bb4", 70),
            ChromaticEntry::new(493.8833, "B4", 71),
        ];
        assert!(ChromaticTable::new(&nan).is_err());
    }

    #[test]
    fn test_nearest_uses_midpoints() {
        let table = ChromaticTable::whistle();
        // Midpoint between F5 and F#5 is 719.2227 Hz, between F#5 and G5 761.98985 Hz
        assert_eq!(table.nearest(719.0).unwrap().note_number, 77);
        assert_eq!(table.nearest(719.3).unwrap().note_number, 78);
        assert_eq!(table.nearest(761.9).unwrap().note_number, 78);
        assert_eq!(table.nearest(762.0).unwrap().note_number, 79);
        // Exact table bounds are inside the range
        assert_eq!(table.nearest(622.254).unwrap().note_number, 75);
        assert_eq!(table.nearest(2793.826).unwrap().note_number, 101);
        assert_eq!(table.nearest(2790.0).unwrap().note_number, 101);
    }

    #[test]
    fn test_nearest_out_of_range() {
        let table = ChromaticTable::whistle();
        assert!(table.nearest(600.0).is_none());
        assert!(table.nearest(2900.0).is_none());
        assert!(table.nearest(f32::NAN).is_none());
        assert!(table.nearest(f32::INFINITY).is_none());
    }

    #[test]
    fn test_entry_lookup() {
        let table = ChromaticTable::whistle();
        assert_eq!(table.entry(78).unwrap().name, "F#5");
        assert!(table.entry(60).is_none());
    }
}

use micromath::F32Ext;

/// Converts a frequency in Hz to a [MIDI](https://en.wikipedia.org/wiki/MIDI) note number (with a fractional part).
pub fn freq_to_midi_note(freq: f32) -> f32 {
    12.0 * F32Ext::log2(freq) - 36.376316562295926
}

/// Converts a (possibly fractional) MIDI note number to a frequency in Hz.
pub fn midi_note_to_freq(note_number: f32) -> f32 {
    440.0 * F32Ext::powf(2.0, (note_number - 69.0) / 12.0)
}

/// The deviation in cents of `freq` from the nearest equal tempered note.
pub fn cents_off_nearest(freq: f32) -> f32 {
    let note_number = freq_to_midi_note(freq);
    100.0 * (note_number - F32Ext::round(note_number))
}

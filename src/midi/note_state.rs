/// Loudness below which detected notes are ignored.
pub const DEFAULT_GATE_THRESHOLD: u8 = 40;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteState {
    /// No note is sounding.
    Silent,
    /// A note-on has been sent for this note, without a matching note-off.
    Sounding(u8),
}

/// The events decided for a single cycle, in the order they should be sent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleEvents {
    /// The new expression value, if it differs from the last one sent.
    pub expression: Option<u8>,
    pub note_off: Option<u8>,
    pub note_on: Option<u8>,
}

impl CycleEvents {
    pub fn is_empty(&self) -> bool {
        self.expression.is_none() && self.note_off.is_none() && self.note_on.is_none()
    }
}

/// Decides when to start and stop notes.
///
/// Cycles without a note, or quieter than the gate threshold, are ignored
/// altogether and the current note keeps sounding. A new note-on is only
/// issued when a loud enough cycle has a different note than the sounding one.
/// This keeps noisy per-cycle estimates and short dropouts from producing a
/// burst of note on/off pairs.
#[derive(Clone, Debug)]
pub struct NoteStateMachine {
    state: NoteState,
    last_loudness: Option<u8>,
    gate_threshold: u8,
}

impl NoteStateMachine {
    pub fn new(gate_threshold: u8) -> Self {
        NoteStateMachine {
            state: NoteState::Silent,
            last_loudness: None,
            gate_threshold,
        }
    }

    /// Evaluates a completed cycle with quantized note `note` and loudness `loudness`.
    pub fn on_cycle(&mut self, note: Option<u8>, loudness: u8) -> CycleEvents {
        let mut events = CycleEvents::default();

        if self.last_loudness != Some(loudness) {
            self.last_loudness = Some(loudness);
            events.expression = Some(loudness);
        }

        let note = match note {
            Some(note) if loudness >= self.gate_threshold => note,
            _ => return events,
        };

        match self.state {
            NoteState::Sounding(sounding) if sounding == note => {}
            NoteState::Sounding(sounding) => {
                events.note_off = Some(sounding);
                events.note_on = Some(note);
            }
            NoteState::Silent => {
                events.note_on = Some(note);
            }
        }
        self.state = NoteState::Sounding(note);

        events
    }

    /// Returns to [`NoteState::Silent`], returning the note that needs a note-off, if any.
    pub fn release(&mut self) -> Option<u8> {
        match core::mem::replace(&mut self.state, NoteState::Silent) {
            NoteState::Sounding(note) => Some(note),
            NoteState::Silent => None,
        }
    }

    pub fn state(&self) -> NoteState {
        self.state
    }

    pub fn sounding_note(&self) -> Option<u8> {
        match self.state {
            NoteState::Sounding(note) => Some(note),
            NoteState::Silent => None,
        }
    }

    /// The last expression value reported by [`on_cycle`](Self::on_cycle).
    pub fn last_loudness(&self) -> Option<u8> {
        self.last_loudness
    }

    pub fn gate_threshold(&self) -> u8 {
        self.gate_threshold
    }
}

impl Default for NoteStateMachine {
    fn default() -> Self {
        NoteStateMachine::new(DEFAULT_GATE_THRESHOLD)
    }
}

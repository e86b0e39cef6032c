use core::sync::atomic::{AtomicU8, Ordering};

const NO_NOTE: u8 = u8::MAX;

/// Publishes the sounding note and the last loudness from the audio thread,
/// to be polled by a display or control thread.
///
/// The two values are independent atomics. A reader may see a note and a
/// loudness from different cycles.
#[derive(Debug)]
pub struct NoteMonitor {
    note: AtomicU8,
    loudness: AtomicU8,
}

impl NoteMonitor {
    pub const fn new() -> Self {
        NoteMonitor {
            note: AtomicU8::new(NO_NOTE),
            loudness: AtomicU8::new(0),
        }
    }

    pub(crate) fn publish(&self, note: Option<u8>, loudness: u8) {
        self.note.store(note.unwrap_or(NO_NOTE), Ordering::Release);
        self.loudness.store(loudness, Ordering::Release);
    }

    /// The transmitted note number of the sounding note.
    pub fn note(&self) -> Option<u8> {
        match self.note.load(Ordering::Acquire) {
            NO_NOTE => None,
            note => Some(note),
        }
    }

    /// The most recent loudness, in `0..=127`.
    pub fn loudness(&self) -> u8 {
        self.loudness.load(Ordering::Acquire)
    }
}

impl Default for NoteMonitor {
    fn default() -> Self {
        NoteMonitor::new()
    }
}

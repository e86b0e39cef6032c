use thiserror::Error;

/// Errors returned when constructing trackers, tables and consumers
/// from invalid options.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum Error {
    #[error("sample rate must be a positive finite number, got {0}")]
    InvalidSampleRate(f32),
    #[error("a chromatic table needs at least 2 entries, got {0}")]
    TableTooShort(usize),
    #[error("chromatic table entry {0} must have a positive finite frequency")]
    InvalidTableFrequency(usize),
    #[error("chromatic table frequencies must be strictly increasing (entry {0})")]
    TableNotAscending(usize),
    #[error("envelope window size must be greater than 0")]
    InvalidWindowSize,
    #[error("envelope divisor must be a positive finite number, got {0}")]
    InvalidEnvelopeDivisor(f32),
    #[error("MIDI channel must be in 0..=15, got {0}")]
    InvalidChannel(u8),
    #[error("MIDI data byte must be in 0..=127, got {0}")]
    InvalidDataByte(u8),
    #[error("note on velocity must be in 1..=127, got {0}")]
    InvalidVelocity(u8),
    #[error("resynthesizer {0} must be a finite, non-negative number")]
    InvalidResynthOption(&'static str),
}

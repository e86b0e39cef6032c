use alloc::{boxed::Box, vec};
use micromath::F32Ext;

use crate::Error;

/// The number of cycle energies averaged by default.
pub const DEFAULT_ENVELOPE_WINDOW_SIZE: usize = 20;
/// Default divisor applied to the mean cycle energy before scaling it to `0..=127`.
pub const DEFAULT_ENVELOPE_DIVISOR: f32 = 2.0;

/// Smooths per-cycle energies over a sliding window of the most recent cycles
/// and maps the mean to a MIDI value.
///
/// The buffer starts out filled with zeros, so the loudness ramps up over the
/// first window of cycles.
pub struct WindowedEnvelope {
    energies: Box<[f32]>,
    write_index: usize,
    divisor: f32,
    loudness: u8,
}

impl WindowedEnvelope {
    pub fn new() -> Self {
        WindowedEnvelope {
            energies: vec![0.0; DEFAULT_ENVELOPE_WINDOW_SIZE].into_boxed_slice(),
            write_index: 0,
            divisor: DEFAULT_ENVELOPE_DIVISOR,
            loudness: 0,
        }
    }

    pub fn from_options(window_size: usize, divisor: f32) -> Result<Self, Error> {
        if window_size == 0 {
            return Err(Error::InvalidWindowSize);
        }
        if !divisor.is_finite() || !(divisor > 0.0) {
            return Err(Error::InvalidEnvelopeDivisor(divisor));
        }
        Ok(WindowedEnvelope {
            energies: vec![0.0; window_size].into_boxed_slice(),
            write_index: 0,
            divisor,
            loudness: 0,
        })
    }

    /// Replaces the oldest energy in the window with `energy` and returns the new loudness.
    pub fn update(&mut self, energy: f32) -> u8 {
        self.energies[self.write_index] = if energy.is_finite() { energy } else { 0.0 };
        self.write_index = (self.write_index + 1) % self.energies.len();
        self.loudness = self.compute_loudness();
        self.loudness
    }

    /// The mean of the energies in the window.
    pub fn mean(&self) -> f32 {
        let sum: f32 = self.energies.iter().sum();
        sum / (self.energies.len() as f32)
    }

    /// The loudness computed by the most recent update, in `0..=127`.
    pub fn loudness(&self) -> u8 {
        self.loudness
    }

    pub fn window_size(&self) -> usize {
        self.energies.len()
    }

    pub fn reset(&mut self) {
        for energy in self.energies.iter_mut() {
            *energy = 0.0;
        }
        self.write_index = 0;
        self.loudness = 0;
    }

    fn compute_loudness(&self) -> u8 {
        let value = F32Ext::round(self.mean() / self.divisor * 127.0);
        if value >= 127.0 {
            127
        } else if value > 0.0 {
            value as u8
        } else {
            0
        }
    }
}

impl Default for WindowedEnvelope {
    fn default() -> Self {
        WindowedEnvelope::new()
    }
}

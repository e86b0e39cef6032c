use core::f32::consts::PI;
use micromath::F32Ext;

/// The number of entries used by [`SineTable`] unless specified otherwise.
pub const DEFAULT_SINE_TABLE_SIZE: usize = 100;

/// A lookup table approximation of `sin(2 * pi * phase)`, avoiding
/// transcendental function calls in the audio thread.
///
/// The table holds `N` values spanning one full cycle. A phase is mapped
/// to the nearest table entry and wraps around at 1.0, so
/// `sine(phase) == sine(phase + 1.0)`.
#[derive(Clone, Debug)]
pub struct SineTable<const N: usize = DEFAULT_SINE_TABLE_SIZE> {
    values: [f32; N],
}

impl<const N: usize> SineTable<N> {
    pub fn new() -> Self {
        if N == 0 {
            panic!("Sine table size must be greater than 0")
        }
        let mut values = [0.0; N];
        for (index, value) in values.iter_mut().enumerate() {
            *value = F32Ext::sin(2.0 * PI * (index as f32) / (N as f32));
        }
        SineTable { values }
    }

    /// Returns the table value closest to `sin(2 * pi * phase)`.
    pub fn sine(&self, phase: f32) -> f32 {
        let position = F32Ext::floor(phase * (N as f32) + 0.5);
        if !position.is_finite() {
            return 0.0;
        }
        let index = (position as i64).rem_euclid(N as i64) as usize;
        self.values[index]
    }

    pub fn len(&self) -> usize {
        N
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

impl<const N: usize> Default for SineTable<N> {
    fn default() -> Self {
        SineTable::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_sine_within_resolution() {
        let table: SineTable = SineTable::new();
        // Snapping to the nearest of 100 entries is off by at most half a step.
        let max_error = PI / 100.0 + 0.005;
        for i in 0..1000 {
            let phase = (i as f32) / 1000.0;
            let expected = (2.0 * PI * phase).sin();
            assert!(
                (table.sine(phase) - expected).abs() <= max_error,
                "phase {}",
                phase
            );
        }
    }

    #[test]
    fn test_wraps_at_one() {
        let table: SineTable = SineTable::new();
        for i in 0..100 {
            let phase = (i as f32) * 0.0123;
            assert_eq!(table.sine(phase), table.sine(phase + 1.0));
            assert_eq!(table.sine(phase), table.sine(phase + 3.0));
        }
        // Slightly negative phases wrap to the end of the table.
        assert_eq!(table.sine(-0.25), table.sine(0.75));
        assert_eq!(table.sine(1.0), table.values()[0]);
    }

    #[test]
    fn test_quarter_points() {
        let table = SineTable::<100>::new();
        assert!(table.sine(0.0).abs() < 0.01);
        assert!((table.sine(0.25) - 1.0).abs() < 0.01);
        assert!(table.sine(0.5).abs() < 0.01);
        assert!((table.sine(0.75) + 1.0).abs() < 0.01);
    }

    #[test]
    fn test_non_finite_phase_is_silent() {
        let table = SineTable::<16>::new();
        assert_eq!(table.len(), 16);
        assert_eq!(table.sine(f32::NAN), 0.0);
        assert_eq!(table.sine(f32::INFINITY), 0.0);
    }
}

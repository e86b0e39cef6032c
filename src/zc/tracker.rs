use micromath::F32Ext;

/// The period length reported by [`ZeroCrossingTracker::samples_per_crossing`]
/// before the first cycle has been closed.
pub const INITIAL_SAMPLES_PER_CROSSING: f32 = 40.0;

/// Moduli of the sub-harmonic phase counters. Counting cycles modulo 8, 12 and 16
/// gives phase references roughly 3, 3.6 and 4 octaves below the fundamental.
pub const PHASE_COUNTER_MODULI: [usize; 3] = [8, 12, 16];

/// A completed cycle, reported on the sample that closes it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CycleResult {
    /// The distance in samples between this falling crossing and the previous one,
    /// including the interpolated fractional part.
    pub period: f32,
    /// The mean absolute amplitude over the cycle.
    pub energy: f32,
}

/// Measures the period of the input signal by timing falling (positive to negative)
/// zero crossings.
///
/// The crossing time is linearly interpolated between the last positive and the first
/// negative sample. The part of the closing sample that lies after the crossing is carried
/// into the next cycle, so interpolation errors do not accumulate over consecutive cycles.
/// Rising crossings only re-arm the detector.
#[derive(Clone, Debug)]
pub struct ZeroCrossingTracker {
    previous_sample: f32,
    is_positive: bool,
    samples_since_crossing: f32,
    samples_per_crossing: f32,
    accumulated_energy: f32,
    last_cycle_energy: f32,
    phase_counters: [usize; 3],
    cycle_count: u64,
}

impl ZeroCrossingTracker {
    pub fn new() -> Self {
        ZeroCrossingTracker {
            // There is no history before the first sample, so start out
            // in a positive half cycle with a previous sample of zero.
            previous_sample: 0.0,
            is_positive: true,
            samples_since_crossing: 0.0,
            samples_per_crossing: INITIAL_SAMPLES_PER_CROSSING,
            accumulated_energy: 0.0,
            last_cycle_energy: 0.0,
            phase_counters: [0; 3],
            cycle_count: 0,
        }
    }

    /// Returns the tracker to the state it had on creation.
    pub fn reset(&mut self) {
        *self = ZeroCrossingTracker::new();
    }

    /// Processes a single sample. Returns the completed cycle if this sample closed one.
    /// Non-finite samples are treated as silence.
    pub fn update(&mut self, sample: f32) -> Option<CycleResult> {
        let sample = if sample.is_finite() { sample } else { 0.0 };

        self.accumulated_energy += F32Ext::abs(sample);
        self.samples_since_crossing += 1.0;

        let mut result = None;
        if self.is_positive {
            if sample < 0.0 {
                result = self.close_cycle(self.previous_sample, sample);
            }
        } else if sample > 0.0 {
            self.is_positive = true;
        }
        self.previous_sample = sample;

        result
    }

    fn close_cycle(&mut self, last_positive: f32, first_negative: f32) -> Option<CycleResult> {
        let adjustment = crossing_adjustment(last_positive, first_negative);
        let period = self.samples_since_crossing - adjustment;
        let accumulated_energy = self.accumulated_energy;

        self.is_positive = false;
        self.samples_since_crossing = adjustment;
        self.accumulated_energy = 0.0;

        // Only the very first sample of a stream can produce a crossing this close
        // to the previous one.
        if !(period > 0.0) {
            return None;
        }

        for (counter, modulus) in self.phase_counters.iter_mut().zip(PHASE_COUNTER_MODULI.iter()) {
            *counter = (*counter + 1) % modulus;
        }

        self.samples_per_crossing = period;
        self.last_cycle_energy = accumulated_energy / period;
        self.cycle_count += 1;

        Some(CycleResult {
            period,
            energy: self.last_cycle_energy,
        })
    }

    /// Samples elapsed since the most recent falling crossing, with a fractional part.
    pub fn samples_since_crossing(&self) -> f32 {
        self.samples_since_crossing
    }

    /// The most recently completed period, or [`INITIAL_SAMPLES_PER_CROSSING`]
    /// if no cycle has been completed yet.
    pub fn samples_per_crossing(&self) -> f32 {
        self.samples_per_crossing
    }

    /// Mean absolute amplitude of the most recently completed cycle.
    pub fn last_cycle_energy(&self) -> f32 {
        self.last_cycle_energy
    }

    /// Reported cycles counted modulo 8, 12 and 16, in the order of [`PHASE_COUNTER_MODULI`].
    pub fn phase_counters(&self) -> [usize; 3] {
        self.phase_counters
    }

    pub fn is_positive(&self) -> bool {
        self.is_positive
    }

    /// The number of cycles reported since creation or the last reset.
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }
}

impl Default for ZeroCrossingTracker {
    fn default() -> Self {
        ZeroCrossingTracker::new()
    }
}

/// The distance in samples from a linearly interpolated falling crossing to the
/// first negative sample `first_negative`, given the preceding sample `last_positive`.
///
/// ```text
///  p
///   \
/// ---x------
///     \
///      n
/// ```
///
/// The crossing `x` splits the step from `p` to `n` in proportion to their distances
/// from zero, so it lies `|n| / (|n| + |p|) = -n / (p - n)` samples before `n`.
/// The result is in `[0, 1)` for `p > 0` and exactly 1 if `p` is zero. A degenerate
/// step with `p - n <= 0` gives 0, i.e the crossing is placed at `n`.
pub fn crossing_adjustment(last_positive: f32, first_negative: f32) -> f32 {
    let step = last_positive - first_negative;
    if !(step > 0.0) {
        return 0.0;
    }
    -first_negative / step
}

use crate::common::{ChromaticTable, SineTable, DEFAULT_SINE_TABLE_SIZE};
use crate::zc::{CycleConsumer, CycleResult, FrequencyQuantizer, ZeroCrossingTracker, PHASE_COUNTER_MODULI};
use crate::Error;

/// Energy subtracted from the cycle energy before it scales the output.
pub const DEFAULT_NOISE_FLOOR: f32 = 0.1;

/// [`SubHarmonicResynth`] options.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResynthConfig {
    /// Cycles with an energy below this value produce silence.
    pub noise_floor: f32,
    /// Output gain.
    pub gain: f32,
    /// Weights of the sub-harmonics at 1/8, 1/12 and 1/16 of the input frequency.
    pub weights: [f32; 3],
    /// Upper bound of the energy above the noise floor, if any.
    pub energy_ceiling: Option<f32>,
    /// One-pole smoothing factor `k`, `out = (value + k * previous_out) / (k + 1)`.
    /// 0 disables smoothing.
    pub smoothing: f32,
}

impl Default for ResynthConfig {
    fn default() -> Self {
        ResynthConfig {
            noise_floor: DEFAULT_NOISE_FLOOR,
            gain: 1.0,
            weights: [1.0; 3],
            energy_ceiling: None,
            smoothing: 0.0,
        }
    }
}

impl ResynthConfig {
    pub fn validate(&self) -> Result<(), Error> {
        fn check(value: f32, name: &'static str) -> Result<(), Error> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(Error::InvalidResynthOption(name))
            }
        }
        check(self.noise_floor, "noise floor")?;
        check(self.smoothing, "smoothing")?;
        if !self.gain.is_finite() {
            return Err(Error::InvalidResynthOption("gain"));
        }
        if self.weights.iter().any(|weight| !weight.is_finite()) {
            return Err(Error::InvalidResynthOption("weight"));
        }
        if let Some(ceiling) = self.energy_ceiling {
            check(ceiling, "energy ceiling")?;
        }
        Ok(())
    }
}

/// Generates a tone three to four octaves below the tracked input.
///
/// The tracker counts cycles modulo 8, 12 and 16. Together with the time since the last
/// crossing, each counter gives the phase of a sine at 1/8, 1/12 and 1/16 of the input
/// frequency, locked to the input cycles. Their weighted sum is scaled by the energy of
/// the last cycle minus a noise floor.
///
/// Output is silent while the last period is outside the range of the chromatic table
/// the resynthesizer was created for.
#[derive(Clone, Debug)]
pub struct SubHarmonicResynth<'a, const N: usize = DEFAULT_SINE_TABLE_SIZE> {
    quantizer: FrequencyQuantizer<'a>,
    config: ResynthConfig,
    sine_table: SineTable<N>,
    sample_energy: f32,
    last_output: f32,
}

impl SubHarmonicResynth<'static> {
    /// Creates a resynthesizer for the whistle range with default options.
    pub fn new(sample_rate: f32) -> Result<Self, Error> {
        let quantizer = FrequencyQuantizer::new(sample_rate, ChromaticTable::whistle())?;
        SubHarmonicResynth::from_options(quantizer, ResynthConfig::default())
    }
}

impl<'a, const N: usize> SubHarmonicResynth<'a, N> {
    /// Creates a resynthesizer gated by the period range of `quantizer`'s table.
    pub fn from_options(quantizer: FrequencyQuantizer<'a>, config: ResynthConfig) -> Result<Self, Error> {
        config.validate()?;
        log::debug!(
            "Sub-harmonic resynth, periods {:.2}..{:.2} samples, {} sine table entries, {:?}",
            quantizer.min_period(),
            quantizer.max_period(),
            N,
            config
        );
        Ok(SubHarmonicResynth {
            quantizer,
            config,
            sine_table: SineTable::new(),
            sample_energy: 0.0,
            last_output: 0.0,
        })
    }

    /// Computes an unsmoothed output sample from the current tracker state.
    pub fn synthesize(&self, tracker: &ZeroCrossingTracker) -> f32 {
        let period = tracker.samples_per_crossing();
        if !self.quantizer.is_in_range(period) {
            return 0.0;
        }

        let mut energy = (self.sample_energy - self.config.noise_floor).max(0.0);
        if let Some(ceiling) = self.config.energy_ceiling {
            energy = energy.min(ceiling);
        }
        if energy == 0.0 {
            return 0.0;
        }

        let since = tracker.samples_since_crossing();
        let mut sum = 0.0;
        for ((counter, modulus), weight) in tracker
            .phase_counters()
            .iter()
            .zip(PHASE_COUNTER_MODULI.iter())
            .zip(self.config.weights.iter())
        {
            let phase = (since + period * (*counter as f32)) / (period * (*modulus as f32));
            sum += weight * self.sine_table.sine(phase);
        }

        self.config.gain * energy * sum
    }

    /// The cycle energy currently scaling the output.
    pub fn sample_energy(&self) -> f32 {
        self.sample_energy
    }

    pub fn last_output(&self) -> f32 {
        self.last_output
    }

    pub fn config(&self) -> &ResynthConfig {
        &self.config
    }

    pub fn quantizer(&self) -> &FrequencyQuantizer<'a> {
        &self.quantizer
    }

    pub fn reset(&mut self) {
        self.sample_energy = 0.0;
        self.last_output = 0.0;
    }
}

impl<'a, const N: usize> CycleConsumer for SubHarmonicResynth<'a, N> {
    type Output = f32;

    fn consume(&mut self, tracker: &ZeroCrossingTracker, cycle: Option<CycleResult>) -> f32 {
        if let Some(cycle) = cycle {
            self.sample_energy = cycle.energy;
        }
        let value = self.synthesize(tracker);
        let k = self.config.smoothing;
        let output = if k > 0.0 {
            (value + k * self.last_output) / (k + 1.0)
        } else {
            value
        };
        self.last_output = output;
        output
    }
}

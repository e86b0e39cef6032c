//! Zero crossing period tracking.
//!
//! A [`ZeroCrossingTracker`] consumes one sample at a time and reports a [`CycleResult`]
//! on every sample that closes a cycle, i.e on every falling zero crossing. The cycle period
//! includes a linearly interpolated fractional part. A [`FrequencyQuantizer`] turns periods into
//! notes of a [chromatic table](crate::common::ChromaticTable).
//!
//! For building instruments on top of the tracker, wrap a [`CycleConsumer`] in a
//! [`Detector`]. The detector drives the tracker and hands its state to the consumer after
//! every sample.
//!
//! # Examples
//! ```
//! use micro_whistle::common::ChromaticTable;
//! use micro_whistle::zc::{FrequencyQuantizer, ZeroCrossingTracker};
//!
//! // A pure tone at 735 Hz, one cycle every 60 samples
//! let sample_rate = 44100.0;
//! let frequency = 735.0;
//! let signal: Vec<f32> = (0..4410)
//!     .map(|i| (2.0 * std::f64::consts::PI * frequency * (i as f64) / sample_rate).sin() as f32)
//!     .collect();
//!
//! let quantizer = FrequencyQuantizer::new(sample_rate as f32, ChromaticTable::whistle()).unwrap();
//! let mut tracker = ZeroCrossingTracker::new();
//! let mut cycle_count = 0;
//! for sample in signal.iter() {
//!     if let Some(cycle) = tracker.update(*sample) {
//!         cycle_count += 1;
//!         // The first cycle is measured from the start of the signal
//!         if cycle_count > 1 {
//!             assert!((cycle.period - 60.0).abs() < 0.01);
//!             let entry = quantizer.quantize_entry(cycle.period).unwrap();
//!             assert_eq!(entry.name, "F#5");
//!         }
//!     }
//! }
//! assert_eq!(cycle_count, 73);
//! ```

mod detector;
mod quantizer;
mod tracker;

pub use detector::{CycleConsumer, Detector};
pub use quantizer::FrequencyQuantizer;
pub use tracker::{
    crossing_adjustment, CycleResult, ZeroCrossingTracker, INITIAL_SAMPLES_PER_CROSSING,
    PHASE_COUNTER_MODULI,
};

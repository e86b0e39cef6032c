//! Sub-harmonic resynthesis.
//!
//! [`SubHarmonicResynth`] is a [`CycleConsumer`](crate::zc::CycleConsumer) producing one
//! output sample per input sample. The output is a sum of sines at 1/8, 1/12 and 1/16 of the
//! tracked frequency, phase locked to the input cycles and scaled by the energy of the most
//! recent cycle.
//!
//! # Examples
//! ```
//! use micro_whistle::resynth::SubHarmonicResynth;
//! use micro_whistle::zc::Detector;
//!
//! let sample_rate = 44100.0;
//! let input: Vec<f32> = (0..4410)
//!     .map(|i| (2.0 * std::f32::consts::PI * 1000.0 * (i as f32) / sample_rate).sin())
//!     .collect();
//! let mut output = vec![0.0; input.len()];
//!
//! let mut detector = Detector::new(SubHarmonicResynth::new(sample_rate).unwrap());
//! detector.process_into(&input, &mut output);
//! assert!(output.iter().any(|value| *value != 0.0));
//! ```

mod resynthesizer;

pub use resynthesizer::{ResynthConfig, SubHarmonicResynth, DEFAULT_NOISE_FLOOR};

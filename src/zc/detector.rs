use crate::zc::tracker::{CycleResult, ZeroCrossingTracker};

/// Receives the tracker state once per input sample. Implemented by
/// [`NoteEmitter`](crate::midi::NoteEmitter) and
/// [`SubHarmonicResynth`](crate::resynth::SubHarmonicResynth).
pub trait CycleConsumer {
    type Output;

    /// Called after `tracker` has processed a sample. `cycle` is the cycle
    /// closed by that sample, if any.
    fn consume(&mut self, tracker: &ZeroCrossingTracker, cycle: Option<CycleResult>) -> Self::Output;
}

/// * Feeds input samples to a [`ZeroCrossingTracker`]
/// * Hands the tracker state to a [`CycleConsumer`] after every sample
pub struct Detector<C> {
    tracker: ZeroCrossingTracker,
    consumer: C,
    processed_sample_count: u64,
}

impl<C: CycleConsumer> Detector<C> {
    pub fn new(consumer: C) -> Self {
        Detector {
            tracker: ZeroCrossingTracker::new(),
            consumer,
            processed_sample_count: 0,
        }
    }

    /// Processes a single sample and returns what the consumer produced for it.
    pub fn process_sample(&mut self, sample: f32) -> C::Output {
        let cycle = self.tracker.update(sample);
        self.processed_sample_count += 1;
        self.consumer.consume(&self.tracker, cycle)
    }

    /// Processes a buffer of samples, invoking `handler` with the index of each
    /// sample in `samples` and the consumer output for it.
    pub fn process<F>(&mut self, samples: &[f32], mut handler: F)
    where
        F: FnMut(usize, C::Output),
    {
        for (sample_index, sample) in samples.iter().enumerate() {
            let output = self.process_sample(*sample);
            handler(sample_index, output);
        }
    }

    pub fn tracker(&self) -> &ZeroCrossingTracker {
        &self.tracker
    }

    pub fn consumer(&self) -> &C {
        &self.consumer
    }

    pub fn consumer_mut(&mut self) -> &mut C {
        &mut self.consumer
    }

    pub fn into_consumer(self) -> C {
        self.consumer
    }

    /// The number of samples processed since the detector was created or reset.
    pub fn processed_sample_count(&self) -> u64 {
        self.processed_sample_count
    }

    /// Resets the tracker. Consumer state is left untouched.
    pub fn reset(&mut self) {
        self.tracker.reset();
        self.processed_sample_count = 0;
    }
}

impl<C: CycleConsumer<Output = f32>> Detector<C> {
    /// Processes `input`, writing one output sample per input sample to `output`.
    pub fn process_into(&mut self, input: &[f32], output: &mut [f32]) {
        if input.len() != output.len() {
            panic!(
                "Got output buffer of length {}, expected {}",
                output.len(),
                input.len()
            )
        }
        for (sample, out) in input.iter().zip(output.iter_mut()) {
            *out = self.process_sample(*sample);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::vec;
    use crate::alloc::vec::Vec;

    /// Records every closed cycle together with the index of the sample closing it.
    struct CycleRecorder {
        cycles: Vec<(u64, CycleResult)>,
        sample_index: u64,
    }

    impl CycleConsumer for CycleRecorder {
        type Output = bool;

        fn consume(&mut self, _: &ZeroCrossingTracker, cycle: Option<CycleResult>) -> bool {
            if let Some(cycle) = cycle {
                self.cycles.push((self.sample_index, cycle));
            }
            self.sample_index += 1;
            cycle.is_some()
        }
    }

    struct Passthrough;

    impl CycleConsumer for Passthrough {
        type Output = f32;

        fn consume(&mut self, tracker: &ZeroCrossingTracker, _: Option<CycleResult>) -> f32 {
            tracker.samples_since_crossing()
        }
    }

    fn square_wave(half_period: usize, length: usize) -> Vec<f32> {
        (0..length)
            .map(|i| if (i / half_period) % 2 == 0 { 0.5 } else { -0.5 })
            .collect()
    }

    #[test]
    fn test_chunked_processing_matches_single_buffer() {
        let signal = square_wave(7, 500);

        let mut whole = Detector::new(CycleRecorder {
            cycles: Vec::new(),
            sample_index: 0,
        });
        whole.process(&signal, |_, _| {});

        let mut chunked = Detector::new(CycleRecorder {
            cycles: Vec::new(),
            sample_index: 0,
        });
        for chunk in signal.chunks(13) {
            chunked.process(chunk, |_, _| {});
        }

        assert_eq!(whole.processed_sample_count(), 500);
        assert_eq!(chunked.processed_sample_count(), 500);
        assert_eq!(whole.consumer().cycles, chunked.consumer().cycles);
        assert!(!whole.consumer().cycles.is_empty());
    }

    #[test]
    fn test_handler_sample_indices() {
        let signal = square_wave(5, 40);
        let mut detector = Detector::new(CycleRecorder {
            cycles: Vec::new(),
            sample_index: 0,
        });
        let mut closing_indices = Vec::new();
        detector.process(&signal, |sample_index, closed| {
            if closed {
                closing_indices.push(sample_index);
            }
        });
        assert_eq!(closing_indices, vec![5, 15, 25, 35]);
        assert_eq!(detector.tracker().cycle_count(), 4);
    }

    #[test]
    fn test_process_into() {
        let signal = square_wave(4, 32);
        let mut output = vec![0.0; signal.len()];
        let mut detector = Detector::new(Passthrough);
        detector.process_into(&signal, &mut output);
        assert_eq!(output[0], 1.0);
        // Crossing exactly halfway between samples 3 and 4
        assert_eq!(output[4], 0.5);
        assert_eq!(output[5], 1.5);

        detector.reset();
        assert_eq!(detector.processed_sample_count(), 0);
        assert_eq!(detector.tracker().cycle_count(), 0);
    }

    #[test]
    #[should_panic]
    fn test_process_into_length_mismatch() {
        let mut detector = Detector::new(Passthrough);
        let mut output = [0.0; 3];
        detector.process_into(&[0.0; 4], &mut output);
    }
}

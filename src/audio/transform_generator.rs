use crate::audio::constants;
use crate::audio::ring_queue::{ring_queue, QueueConsumer, QueueProducer};
use apodize::blackman_iter;
use nih_plug::util;
use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};
use std::sync::Arc;

/// Turns a stream of audio blocks into dB-mapped magnitude vectors.
///
/// Keeps the last `transform_size` samples as a sliding history. Every block
/// shifts the history left, appends the block, and runs a windowed FFT over the
/// whole history. The result has `transform_size / 2` values in `[0, 1]`, where
/// 0 is the dB floor and 1 is 0 dBFS, and is published to an output queue that
/// the path renderer drains.
pub struct TransformDataGenerator {
    // FFT instance
    fft: Arc<dyn RealToComplex<f32>>,

    // Window function (precomputed)
    window: Vec<f32>,

    // Most recent `transform_size` samples, oldest first
    history: Vec<f32>,

    // Buffers
    time_domain_buffer: Vec<f32>,
    frequency_domain_buffer: Vec<Complex32>,
    scratch: Vec<Complex32>,
    magnitudes: Vec<f32>,

    floor_db: f32,

    // Both ends live on the display thread, the queue only decouples producing
    // from rendering
    producer: QueueProducer<Vec<f32>>,
    consumer: QueueConsumer<Vec<f32>>,

    dropped_vectors: usize,
}

impl TransformDataGenerator {
    pub fn new(transform_size: usize, capacity: usize) -> Self {
        nih_plug::nih_debug_assert!(
            transform_size.is_power_of_two() && transform_size >= 2,
            "transform size must be a power of two"
        );

        // Create FFT planner and get FFT instance
        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(transform_size);

        // Blackman window keeps sidelobes well below the -48 dB default floor
        let window: Vec<f32> = blackman_iter(transform_size).map(|w| w as f32).collect();

        let num_bins = transform_size / 2;
        let (producer, consumer) = ring_queue(capacity, || vec![0.0; num_bins]);

        Self {
            frequency_domain_buffer: fft.make_output_vec(),
            scratch: fft.make_scratch_vec(),
            fft,
            window,
            history: vec![0.0; transform_size],
            time_domain_buffer: vec![0.0; transform_size],
            magnitudes: vec![0.0; num_bins],
            floor_db: constants::DEFAULT_FLOOR_DB,
            producer,
            consumer,
            dropped_vectors: 0,
        }
    }

    pub fn transform_size(&self) -> usize {
        self.history.len()
    }

    /// Length of every produced magnitude vector
    pub fn num_bins(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn floor_db(&self) -> f32 {
        self.floor_db
    }

    pub fn set_floor_db(&mut self, floor_db: f32) {
        self.floor_db = floor_db.clamp(constants::MIN_FLOOR_DB, constants::MAX_FLOOR_DB);
    }

    /// The sliding sample history, oldest sample first
    pub fn history(&self) -> &[f32] {
        &self.history
    }

    /// Vectors dropped because the output queue was full
    pub fn dropped_vectors(&self) -> usize {
        self.dropped_vectors
    }

    /// Clear the history and discard all pending vectors
    pub fn reset(&mut self) {
        self.history.fill(0.0);
        self.consumer.clear();
        self.dropped_vectors = 0;
    }

    /// Append one block to the history and publish the resulting magnitude
    /// vector. Returns `false` if the vector could not be produced or queued.
    pub fn process_block(&mut self, samples: &[f32]) -> bool {
        self.slide_history(samples);
        self.produce_transform_data()
    }

    /// Shift the history left by the block length and copy the block into the
    /// vacated tail. Blocks longer than the history only keep their newest part.
    fn slide_history(&mut self, samples: &[f32]) {
        let size = self.history.len();
        let samples = &samples[samples.len().saturating_sub(size)..];

        self.history.copy_within(samples.len().., 0);
        self.history[size - samples.len()..].copy_from_slice(samples);
    }

    /// Run the windowed transform over the current history and push the result
    pub fn produce_transform_data(&mut self) -> bool {
        // Step 1: Apply window function to input
        for ((windowed, sample), coeff) in self
            .time_domain_buffer
            .iter_mut()
            .zip(&self.history)
            .zip(&self.window)
        {
            *windowed = sample * coeff;
        }

        // Step 2: Run FFT (time domain -> frequency domain)
        if self
            .fft
            .process_with_scratch(
                &mut self.time_domain_buffer,
                &mut self.frequency_domain_buffer,
                &mut self.scratch,
            )
            .is_err()
        {
            // FFT failed - skip this frame, the renderer keeps the last one
            return false;
        }

        // Step 3: Calculate magnitudes, convert to dB and map onto [0, 1]
        let num_bins = self.magnitudes.len() as f32;
        for (magnitude, bin) in self
            .magnitudes
            .iter_mut()
            .zip(&self.frequency_domain_buffer)
        {
            let db = util::gain_to_db(bin.norm() / num_bins).max(self.floor_db);
            *magnitude = constants::db_to_normalized(db, self.floor_db);
        }

        if self.producer.push(&self.magnitudes) {
            true
        } else {
            self.dropped_vectors += 1;
            nih_plug::nih_trace!(
                "Transform output queue full, dropped {} vectors so far",
                self.dropped_vectors
            );
            false
        }
    }

    /// Number of magnitude vectors waiting to be rendered
    pub fn available_blocks(&self) -> usize {
        self.consumer.ready_count()
    }

    /// Take the oldest magnitude vector
    pub fn pull(&mut self, magnitudes: &mut Vec<f32>) -> bool {
        self.consumer.pull(magnitudes)
    }
}

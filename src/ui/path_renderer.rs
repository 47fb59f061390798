use crate::audio::constants::{log_position_to_freq, QUEUE_CAPACITY, TRANSFORM_SIZE};
use crate::audio::sample_accumulator::{AudioBlock, AudioBlockConsumer, Channel};
use crate::audio::transform_generator::TransformDataGenerator;
use crate::ui::geometry::{Point, Rect};

/// Builds the RMS polyline from a magnitude vector.
///
/// One point per pixel column of the target area. Column `x` stands for the
/// frequency at `x / width` on a 20Hz-20kHz log axis, its height is the
/// magnitude of the nearest bin. The path is rebuilt from scratch every frame.
#[derive(Debug, Default)]
pub struct PathRenderer {
    path: Vec<Point>,
}

impl PathRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently generated path
    pub fn path(&self) -> &[Point] {
        &self.path
    }

    /// Replace the path with one generated from `magnitudes`, whose values are
    /// already mapped from `[floor, 0 dB]` onto `[0, 1]`.
    ///
    /// `bin_width` is the frequency step between bins (sample rate / transform
    /// size). Returns `false` and keeps the previous path when there is nothing
    /// sensible to draw.
    pub fn generate_path(&mut self, magnitudes: &[f32], bounds: Rect, bin_width: f32) -> bool {
        if magnitudes.is_empty() || bounds.is_empty() || !(bin_width > 0.0) {
            return false;
        }

        let columns = bounds.width.floor() as usize;
        let last_bin = magnitudes.len() - 1;

        self.path.clear();
        for column in 0..columns {
            let freq = log_position_to_freq(column as f32 / bounds.width);
            let bin = ((freq / bin_width).round() as usize).min(last_bin);

            let level = magnitudes[bin];
            let level = if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) };

            self.path.push(Point::new(
                bounds.x + column as f32,
                bounds.bottom() - level * bounds.height,
            ));
        }

        true
    }
}

/// One channel's chain from queued audio blocks to a finished path.
///
/// Drains the accumulator's queue into the transform data generator, then the
/// generator's vectors into the path renderer. Only the newest vector ends up in
/// the path, older ones are superseded within the same frame.
pub struct PathProducer {
    blocks: AudioBlockConsumer,
    incoming: AudioBlock,
    // Generation of the last block fed to the generator
    generation: u32,
    generator: TransformDataGenerator,
    magnitudes: Vec<f32>,
    renderer: PathRenderer,
}

impl PathProducer {
    pub fn new(channel: Channel, blocks: AudioBlockConsumer) -> Self {
        let generator = TransformDataGenerator::new(TRANSFORM_SIZE, QUEUE_CAPACITY);

        Self {
            blocks,
            incoming: AudioBlock::with_max_capacity(channel),
            generation: 0,
            magnitudes: vec![0.0; generator.num_bins()],
            generator,
            renderer: PathRenderer::new(),
        }
    }

    pub fn generator(&self) -> &TransformDataGenerator {
        &self.generator
    }

    pub fn set_floor_db(&mut self, floor_db: f32) {
        self.generator.set_floor_db(floor_db);
    }

    pub fn path(&self) -> &[Point] {
        self.renderer.path()
    }

    /// Consume everything that is ready. Returns `true` if the path changed,
    /// with nothing ready the previous path stays in place. Blocks from an
    /// earlier generation than the one that follows them are superseded.
    pub fn process(&mut self, bounds: Rect, sample_rate: f32) -> bool {
        while self.blocks.pull(&mut self.incoming) {
            // The stream was restarted, nothing from before may stay in the window
            if self.incoming.generation != self.generation {
                self.generator.reset();
                self.generation = self.incoming.generation;
            }
            self.generator.process_block(&self.incoming.samples);
        }

        let bin_width = sample_rate / self.generator.transform_size() as f32;
        let mut updated = false;
        while self.generator.pull(&mut self.magnitudes) {
            updated = true;
        }

        updated && self.renderer.generate_path(&self.magnitudes, bounds, bin_width)
    }

    /// Throw away queued blocks without analysing them
    pub fn discard_pending(&mut self) -> usize {
        self.blocks.clear()
    }

    /// Forget all history, queued data and the current path
    pub fn reset(&mut self) {
        self.blocks.clear();
        self.generator.reset();
        self.renderer.path.clear();
    }
}

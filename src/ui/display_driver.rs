use crate::audio::constants::{SPECTROGRAM_HEIGHT, SPECTROGRAM_WIDTH, TIMER_HZ, TRANSFORM_SIZE};
use crate::audio::sample_accumulator::{AudioBlock, AudioBlockConsumer, Channel};
use crate::ui::geometry::{self, AxisGrid, Point, Rect};
use crate::ui::path_renderer::PathProducer;
use crate::ui::spectrogram::{SpectrogramImage, SpectrogramRenderer};
use crate::{ScopeParams, VisualizationMode};
use atomic_float::AtomicF32;
use std::sync::{atomic::Ordering, Arc};
use std::time::Duration;

/// Display-thread half of the analyzer.
///
/// The [`DisplayTimer`](crate::ui::DisplayTimer) calls [`tick()`](Self::tick) about 30 times per second;
/// that is the only place queued audio gets consumed. Everything else here is
/// a query for the painting layer.
pub struct DisplayDriver {
    mode: VisualizationMode,
    bounds: Rect,
    floor_db: f32,

    // Written by the plugin in initialize()
    sample_rate: Arc<AtomicF32>,

    left: PathProducer,
    right: PathProducer,

    spectrogram_blocks: AudioBlockConsumer,
    spectrogram_block: AudioBlock,
    spectrogram: SpectrogramRenderer,
}

impl DisplayDriver {
    pub fn new(
        left_blocks: AudioBlockConsumer,
        right_blocks: AudioBlockConsumer,
        spectrogram_blocks: AudioBlockConsumer,
        sample_rate: Arc<AtomicF32>,
    ) -> Self {
        Self {
            mode: VisualizationMode::Rms,
            bounds: Rect::default(),
            floor_db: crate::audio::constants::DEFAULT_FLOOR_DB,
            sample_rate,
            left: PathProducer::new(Channel::Left, left_blocks),
            right: PathProducer::new(Channel::Right, right_blocks),
            spectrogram_blocks,
            spectrogram_block: AudioBlock::with_max_capacity(Channel::Left),
            spectrogram: SpectrogramRenderer::new(
                TRANSFORM_SIZE,
                SPECTROGRAM_WIDTH,
                SPECTROGRAM_HEIGHT,
            ),
        }
    }

    /// Interval the display timer calls [`tick()`](Self::tick) at
    pub fn tick_interval() -> Duration {
        Duration::from_secs_f64(1.0 / TIMER_HZ as f64)
    }

    /// Consume whatever the audio thread has queued for the active mode and
    /// drop what was queued for the other one. Returns `true` if the editor
    /// should repaint.
    pub fn tick(&mut self) -> bool {
        match self.mode {
            VisualizationMode::Rms => {
                self.spectrogram_blocks.clear();

                let area = self.analysis_area();
                let sample_rate = self.sample_rate.load(Ordering::Relaxed);
                self.left.process(area, sample_rate);
                self.right.process(area, sample_rate);

                true
            }
            VisualizationMode::Spectrogram => {
                self.left.discard_pending();
                self.right.discard_pending();

                let mut drawn = false;
                while self.spectrogram_blocks.pull(&mut self.spectrogram_block) {
                    drawn |= self
                        .spectrogram
                        .draw_next_line(&self.spectrogram_block.samples);
                }

                drawn
            }
        }
    }

    pub fn mode(&self) -> VisualizationMode {
        self.mode
    }

    /// Switch modes, picked up by the next tick
    pub fn set_mode(&mut self, mode: VisualizationMode) {
        if mode != self.mode {
            nih_plug::nih_log!("Visualization mode changed to {:?}", mode);
            self.mode = mode;
        }
    }

    /// Selector input: 0 is RMS, 1 is Spectrogram. Anything else is ignored and
    /// returns `false`.
    pub fn select_mode(&mut self, selection: i32) -> bool {
        match VisualizationMode::from_selection(selection) {
            Some(mode) => {
                self.set_mode(mode);
                true
            }
            None => {
                nih_plug::nih_log!("Ignoring invalid visualization mode selection {}", selection);
                false
            }
        }
    }

    pub fn floor_db(&self) -> f32 {
        self.floor_db
    }

    pub fn set_floor_db(&mut self, floor_db: f32) {
        self.left.set_floor_db(floor_db);
        self.right.set_floor_db(floor_db);
        self.floor_db = self.left.generator().floor_db();
    }

    /// Pull the current parameter values
    pub fn apply_params(&mut self, params: &ScopeParams) {
        self.set_mode(params.mode.value());
        if params.floor.value() != self.floor_db {
            self.set_floor_db(params.floor.value());
        }
    }

    /// Drop all queued blocks, histories, paths and the spectrogram image.
    /// Called whenever the stream configuration changes.
    pub fn prepare(&mut self) {
        self.left.reset();
        self.right.reset();
        self.spectrogram_blocks.clear();
        self.spectrogram.clear();

        nih_plug::nih_log!(
            "Display prepared at {} Hz",
            self.sample_rate.load(Ordering::Relaxed)
        );
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Component bounds, as reported by the editor on resize
    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    pub fn render_area(&self) -> Rect {
        geometry::render_area(self.bounds, self.mode)
    }

    pub fn analysis_area(&self) -> Rect {
        geometry::analysis_area(self.bounds, self.mode)
    }

    pub fn axis_grid(&self) -> AxisGrid {
        AxisGrid::new(self.bounds)
    }

    /// Latest RMS polyline for `channel`, empty until the first frame
    pub fn render_path(&self, channel: Channel) -> &[Point] {
        match channel {
            Channel::Left => self.left.path(),
            Channel::Right => self.right.path(),
        }
    }

    pub fn spectrogram_image(&self) -> &SpectrogramImage {
        self.spectrogram.image()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::sample_accumulator::ChannelSampleAccumulator;

    const BOUNDS: Rect = Rect {
        x: 0.0,
        y: 0.0,
        width: 600.0,
        height: 300.0,
    };

    struct Harness {
        left: ChannelSampleAccumulator,
        right: ChannelSampleAccumulator,
        spectrogram: ChannelSampleAccumulator,
        driver: DisplayDriver,
    }

    fn harness() -> Harness {
        let (mut left, left_blocks) = ChannelSampleAccumulator::new(Channel::Left, 30);
        let (mut right, right_blocks) = ChannelSampleAccumulator::new(Channel::Right, 30);
        let (mut spectrogram, spectrogram_blocks) =
            ChannelSampleAccumulator::new(Channel::Left, 30);
        left.prepare(512);
        right.prepare(512);
        spectrogram.prepare(TRANSFORM_SIZE);

        let sample_rate = Arc::new(AtomicF32::new(48000.0));
        let mut driver =
            DisplayDriver::new(left_blocks, right_blocks, spectrogram_blocks, sample_rate);
        driver.set_bounds(BOUNDS);

        Harness {
            left,
            right,
            spectrogram,
            driver,
        }
    }

    fn sine(len: usize, freq: f32) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / 48000.0).sin())
            .collect()
    }

    #[test]
    fn rms_tick_builds_both_paths() {
        let mut h = harness();
        let signal = sine(2048, 440.0);
        h.left.update_block(&signal);
        h.right.update_block(&signal);

        assert!(h.driver.tick());

        let area = h.driver.analysis_area();
        for channel in [Channel::Left, Channel::Right] {
            let path = h.driver.render_path(channel);
            assert_eq!(path.len(), area.width as usize);
            assert!(path.iter().all(|p| p.y >= area.y && p.y <= area.bottom()));
        }
    }

    #[test]
    fn rms_mode_repaints_every_tick() {
        let mut h = harness();
        assert!(h.driver.tick());
        assert!(h.driver.tick());
        assert!(h.driver.render_path(Channel::Left).is_empty());
    }

    #[test]
    fn spectrogram_repaints_only_on_new_blocks() {
        let mut h = harness();
        assert!(h.driver.select_mode(1));
        assert!(!h.driver.tick());

        h.spectrogram.update_block(&sine(TRANSFORM_SIZE - 1, 1000.0));
        assert!(!h.driver.tick());

        h.spectrogram.update(0.0);
        assert!(h.driver.tick());
        assert!(!h.driver.tick());

        let image = h.driver.spectrogram_image();
        let column = image.column(image.width() - 1);
        assert!(column.iter().any(|&pixel| pixel != crate::ui::spectrogram::Rgb::BLACK));
    }

    #[test]
    fn every_queued_spectrogram_block_becomes_a_column() {
        let mut h = harness();
        h.driver.set_mode(VisualizationMode::Spectrogram);

        let signal = sine(TRANSFORM_SIZE, 2000.0);
        h.spectrogram.update_block(&signal);
        h.spectrogram.update_block(&signal);
        h.spectrogram.update_block(&signal);
        assert!(h.driver.tick());

        let image = h.driver.spectrogram_image();
        let newest = image.column(image.width() - 1);
        assert_eq!(image.column(image.width() - 2), newest);
        assert_eq!(image.column(image.width() - 3), newest);
        assert_ne!(image.column(image.width() - 4), newest);
    }

    #[test]
    fn inactive_mode_queues_are_drained() {
        let mut h = harness();
        h.spectrogram.update_block(&[0.5; TRANSFORM_SIZE]);
        assert!(h.driver.tick());

        // The block queued during RMS mode is gone after switching
        h.driver.set_mode(VisualizationMode::Spectrogram);
        assert!(!h.driver.tick());

        h.left.update_block(&[0.5; 1024]);
        h.driver.tick();
        h.driver.set_mode(VisualizationMode::Rms);
        h.driver.tick();
        assert!(h.driver.render_path(Channel::Left).is_empty());
    }

    #[test]
    fn invalid_selection_keeps_the_mode() {
        let mut h = harness();
        assert!(!h.driver.select_mode(2));
        assert!(!h.driver.select_mode(-1));
        assert_eq!(h.driver.mode(), VisualizationMode::Rms);

        assert!(h.driver.select_mode(1));
        assert!(!h.driver.select_mode(7));
        assert_eq!(h.driver.mode(), VisualizationMode::Spectrogram);

        assert!(h.driver.select_mode(0));
        assert_eq!(h.driver.mode(), VisualizationMode::Rms);
    }

    #[test]
    fn geometry_follows_the_mode() {
        let mut h = harness();
        assert_eq!(h.driver.render_area(), Rect::new(20.0, 15.0, 560.0, 285.0));

        h.driver.set_mode(VisualizationMode::Spectrogram);
        assert_eq!(h.driver.render_area(), Rect::new(0.0, 0.0, 569.0, 303.0));
        assert_eq!(h.driver.axis_grid(), AxisGrid::new(BOUNDS));
    }

    #[test]
    fn floor_reaches_both_generators() {
        let mut h = harness();
        h.driver.set_floor_db(-72.0);
        assert_eq!(h.driver.floor_db(), -72.0);

        h.driver.set_floor_db(-500.0);
        assert_eq!(h.driver.floor_db(), crate::audio::constants::MIN_FLOOR_DB);
    }

    #[test]
    fn params_drive_mode_and_floor() {
        let mut h = harness();
        let params = ScopeParams::default();

        h.driver.set_mode(VisualizationMode::Spectrogram);
        h.driver.set_floor_db(-90.0);
        h.driver.apply_params(&params);

        assert_eq!(h.driver.mode(), VisualizationMode::Rms);
        assert_eq!(h.driver.floor_db(), crate::audio::constants::DEFAULT_FLOOR_DB);
    }

    #[test]
    fn prepare_clears_everything() {
        let mut h = harness();
        h.left.update_block(&sine(2048, 440.0));
        h.driver.tick();
        assert!(!h.driver.render_path(Channel::Left).is_empty());

        h.driver.set_mode(VisualizationMode::Spectrogram);
        h.spectrogram.update_block(&sine(TRANSFORM_SIZE, 440.0));
        h.driver.tick();

        h.driver.prepare();
        assert!(h.driver.render_path(Channel::Left).is_empty());
        assert!(h
            .driver
            .spectrogram_image()
            .pixels()
            .iter()
            .all(|&pixel| pixel == crate::ui::spectrogram::Rgb::BLACK));
    }

    #[test]
    fn tick_interval_matches_the_timer_rate() {
        let interval = DisplayDriver::tick_interval();
        assert!((interval.as_secs_f64() - 1.0 / 30.0).abs() < 1e-9);
    }
}

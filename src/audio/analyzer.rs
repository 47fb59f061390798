use crate::audio::constants::{MAX_BLOCK_SIZE, QUEUE_CAPACITY, TRANSFORM_SIZE};
use crate::audio::sample_accumulator::{Channel, ChannelSampleAccumulator};
use crate::ui::display_driver::DisplayDriver;
use atomic_float::AtomicF32;
use nih_plug::prelude::Buffer;
use std::sync::Arc;

/// Audio-thread half of the analyzer.
///
/// Owns one accumulator per channel for the RMS paths, and a third one on the
/// left channel that collects whole transform-size blocks for the spectrogram.
pub struct AnalyzerInput {
    left: ChannelSampleAccumulator,
    right: ChannelSampleAccumulator,
    spectrogram: ChannelSampleAccumulator,
}

/// Split the analyzer into the half fed by `process()` and the half the
/// display timer drives
pub fn create_analyzer_channels(sample_rate: Arc<AtomicF32>) -> (AnalyzerInput, DisplayDriver) {
    let (left, left_blocks) = ChannelSampleAccumulator::new(Channel::Left, QUEUE_CAPACITY);
    let (right, right_blocks) = ChannelSampleAccumulator::new(Channel::Right, QUEUE_CAPACITY);
    let (spectrogram, spectrogram_blocks) =
        ChannelSampleAccumulator::new(Channel::Left, QUEUE_CAPACITY);

    let input = AnalyzerInput {
        left,
        right,
        spectrogram,
    };
    let driver = DisplayDriver::new(left_blocks, right_blocks, spectrogram_blocks, sample_rate);

    (input, driver)
}

impl AnalyzerInput {
    /// Block length used for the RMS accumulators given the host's maximum
    /// buffer size
    pub fn block_size_for(max_buffer_size: usize) -> usize {
        max_buffer_size.min(TRANSFORM_SIZE).clamp(1, MAX_BLOCK_SIZE)
    }

    /// Restart all accumulators. Only call while the host is not processing.
    pub fn prepare(&mut self, max_buffer_size: usize) {
        let block_size = Self::block_size_for(max_buffer_size);
        self.left.prepare(block_size);
        self.right.prepare(block_size);
        self.spectrogram.prepare(TRANSFORM_SIZE);
    }

    pub fn is_prepared(&self) -> bool {
        self.left.is_prepared() && self.right.is_prepared() && self.spectrogram.is_prepared()
    }

    pub fn block_size(&self) -> usize {
        self.left.block_size()
    }

    /// Feed one channel's samples for the current cycle
    pub fn update(&mut self, channel: Channel, samples: &[f32]) {
        match channel {
            Channel::Left => {
                self.left.update_block(samples);
                self.spectrogram.update_block(samples);
            }
            Channel::Right => self.right.update_block(samples),
        }
    }

    /// Feed a whole multichannel buffer. A single channel feeds both paths,
    /// channels past the second are ignored.
    pub fn update_channels<S: AsRef<[f32]>>(&mut self, channels: &[S]) {
        match channels {
            [] => {}
            [mono] => {
                self.update(Channel::Left, mono.as_ref());
                self.right.update_block(mono.as_ref());
            }
            [left, right, ..] => {
                self.update(Channel::Left, left.as_ref());
                self.update(Channel::Right, right.as_ref());
            }
        }
    }

    // Called from audio thread - NO ALLOCATIONS!
    pub fn process_buffer(&mut self, buffer: &Buffer) {
        self.update_channels(buffer.as_slice_immutable());
    }

    /// Completed blocks the display side has not picked up yet, per channel
    pub fn ready_count(&self, channel: Channel) -> usize {
        match channel {
            Channel::Left => self.left.ready_count(),
            Channel::Right => self.right.ready_count(),
        }
    }

    /// Blocks lost because the display side fell behind
    pub fn dropped_blocks(&self) -> usize {
        self.left.dropped_blocks() + self.right.dropped_blocks() + self.spectrogram.dropped_blocks()
    }
}

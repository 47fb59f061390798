use crate::audio::constants::MAX_BLOCK_SIZE;
use crate::audio::ring_queue::{ring_queue, QueueConsumer, QueueProducer};

/// Input channel an accumulator reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Left = 0,
    Right = 1,
}

impl Channel {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A fixed-length run of consecutive samples from one channel
#[derive(Debug, PartialEq)]
pub struct AudioBlock {
    pub channel: Channel,
    /// Bumped by every `prepare()` of the accumulator that filled the block.
    /// Consumers drop their history when it changes.
    pub generation: u32,
    pub samples: Vec<f32>,
}

impl AudioBlock {
    /// An empty block whose storage already fits `MAX_BLOCK_SIZE` samples
    pub fn with_max_capacity(channel: Channel) -> Self {
        Self {
            channel,
            generation: 0,
            samples: Vec::with_capacity(MAX_BLOCK_SIZE),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// Spelled out so `clone_from` keeps the destination's allocation, the derived
// version would allocate a fresh vector on every queue push
impl Clone for AudioBlock {
    fn clone(&self) -> Self {
        Self {
            channel: self.channel,
            generation: self.generation,
            samples: self.samples.clone(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.channel = source.channel;
        self.generation = source.generation;
        self.samples.clone_from(&source.samples);
    }
}

pub type AudioBlockConsumer = QueueConsumer<AudioBlock>;

/// Batches one channel's samples into fixed-size blocks and hands completed
/// blocks to the display thread.
///
/// Lives on the audio thread. Once prepared it never allocates or locks: a
/// completed block is copied into the queue, and if the queue is full the block
/// is simply overwritten by the next samples.
pub struct ChannelSampleAccumulator {
    channel: Channel,

    // Block being filled (audio thread only)
    block: AudioBlock,

    // Position in block
    write_position: usize,

    prepared: bool,
    generation: u32,

    producer: QueueProducer<AudioBlock>,

    // Completed blocks that did not fit into the queue
    dropped_blocks: usize,
}

impl ChannelSampleAccumulator {
    /// Create an accumulator and the consumer for its completed blocks.
    /// Returns (accumulator for audio thread, consumer for UI thread)
    pub fn new(channel: Channel, capacity: usize) -> (Self, AudioBlockConsumer) {
        let (producer, consumer) = ring_queue(capacity, || AudioBlock::with_max_capacity(channel));

        let accumulator = Self {
            channel,
            block: AudioBlock::with_max_capacity(channel),
            write_position: 0,
            prepared: false,
            generation: 0,
            producer,
            dropped_blocks: 0,
        };

        (accumulator, consumer)
    }

    /// Reset the write position and set the block length. Must be called before
    /// the first `update()`. Block sizes are capped at `MAX_BLOCK_SIZE` so the
    /// pre-allocated storage is always large enough.
    ///
    /// Every call starts a new generation. Blocks already in the queue keep the
    /// old one, which tells the consumer the stream was restarted.
    pub fn prepare(&mut self, block_size: usize) {
        nih_plug::nih_debug_assert!(
            block_size > 0 && block_size <= MAX_BLOCK_SIZE,
            "block size {} out of range",
            block_size
        );

        let block_size = block_size.clamp(1, MAX_BLOCK_SIZE);
        self.block.samples.clear();
        self.block.samples.resize(block_size, 0.0);
        self.write_position = 0;
        self.dropped_blocks = 0;
        self.generation = self.generation.wrapping_add(1);
        self.block.generation = self.generation;
        self.prepared = true;
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Generation stamped on blocks published from now on
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn block_size(&self) -> usize {
        self.block.len()
    }

    /// Completed blocks waiting in the queue
    pub fn ready_count(&self) -> usize {
        self.producer.ready_count()
    }

    /// Blocks discarded because the display thread fell behind
    pub fn dropped_blocks(&self) -> usize {
        self.dropped_blocks
    }

    // Called from audio thread - NO ALLOCATIONS!
    pub fn update(&mut self, sample: f32) {
        nih_plug::nih_debug_assert!(self.prepared, "update() called before prepare()");
        if !self.prepared {
            return;
        }

        self.block.samples[self.write_position] = sample;
        self.write_position += 1;
        if self.write_position == self.block.len() {
            self.publish_block();
        }
    }

    /// Feed a whole slice of samples, equivalent to calling `update()` for each
    pub fn update_block(&mut self, samples: &[f32]) {
        nih_plug::nih_debug_assert!(self.prepared, "update() called before prepare()");
        if !self.prepared {
            return;
        }

        let mut remaining = samples;
        while !remaining.is_empty() {
            let space = self.block.len() - self.write_position;
            let (chunk, rest) = remaining.split_at(space.min(remaining.len()));

            self.block.samples[self.write_position..self.write_position + chunk.len()]
                .copy_from_slice(chunk);
            self.write_position += chunk.len();
            if self.write_position == self.block.len() {
                self.publish_block();
            }

            remaining = rest;
        }
    }

    fn publish_block(&mut self) {
        // Buffer is full, send a copy to the consumer. A full queue means the
        // display is behind, the block is lost and gets overwritten.
        if !self.producer.push(&self.block) {
            self.dropped_blocks += 1;
        }
        self.write_position = 0;
    }
}

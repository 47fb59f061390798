//! Bounded single-producer/single-consumer queue of pre-allocated slots.
//!
//! Built from two `rtrb` ring buffers of the same capacity. `ready` carries
//! filled slots to the consumer, `free` hands emptied slots back to the
//! producer. Every slot is created up front and only ever moves between the two,
//! so the number of ready slots never exceeds the capacity and items are copied
//! in and out with `Clone::clone_from`. A push into a full queue and a pull from
//! an empty one fail instead of waiting.

use rtrb::RingBuffer;

/// Writing half, owned by the real-time thread
pub struct QueueProducer<T> {
    ready: rtrb::Producer<T>,
    free: rtrb::Consumer<T>,
}

/// Reading half, owned by the display thread
pub struct QueueConsumer<T> {
    ready: rtrb::Consumer<T>,
    free: rtrb::Producer<T>,
}

/// Create a queue with `capacity` slots, each built by `make_slot`.
///
/// Element types whose `clone_from` keeps their allocation (such as `Vec`)
/// never allocate on push or pull.
pub fn ring_queue<T: Clone + Send>(
    capacity: usize,
    make_slot: impl FnMut() -> T,
) -> (QueueProducer<T>, QueueConsumer<T>) {
    nih_plug::nih_debug_assert!(capacity > 0, "ring queue needs at least one slot");
    let capacity = capacity.max(1);

    let (ready_producer, ready_consumer) = RingBuffer::new(capacity);
    let (mut free_producer, free_consumer) = RingBuffer::new(capacity);
    if let Ok(slots) = free_producer.write_chunk_uninit(capacity) {
        slots.fill_from_iter(std::iter::repeat_with(make_slot));
    }

    (
        QueueProducer {
            ready: ready_producer,
            free: free_consumer,
        },
        QueueConsumer {
            ready: ready_consumer,
            free: free_producer,
        },
    )
}

impl<T: Clone + Send> QueueProducer<T> {
    pub fn capacity(&self) -> usize {
        self.ready.buffer().capacity()
    }

    /// Number of written-but-unread slots
    pub fn ready_count(&self) -> usize {
        self.capacity() - self.ready.slots()
    }

    /// Copy `item` into the next free slot. Returns `false` when the queue is
    /// full; the caller decides whether that matters.
    pub fn push(&mut self, item: &T) -> bool {
        let Ok(mut slot) = self.free.pop() else {
            return false;
        };

        slot.clone_from(item);
        self.ready.push(slot).is_ok()
    }

    /// Push as many of `items` as fit, in order. Returns how many were written.
    pub fn push_slice(&mut self, items: &[T]) -> usize {
        let count = items.len().min(self.free.slots()).min(self.ready.slots());
        if count == 0 {
            return 0;
        }

        // Both reservations may wrap around the end of their buffers
        let (Ok(slots), Ok(reserved)) = (
            self.free.read_chunk(count),
            self.ready.write_chunk_uninit(count),
        ) else {
            return 0;
        };

        reserved.fill_from_iter(items.iter().zip(slots).map(|(item, mut slot)| {
            slot.clone_from(item);
            slot
        }))
    }
}

impl<T: Clone + Send> QueueConsumer<T> {
    pub fn capacity(&self) -> usize {
        self.ready.buffer().capacity()
    }

    /// Number of written-but-unread slots
    pub fn ready_count(&self) -> usize {
        self.ready.slots()
    }

    pub fn is_empty(&self) -> bool {
        self.ready.is_empty()
    }

    /// Copy the oldest ready slot into `item`. Returns `false` and leaves `item`
    /// untouched when nothing is ready.
    pub fn pull(&mut self, item: &mut T) -> bool {
        let Ok(slot) = self.ready.pop() else {
            return false;
        };

        item.clone_from(&slot);
        // The free list always has room for every slot
        let _ = self.free.push(slot);

        true
    }

    /// Pull up to `items.len()` slots, oldest first. Returns how many were read.
    pub fn pull_slice(&mut self, items: &mut [T]) -> usize {
        let count = items.len().min(self.ready.slots());
        self.release(count, |ready| {
            let (first, second) = ready.as_slices();
            for (item, slot) in items.iter_mut().zip(first.iter().chain(second)) {
                item.clone_from(slot);
            }
        })
    }

    /// Discard everything that is ready. Only the consumer moves slots out of
    /// the ready buffer, so this is safe while the producer keeps running.
    pub fn clear(&mut self) -> usize {
        self.release(self.ready.slots(), |_| {})
    }

    /// Take `count` ready slots, let `read` look at them, then hand them back to
    /// the producer
    fn release(&mut self, count: usize, read: impl FnOnce(&rtrb::chunks::ReadChunk<'_, T>)) -> usize {
        if count == 0 {
            return 0;
        }
        let Ok(ready) = self.ready.read_chunk(count) else {
            return 0;
        };

        read(&ready);
        match self.free.write_chunk_uninit(count) {
            Ok(free) => {
                free.fill_from_iter(ready);
            }
            Err(_) => ready.commit_all(),
        }

        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUEUE_TEST_CAPACITY: usize = 30;

    #[test]
    fn ready_count_stays_within_capacity() {
        let (mut producer, mut consumer) = ring_queue(4, || 0u32);
        let mut out = 0;

        // Deterministic mix of pushes and pulls
        for step in 0..200u32 {
            if step % 3 == 2 {
                consumer.pull(&mut out);
            } else {
                producer.push(&step);
            }
            assert!(consumer.ready_count() <= 4);
            assert_eq!(consumer.ready_count(), producer.ready_count());
        }
    }

    #[test]
    fn items_come_out_in_push_order() {
        let (mut producer, mut consumer) = ring_queue(QUEUE_TEST_CAPACITY, Vec::<f32>::new);
        let mut out = Vec::new();
        let mut pulled = Vec::new();

        for round in 0..5 {
            for i in 0..QUEUE_TEST_CAPACITY {
                assert!(producer.push(&vec![(round * 100 + i) as f32; 3]));
            }
            while consumer.pull(&mut out) {
                pulled.push(out[0]);
            }
        }

        let expected: Vec<f32> = (0..5)
            .flat_map(|round| (0..QUEUE_TEST_CAPACITY).map(move |i| (round * 100 + i) as f32))
            .collect();
        assert_eq!(pulled, expected);
    }

    #[test]
    fn push_into_full_queue_fails() {
        let (mut producer, mut consumer) = ring_queue(QUEUE_TEST_CAPACITY, || 0usize);

        let failures = (0..=QUEUE_TEST_CAPACITY)
            .filter(|i| !producer.push(i))
            .count();
        assert_eq!(failures, 1);
        assert_eq!(consumer.ready_count(), QUEUE_TEST_CAPACITY);

        // The dropped item is the newest one, the oldest is still first in line
        let mut out = usize::MAX;
        assert!(consumer.pull(&mut out));
        assert_eq!(out, 0);
    }

    #[test]
    fn pull_from_empty_queue_leaves_item_untouched() {
        let (_producer, mut consumer) = ring_queue(2, || 1.5f32);
        let mut out = 7.0;

        assert!(!consumer.pull(&mut out));
        assert_eq!(out, 7.0);
        assert_eq!(consumer.ready_count(), 0);
    }

    #[test]
    fn bulk_transfers_wrap_around() {
        let (mut producer, mut consumer) = ring_queue(5, || 0i32);
        let mut scratch = [0; 3];

        assert_eq!(producer.push_slice(&[1, 2, 3]), 3);
        assert_eq!(consumer.pull_slice(&mut scratch), 3);
        assert_eq!(scratch, [1, 2, 3]);

        // Both buffers now start at index 3, the next reservation wraps to 0
        assert_eq!(producer.push_slice(&[4, 5, 6, 7, 8, 9]), 5);
        assert_eq!(producer.ready_count(), 5);
        assert!(!producer.push(&10));
        let mut all = [0; 8];
        assert_eq!(consumer.pull_slice(&mut all), 5);
        assert_eq!(&all[..5], &[4, 5, 6, 7, 8]);
    }

    #[test]
    fn clear_discards_ready_slots() {
        let (mut producer, mut consumer) = ring_queue(3, || 0u8);
        producer.push(&1);
        producer.push(&2);

        assert_eq!(consumer.clear(), 2);
        assert_eq!(consumer.ready_count(), 0);
        assert!(producer.push(&3));

        let mut out = 0;
        assert!(consumer.pull(&mut out));
        assert_eq!(out, 3);
    }

    #[test]
    fn push_reuses_slot_allocation() {
        let (mut producer, mut consumer) = ring_queue(2, || Vec::<f32>::with_capacity(64));
        let block = vec![0.25f32; 48];

        assert!(producer.push(&block));
        let mut out = Vec::with_capacity(64);
        let before = out.as_ptr();
        assert!(consumer.pull(&mut out));
        assert_eq!(out, block);
        assert_eq!(out.as_ptr(), before);
    }

    #[test]
    fn producer_and_consumer_on_separate_threads() {
        const COUNT: u64 = 20_000;
        let (mut producer, mut consumer) = ring_queue(8, || 0u64);

        let writer = std::thread::spawn(move || {
            let mut next = 0;
            while next < COUNT {
                if producer.push(&next) {
                    next += 1;
                } else {
                    std::thread::yield_now();
                }
            }
        });

        let mut expected = 0;
        let mut out = 0;
        while expected < COUNT {
            if consumer.pull(&mut out) {
                assert_eq!(out, expected);
                expected += 1;
            } else {
                std::thread::yield_now();
            }
        }

        writer.join().unwrap();
        assert_eq!(consumer.ready_count(), 0);
    }
}

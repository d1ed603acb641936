//! Lock-free single-producer single-consumer ring buffer for real-time audio.
//!
//! Designed for the game thread (producer) and the device callback thread
//! (consumer). No mutexes, no allocation after construction: each side owns
//! one cursor and publishes it with a release store; the other side reads it
//! with an acquire load, which makes the copied samples visible.
//!
//! One slot is always left empty so that `write == read` means empty and
//! full never aliases it. A buffer of `capacity` slots holds at most
//! `capacity - 1` readable samples.

use std::cell::UnsafeCell;
use std::fmt;
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A SPSC ring buffer of `Copy` samples. `T::default()` is silence.
///
/// Used directly (`&mut self`) it is a plain single-threaded FIFO. Call
/// [`RingBuffer::split`] to get the [`Producer`] and [`Consumer`] halves that
/// can live on two different threads.
pub struct RingBuffer<T = f32> {
    slots: Box<[UnsafeCell<T>]>,
    read_pos: AtomicUsize,
    write_pos: AtomicUsize,
}

// SAFETY: Slots are only touched through `write_shared` (producer) and
// `read_shared` (consumer). Safe callers reach those either through `&mut
// RingBuffer` or through the unique, non-Clone `Producer`/`Consumer` handles,
// so there is at most one writer and one reader. The writer only touches the
// free region and the reader only the filled region; the acquire/release
// cursor handshake keeps those regions disjoint.
unsafe impl<T: Send> Send for RingBuffer<T> {}
unsafe impl<T: Send> Sync for RingBuffer<T> {}

#[inline]
fn occupied(write: usize, read: usize, capacity: usize) -> usize {
    if write >= read {
        write - read
    } else {
        capacity - read + write
    }
}

#[inline]
fn advance(pos: usize, count: usize, capacity: usize) -> usize {
    let next = pos + count;
    if next >= capacity {
        next - capacity
    } else {
        next
    }
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Create a ring buffer with `capacity` slots (minimum 2).
    ///
    /// Powers of two are not required.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            slots: (0..capacity).map(|_| UnsafeCell::new(T::default())).collect(),
            read_pos: AtomicUsize::new(0),
            write_pos: AtomicUsize::new(0),
        }
    }

    /// Total slot count. Usable capacity is one less.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Samples currently readable. A racy snapshot under concurrent use.
    pub fn len(&self) -> usize {
        let w = self.write_pos.load(Ordering::Acquire);
        let r = self.read_pos.load(Ordering::Acquire);
        occupied(w, r, self.capacity())
    }

    /// Check if nothing is readable.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Samples that can currently be written. A racy snapshot.
    pub fn free_len(&self) -> usize {
        self.capacity() - 1 - self.len()
    }

    /// Write as many samples as fit. Returns the number written; the rest
    /// of `data` is dropped.
    pub fn write(&mut self, data: &[T]) -> usize {
        // SAFETY: `&mut self` excludes every other reader and writer.
        unsafe { self.write_shared(data) }
    }

    /// Fill `dest` from the buffer, padding any shortfall with silence.
    /// Returns the number of real samples read.
    pub fn read(&mut self, dest: &mut [T]) -> usize {
        // SAFETY: `&mut self` excludes every other reader and writer.
        unsafe { self.read_shared(dest) }
    }

    /// Reset both cursors to zero, discarding unread samples.
    ///
    /// Needs exclusive access: neither side may be active.
    pub fn clear(&mut self) {
        *self.read_pos.get_mut() = 0;
        *self.write_pos.get_mut() = 0;
    }

    /// Split into producer and consumer halves.
    pub fn split(self) -> (Producer<T>, Consumer<T>) {
        let shared = Arc::new(self);
        (
            Producer {
                ring: Arc::clone(&shared),
            },
            Consumer { ring: shared },
        )
    }

    /// Producer side of the copy.
    ///
    /// # Safety
    /// At most one thread may be inside `write_shared` at a time.
    unsafe fn write_shared(&self, data: &[T]) -> usize {
        let capacity = self.capacity();
        // Our own cursor: nobody else stores it.
        let w = self.write_pos.load(Ordering::Relaxed);
        // Acquire pairs with the consumer's release so its reads of the
        // slots we are about to overwrite have completed.
        let r = self.read_pos.load(Ordering::Acquire);

        let free = capacity - 1 - occupied(w, r, capacity);
        let count = data.len().min(free);
        if count == 0 {
            return 0;
        }

        // Write in up to two segments (wrap-around)
        let first_chunk = (capacity - w).min(count);
        let second_chunk = count - first_chunk;

        let base = UnsafeCell::raw_get(self.slots.as_ptr());
        ptr::copy_nonoverlapping(data.as_ptr(), base.add(w), first_chunk);
        if second_chunk > 0 {
            ptr::copy_nonoverlapping(data.as_ptr().add(first_chunk), base, second_chunk);
        }

        // Publish the samples.
        self.write_pos
            .store(advance(w, count, capacity), Ordering::Release);
        count
    }

    /// Consumer side of the copy.
    ///
    /// # Safety
    /// At most one thread may be inside `read_shared` at a time.
    unsafe fn read_shared(&self, dest: &mut [T]) -> usize {
        let capacity = self.capacity();
        let r = self.read_pos.load(Ordering::Relaxed);
        // Acquire pairs with the producer's release: the samples up to `w`
        // are visible.
        let w = self.write_pos.load(Ordering::Acquire);

        let available = occupied(w, r, capacity);
        let count = dest.len().min(available);

        if count > 0 {
            let first_chunk = (capacity - r).min(count);
            let second_chunk = count - first_chunk;

            let base = UnsafeCell::raw_get(self.slots.as_ptr()) as *const T;
            ptr::copy_nonoverlapping(base.add(r), dest.as_mut_ptr(), first_chunk);
            if second_chunk > 0 {
                ptr::copy_nonoverlapping(base, dest.as_mut_ptr().add(first_chunk), second_chunk);
            }

            // Hand the slots back to the producer.
            self.read_pos
                .store(advance(r, count, capacity), Ordering::Release);
        }

        // Underrun: pad with silence.
        dest[count..].fill(T::default());
        count
    }
}

impl<T> fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.slots.len())
            .field("read_pos", &self.read_pos.load(Ordering::Relaxed))
            .field("write_pos", &self.write_pos.load(Ordering::Relaxed))
            .finish()
    }
}

/// Writing half of a split [`RingBuffer`]. Not `Clone`: one producer only.
pub struct Producer<T = f32> {
    ring: Arc<RingBuffer<T>>,
}

impl<T: Copy + Default> Producer<T> {
    /// Write as many samples as fit; never blocks. Returns the count written.
    #[inline]
    pub fn write(&mut self, data: &[T]) -> usize {
        // SAFETY: this handle is the only producer and `&mut self` serializes it.
        unsafe { self.ring.write_shared(data) }
    }

    /// Total slot count of the shared buffer.
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Racy snapshot of the readable sample count.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Check if the consumer has drained everything.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Racy snapshot of the writable sample count.
    pub fn free_len(&self) -> usize {
        self.ring.free_len()
    }
}

/// Reading half of a split [`RingBuffer`]. Not `Clone`: one consumer only.
pub struct Consumer<T = f32> {
    ring: Arc<RingBuffer<T>>,
}

impl<T: Copy + Default> Consumer<T> {
    /// Fill `dest`, padding with silence on underrun; never blocks.
    /// Returns the number of real samples read.
    #[inline]
    pub fn read(&mut self, dest: &mut [T]) -> usize {
        // SAFETY: this handle is the only consumer and `&mut self` serializes it.
        unsafe { self.ring.read_shared(dest) }
    }

    /// Total slot count of the shared buffer.
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Racy snapshot of the readable sample count.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Check if nothing is readable.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Producer").field(&self.ring).finish()
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Consumer").field(&self.ring).finish()
    }
}

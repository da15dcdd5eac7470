//! Lock-free single-producer/single-consumer mode.
//!
//! [`split`] (or [`RingFifo::into_spsc`]) returns a [`Producer`] and a
//! [`Consumer`] sharing one fixed-size byte array. Each half keeps its own
//! cursor; the only shared mutable state is the array and two wrapping `u32`
//! counters:
//!
//! - the producer writes bytes into the free region, then publishes the new
//!   `write_count` with `Release`;
//! - the consumer observes `write_count` with `Acquire` before touching those
//!   bytes, copies them out, then publishes `read_count` with `Release`;
//! - the producer observes `read_count` with `Acquire` before reusing the
//!   space.
//!
//! Writes are always bounded by the free space seen at entry, so the producer
//! never overwrites unread data. Reallocation is not available in this mode.
//! Nothing here blocks: an empty consumer or a full producer just reports it
//! and the caller decides how to wait.

use alloc::{boxed::Box, sync::Arc};
use core::{
    cell::UnsafeCell,
    fmt,
    sync::atomic::{AtomicU32, Ordering},
};

use crate::{
    FifoError, RingFifo,
    mover::{Sink, Source},
    storage::{contiguous, try_alloc, wrap_add},
};

struct Shared {
    cells: Box<[UnsafeCell<u8>]>,
    capacity: u32,
    write_count: AtomicU32,
    read_count: AtomicU32,
}

// SAFETY: the producer only touches cells in the free region and the consumer
// only touches cells in the occupied region. The two regions are disjoint and
// ownership of a byte moves between them through the Release/Acquire pairs on
// `write_count` and `read_count`.
unsafe impl Sync for Shared {}

impl Shared {
    fn allocate(capacity: u32) -> Result<Self, FifoError> {
        Ok(Self {
            cells: try_alloc(capacity, || UnsafeCell::new(0))?,
            capacity,
            write_count: AtomicU32::new(0),
            read_count: AtomicU32::new(0),
        })
    }

    fn base(&self) -> *mut u8 {
        UnsafeCell::raw_get(self.cells.as_ptr())
    }

    /// # Safety
    ///
    /// `[cursor, cursor + len)` must lie inside the array and no other
    /// reference to those bytes may exist while the returned slice lives.
    #[allow(clippy::mut_from_ref)]
    unsafe fn region_mut(&self, cursor: u32, len: u32) -> &mut [u8] {
        debug_assert!(u64::from(cursor) + u64::from(len) <= u64::from(self.capacity));
        // SAFETY: in bounds per the caller contract; `UnsafeCell<u8>` has the
        // layout of `u8`.
        unsafe { core::slice::from_raw_parts_mut(self.base().add(cursor as usize), len as usize) }
    }

    /// # Safety
    ///
    /// `[cursor, cursor + len)` must lie inside the array and nobody may write
    /// those bytes while the returned slice lives.
    unsafe fn region(&self, cursor: u32, len: u32) -> &[u8] {
        debug_assert!(u64::from(cursor) + u64::from(len) <= u64::from(self.capacity));
        // SAFETY: see `region_mut`.
        unsafe { core::slice::from_raw_parts(self.base().add(cursor as usize), len as usize) }
    }
}

/// Create an empty SPSC ring of `capacity` bytes.
///
/// ```rust
/// use std::thread;
///
/// let (mut tx, mut rx) = ringfifo::spsc::split(16).unwrap();
/// let writer = thread::spawn(move || {
///     let mut data: &[u8] = b"hello, ring";
///     while !data.is_empty() {
///         let n = tx.write(data) as usize;
///         data = &data[n..];
///     }
/// });
///
/// let mut out = Vec::new();
/// while out.len() < 11 {
///     let n = rx.len();
///     rx.read_into(&mut out, n).unwrap();
/// }
/// writer.join().unwrap();
/// assert_eq!(out, b"hello, ring");
/// ```
///
/// # Errors
///
/// [`FifoError::OutOfMemory`] if the array cannot be allocated.
pub fn split(capacity: u32) -> Result<(Producer, Consumer), FifoError> {
    let shared = Arc::new(Shared::allocate(capacity)?);
    Ok(halves(shared, 0))
}

fn halves(shared: Arc<Shared>, write_cursor: u32) -> (Producer, Consumer) {
    (
        Producer {
            shared: Arc::clone(&shared),
            cursor: write_cursor,
        },
        Consumer { shared, cursor: 0 },
    )
}

impl RingFifo {
    /// Move the queued bytes into a new SPSC ring of the same capacity and
    /// return its two halves.
    ///
    /// # Errors
    ///
    /// [`FifoError::OutOfMemory`] if the shared array cannot be allocated.
    pub fn into_spsc(self) -> Result<(Producer, Consumer), FifoError> {
        let shared = Shared::allocate(self.capacity())?;
        let (head, tail) = self.as_slices();
        let carried = [head, tail].iter().fold(0u32, |offset, part| {
            let len = u32::try_from(part.len()).unwrap_or(u32::MAX);
            // SAFETY: `shared` is not shared yet, and the parts together fit
            // in a ring of the same capacity.
            unsafe { shared.region_mut(offset, len) }.copy_from_slice(part);
            offset + len
        });
        shared.write_count.store(carried, Ordering::Relaxed);
        let write_cursor = wrap_add(0, carried, shared.capacity);
        tracing::debug!(capacity = shared.capacity, carried, "fifo split into spsc halves");
        Ok(halves(Arc::new(shared), write_cursor))
    }
}

/// The writing half of an SPSC ring.
pub struct Producer {
    shared: Arc<Shared>,
    cursor: u32,
}

impl Producer {
    /// Size of the shared array in bytes.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.shared.capacity
    }

    /// Bytes that can be written right now. May only grow until the next
    /// write, as the consumer frees space.
    #[must_use]
    pub fn free_space(&self) -> u32 {
        let written = self.shared.write_count.load(Ordering::Relaxed);
        let read = self.shared.read_count.load(Ordering::Acquire);
        self.shared.capacity - written.wrapping_sub(read)
    }

    /// Copy as much of `data` as fits and return the number of bytes written.
    pub fn write(&mut self, data: &[u8]) -> u32 {
        let size = u32::try_from(data.len()).unwrap_or(u32::MAX);
        let mut source = data;
        self.write_from(&mut source, size)
    }

    /// Pull up to `size` bytes from `source`, bounded by the free space.
    ///
    /// Stops early when `source` returns `0`. The bytes become visible to the
    /// consumer in one step when the call returns.
    pub fn write_from<S>(&mut self, source: &mut S, size: u32) -> u32
    where
        S: Source + ?Sized,
    {
        let capacity = self.shared.capacity;
        let written_before = self.shared.write_count.load(Ordering::Relaxed);
        let mut remaining = size.min(self.free_space());
        let mut written = 0u32;

        while remaining > 0 {
            let room = contiguous(self.cursor, remaining, capacity);
            // SAFETY: the chunk lies in the free region, which the consumer
            // does not read until `write_count` is published below.
            let chunk = unsafe { self.shared.region_mut(self.cursor, room) };
            let filled = u32::try_from(source.fill(chunk)).map_or(room, |n| n.min(room));
            if filled == 0 {
                break;
            }
            self.cursor = wrap_add(self.cursor, filled, capacity);
            written += filled;
            remaining -= filled;
        }

        self.shared
            .write_count
            .store(written_before.wrapping_add(written), Ordering::Release);
        written
    }
}

impl fmt::Debug for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("capacity", &self.capacity())
            .field("free_space", &self.free_space())
            .finish_non_exhaustive()
    }
}

/// The reading half of an SPSC ring.
pub struct Consumer {
    shared: Arc<Shared>,
    cursor: u32,
}

impl Consumer {
    /// Size of the shared array in bytes.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.shared.capacity
    }

    /// Bytes published by the producer and not yet consumed.
    #[must_use]
    pub fn len(&self) -> u32 {
        let written = self.shared.write_count.load(Ordering::Acquire);
        let read = self.shared.read_count.load(Ordering::Relaxed);
        written.wrapping_sub(read)
    }

    /// `true` when nothing has been published since the last read.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self, offset: u32, size: u32) -> Result<(), FifoError> {
        let requested = u64::from(offset) + u64::from(size);
        let available = self.len();
        if requested > u64::from(available) {
            return Err(FifoError::violation(requested, available));
        }
        Ok(())
    }

    fn commit(&mut self, len: u32) {
        self.cursor = wrap_add(self.cursor, len, self.shared.capacity);
        let read = self.shared.read_count.load(Ordering::Relaxed);
        self.shared
            .read_count
            .store(read.wrapping_add(len), Ordering::Release);
    }

    /// Discard `size` bytes without copying them.
    ///
    /// # Errors
    ///
    /// [`FifoError::ContractViolation`] if fewer than `size` bytes are
    /// available.
    pub fn drain(&mut self, size: u32) -> Result<(), FifoError> {
        self.check_available(0, size)?;
        self.commit(size);
        Ok(())
    }

    /// Fill `dest` completely, consuming the bytes.
    ///
    /// # Errors
    ///
    /// [`FifoError::ContractViolation`] if fewer than `dest.len()` bytes are
    /// available. Nothing is consumed in that case.
    pub fn read(&mut self, dest: &mut [u8]) -> Result<(), FifoError> {
        let size = self.slice_len(dest.len())?;
        let mut sink = dest;
        self.read_into(&mut sink, size)
    }

    /// Hand exactly `size` bytes to `sink`, consuming them chunk by chunk.
    ///
    /// # Errors
    ///
    /// [`FifoError::ContractViolation`] if fewer than `size` bytes are
    /// available.
    pub fn read_into<K>(&mut self, sink: &mut K, size: u32) -> Result<(), FifoError>
    where
        K: Sink + ?Sized,
    {
        self.check_available(0, size)?;
        let mut remaining = size;
        while remaining > 0 {
            let len = contiguous(self.cursor, remaining, self.shared.capacity);
            // SAFETY: the chunk lies in the occupied region published by the
            // producer, which it does not write until `read_count` moves past.
            sink.accept(unsafe { self.shared.region(self.cursor, len) });
            self.commit(len);
            remaining -= len;
        }
        Ok(())
    }

    /// Copy the first `dest.len()` available bytes without consuming them.
    ///
    /// # Errors
    ///
    /// [`FifoError::ContractViolation`] if fewer than `dest.len()` bytes are
    /// available.
    pub fn peek(&self, dest: &mut [u8]) -> Result<(), FifoError> {
        self.peek_at(dest, 0)
    }

    /// Hand the first `size` available bytes to `sink` without consuming
    /// them.
    ///
    /// # Errors
    ///
    /// [`FifoError::ContractViolation`] if fewer than `size` bytes are
    /// available.
    pub fn peek_into<K>(&self, sink: &mut K, size: u32) -> Result<(), FifoError>
    where
        K: Sink + ?Sized,
    {
        self.peek_at_into(sink, 0, size)
    }

    /// Copy `dest.len()` bytes starting `offset` bytes past the read cursor.
    ///
    /// # Errors
    ///
    /// [`FifoError::ContractViolation`] if `offset + dest.len()` exceeds
    /// [`len`](Self::len).
    pub fn peek_at(&self, dest: &mut [u8], offset: u32) -> Result<(), FifoError> {
        let size = self.slice_len(dest.len())?;
        let mut sink = dest;
        self.peek_at_into(&mut sink, offset, size)
    }

    /// Hand `size` bytes starting `offset` bytes past the read cursor to
    /// `sink`.
    ///
    /// # Errors
    ///
    /// [`FifoError::ContractViolation`] if `offset + size` exceeds
    /// [`len`](Self::len).
    pub fn peek_at_into<K>(&self, sink: &mut K, offset: u32, size: u32) -> Result<(), FifoError>
    where
        K: Sink + ?Sized,
    {
        self.check_available(offset, size)?;
        let capacity = self.shared.capacity;
        let mut cursor = wrap_add(self.cursor, offset, capacity);
        let mut remaining = size;
        while remaining > 0 {
            let len = contiguous(cursor, remaining, capacity);
            // SAFETY: as in `read_into`; the range is inside the published
            // region because `offset + size <= len()`.
            sink.accept(unsafe { self.shared.region(cursor, len) });
            cursor = wrap_add(cursor, len, capacity);
            remaining -= len;
        }
        Ok(())
    }

    fn slice_len(&self, len: usize) -> Result<u32, FifoError> {
        u32::try_from(len).map_err(|_| FifoError::violation(len as u64, self.len()))
    }
}

impl fmt::Debug for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::split;
    use crate::RingFifo;

    #[test]
    fn write_is_bounded_by_free_space() {
        let (mut tx, mut rx) = split(4).unwrap();
        assert_eq!(tx.write(&[1, 2, 3, 4, 5, 6]), 4);
        assert_eq!(tx.free_space(), 0);
        rx.drain(3).unwrap();
        assert_eq!(tx.write(&[7, 8, 9]), 3);

        let mut out = Vec::new();
        rx.read_into(&mut out, 4).unwrap();
        assert_eq!(out, [4, 7, 8, 9]);
        assert!(rx.is_empty());
    }

    #[test]
    fn peek_at_wraps() {
        let (mut tx, mut rx) = split(5).unwrap();
        tx.write(&[0, 0, 0, 1, 2]);
        rx.drain(3).unwrap();
        tx.write(&[3, 4]);

        let mut out = [0u8; 3];
        rx.peek_at(&mut out, 1).unwrap();
        assert_eq!(out, [2, 3, 4]);
        assert_eq!(rx.len(), 4);
        assert!(rx.peek_at(&mut out, 2).is_err());
    }

    #[test]
    fn into_spsc_carries_wrapped_content() {
        let mut fifo = RingFifo::new(6).unwrap();
        fifo.write(&[9, 9, 9, 9, 1, 2]);
        fifo.drain(4).unwrap();
        fifo.write(&[3, 4, 5]);

        let (mut tx, mut rx) = fifo.into_spsc().unwrap();
        assert_eq!(rx.len(), 5);
        assert_eq!(tx.free_space(), 1);
        assert_eq!(tx.write(&[6, 7]), 1);

        let mut out = [0u8; 6];
        rx.read(&mut out).unwrap();
        assert_eq!(out, [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn zero_capacity_moves_nothing() {
        let (mut tx, mut rx) = split(0).unwrap();
        assert_eq!(tx.write(&[1]), 0);
        assert!(rx.is_empty());
        rx.read(&mut []).unwrap();
    }
}

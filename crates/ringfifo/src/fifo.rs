use core::fmt;

use crate::{
    FifoError,
    mover::{Sink, Source},
    options::{FifoOptions, OverrunPolicy},
    storage::Storage,
};

/// A resizable circular byte FIFO with one reader cursor and one writer
/// cursor.
///
/// The occupied length is tracked by two wrapping `u32` counters of bytes ever
/// written and ever read, so [`len`](Self::len) stays correct after more than
/// 4 GiB have passed through the ring.
///
/// Every mutation takes `&mut self`; the ring performs no synchronisation of
/// its own. For a producer and a consumer on different threads, convert it
/// with [`into_spsc`](Self::into_spsc).
///
/// ```rust
/// use ringfifo::RingFifo;
///
/// let mut fifo = RingFifo::new(8).unwrap();
/// fifo.write(&[1, 2, 3, 4, 5, 6]);
/// fifo.drain(4).unwrap();
/// fifo.write(&[7, 8, 9, 10]);
///
/// let mut out = [0u8; 6];
/// fifo.read(&mut out).unwrap();
/// assert_eq!(out, [5, 6, 7, 8, 9, 10]);
/// ```
pub struct RingFifo {
    storage: Storage,
    read_cursor: u32,
    write_cursor: u32,
    read_count: u32,
    write_count: u32,
    options: FifoOptions,
}

impl RingFifo {
    /// Allocate an empty ring of `capacity` bytes.
    ///
    /// # Errors
    ///
    /// [`FifoError::OutOfMemory`] if the backing array cannot be allocated.
    pub fn new(capacity: u32) -> Result<Self, FifoError> {
        Self::with_options(FifoOptions {
            capacity,
            ..FifoOptions::default()
        })
    }

    /// Allocate an empty ring sized for `count` elements of `elem_size` bytes.
    ///
    /// # Errors
    ///
    /// [`FifoError::InvalidArgument`] if `count * elem_size` does not fit in a
    /// `u32`, [`FifoError::OutOfMemory`] if allocation fails.
    pub fn with_array(count: usize, elem_size: usize) -> Result<Self, FifoError> {
        let capacity = count
            .checked_mul(elem_size)
            .and_then(|bytes| u32::try_from(bytes).ok())
            .ok_or(FifoError::InvalidArgument("array size overflows u32"))?;
        Self::new(capacity)
    }

    /// Allocate an empty ring configured by `options`.
    ///
    /// # Errors
    ///
    /// [`FifoError::OutOfMemory`] if the backing array cannot be allocated.
    pub fn with_options(options: FifoOptions) -> Result<Self, FifoError> {
        Ok(Self {
            storage: Storage::allocate(options.capacity)?,
            read_cursor: 0,
            write_cursor: 0,
            read_count: 0,
            write_count: 0,
            options,
        })
    }

    /// The options this ring was created with. `capacity` reflects the initial
    /// size, not later growth.
    #[must_use]
    pub fn options(&self) -> &FifoOptions {
        &self.options
    }

    /// Size of the backing array in bytes.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.storage.capacity()
    }

    /// Number of bytes available to read.
    #[inline]
    #[must_use]
    pub fn len(&self) -> u32 {
        self.write_count.wrapping_sub(self.read_count)
    }

    /// `true` when nothing is left to read.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.write_count == self.read_count
    }

    /// Number of bytes that can be written without overwriting unread data.
    #[inline]
    #[must_use]
    pub fn free_space(&self) -> u32 {
        self.capacity().saturating_sub(self.len())
    }

    /// Empty the ring without reallocating. Stale bytes stay in the array but
    /// are unreachable.
    pub fn reset(&mut self) {
        tracing::trace!(discarded = self.len(), "fifo reset");
        self.read_cursor = 0;
        self.write_cursor = 0;
        self.read_count = 0;
        self.write_count = 0;
    }

    /// Release the ring and its backing array.
    #[allow(clippy::needless_pass_by_value)]
    pub fn free(self) {
        tracing::trace!(capacity = self.capacity(), "fifo released");
    }

    /// Release the ring held in `slot`, if any, and leave `None` behind.
    pub fn free_and_clear(slot: &mut Option<Self>) {
        if let Some(fifo) = slot.take() {
            fifo.free();
        }
    }

    /// Discard `size` bytes from the front without copying them.
    ///
    /// # Errors
    ///
    /// [`FifoError::ContractViolation`] if fewer than `size` bytes are queued.
    pub fn drain(&mut self, size: u32) -> Result<(), FifoError> {
        self.check_available(0, size)?;
        self.consume(size);
        Ok(())
    }

    // Callers guarantee `size <= len()`. A drain larger than the capacity
    // can only follow an unchecked overrun; it is split so every cursor step
    // stays within one lap.
    fn consume(&mut self, size: u32) {
        let capacity = self.capacity();
        let mut remaining = size;
        while remaining > 0 {
            let step = remaining.min(capacity);
            self.read_cursor = self.storage.advance(self.read_cursor, step);
            remaining -= step;
        }
        self.read_count = self.read_count.wrapping_add(size);
    }

    fn check_available(&self, offset: u32, size: u32) -> Result<(), FifoError> {
        let requested = u64::from(offset) + u64::from(size);
        let available = self.len();
        if requested > u64::from(available) {
            return Err(FifoError::violation(requested, available));
        }
        Ok(())
    }

    /// Copy `data` into the ring and return the number of bytes written.
    ///
    /// This is the unchecked fast path: it does not look at
    /// [`free_space`](Self::free_space), and writing more than that silently
    /// overwrites unread data. Use [`try_write`](Self::try_write) or
    /// [`push`](Self::push) for a bounded write.
    pub fn write(&mut self, data: &[u8]) -> u32 {
        let size = u32::try_from(data.len()).unwrap_or(u32::MAX);
        let mut source = data;
        self.write_from(&mut source, size)
    }

    /// Pull up to `size` bytes from `source` into the ring.
    ///
    /// The ring hands `source` one contiguous chunk at a time, each bounded by
    /// the distance from the write cursor to the end of the array. The write
    /// stops early when `source` returns `0`; the return value is the number
    /// of bytes actually written. Like [`write`](Self::write) this does not
    /// check [`free_space`](Self::free_space).
    pub fn write_from<S>(&mut self, source: &mut S, size: u32) -> u32
    where
        S: Source + ?Sized,
    {
        let free = self.free_space();
        let mut cursor = self.write_cursor;
        let mut remaining = size;

        while remaining > 0 {
            let room = self.storage.contiguous(cursor, remaining);
            if room == 0 {
                break;
            }
            let filled = source.fill(self.storage.chunk_mut(cursor, room));
            let filled = u32::try_from(filled).map_or(room, |n| n.min(room));
            if filled == 0 {
                break;
            }
            cursor = self.storage.advance(cursor, filled);
            remaining -= filled;
        }

        let written = size - remaining;
        self.write_cursor = cursor;
        self.write_count = self.write_count.wrapping_add(written);
        if written > free {
            tracing::warn!(
                written,
                free,
                overwritten = written - free,
                "unchecked write overran unread data"
            );
        }
        written
    }

    /// Like [`write`](Self::write), but refuses to overwrite unread data.
    ///
    /// # Errors
    ///
    /// [`FifoError::ContractViolation`] if `data` is longer than
    /// [`free_space`](Self::free_space). The ring is unchanged.
    pub fn try_write(&mut self, data: &[u8]) -> Result<u32, FifoError> {
        let free = self.free_space();
        let size = u32::try_from(data.len())
            .ok()
            .filter(|&size| size <= free)
            .ok_or_else(|| FifoError::violation(data.len() as u64, free))?;
        let mut source = data;
        Ok(self.write_from(&mut source, size))
    }

    /// Like [`write_from`](Self::write_from), but refuses to overwrite unread
    /// data.
    ///
    /// # Errors
    ///
    /// [`FifoError::ContractViolation`] if `size` exceeds
    /// [`free_space`](Self::free_space). The ring is unchanged and `source` is
    /// never called.
    pub fn try_write_from<S>(&mut self, source: &mut S, size: u32) -> Result<u32, FifoError>
    where
        S: Source + ?Sized,
    {
        let free = self.free_space();
        if size > free {
            return Err(FifoError::violation(size, free));
        }
        Ok(self.write_from(source, size))
    }

    /// Write all of `data`, handling a full ring according to the configured
    /// [`OverrunPolicy`].
    ///
    /// # Errors
    ///
    /// - [`FifoError::ContractViolation`] under [`OverrunPolicy::Reject`] when
    ///   `data` does not fit.
    /// - [`FifoError::InvalidArgument`] or [`FifoError::OutOfMemory`] under
    ///   [`OverrunPolicy::Grow`] when the ring cannot grow enough.
    pub fn push(&mut self, data: &[u8]) -> Result<u32, FifoError> {
        match self.options.overrun {
            OverrunPolicy::Overwrite => Ok(self.write(data)),
            OverrunPolicy::Reject => self.try_write(data),
            OverrunPolicy::Grow => {
                let size = u32::try_from(data.len())
                    .map_err(|_| FifoError::InvalidArgument("push larger than u32::MAX"))?;
                if size > self.free_space() {
                    self.grow(size)?;
                }
                Ok(self.write(data))
            }
        }
    }

    /// Fill `dest` completely from the front of the ring, consuming the
    /// bytes.
    ///
    /// # Errors
    ///
    /// [`FifoError::ContractViolation`] if fewer than `dest.len()` bytes are
    /// queued. Nothing is consumed in that case.
    pub fn read(&mut self, dest: &mut [u8]) -> Result<(), FifoError> {
        let size = self.slice_len(dest.len())?;
        let mut sink = dest;
        self.read_into(&mut sink, size)
    }

    /// Hand exactly `size` bytes from the front of the ring to `sink`,
    /// consuming them.
    ///
    /// `sink` receives at most two chunks, split where the occupied region
    /// wraps past the end of the array. Each chunk is drained as soon as the
    /// sink has taken it.
    ///
    /// # Errors
    ///
    /// [`FifoError::ContractViolation`] if fewer than `size` bytes are queued.
    pub fn read_into<K>(&mut self, sink: &mut K, size: u32) -> Result<(), FifoError>
    where
        K: Sink + ?Sized,
    {
        self.check_available(0, size)?;
        let mut remaining = size;
        while remaining > 0 {
            let len = self.storage.contiguous(self.read_cursor, remaining);
            sink.accept(self.storage.chunk(self.read_cursor, len));
            self.consume(len);
            remaining -= len;
        }
        Ok(())
    }

    /// Copy the first `dest.len()` queued bytes into `dest` without consuming
    /// them.
    ///
    /// # Errors
    ///
    /// [`FifoError::ContractViolation`] if fewer than `dest.len()` bytes are
    /// queued.
    pub fn peek(&self, dest: &mut [u8]) -> Result<(), FifoError> {
        self.peek_at(dest, 0)
    }

    /// Hand the first `size` queued bytes to `sink` without consuming them.
    ///
    /// # Errors
    ///
    /// [`FifoError::ContractViolation`] if fewer than `size` bytes are queued.
    pub fn peek_into<K>(&self, sink: &mut K, size: u32) -> Result<(), FifoError>
    where
        K: Sink + ?Sized,
    {
        self.peek_at_into(sink, 0, size)
    }

    /// Copy `dest.len()` bytes starting `offset` bytes past the read cursor,
    /// without consuming anything.
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
    /// `sink`, without consuming anything.
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
        let capacity = self.capacity();
        if size == 0 {
            return Ok(());
        }
        // An offset of a full lap or more is only reachable after an
        // unchecked overrun.
        let offset = if offset < capacity { offset } else { offset % capacity };
        let mut cursor = self.storage.advance(self.read_cursor, offset);
        let mut remaining = size;
        while remaining > 0 {
            let len = self.storage.contiguous(cursor, remaining);
            sink.accept(self.storage.chunk(cursor, len));
            cursor = self.storage.advance(cursor, len);
            remaining -= len;
        }
        Ok(())
    }

    fn slice_len(&self, len: usize) -> Result<u32, FifoError> {
        u32::try_from(len).map_err(|_| FifoError::violation(len as u64, self.len()))
    }

    /// The queued bytes as two slices in read order. The second slice is
    /// empty unless the data wraps past the end of the backing array.
    #[must_use]
    pub fn as_slices(&self) -> (&[u8], &[u8]) {
        let len = self.len().min(self.capacity());
        let head = self.storage.contiguous(self.read_cursor, len);
        (
            self.storage.chunk(self.read_cursor, head),
            self.storage.chunk(0, len - head),
        )
    }

    /// Resize the backing array to `new_capacity` bytes, keeping the queued
    /// bytes in order.
    ///
    /// Does nothing when `new_capacity` is not larger than the current
    /// capacity. The ring handle stays the same; only its backing array is
    /// replaced.
    ///
    /// # Errors
    ///
    /// [`FifoError::OutOfMemory`] if the new array cannot be allocated. The
    /// ring is left exactly as it was.
    pub fn reallocate(&mut self, new_capacity: u32) -> Result<(), FifoError> {
        let old_capacity = self.capacity();
        if new_capacity <= old_capacity {
            return Ok(());
        }

        let mut storage = Storage::allocate(new_capacity)?;
        let (head, tail) = self.as_slices();
        let (head_len, tail_len) = (head.len(), tail.len());
        storage.chunk_mut(0, to_u32(head_len)).copy_from_slice(head);
        storage
            .chunk_mut(to_u32(head_len), to_u32(tail_len))
            .copy_from_slice(tail);
        let carried = to_u32(head_len + tail_len);

        tracing::debug!(old_capacity, new_capacity, carried, "fifo reallocated");
        self.read_cursor = 0;
        self.read_count = 0;
        self.write_cursor = storage.advance(0, carried);
        self.write_count = carried;
        self.storage = storage;
        Ok(())
    }

    /// Make room for at least `additional` more bytes beyond what is queued.
    ///
    /// When the ring must grow it grows to at least twice its current
    /// capacity, so a stream of small growths reallocates only a logarithmic
    /// number of times.
    ///
    /// # Errors
    ///
    /// - [`FifoError::InvalidArgument`] if `len() + additional` overflows a
    ///   `u32`. The ring is unchanged.
    /// - [`FifoError::OutOfMemory`] if reallocation fails. The ring is
    ///   unchanged.
    pub fn grow(&mut self, additional: u32) -> Result<(), FifoError> {
        let target = self
            .len()
            .checked_add(additional)
            .ok_or(FifoError::InvalidArgument("grow size overflows u32"))?;
        let capacity = self.capacity();
        if target <= capacity {
            tracing::trace!(target, capacity, "grow already satisfied");
            return Ok(());
        }
        self.reallocate(target.max(capacity.saturating_mul(2)))
    }

    #[cfg(test)]
    pub(crate) fn seed_counters(&mut self, count: u32) {
        debug_assert!(self.is_empty());
        self.read_count = count;
        self.write_count = count;
    }

    /// Assert the ring's internal invariants.
    ///
    /// # Panics
    ///
    /// Panics if a cursor escaped the backing array or, when
    /// `allow_overrun` is `false`, if the occupied length exceeds capacity.
    #[cfg(any(test, feature = "fuzzing"))]
    pub fn check_invariants(&self, allow_overrun: bool) {
        let capacity = self.capacity();
        if capacity == 0 {
            assert_eq!(self.read_cursor, 0);
            assert_eq!(self.write_cursor, 0);
        } else {
            assert!(self.read_cursor < capacity, "read cursor out of range");
            assert!(self.write_cursor < capacity, "write cursor out of range");
        }
        if !allow_overrun {
            assert!(self.len() <= capacity, "occupied length exceeds capacity");
            assert_eq!(
                self.storage.advance(self.read_cursor, self.len()),
                self.write_cursor,
                "cursors disagree with counters"
            );
        }
    }
}

// Lengths here are bounded by a u32 capacity.
#[allow(clippy::cast_possible_truncation)]
fn to_u32(len: usize) -> u32 {
    debug_assert!(u32::try_from(len).is_ok());
    len as u32
}

impl fmt::Debug for RingFifo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingFifo")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("read_cursor", &self.read_cursor)
            .field("write_cursor", &self.write_cursor)
            .finish_non_exhaustive()
    }
}

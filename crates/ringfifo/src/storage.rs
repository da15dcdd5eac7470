//! Backing array and cursor arithmetic shared by every ring flavour.
//!
//! Cursors are byte indices into the array rather than pointers. A cursor is
//! always in `[0, capacity)`, except for a zero-capacity array where the only
//! valid cursor is `0`. Wraparound is resolved as soon as a cursor moves, so
//! readers never observe a cursor equal to `capacity`.

use alloc::{boxed::Box, vec::Vec};

use crate::FifoError;

/// Add `delta` to `cursor`, wrapping back into `[0, capacity)`.
///
/// `delta` must not exceed `capacity`, which holds for every chunk the ring
/// moves: a chunk never spans more than the distance to the end of the array.
/// Under that bound a single subtraction is enough and no modulo is needed.
#[inline]
pub(crate) fn wrap_add(cursor: u32, delta: u32, capacity: u32) -> u32 {
    debug_assert!(cursor < capacity || capacity == 0);
    debug_assert!(delta <= capacity);
    let to_end = capacity - cursor;
    if delta >= to_end {
        delta - to_end
    } else {
        cursor + delta
    }
}

/// Length of the contiguous run starting at `cursor`, capped at `want`.
#[inline]
pub(crate) fn contiguous(cursor: u32, want: u32, capacity: u32) -> u32 {
    (capacity - cursor).min(want)
}

/// Allocate `capacity` zeroed elements, reporting allocator failure instead of
/// aborting.
pub(crate) fn try_alloc<T>(capacity: u32, init: impl FnMut() -> T) -> Result<Box<[T]>, FifoError> {
    let len = capacity as usize;
    let mut data = Vec::new();
    if data.try_reserve_exact(len).is_err() {
        tracing::debug!(capacity, "ring allocation failed");
        return Err(FifoError::OutOfMemory {
            requested: len.saturating_mul(core::mem::size_of::<T>()),
        });
    }
    data.resize_with(len, init);
    Ok(data.into_boxed_slice())
}

/// The owned byte array behind a [`RingFifo`](crate::RingFifo).
///
/// Reallocation replaces the whole `Storage` value, so the ring handle itself
/// keeps its identity across growth.
pub(crate) struct Storage {
    data: Box<[u8]>,
    capacity: u32,
}

impl Storage {
    pub(crate) fn allocate(capacity: u32) -> Result<Self, FifoError> {
        Ok(Self {
            data: try_alloc(capacity, || 0)?,
            capacity,
        })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> u32 {
        self.capacity
    }

    #[inline]
    pub(crate) fn advance(&self, cursor: u32, delta: u32) -> u32 {
        wrap_add(cursor, delta, self.capacity)
    }

    #[inline]
    pub(crate) fn contiguous(&self, cursor: u32, want: u32) -> u32 {
        contiguous(cursor, want, self.capacity)
    }

    #[inline]
    pub(crate) fn chunk(&self, cursor: u32, len: u32) -> &[u8] {
        let start = cursor as usize;
        &self.data[start..start + len as usize]
    }

    #[inline]
    pub(crate) fn chunk_mut(&mut self, cursor: u32, len: u32) -> &mut [u8] {
        let start = cursor as usize;
        &mut self.data[start..start + len as usize]
    }
}

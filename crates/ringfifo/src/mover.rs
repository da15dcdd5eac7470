//! Data movers: how bytes get into and out of the ring.
//!
//! The ring only ever hands a mover one contiguous chunk of its backing array
//! at a time. A [`Source`] fills a writable chunk and may stop early; a
//! [`Sink`] receives a readable chunk and must take all of it. Flat byte
//! slices implement both traits, so the plain-copy path is just the default
//! mover.
//!
//! ```rust
//! use ringfifo::{RingFifo, mover::{fill_fn, sink_fn}};
//!
//! let mut fifo = RingFifo::new(8).unwrap();
//!
//! // A filling mover that counts upwards and stops after five bytes.
//! let mut next = 0u8;
//! let mut counter = fill_fn(|chunk: &mut [u8]| {
//!     let n = chunk.len().min(usize::from(5 - next));
//!     for byte in &mut chunk[..n] {
//!         *byte = next;
//!         next += 1;
//!     }
//!     n
//! });
//! assert_eq!(fifo.write_from(&mut counter, 8), 5);
//!
//! let mut sum = 0u32;
//! fifo.read_into(&mut sink_fn(|chunk: &[u8]| sum += chunk.iter().map(|&b| u32::from(b)).sum::<u32>()), 5)
//!     .unwrap();
//! assert_eq!(sum, 0 + 1 + 2 + 3 + 4);
//! ```

use alloc::vec::Vec;
use core::mem;

/// A filling mover: produces bytes into the ring.
pub trait Source {
    /// Write up to `chunk.len()` bytes into `chunk` and return how many were
    /// written.
    ///
    /// Returning `0` tells the ring there is no more data and ends the write
    /// immediately. Values larger than `chunk.len()` are clamped.
    fn fill(&mut self, chunk: &mut [u8]) -> usize;
}

/// A draining mover: consumes bytes leaving the ring.
pub trait Sink {
    /// Take every byte of `chunk`.
    fn accept(&mut self, chunk: &[u8]);
}

/// Copies from the front of the slice and advances it, like `io::Read for
/// &[u8]`.
impl Source for &[u8] {
    #[inline]
    fn fill(&mut self, chunk: &mut [u8]) -> usize {
        let n = chunk.len().min(self.len());
        let (head, tail) = self.split_at(n);
        chunk[..n].copy_from_slice(head);
        *self = tail;
        n
    }
}

/// Copies into the front of the slice and advances it.
///
/// # Panics
///
/// Panics if the slice is shorter than the chunk. The ring checks the total
/// length before it starts moving bytes, so this only fires when a caller
/// drives the sink by hand.
impl Sink for &mut [u8] {
    #[inline]
    fn accept(&mut self, chunk: &[u8]) {
        let (head, tail) = mem::take(self).split_at_mut(chunk.len());
        head.copy_from_slice(chunk);
        *self = tail;
    }
}

impl Sink for Vec<u8> {
    #[inline]
    fn accept(&mut self, chunk: &[u8]) {
        self.extend_from_slice(chunk);
    }
}

/// [`Source`] built from a closure. See [`fill_fn`].
#[derive(Debug, Clone)]
pub struct FillFn<F>(F);

/// Wrap `f` as a [`Source`].
pub fn fill_fn<F>(f: F) -> FillFn<F>
where
    F: FnMut(&mut [u8]) -> usize,
{
    FillFn(f)
}

impl<F> Source for FillFn<F>
where
    F: FnMut(&mut [u8]) -> usize,
{
    #[inline]
    fn fill(&mut self, chunk: &mut [u8]) -> usize {
        (self.0)(chunk)
    }
}

/// [`Sink`] built from a closure. See [`sink_fn`].
#[derive(Debug, Clone)]
pub struct SinkFn<F>(F);

/// Wrap `f` as a [`Sink`].
pub fn sink_fn<F>(f: F) -> SinkFn<F>
where
    F: FnMut(&[u8]),
{
    SinkFn(f)
}

impl<F> Sink for SinkFn<F>
where
    F: FnMut(&[u8]),
{
    #[inline]
    fn accept(&mut self, chunk: &[u8]) {
        (self.0)(chunk);
    }
}

/// [`Source`] that fills every chunk with one byte value and never runs dry.
#[derive(Debug, Clone, Copy)]
pub struct Repeat(u8);

/// A source of endless `byte`s, handy for padding.
#[must_use]
pub fn repeat(byte: u8) -> Repeat {
    Repeat(byte)
}

impl Source for Repeat {
    #[inline]
    fn fill(&mut self, chunk: &mut [u8]) -> usize {
        chunk.fill(self.0);
        chunk.len()
    }
}

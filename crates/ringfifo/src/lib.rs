//! A resizable, byte-oriented ring FIFO.
//!
//! [`RingFifo`] decouples a producer and a consumer of a byte stream, for
//! example a socket feeding a decompressor. Bytes move in and out through
//! [movers](mover): a [`Source`](mover::Source) fills the ring one contiguous
//! chunk at a time and may stop early, a [`Sink`](mover::Sink) drains it.
//! Plain slices are the default movers.
//!
//! The ring can be grown in place with [`RingFifo::grow`] (geometric, overflow
//! checked) or [`RingFifo::reallocate`]; queued bytes keep their order.
//!
//! [`RingFifo`] itself is not synchronised. For a producer and a consumer on
//! different threads use [`spsc::split`] or [`RingFifo::into_spsc`], which
//! publish progress through atomic counters with acquire/release ordering.
//!
//! ```rust
//! use ringfifo::RingFifo;
//!
//! let mut fifo = RingFifo::new(4).unwrap();
//! fifo.write(b"ab");
//! fifo.grow(8).unwrap();
//! assert!(fifo.free_space() >= 8);
//!
//! let mut head = [0u8; 1];
//! fifo.peek_at(&mut head, 1).unwrap();
//! assert_eq!(&head, b"b");
//! assert_eq!(fifo.len(), 2);
//! ```

#![no_std]
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

mod error;
mod fifo;
#[cfg(feature = "std")]
mod io;
pub mod mover;
mod options;
pub mod spsc;
mod storage;

#[cfg(test)]
mod tests;

pub use error::FifoError;
pub use fifo::RingFifo;
#[cfg(feature = "std")]
pub use io::ReadSource;
pub use options::{FifoOptions, OverrunPolicy};

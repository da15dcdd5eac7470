//! `std::io` adapters.
//!
//! [`RingFifo`] implements [`Read`], [`BufRead`] and [`Write`], which makes it
//! a drop-in pipe between a socket or file and a decoder. [`ReadSource`] goes
//! the other way and lets any reader act as a filling mover.

use std::io::{self, BufRead, Read, Write};

use crate::{FifoError, RingFifo, mover::Source, options::OverrunPolicy};

/// A [`Source`] that pulls from an [`io::Read`].
///
/// The first I/O error ends the write (the ring sees a `0` fill) and is kept
/// for the caller to inspect with [`take_error`](Self::take_error).
/// `Interrupted` errors are retried.
#[derive(Debug)]
pub struct ReadSource<R> {
    reader: R,
    error: Option<io::Error>,
}

impl<R: Read> ReadSource<R> {
    /// Wrap `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            error: None,
        }
    }

    /// The error that stopped the last fill, if any.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    /// Unwrap the reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> Source for ReadSource<R> {
    fn fill(&mut self, chunk: &mut [u8]) -> usize {
        if self.error.is_some() {
            return 0;
        }
        loop {
            match self.reader.read(chunk) {
                Ok(n) => return n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => {
                    self.error = Some(err);
                    return 0;
                }
            }
        }
    }
}

impl RingFifo {
    /// Read from `reader` into the ring until it is full, `max` bytes have
    /// been written, or the reader reports end of stream.
    ///
    /// # Errors
    ///
    /// Returns the reader's error if it failed before any byte was written.
    /// An error after a partial fill is dropped in favour of the partial
    /// count.
    pub fn fill_from<R: Read>(&mut self, reader: R, max: u32) -> io::Result<u32> {
        let mut source = ReadSource::new(reader);
        let written = self.write_from(&mut source, max.min(self.free_space()));
        match source.take_error() {
            Some(err) if written == 0 => Err(err),
            _ => Ok(written),
        }
    }
}

fn to_io_error(err: FifoError) -> io::Error {
    let kind = match err {
        FifoError::OutOfMemory { .. } => io::ErrorKind::OutOfMemory,
        FifoError::InvalidArgument(_) => io::ErrorKind::InvalidInput,
        FifoError::ContractViolation { .. } => io::ErrorKind::WriteZero,
    };
    io::Error::new(kind, err)
}

impl Read for RingFifo {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.len() as usize);
        RingFifo::read(self, &mut buf[..n]).map_err(to_io_error)?;
        Ok(n)
    }
}

impl BufRead for RingFifo {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        Ok(self.as_slices().0)
    }

    fn consume(&mut self, amt: usize) {
        let amt = u32::try_from(amt).unwrap_or(u32::MAX).min(self.len());
        // Clamped to len(), so this cannot fail.
        let _ = self.drain(amt);
    }
}

/// Under [`OverrunPolicy::Reject`] a write into a nearly full ring is partial,
/// and a write into a full ring returns `Ok(0)`, like a bounded pipe.
impl Write for RingFifo {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.options().overrun == OverrunPolicy::Reject {
            let n = buf.len().min(self.free_space() as usize);
            return Ok(RingFifo::write(self, &buf[..n]) as usize);
        }
        self.push(buf).map(|n| n as usize).map_err(to_io_error)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// What [`RingFifo::push`](crate::RingFifo::push) does when the data does not
/// fit in the free space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OverrunPolicy {
    /// Write anyway, overwriting the oldest unread bytes. Same as
    /// [`RingFifo::write`](crate::RingFifo::write).
    Overwrite,
    /// Refuse the push with [`FifoError::ContractViolation`](crate::FifoError).
    Reject,
    /// Grow the ring (at least doubling it) until the data fits.
    #[default]
    Grow,
}

/// Configuration for a [`RingFifo`](crate::RingFifo).
///
/// # Examples
///
/// ```rust
/// use ringfifo::{FifoOptions, OverrunPolicy, RingFifo};
///
/// let fifo = RingFifo::with_options(FifoOptions {
///     capacity: 64,
///     overrun: OverrunPolicy::Reject,
/// })
/// .unwrap();
/// assert_eq!(fifo.capacity(), 64);
/// ```
///
/// # Default
///
/// A 4 KiB ring that grows on overrun.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FifoOptions {
    /// Initial capacity of the backing array in bytes.
    ///
    /// # Default
    ///
    /// `4096`
    pub capacity: u32,

    /// Behaviour of [`RingFifo::push`](crate::RingFifo::push) and the
    /// `std::io::Write` adapter when the ring is too full.
    ///
    /// # Default
    ///
    /// [`OverrunPolicy::Grow`]
    pub overrun: OverrunPolicy,
}

impl FifoOptions {
    /// Default capacity in bytes.
    pub const DEFAULT_CAPACITY: u32 = 4096;
}

impl Default for FifoOptions {
    fn default() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
            overrun: OverrunPolicy::default(),
        }
    }
}

use thiserror::Error;

/// Errors returned by [`RingFifo`](crate::RingFifo) and the SPSC halves.
///
/// Every fallible operation either succeeds completely or returns one of these
/// without mutating the ring.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FifoError {
    /// The allocator could not provide a backing array of `requested` bytes.
    #[error("out of memory allocating {requested} bytes")]
    OutOfMemory {
        /// Number of bytes that were requested.
        requested: usize,
    },
    /// A size computation would leave the `u32` domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// The caller asked for more bytes than the ring can provide or accept.
    #[error("contract violation: requested {requested} bytes but only {available} available")]
    ContractViolation {
        /// Bytes the operation needed (may exceed `u32::MAX` for peek offsets).
        requested: u64,
        /// Bytes that were actually available.
        available: u32,
    },
}

impl FifoError {
    pub(crate) fn violation(requested: impl Into<u64>, available: u32) -> Self {
        Self::ContractViolation {
            requested: requested.into(),
            available,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::FifoError;

    #[test]
    fn messages() {
        insta::assert_snapshot!(
            FifoError::OutOfMemory { requested: 64 }.to_string(),
            @"out of memory allocating 64 bytes"
        );
        insta::assert_snapshot!(
            FifoError::InvalidArgument("grow size overflows u32").to_string(),
            @"invalid argument: grow size overflows u32"
        );
        insta::assert_snapshot!(
            FifoError::violation(9u32, 4).to_string(),
            @"contract violation: requested 9 bytes but only 4 available"
        );
    }
}

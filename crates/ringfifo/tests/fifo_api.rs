#![allow(missing_docs)]

use ringfifo::{
    FifoError, FifoOptions, OverrunPolicy, RingFifo,
    mover::{Sink, Source, fill_fn, sink_fn},
};
use rstest::rstest;

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + 3) as u8).collect()
}

/// A fifo whose cursors start `offset` bytes into the array.
fn fifo_at(capacity: u32, offset: u32) -> RingFifo {
    let mut fifo = RingFifo::new(capacity).unwrap();
    fifo.write(&vec![0xFFu8; offset as usize]);
    fifo.drain(offset).unwrap();
    fifo
}

#[rstest]
fn round_trip_across_the_array_end(
    #[values(0, 1, 5, 8)] len: usize,
    #[values(0, 3, 7)] offset: u32,
) {
    let data = pattern(len);
    let mut fifo = fifo_at(8, offset);

    assert_eq!(fifo.write(&data), len as u32);
    assert_eq!(fifo.len() as usize, len);

    let mut out = vec![0u8; len];
    fifo.read(&mut out).unwrap();
    assert_eq!(out, data);
    assert!(fifo.is_empty());
}

#[rstest]
#[case::empty(0, 0)]
#[case::head(0, 3)]
#[case::middle(2, 3)]
#[case::tail(4, 2)]
fn peek_at_matches_slice(#[case] offset: u32, #[case] len: usize) {
    let data = pattern(6);
    let mut fifo = fifo_at(7, 5);
    fifo.write(&data);

    let mut out = vec![0u8; len];
    fifo.peek_at(&mut out, offset).unwrap();
    assert_eq!(out, &data[offset as usize..offset as usize + len]);
    assert_eq!(fifo.len(), 6);
}

#[test]
fn size_tracks_writes_minus_reads() {
    let mut fifo = RingFifo::new(10).unwrap();
    let mut written = 0u32;
    let mut read = 0u32;
    for round in 0..50u32 {
        let n = round % 7;
        if n <= fifo.free_space() {
            written += fifo.write(&pattern(n as usize));
        }
        let m = (round * 3) % 5;
        if m <= fifo.len() {
            fifo.drain(m).unwrap();
            read += m;
        }
        assert_eq!(fifo.len(), written - read);
        assert_eq!(fifo.free_space(), 10 - fifo.len());
    }
}

#[test]
fn peek_into_custom_sink() {
    struct Checksum(u32);
    impl Sink for Checksum {
        fn accept(&mut self, chunk: &[u8]) {
            self.0 = chunk
                .iter()
                .fold(self.0, |acc, &b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
        }
    }

    let mut fifo = fifo_at(5, 4);
    fifo.write(b"hello");

    let mut direct = Checksum(0);
    direct.accept(b"hello");
    let mut peeked = Checksum(0);
    fifo.peek_into(&mut peeked, 5).unwrap();
    assert_eq!(peeked.0, direct.0);
    assert_eq!(fifo.len(), 5);
}

#[test]
fn custom_source_is_clamped_to_chunk() {
    struct Liar;
    impl Source for Liar {
        fn fill(&mut self, chunk: &mut [u8]) -> usize {
            chunk.fill(1);
            chunk.len() + 100
        }
    }

    let mut fifo = RingFifo::new(4).unwrap();
    assert_eq!(fifo.write_from(&mut Liar, 3), 3);
    assert_eq!(fifo.len(), 3);
}

#[test]
fn decoder_style_transform_on_read() {
    let mut fifo = fifo_at(6, 4);
    fifo.write(b"abcdef");

    let mut upper = Vec::new();
    fifo.read_into(
        &mut sink_fn(|chunk: &[u8]| upper.extend(chunk.iter().map(u8::to_ascii_uppercase))),
        4,
    )
    .unwrap();
    assert_eq!(upper, b"ABCD");
    assert_eq!(fifo.len(), 2);
}

#[test]
fn grow_with_partial_source() {
    let mut fifo = RingFifo::with_options(FifoOptions {
        capacity: 4,
        overrun: OverrunPolicy::Grow,
    })
    .unwrap();
    let mut remaining = 10usize;
    loop {
        fifo.grow(3).unwrap();
        let n = fifo.write_from(
            &mut fill_fn(|chunk: &mut [u8]| {
                let n = chunk.len().min(remaining).min(3);
                chunk[..n].fill(b'z');
                remaining -= n;
                n
            }),
            3,
        );
        if n == 0 {
            break;
        }
    }
    assert_eq!(fifo.len(), 10);
    assert!(fifo.capacity() >= 10);
}

#[test]
fn errors_leave_ring_untouched() {
    let mut fifo = RingFifo::new(3).unwrap();
    fifo.write(&[1, 2, 3]);
    fifo.drain(1).unwrap();

    assert!(matches!(fifo.drain(3), Err(FifoError::ContractViolation { .. })));
    assert!(matches!(fifo.try_write(&[9, 9]), Err(FifoError::ContractViolation { .. })));
    assert!(matches!(fifo.grow(u32::MAX), Err(FifoError::InvalidArgument(_))));
    assert_eq!(fifo.as_slices(), (&[2u8, 3][..], &[][..]));
}

use alloc::{collections::VecDeque, vec, vec::Vec};

use quickcheck::{Arbitrary, Gen, QuickCheck};

use crate::{RingFifo, mover::repeat};

#[derive(Debug, Clone)]
enum Op {
    Write(Vec<u8>),
    Read(u8),
    Peek(u8),
    PeekAt(u8, u8),
    Drain(u8),
    Grow(u8),
    Reallocate(u8),
    Reset,
}

impl Arbitrary for Op {
    fn arbitrary(g: &mut Gen) -> Self {
        match usize::arbitrary(g) % 10 {
            0..=2 => {
                let len = usize::arbitrary(g) % 24;
                Op::Write((0..len).map(|_| u8::arbitrary(g)).collect())
            }
            3 | 4 => Op::Read(u8::arbitrary(g) % 24),
            5 => Op::Peek(u8::arbitrary(g) % 24),
            6 => Op::PeekAt(u8::arbitrary(g) % 24, u8::arbitrary(g) % 24),
            7 => Op::Drain(u8::arbitrary(g) % 24),
            8 => {
                if bool::arbitrary(g) {
                    Op::Grow(u8::arbitrary(g) % 32)
                } else {
                    Op::Reallocate(u8::arbitrary(g) % 64)
                }
            }
            _ => Op::Reset,
        }
    }
}

fn front(model: &VecDeque<u8>, offset: usize, len: usize) -> Vec<u8> {
    model.iter().skip(offset).take(len).copied().collect()
}

/// Replays `ops` against both the ring and a `VecDeque` and checks they never
/// disagree. Writes go through the checked path so the model stays exact.
fn replay(initial_capacity: u8, ops: &[Op]) -> bool {
    let mut fifo = RingFifo::new(u32::from(initial_capacity % 32)).unwrap();
    let mut model: VecDeque<u8> = VecDeque::new();

    for op in ops {
        match op {
            Op::Write(data) => {
                let fits = data.len() <= fifo.free_space() as usize;
                match fifo.try_write(data) {
                    Ok(n) => {
                        assert!(fits);
                        assert_eq!(n as usize, data.len());
                        model.extend(data);
                    }
                    Err(_) => assert!(!fits),
                }
            }
            Op::Read(n) => {
                let n = usize::from(*n);
                let mut out = vec![0u8; n];
                match fifo.read(&mut out) {
                    Ok(()) => assert_eq!(out, model.drain(..n).collect::<Vec<_>>()),
                    Err(_) => assert!(n > model.len()),
                }
            }
            Op::Peek(n) => {
                let n = usize::from(*n);
                let mut out = vec![0u8; n];
                match fifo.peek(&mut out) {
                    Ok(()) => assert_eq!(out, front(&model, 0, n)),
                    Err(_) => assert!(n > model.len()),
                }
            }
            Op::PeekAt(offset, n) => {
                let (offset, n) = (usize::from(*offset), usize::from(*n));
                let mut out = vec![0u8; n];
                match fifo.peek_at(&mut out, u32::try_from(offset).unwrap()) {
                    Ok(()) => assert_eq!(out, front(&model, offset, n)),
                    Err(_) => assert!(offset + n > model.len()),
                }
            }
            Op::Drain(n) => {
                let n = usize::from(*n);
                match fifo.drain(u32::try_from(n).unwrap()) {
                    Ok(()) => {
                        model.drain(..n);
                    }
                    Err(_) => assert!(n > model.len()),
                }
            }
            Op::Grow(k) => {
                let before = fifo.capacity();
                fifo.grow(u32::from(*k)).unwrap();
                assert!(fifo.free_space() >= u32::from(*k));
                assert!(fifo.capacity() == before || fifo.capacity() >= before * 2);
            }
            Op::Reallocate(k) => {
                let before = fifo.capacity();
                fifo.reallocate(u32::from(*k)).unwrap();
                assert_eq!(fifo.capacity(), before.max(u32::from(*k)));
            }
            Op::Reset => {
                fifo.reset();
                model.clear();
            }
        }

        fifo.check_invariants(false);
        assert_eq!(fifo.len() as usize, model.len());
        let (head, tail) = fifo.as_slices();
        assert_eq!([head, tail].concat(), model.iter().copied().collect::<Vec<_>>());
    }
    true
}

/// Property: any interleaving of checked writes, reads, peeks, drains and
/// growth behaves exactly like a `VecDeque<u8>`.
#[test]
fn ring_matches_vecdeque_model() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(initial_capacity: u8, ops: Vec<Op>) -> bool {
        replay(initial_capacity, &ops)
    }

    #[cfg(not(miri))]
    let tests = if is_ci::cached() { 10_000 } else { 1_000 };
    #[cfg(miri)]
    let tests = 10;

    QuickCheck::new()
        .tests(tests)
        .quickcheck(prop as fn(u8, Vec<Op>) -> bool);
}

/// Property: writing `n <= capacity` bytes at any starting offset and reading
/// them back yields the same bytes, including across the end of the array.
#[quickcheck_macros::quickcheck]
#[allow(clippy::needless_pass_by_value)]
fn round_trip_at_every_offset(capacity: u8, start: u8, data: Vec<u8>) -> bool {
    let capacity = u32::from(capacity % 40) + 1;
    let data = &data[..data.len().min(capacity as usize)];
    let mut fifo = RingFifo::new(capacity).unwrap();

    let skip = u32::from(start) % capacity;
    fifo.write_from(&mut repeat(0), skip);
    fifo.drain(skip).unwrap();

    fifo.write(data);
    let mut out = vec![0u8; data.len()];
    fifo.read(&mut out).unwrap();
    out == data && fifo.is_empty()
}

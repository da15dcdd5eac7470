#![no_main]
use std::collections::VecDeque;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ringfifo::RingFifo;

#[derive(Debug, Arbitrary)]
enum Op {
    Write(Vec<u8>),
    TryWrite(Vec<u8>),
    Read(u16),
    Peek(u16),
    PeekAt(u16, u16),
    Drain(u16),
    Grow(u16),
    Reallocate(u16),
    Reset,
}

#[derive(Debug, Arbitrary)]
struct Input {
    capacity: u16,
    ops: Vec<Op>,
}

fn front(model: &VecDeque<u8>, offset: usize, len: usize) -> Vec<u8> {
    model.iter().skip(offset).take(len).copied().collect()
}

fuzz_target!(|input: Input| {
    let Ok(mut fifo) = RingFifo::new(u32::from(input.capacity % 4096)) else {
        return;
    };
    let mut model: VecDeque<u8> = VecDeque::new();

    for op in input.ops {
        match op {
            // Unchecked writes are only replayed when they fit, otherwise the
            // model would have to mimic the overwrite.
            Op::Write(data) => {
                if data.len() <= fifo.free_space() as usize {
                    assert_eq!(fifo.write(&data) as usize, data.len());
                    model.extend(&data);
                }
            }
            Op::TryWrite(data) => {
                let fits = data.len() <= fifo.free_space() as usize;
                assert_eq!(fifo.try_write(&data).is_ok(), fits);
                if fits {
                    model.extend(&data);
                }
            }
            Op::Read(n) => {
                let mut out = vec![0u8; usize::from(n)];
                if fifo.read(&mut out).is_ok() {
                    assert_eq!(out, model.drain(..out.len()).collect::<Vec<_>>());
                } else {
                    assert!(out.len() > model.len());
                }
            }
            Op::Peek(n) => {
                let mut out = vec![0u8; usize::from(n)];
                if fifo.peek(&mut out).is_ok() {
                    assert_eq!(out, front(&model, 0, out.len()));
                } else {
                    assert!(out.len() > model.len());
                }
            }
            Op::PeekAt(offset, n) => {
                let mut out = vec![0u8; usize::from(n)];
                if fifo.peek_at(&mut out, u32::from(offset)).is_ok() {
                    assert_eq!(out, front(&model, usize::from(offset), out.len()));
                } else {
                    assert!(usize::from(offset) + out.len() > model.len());
                }
            }
            Op::Drain(n) => {
                if fifo.drain(u32::from(n)).is_ok() {
                    model.drain(..usize::from(n));
                } else {
                    assert!(usize::from(n) > model.len());
                }
            }
            Op::Grow(k) => {
                if fifo.grow(u32::from(k)).is_ok() {
                    assert!(fifo.free_space() >= u32::from(k));
                }
            }
            Op::Reallocate(k) => {
                let _ = fifo.reallocate(u32::from(k));
            }
            Op::Reset => {
                fifo.reset();
                model.clear();
            }
        }

        fifo.check_invariants(false);
        let (head, tail) = fifo.as_slices();
        assert_eq!(head.len() + tail.len(), model.len());
        assert!(head.iter().chain(tail).eq(model.iter()));
    }
});

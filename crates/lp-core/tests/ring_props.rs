//! Property tests: the sample ring never exceeds its headroom and hands
//! out every produced frame exactly once, in order.

use lp_core::{EmulationCore, Frame, SampleRing, StepResult, VideoFrame};
use proptest::prelude::*;

/// One scripted step. The raw values are scaled against the request at
/// run time so that every generated step honours the core contract.
#[derive(Clone, Copy, Debug)]
struct RawStep {
    boundary: bool,
    amount: u16,
    tail: u16,
}

struct NumberingCore {
    steps: Vec<RawStep>,
    next: usize,
    headroom: usize,
    counter: u32,
}

impl EmulationCore for NumberingCore {
    fn run_for(&mut self, _: &mut VideoFrame, audio: &mut [Frame], requested: usize) -> StepResult {
        let step = self.steps[self.next];
        self.next += 1;

        let max = requested + self.headroom;
        let produced = step.amount as usize * max / u16::MAX as usize;
        for slot in &mut audio[..produced] {
            *slot = Frame::from_packed(self.counter);
            self.counter += 1;
        }

        if step.boundary {
            let tail = (step.tail as usize).min(self.headroom).min(produced);
            StepResult::FrameDone {
                produced,
                offset: produced - tail,
            }
        } else {
            StepResult::Ran { produced }
        }
    }
}

fn raw_step() -> impl Strategy<Value = RawStep> {
    (any::<bool>(), any::<u16>(), any::<u16>()).prop_map(|(boundary, amount, tail)| RawStep {
        boundary,
        amount,
        tail,
    })
}

fn drive(target: usize, headroom: usize, steps: Vec<RawStep>) {
    let count = steps.len();
    let mut core = NumberingCore {
        steps,
        next: 0,
        headroom,
        counter: 0,
    };
    let mut ring = SampleRing::new(target, headroom);
    let mut video = VideoFrame::new(1, 1);
    let mut emitted = Vec::new();

    for _ in 0..count {
        let batch = ring.run(&mut core, &mut video);
        assert_eq!(batch.ready, ring.ready().len());
        emitted.extend(ring.ready().iter().map(|f| f.to_packed()));
        ring.compact();
        assert!(ring.pending() <= headroom, "pending {} > {}", ring.pending(), headroom);
    }

    let expected: Vec<u32> = (0..core.counter - ring.pending() as u32).collect();
    assert_eq!(emitted, expected);
}

proptest! {
    #[test]
    fn pending_stays_within_headroom_and_nothing_is_lost(
        steps in prop::collection::vec(raw_step(), 1..200),
    ) {
        drive(64, 16, steps);
    }

    #[test]
    fn tiny_headroom_is_respected(
        steps in prop::collection::vec(raw_step(), 1..100),
    ) {
        drive(5, 1, steps);
    }
}

#[test]
fn domain_sized_ring_reconstructs_stream() {
    let steps = (0..40u16)
        .map(|i| RawStep {
            boundary: i % 3 != 0,
            amount: i.wrapping_mul(7919) | 0x8000,
            tail: i.wrapping_mul(104),
        })
        .collect();
    drive(lp_core::SAMPLES_PER_FRAME, lp_core::MAX_OVERPRODUCTION, steps);
}

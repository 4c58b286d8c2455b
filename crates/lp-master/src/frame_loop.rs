//! The per-frame orchestration loop.
//!
//! One iteration:
//! 1. drain pending MIDI real-time messages into the link port,
//! 2. run one emulation step and account the produced samples,
//! 3. if a video frame completed, ask the skip scheduler (with the low
//!    flag from the previous write) and either pace and present it or
//!    drop it,
//! 4. write the samples that belong to completed frames,
//! 5. keep the low flag and rescale the frame period from the reported
//!    device rate,
//! 6. move the leftover samples to the front of the ring.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use lp_audio::{AudioSink, AudioStatus, Resampler};
use lp_core::{
    Batch, EmulationCore, LinkAction, LinkSync, SampleRing, SkipSched, VideoFrame, VideoSink,
    MAX_OVERPRODUCTION, SAMPLES_PER_FRAME,
};
use lp_timing::{frame_period, Clock, FrameWait, Usec};
use tracing::{debug, info, trace};

use crate::config::Config;
use crate::runtime::Runtime;

/// What happened to the video side in one iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// No video frame completed.
    Pending,
    /// Paced and presented; `late` is how far the wakeup overshot.
    Presented { late: Usec },
    /// Completed but dropped to relieve the audio path.
    Skipped,
}

/// Report of one [`FrameLoop::iterate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Iteration {
    pub batch: Batch,
    pub frame: FrameOutcome,
    pub audio: AudioStatus,
    pub midi_messages: usize,
}

/// Running totals kept by the loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub iterations: u64,
    pub presented: u64,
    pub skipped: u64,
    pub midi_messages: u64,
    pub max_late: Usec,
}

impl LoopStats {
    /// Video frames completed, presented or not.
    pub fn frames(&self) -> u64 {
        self.presented + self.skipped
    }
}

/// Loop totals readable from another thread.
#[derive(Debug, Default)]
pub struct SharedStats {
    iterations: AtomicU64,
    presented: AtomicU64,
    skipped: AtomicU64,
    midi_messages: AtomicU64,
    max_late: AtomicU64,
}

impl SharedStats {
    pub fn publish(&self, stats: &LoopStats) {
        self.iterations.store(stats.iterations, Ordering::Relaxed);
        self.presented.store(stats.presented, Ordering::Relaxed);
        self.skipped.store(stats.skipped, Ordering::Relaxed);
        self.midi_messages.store(stats.midi_messages, Ordering::Relaxed);
        self.max_late.store(stats.max_late, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> LoopStats {
        LoopStats {
            iterations: self.iterations.load(Ordering::Relaxed),
            presented: self.presented.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            midi_messages: self.midi_messages.load(Ordering::Relaxed),
            max_late: self.max_late.load(Ordering::Relaxed),
        }
    }
}

/// Owns the loop state: sample ring, video buffer, skip policy,
/// presentation timeline and link sync.
pub struct FrameLoop<K> {
    ring: SampleRing,
    frame: VideoFrame,
    skip: SkipSched,
    wait: FrameWait<K>,
    link: LinkSync,
    /// Low-buffer flag from the previous write.
    low: bool,
    frame_time: Usec,
    output_rate: u32,
    stats: LoopStats,
    stats_interval: u64,
    stats_reports: u64,
}

impl<K: Clock> FrameLoop<K> {
    /// `output_rate` is the rate the audio sink was opened at.
    pub fn new(clock: K, output_rate: u32, skip: SkipSched, link: LinkSync) -> Self {
        Self {
            ring: SampleRing::new(SAMPLES_PER_FRAME, MAX_OVERPRODUCTION),
            frame: VideoFrame::default(),
            skip,
            wait: FrameWait::new(clock),
            link,
            low: false,
            frame_time: frame_period(output_rate, output_rate),
            output_rate,
            stats: LoopStats::default(),
            stats_interval: 600,
            stats_reports: 0,
        }
    }

    pub fn from_config(clock: K, output_rate: u32, config: &Config) -> Self {
        Self::new(
            clock,
            output_rate,
            config.skip_sched(),
            LinkSync::new(config.midi.ticks_per_clock),
        )
        .with_stats_interval(config.timing.frames_per_stats)
    }

    /// Log statistics every `frames` completed video frames (0 disables).
    pub fn with_stats_interval(mut self, frames: u32) -> Self {
        self.stats_interval = frames as u64;
        self
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// Number of periodic statistics reports logged so far.
    pub fn stats_reports(&self) -> u64 {
        self.stats_reports
    }

    pub fn frame_time(&self) -> Usec {
        self.frame_time
    }

    pub fn buffer_low(&self) -> bool {
        self.low
    }

    /// Samples carried over to the next iteration.
    pub fn pending_samples(&self) -> usize {
        self.ring.pending()
    }

    pub fn link(&self) -> &LinkSync {
        &self.link
    }

    pub fn clock(&self) -> &K {
        self.wait.clock()
    }

    /// Run one iteration.
    pub fn iterate<C, R, S, V>(&mut self, rt: &mut Runtime<C, R, S, V>) -> Iteration
    where
        C: EmulationCore,
        R: Resampler,
        S: AudioSink,
        V: VideoSink,
    {
        let midi_messages = self.drain_midi(rt);

        let batch = self.ring.run(&mut rt.core, &mut self.frame);

        let frame = if batch.frame_done {
            if self.skip.skip_next(self.low) {
                trace!(run = self.skip.run_length(), "skipping frame, audio buffer low");
                self.stats.skipped += 1;
                FrameOutcome::Skipped
            } else {
                let late = self.wait.wait_for_next_frame_time(self.frame_time);
                rt.video.present(&self.frame);
                self.stats.presented += 1;
                self.stats.max_late = self.stats.max_late.max(late);
                FrameOutcome::Presented { late }
            }
        } else {
            FrameOutcome::Pending
        };

        let audio = rt.audio.write(self.ring.ready());
        self.low = audio.low;
        self.frame_time = frame_period(self.output_rate, audio.rate);

        self.ring.compact();

        self.stats.iterations += 1;
        if batch.frame_done
            && self.stats_interval > 0
            && self.stats.frames() % self.stats_interval == 0
        {
            self.stats_reports += 1;
            debug!(
                frames = self.stats.frames(),
                iterations = self.stats.iterations,
                presented = self.stats.presented,
                skipped = self.stats.skipped,
                max_late_us = self.stats.max_late,
                device_rate = audio.rate,
                frame_time_us = self.frame_time,
                "frame loop stats"
            );
        }

        Iteration {
            batch,
            frame,
            audio,
            midi_messages,
        }
    }

    /// Iterate until `stop` is set, publishing totals after each iteration.
    pub fn run<C, R, S, V>(
        &mut self,
        rt: &mut Runtime<C, R, S, V>,
        stop: &AtomicBool,
        shared: &SharedStats,
    ) -> LoopStats
    where
        C: EmulationCore,
        R: Resampler,
        S: AudioSink,
        V: VideoSink,
    {
        info!(output_rate = self.output_rate, "frame loop started");
        while !stop.load(Ordering::Relaxed) {
            self.iterate(rt);
            shared.publish(&self.stats);
        }
        info!(
            iterations = self.stats.iterations,
            presented = self.stats.presented,
            skipped = self.stats.skipped,
            "frame loop stopped"
        );
        self.stats
    }

    /// Iterate until `frames` more video frames have completed.
    pub fn run_frames<C, R, S, V>(&mut self, rt: &mut Runtime<C, R, S, V>, frames: u64) -> LoopStats
    where
        C: EmulationCore,
        R: Resampler,
        S: AudioSink,
        V: VideoSink,
    {
        let target = self.stats.frames() + frames;
        while self.stats.frames() < target {
            self.iterate(rt);
        }
        self.stats
    }

    fn drain_midi<C, R, S, V>(&mut self, rt: &mut Runtime<C, R, S, V>) -> usize
    where
        C: EmulationCore,
    {
        let Some(rx) = rt.midi.as_mut() else {
            return 0;
        };

        let mut count = 0;
        while let Some(message) = rx.try_recv() {
            match self.link.handle(message, &mut rt.core) {
                LinkAction::Enabled => info!("MIDI start, link enabled"),
                LinkAction::Disabled => info!("MIDI stop, link disabled"),
                LinkAction::Ticked(_) | LinkAction::Ignored => {}
            }
            count += 1;
        }
        self.stats.midi_messages += count as u64;
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tone::ToneCore;
    use crate::wav::CaptureSink;
    use lp_audio::{AudioOut, LinearFactory};
    use lp_core::{ButtonMask, NullVideo, MAX_BATCH};
    use lp_timing::{VirtualClock, NOMINAL_FRAME_PERIOD_US};

    fn silent() -> ButtonMask {
        ButtonMask::NONE
    }

    fn capture_runtime(
    ) -> Runtime<ToneCore<fn() -> ButtonMask>, lp_audio::LinearResampler, CaptureSink, NullVideo>
    {
        let audio = AudioOut::new(&LinearFactory, CaptureSink::new(48_000), MAX_BATCH);
        Runtime::new(ToneCore::new(silent as fn() -> ButtonMask), audio, NullVideo)
    }

    #[test]
    fn presents_every_frame_on_nominal_cadence() {
        let clock = VirtualClock::new();
        let mut rt = capture_runtime();
        let mut lp = FrameLoop::new(&clock, 48_000, SkipSched::default(), LinkSync::default());

        let stats = lp.run_frames(&mut rt, 60);
        assert_eq!(stats.presented, 60);
        assert_eq!(stats.skipped, 0);
        assert_eq!(clock.now(), 60 * NOMINAL_FRAME_PERIOD_US);
        assert_eq!(lp.frame_time(), NOMINAL_FRAME_PERIOD_US);
    }

    #[test]
    fn first_iteration_matches_ring_accounting() {
        let clock = VirtualClock::new();
        let mut rt = capture_runtime();
        let mut lp = FrameLoop::new(&clock, 48_000, SkipSched::default(), LinkSync::default());

        let it = lp.iterate(&mut rt);
        assert!(it.batch.frame_done);
        assert_eq!(it.batch.ready, SAMPLES_PER_FRAME);
        assert_eq!(lp.pending_samples(), it.batch.leftover);
        assert!(lp.pending_samples() <= MAX_OVERPRODUCTION);
        assert_eq!(it.frame, FrameOutcome::Presented { late: 0 });
        assert!(!it.audio.low);

        let written = rt.audio.sink().frames().len() as i64;
        assert!((written - 803).abs() <= 1);
    }

    #[test]
    fn stats_interval_zero_disables_logging_but_counts() {
        let clock = VirtualClock::new();
        let mut rt = capture_runtime();
        let mut lp = FrameLoop::new(&clock, 48_000, SkipSched::default(), LinkSync::default())
            .with_stats_interval(0);
        for _ in 0..5 {
            lp.iterate(&mut rt);
        }
        assert_eq!(lp.stats().iterations, 5);
        assert_eq!(lp.stats_reports(), 0);
    }

    /// Completes a video frame on every second call.
    struct HalfFrames {
        done: bool,
    }

    impl EmulationCore for HalfFrames {
        fn run_for(
            &mut self,
            _: &mut VideoFrame,
            _: &mut [lp_core::Frame],
            _: usize,
        ) -> lp_core::StepResult {
            let half = SAMPLES_PER_FRAME / 2;
            self.done = !self.done;
            if self.done {
                lp_core::StepResult::FrameDone {
                    produced: half,
                    offset: half,
                }
            } else {
                lp_core::StepResult::Ran { produced: half }
            }
        }
    }

    #[test]
    fn stats_interval_counts_frames_not_iterations() {
        let clock = VirtualClock::new();
        let audio = AudioOut::new(&LinearFactory, CaptureSink::new(48_000), MAX_BATCH);
        let mut rt = Runtime::new(HalfFrames { done: false }, audio, NullVideo);
        let mut lp = FrameLoop::new(&clock, 48_000, SkipSched::default(), LinkSync::default())
            .with_stats_interval(2);

        for _ in 0..8 {
            lp.iterate(&mut rt);
        }
        assert_eq!(lp.stats().iterations, 8);
        assert_eq!(lp.stats().frames(), 4);
        assert_eq!(lp.stats_reports(), 2);
    }

    #[test]
    fn shared_stats_snapshot_matches() {
        let shared = SharedStats::default();
        let stats = LoopStats {
            iterations: 10,
            presented: 7,
            skipped: 3,
            midi_messages: 2,
            max_late: 40,
        };
        shared.publish(&stats);
        assert_eq!(shared.snapshot(), stats);
        assert_eq!(shared.snapshot().frames(), 10);
    }

    #[test]
    fn stop_flag_ends_run() {
        let clock = VirtualClock::new();
        let mut rt = capture_runtime();
        let mut lp = FrameLoop::new(&clock, 48_000, SkipSched::default(), LinkSync::default());
        let stop = AtomicBool::new(true);
        let stats = lp.run(&mut rt, &stop, &SharedStats::default());
        assert_eq!(stats.iterations, 0);
    }
}

//! CPAL-based audio sink.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Device, SampleFormat, SampleRate, Stream, StreamConfig};
use lp_core::Frame;
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, trace, warn};

use crate::rate_est::RateEstimator;
use crate::traits::{AudioError, AudioSink, SinkStatus};

/// Counters shared between the writer and the device callback.
#[derive(Default)]
struct Shared {
    /// Frames the callback had to zero-fill.
    underruns: AtomicU64,
    /// Latest consumption-rate estimate, 0 until settled.
    measured_rate: AtomicU32,
}

/// Output stream fed through a lock-free ring.
///
/// `write` never blocks: frames that do not fit are dropped and counted.
/// The reported rate is the measured consumption rate once a second of
/// callbacks has been observed, the opened rate before that.
pub struct CpalSink {
    _stream: Stream,
    producer: HeapProd<Frame>,
    shared: Arc<Shared>,
    rate: u32,
    overflows: u64,
    since_log: u64,
    logged_underruns: u64,
    logged_overflows: u64,
}

impl CpalSink {
    /// Open the default output device.
    ///
    /// The requested rate is used when the device offers it for stereo
    /// f32 output; otherwise the device default rate is taken. The ring
    /// holds `latency_ms` worth of frames and the device buffer is asked
    /// for a `periods`-th of that.
    pub fn open(rate: u32, latency_ms: u32, periods: u32) -> Result<Self, AudioError> {
        if rate == 0 || latency_ms == 0 || periods == 0 {
            return Err(AudioError::Unsupported(format!(
                "rate {} latency {} ms periods {}",
                rate, latency_ms, periods
            )));
        }

        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        let name = device.name().unwrap_or_else(|_| "<unnamed>".into());

        let sample_rate = find_sample_rate(&device, rate)?;
        let ring_len = (sample_rate as usize * latency_ms as usize / 1_000).max(periods as usize);
        let period = (ring_len / periods as usize) as u32;

        let shared = Arc::new(Shared::default());
        let mut config = StreamConfig {
            channels: 2,
            sample_rate: SampleRate(sample_rate),
            buffer_size: BufferSize::Fixed(period),
        };

        let (stream, producer) = match build_stream(&device, &config, ring_len, &shared) {
            Ok(built) => built,
            Err(e) => {
                warn!(period, "fixed buffer size rejected ({}), using device default", e);
                config.buffer_size = BufferSize::Default;
                build_stream(&device, &config, ring_len, &shared)?
            }
        };

        stream
            .play()
            .map_err(|e| AudioError::Playback(e.to_string()))?;

        info!(
            device = %name,
            requested = rate,
            negotiated = sample_rate,
            ring_len,
            "audio output opened"
        );

        Ok(Self {
            _stream: stream,
            producer,
            shared,
            rate: sample_rate,
            overflows: 0,
            since_log: 0,
            logged_underruns: 0,
            logged_overflows: 0,
        })
    }

    /// Frames the device callback has zero-filled so far.
    pub fn underruns(&self) -> u64 {
        self.shared.underruns.load(Ordering::Relaxed)
    }

    /// Frames dropped because the ring was full.
    pub fn overflows(&self) -> u64 {
        self.overflows
    }

    fn log_counters(&mut self, written: usize) {
        self.since_log += written as u64;
        if self.since_log < self.rate as u64 {
            return;
        }
        self.since_log = 0;

        let underruns = self.underruns();
        if underruns != self.logged_underruns || self.overflows != self.logged_overflows {
            debug!(
                underruns = underruns - self.logged_underruns,
                overflows = self.overflows - self.logged_overflows,
                "audio ring compensation"
            );
            self.logged_underruns = underruns;
            self.logged_overflows = self.overflows;
        }
    }
}

impl AudioSink for CpalSink {
    fn rate(&self) -> u32 {
        self.rate
    }

    fn write(&mut self, frames: &[Frame]) -> SinkStatus {
        let queued = self.producer.occupied_len();
        let vacant = self.producer.vacant_len();

        let pushed = self.producer.push_slice(frames);
        self.overflows += (frames.len() - pushed) as u64;
        self.log_counters(frames.len());

        let measured = self.shared.measured_rate.load(Ordering::Relaxed);
        SinkStatus {
            rate: if measured == 0 { self.rate } else { measured },
            from_underrun: queued as i64,
            from_overflow: vacant as i64,
        }
    }
}

fn build_stream(
    device: &Device,
    config: &StreamConfig,
    ring_len: usize,
    shared: &Arc<Shared>,
) -> Result<(Stream, HeapProd<Frame>), AudioError> {
    let (producer, mut consumer): (HeapProd<Frame>, HeapCons<Frame>) =
        HeapRb::<Frame>::new(ring_len).split();
    let channels = config.channels as usize;
    let shared = shared.clone();
    let mut estimator = RateEstimator::new(config.sample_rate.0);
    let mut last: Option<Instant> = None;

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let mut missing = 0u64;
                for chunk in data.chunks_mut(channels) {
                    match consumer.try_pop() {
                        Some(frame) => {
                            let left = frame.left as f32 / 32768.0;
                            let right = frame.right as f32 / 32768.0;
                            for (i, sample) in chunk.iter_mut().enumerate() {
                                *sample = match i {
                                    0 => left,
                                    1 => right,
                                    _ => 0.0,
                                };
                            }
                        }
                        None => {
                            chunk.fill(0.0);
                            missing += 1;
                        }
                    }
                }
                if missing > 0 {
                    shared.underruns.fetch_add(missing, Ordering::Relaxed);
                }

                let now = Instant::now();
                if let Some(prev) = last {
                    let usecs = now.duration_since(prev).as_micros() as u64;
                    let frames = (data.len() / channels) as u64;
                    if let Some(rate) = estimator.observe(frames, usecs) {
                        trace!(rate, "device rate estimate");
                        shared.measured_rate.store(rate, Ordering::Relaxed);
                    }
                }
                last = Some(now);
            },
            |err| error!("audio stream error: {}", err),
            None,
        )
        .map_err(|e| AudioError::StreamCreate(e.to_string()))?;

    Ok((stream, producer))
}

/// The requested rate if the device offers it for stereo f32, else the
/// device default.
fn find_sample_rate(device: &Device, requested: u32) -> Result<u32, AudioError> {
    let supported = device
        .supported_output_configs()
        .map_err(|e| AudioError::DeviceInit(e.to_string()))?;

    for range in supported {
        if range.channels() == 2
            && range.sample_format() == SampleFormat::F32
            && range.min_sample_rate().0 <= requested
            && range.max_sample_rate().0 >= requested
        {
            return Ok(requested);
        }
    }

    let default = device
        .default_output_config()
        .map_err(|e| AudioError::DeviceInit(e.to_string()))?;
    Ok(default.sample_rate().0)
}

/// Names of the output devices on the default host.
pub fn output_device_names() -> Result<Vec<String>, AudioError> {
    let host = cpal::default_host();
    let devices = host
        .output_devices()
        .map_err(|e| AudioError::DeviceInit(e.to_string()))?;
    Ok(devices
        .map(|d| d.name().unwrap_or_else(|_| "<unnamed>".into()))
        .collect())
}

//! Realtime producer/consumer pipeline.
//!
//! Two threads cooperate through a bounded hand-off channel:
//!
//! ## Producer
//!
//! Ticks at a fixed `frame_rate`. Every tick captures an [`AnimationState`],
//! asks the [`FrameSource`] for a frame and pushes it into the hand-off.
//! When the hand-off is full the producer waits (in short, cancellable
//! slices) until the consumer makes room. Frames are never dropped on the
//! producer side and the hand-off never grows.
//!
//! ## Consumer
//!
//! Runs on its own OS thread ("laser-output"), pinned to one core
//! (`output_core`, default the last one). It waits for the first frame,
//! then loops:
//!
//! 1. drain the hand-off, keeping only the newest frame
//! 2. hold off until `replay_ratio` of the last written frame's duration has
//!    elapsed, so a playing frame is never cut short
//! 3. poll every device and write the held frame to each ready one
//! 4. if nothing was written, sleep for `poll_interval` (longer, with bounded
//!    backoff, while devices report errors)
//!
//! Negative status codes are logged and counted; they never stop the loop.
//!
//! Both threads observe one [`CancellationToken`] at every wait. The consumer
//! exits without a final write; stopping and closing devices is left to the
//! caller, who gets the DAC back from [`PipelineHandle::join`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::io;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TryRecvError, TrySendError};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use core_affinity::CoreId;
use log::{debug, error, info, warn};

use crate::compile::{Compiler, Shape};
use crate::dac::{Dac, DeviceStatus};
use crate::error::{Error, Result};
use crate::types::Frame;

// =============================================================================
// Cancellation
// =============================================================================

/// Cooperative cancellation signal shared by the pipeline threads.
///
/// Cloning yields a handle to the same signal. Waits wake up immediately
/// when the token is cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

#[derive(Debug, Default)]
struct TokenInner {
    cancelled: Mutex<bool>,
    changed: Condvar,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the token and wakes every waiter.
    pub fn cancel(&self) {
        *self.lock() = true;
        self.inner.changed.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.lock()
    }

    /// Returns `Err(Error::Stopped)` once the token is cancelled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Stopped)
        } else {
            Ok(())
        }
    }

    /// Sleeps for up to `timeout`. Returns true if the token is cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.lock();
        let (guard, _) = self
            .inner
            .changed
            .wait_timeout_while(guard, timeout, |cancelled| !*cancelled)
            .unwrap_or_else(|e| e.into_inner());
        *guard
    }

    /// Sleeps until `deadline`. Returns true if the token is cancelled.
    pub fn wait_until(&self, deadline: Instant) -> bool {
        let now = Instant::now();
        if deadline <= now {
            return self.is_cancelled();
        }
        self.wait_timeout(deadline - now)
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        // A poisoned flag is still a valid bool
        self.inner
            .cancelled
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }
}

// =============================================================================
// State
// =============================================================================

/// Lifecycle of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PipelineState {
    /// Threads not started yet.
    Idle,
    /// Consumer is waiting for the producer's first frame.
    AwaitingFirstFrame,
    /// Consumer is polling devices and writing frames.
    Streaming,
    /// Consumer has exited.
    Stopped,
}

impl PipelineState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => PipelineState::Idle,
            1 => PipelineState::AwaitingFirstFrame,
            2 => PipelineState::Streaming,
            _ => PipelineState::Stopped,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            PipelineState::Idle => 0,
            PipelineState::AwaitingFirstFrame => 1,
            PipelineState::Streaming => 2,
            PipelineState::Stopped => 3,
        }
    }
}

#[derive(Debug, Clone)]
struct StateCell(Arc<AtomicU8>);

impl StateCell {
    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(PipelineState::Idle.as_u8())))
    }

    fn get(&self) -> PipelineState {
        PipelineState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: PipelineState) {
        self.0.store(state.as_u8(), Ordering::Release);
    }
}

/// Counters collected over a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputStats {
    /// Frames the producer pushed into the hand-off.
    pub frames_produced: u64,
    /// Successful device writes (one per device per write).
    pub frames_written: u64,
    /// Frames replaced by a newer one before they were ever written.
    pub frames_skipped: u64,
    /// Negative status codes reported by devices.
    pub device_errors: u64,
    /// Failed write calls.
    pub write_errors: u64,
    /// Polls that found a device busy.
    pub busy_polls: u64,
}

// =============================================================================
// Frame Sources
// =============================================================================

/// Animation parameters captured once per producer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationState {
    /// Tick counter, starting at 0.
    pub tick: u64,
    /// Wall-clock time since the producer started.
    pub elapsed: Duration,
}

/// Produces one frame per producer tick.
///
/// Implemented for closures `FnMut(&AnimationState) -> Result<Frame>`.
pub trait FrameSource: Send + 'static {
    fn next_frame(&mut self, state: &AnimationState) -> Result<Frame>;
}

impl<F> FrameSource for F
where
    F: FnMut(&AnimationState) -> Result<Frame> + Send + 'static,
{
    fn next_frame(&mut self, state: &AnimationState) -> Result<Frame> {
        self(state)
    }
}

/// Repeats one precompiled frame.
#[derive(Debug, Clone)]
pub struct StaticFrame(pub Frame);

impl FrameSource for StaticFrame {
    fn next_frame(&mut self, _state: &AnimationState) -> Result<Frame> {
        Ok(self.0.clone())
    }
}

/// Maps each tick's state to a [`Shape`] and compiles it.
pub struct ShapeAnimation<F> {
    compiler: Compiler,
    point_budget: usize,
    pps: u32,
    shape_at: F,
}

impl<F> ShapeAnimation<F>
where
    F: FnMut(&AnimationState) -> Shape + Send + 'static,
{
    pub fn new(compiler: Compiler, point_budget: usize, pps: u32, shape_at: F) -> Self {
        Self {
            compiler,
            point_budget,
            pps,
            shape_at,
        }
    }
}

impl<F> FrameSource for ShapeAnimation<F>
where
    F: FnMut(&AnimationState) -> Shape + Send + 'static,
{
    fn next_frame(&mut self, state: &AnimationState) -> Result<Frame> {
        let shape = (self.shape_at)(state);
        self.compiler.compile(&shape, self.point_budget, self.pps)
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Timing policy for the pipeline threads.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PipelineConfig {
    /// Producer ticks per second.
    pub frame_rate: u32,
    /// Capacity of the hand-off channel (at least 2).
    pub handoff_capacity: usize,
    /// Consumer yield when no device accepted a frame; also the longest
    /// single wait of either thread.
    pub poll_interval: Duration,
    /// Minimum spacing between writes as a share of the last written
    /// frame's duration.
    pub replay_ratio: f64,
    /// Upper bound of the backoff while devices keep reporting errors.
    pub max_error_backoff: Duration,
    /// Index into the host's core list for the output thread. `None`
    /// picks the last reported core.
    pub output_core: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frame_rate: 30,
            handoff_capacity: 2,
            poll_interval: Duration::from_millis(1),
            replay_ratio: 0.9,
            max_error_backoff: Duration::from_millis(50),
            output_core: None,
        }
    }
}

impl PipelineConfig {
    /// Set the producer tick rate (builder pattern).
    pub fn with_frame_rate(mut self, frame_rate: u32) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    /// Set the hand-off capacity (builder pattern).
    pub fn with_handoff_capacity(mut self, capacity: usize) -> Self {
        self.handoff_capacity = capacity;
        self
    }

    /// Set the consumer poll interval (builder pattern).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the replay ratio (builder pattern).
    pub fn with_replay_ratio(mut self, ratio: f64) -> Self {
        self.replay_ratio = ratio;
        self
    }

    /// Set the maximum error backoff (builder pattern).
    pub fn with_max_error_backoff(mut self, backoff: Duration) -> Self {
        self.max_error_backoff = backoff;
        self
    }

    /// Pin the output thread to the given core index (builder pattern).
    pub fn with_output_core(mut self, core: Option<usize>) -> Self {
        self.output_core = core;
        self
    }

    /// Interval between producer ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.frame_rate == 0 {
            return Err(Error::invalid_config("frame_rate must be greater than 0"));
        }
        if self.handoff_capacity < 2 {
            return Err(Error::invalid_config(format!(
                "handoff_capacity must be at least 2, got {}",
                self.handoff_capacity
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(Error::invalid_config("poll_interval must be non-zero"));
        }
        if !(self.replay_ratio > 0.0 && self.replay_ratio <= 1.0) {
            return Err(Error::invalid_config(format!(
                "replay_ratio must be within (0, 1], got {}",
                self.replay_ratio
            )));
        }
        if self.max_error_backoff < self.poll_interval {
            return Err(Error::invalid_config(
                "max_error_backoff must not be shorter than poll_interval",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// A validated pipeline, ready to start.
pub struct Pipeline<D: Dac> {
    dac: D,
    config: PipelineConfig,
}

impl<D: Dac> Pipeline<D> {
    /// Validates `config` and checks that the DAC has at least one device.
    pub fn new(dac: D, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        if dac.device_count() == 0 {
            return Err(Error::NoDevices);
        }
        Ok(Self { dac, config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Spawns the producer and consumer threads.
    pub fn start<S: FrameSource>(self, source: S) -> Result<PipelineHandle<D>> {
        let token = CancellationToken::new();
        let state = StateCell::new();
        let (tx, rx) = mpsc::sync_channel::<Frame>(self.config.handoff_capacity);

        let producer = Producer {
            source,
            tx,
            token: token.clone(),
            interval: self.config.tick_interval(),
            retry: self.config.poll_interval,
        };
        let producer_handle = thread::Builder::new()
            .name("laser-producer".into())
            .spawn(move || producer.run())?;

        let consumer = Consumer {
            dac: self.dac,
            rx,
            token: token.clone(),
            state: state.clone(),
            config: self.config,
            stats: OutputStats::default(),
        };
        let consumer_handle = match thread::Builder::new()
            .name("laser-output".into())
            .spawn(move || consumer.run())
        {
            Ok(handle) => handle,
            Err(e) => {
                token.cancel();
                let _ = producer_handle.join();
                return Err(e.into());
            }
        };

        Ok(PipelineHandle {
            token,
            state,
            producer: Some(producer_handle),
            consumer: Some(consumer_handle),
        })
    }
}

/// Handle to a running pipeline.
///
/// Dropping the handle cancels the pipeline without waiting for it.
pub struct PipelineHandle<D: Dac> {
    token: CancellationToken,
    state: StateCell,
    producer: Option<JoinHandle<u64>>,
    consumer: Option<JoinHandle<(D, OutputStats)>>,
}

impl<D: Dac> PipelineHandle<D> {
    /// Signals both threads to stop (non-blocking).
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// A clone of the pipeline's cancellation token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn state(&self) -> PipelineState {
        self.state.get()
    }

    /// True once both threads have exited.
    pub fn is_finished(&self) -> bool {
        let done = |h: Option<bool>| h.unwrap_or(true);
        done(self.producer.as_ref().map(JoinHandle::is_finished))
            && done(self.consumer.as_ref().map(JoinHandle::is_finished))
    }

    /// Waits for both threads and returns the DAC with the run statistics.
    ///
    /// Blocks until the pipeline is cancelled; see [`stop`](Self::stop).
    pub fn join(mut self) -> Result<(D, OutputStats)> {
        let produced = self.producer.take().map(JoinHandle::join);
        if !matches!(produced, Some(Ok(_))) {
            // The consumer would otherwise wait forever on a dead producer
            self.token.cancel();
        }
        let consumed = self.consumer.take().map(JoinHandle::join);

        let produced = match produced {
            Some(Ok(n)) => n,
            _ => return Err(Error::WorkerPanicked("producer")),
        };
        match consumed {
            Some(Ok((dac, mut stats))) => {
                stats.frames_produced = produced;
                Ok((dac, stats))
            }
            _ => Err(Error::WorkerPanicked("consumer")),
        }
    }

    /// Cancels the pipeline and waits for it.
    pub fn stop(self) -> Result<(D, OutputStats)> {
        self.cancel();
        self.join()
    }
}

impl<D: Dac> Drop for PipelineHandle<D> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

// =============================================================================
// Producer
// =============================================================================

struct Producer<S> {
    source: S,
    tx: SyncSender<Frame>,
    token: CancellationToken,
    interval: Duration,
    retry: Duration,
}

impl<S: FrameSource> Producer<S> {
    fn run(mut self) -> u64 {
        debug!("producer started, tick interval {:?}", self.interval);
        let start = Instant::now();
        let mut next_tick = start;
        let mut tick = 0u64;
        let mut produced = 0u64;

        while !self.token.wait_until(next_tick) {
            let state = AnimationState {
                tick,
                elapsed: start.elapsed(),
            };
            tick += 1;

            match self.source.next_frame(&state) {
                Ok(frame) if frame.is_empty() || frame.pps == 0 => {
                    warn!(
                        "tick {}: source returned an unusable frame \
                         ({} points at {} pps), skipping",
                        state.tick,
                        frame.len(),
                        frame.pps
                    );
                }
                Ok(frame) => match self.send(frame) {
                    Ok(()) => produced += 1,
                    Err(e) => {
                        debug!("producer exiting: {}", e);
                        break;
                    }
                },
                Err(e) => warn!("tick {}: frame generation failed: {}", state.tick, e),
            }

            next_tick += self.interval;
            let now = Instant::now();
            if next_tick < now {
                // Behind schedule: resync instead of bursting to catch up
                next_tick = now;
            }
        }

        debug!("producer stopped after {} frames", produced);
        produced
    }

    /// Pushes `frame`, waiting while the hand-off is full.
    fn send(&self, mut frame: Frame) -> Result<()> {
        loop {
            match self.tx.try_send(frame) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Full(f)) => {
                    frame = f;
                    if self.token.wait_timeout(self.retry) {
                        return Err(Error::Stopped);
                    }
                }
                Err(TrySendError::Disconnected(_)) => {
                    return Err(Error::backend(io::Error::new(
                        io::ErrorKind::BrokenPipe,
                        "output thread hung up",
                    )));
                }
            }
        }
    }
}

// =============================================================================
// Consumer
// =============================================================================

/// The frame currently held for output.
struct Held {
    frame: Frame,
    written: bool,
}

struct LastWrite {
    at: Instant,
    duration: Duration,
}

struct Consumer<D> {
    dac: D,
    rx: Receiver<Frame>,
    token: CancellationToken,
    state: StateCell,
    config: PipelineConfig,
    stats: OutputStats,
}

impl<D: Dac> Consumer<D> {
    fn run(mut self) -> (D, OutputStats) {
        pin_output_thread(self.config.output_core);
        self.state.set(PipelineState::AwaitingFirstFrame);

        if let Some(frame) = self.await_first_frame() {
            info!(
                "streaming {}-point frames to {} device(s)",
                frame.len(),
                self.dac.device_count()
            );
            self.state.set(PipelineState::Streaming);
            self.stream(Held {
                frame,
                written: false,
            });
        }

        self.state.set(PipelineState::Stopped);
        info!(
            "output stopped: {} writes, {} skipped frames, {} device errors",
            self.stats.frames_written, self.stats.frames_skipped, self.stats.device_errors
        );
        (self.dac, self.stats)
    }

    fn await_first_frame(&mut self) -> Option<Frame> {
        loop {
            if self.token.is_cancelled() {
                return None;
            }
            match self.rx.recv_timeout(self.config.poll_interval) {
                Ok(frame) => return Some(frame),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("producer exited before the first frame");
                    return None;
                }
            }
        }
    }

    fn stream(&mut self, mut held: Held) {
        let mut last_write: Option<LastWrite> = None;
        let mut error_streak = 0u32;

        while !self.token.is_cancelled() {
            self.drain_latest(&mut held);

            if let Some(last) = &last_write {
                let min_interval = last.duration.mul_f64(self.config.replay_ratio);
                let since = last.at.elapsed();
                if since < min_interval {
                    let wait = (min_interval - since).min(self.config.poll_interval);
                    self.token.wait_timeout(wait);
                    continue;
                }
            }

            let (written, errors) = self.write_to_ready(&held.frame);
            if written {
                held.written = true;
                last_write = Some(LastWrite {
                    at: Instant::now(),
                    duration: held.frame.duration(),
                });
                error_streak = 0;
                continue;
            }

            let wait = if errors > 0 {
                error_streak = error_streak.saturating_add(1);
                self.error_backoff(error_streak)
            } else {
                error_streak = 0;
                self.config.poll_interval
            };
            self.token.wait_timeout(wait);
        }
    }

    /// Replaces the held frame with the newest queued one.
    fn drain_latest(&mut self, held: &mut Held) {
        loop {
            match self.rx.try_recv() {
                Ok(frame) => {
                    if !held.written {
                        self.stats.frames_skipped += 1;
                    }
                    held.frame = frame;
                    held.written = false;
                }
                // A vanished producer leaves the last frame on hold
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return,
            }
        }
    }

    /// Polls every device and writes `frame` to each ready one.
    ///
    /// Returns whether any write succeeded and how many devices reported
    /// errors.
    fn write_to_ready(&mut self, frame: &Frame) -> (bool, u32) {
        let mut written = false;
        let mut errors = 0;

        for device in 0..self.dac.device_count() {
            if self.token.is_cancelled() {
                break;
            }
            match self.dac.status(device) {
                DeviceStatus::Ready => match self.dac.write_frame(device, frame) {
                    Ok(()) => {
                        self.stats.frames_written += 1;
                        written = true;
                    }
                    Err(e) => {
                        self.stats.write_errors += 1;
                        warn!("device {}: write failed: {}", device, e);
                    }
                },
                DeviceStatus::Busy => self.stats.busy_polls += 1,
                DeviceStatus::Error(code) => {
                    self.stats.device_errors += 1;
                    errors += 1;
                    error!("{}", Error::Device { device, code });
                }
            }
        }

        (written, errors)
    }

    fn error_backoff(&self, streak: u32) -> Duration {
        let factor = 1u32 << streak.saturating_sub(1).min(16);
        self.config
            .poll_interval
            .checked_mul(factor)
            .map_or(self.config.max_error_backoff, |d| {
                d.min(self.config.max_error_backoff)
            })
    }
}

/// Pins the calling thread to one core so the scheduler cannot migrate it.
///
/// Failure only costs jitter, so it is logged and output continues.
fn pin_output_thread(requested: Option<usize>) {
    let Some(cores) = core_affinity::get_core_ids() else {
        warn!("cannot query CPU cores, output thread left unpinned");
        return;
    };
    match select_core(&cores, requested) {
        Some(core) if core_affinity::set_for_current(core) => {
            debug!("output thread pinned to core {}", core.id);
        }
        Some(core) => warn!("failed to pin output thread to core {}", core.id),
        None => warn!(
            "core {:?} not available ({} cores), output thread left unpinned",
            requested,
            cores.len()
        ),
    }
}

fn select_core(cores: &[CoreId], requested: Option<usize>) -> Option<CoreId> {
    match requested {
        Some(index) => cores.get(index).copied(),
        None => cores.last().copied(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Color, Position, Sample};

    struct NoDevices;

    impl Dac for NoDevices {
        fn device_count(&self) -> usize {
            0
        }

        fn status(&mut self, _device: usize) -> DeviceStatus {
            DeviceStatus::Busy
        }

        fn write_frame(&mut self, _device: usize, _frame: &Frame) -> Result<()> {
            Ok(())
        }
    }

    fn state(tick: u64) -> AnimationState {
        AnimationState {
            tick,
            elapsed: Duration::from_millis(tick * 33),
        }
    }

    // ==========================================================================
    // CancellationToken Tests
    // ==========================================================================

    #[test]
    fn test_token_wait_times_out_when_not_cancelled() {
        let token = CancellationToken::new();
        let start = Instant::now();
        assert!(!token.wait_timeout(Duration::from_millis(5)));
        assert!(start.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn test_token_cancel_wakes_waiter() {
        let token = CancellationToken::new();
        let waiter = token.clone();
        let handle = thread::spawn(move || {
            let start = Instant::now();
            let cancelled = waiter.wait_timeout(Duration::from_secs(10));
            (cancelled, start.elapsed())
        });
        thread::sleep(Duration::from_millis(10));
        token.cancel();
        let (cancelled, waited) = handle.join().unwrap();
        assert!(cancelled);
        assert!(waited < Duration::from_secs(5));
    }

    #[test]
    fn test_token_wait_until_past_deadline_returns_immediately() {
        let token = CancellationToken::new();
        assert!(!token.wait_until(Instant::now()));
        assert!(token.check().is_ok());
        token.cancel();
        assert!(token.check().unwrap_err().is_stopped());
        assert!(token.wait_until(Instant::now() + Duration::from_secs(10)));
    }

    // ==========================================================================
    // Config Tests
    // ==========================================================================

    #[test]
    fn test_pipeline_config_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.handoff_capacity, 2);
        assert_eq!(config.replay_ratio, 0.9);
        assert_eq!(config.output_core, None);
        assert_eq!(
            config.clone().with_output_core(Some(2)).output_core,
            Some(2)
        );
        assert_eq!(
            config.with_frame_rate(50).tick_interval(),
            Duration::from_millis(20)
        );
    }

    #[test]
    fn test_pipeline_config_rejects_bad_values() {
        let base = PipelineConfig::default();
        assert!(base.clone().with_handoff_capacity(1).validate().is_err());
        assert!(base.clone().with_frame_rate(0).validate().is_err());
        assert!(base.clone().with_replay_ratio(0.0).validate().is_err());
        assert!(base.clone().with_replay_ratio(1.5).validate().is_err());
        assert!(base.clone().with_poll_interval(Duration::ZERO).validate().is_err());
        assert!(base
            .with_max_error_backoff(Duration::from_micros(10))
            .validate()
            .is_err());
    }

    #[test]
    fn test_pipeline_refuses_zero_devices() {
        match Pipeline::new(NoDevices, PipelineConfig::default()) {
            Err(Error::NoDevices) => {}
            Err(e) => panic!("expected NoDevices, got {}", e),
            Ok(_) => panic!("expected NoDevices"),
        }
    }

    #[test]
    fn test_state_cell_roundtrip() {
        let cell = StateCell::new();
        assert_eq!(cell.get(), PipelineState::Idle);
        for s in [
            PipelineState::AwaitingFirstFrame,
            PipelineState::Streaming,
            PipelineState::Stopped,
        ] {
            cell.set(s);
            assert_eq!(cell.get(), s);
        }
    }

    #[test]
    fn test_error_backoff_doubles_up_to_cap() {
        let (_tx, rx) = mpsc::sync_channel(2);
        let consumer = Consumer {
            dac: NoDevices,
            rx,
            token: CancellationToken::new(),
            state: StateCell::new(),
            config: PipelineConfig::default(),
            stats: OutputStats::default(),
        };
        let ms = Duration::from_millis;
        assert_eq!(consumer.error_backoff(1), ms(1));
        assert_eq!(consumer.error_backoff(2), ms(2));
        assert_eq!(consumer.error_backoff(4), ms(8));
        assert_eq!(consumer.error_backoff(7), ms(50));
        assert_eq!(consumer.error_backoff(u32::MAX), ms(50));
    }

    #[test]
    fn test_select_core() {
        let cores: Vec<CoreId> = (0..4).map(|id| CoreId { id }).collect();
        let id = |c: Option<CoreId>| c.map(|c| c.id);
        assert_eq!(id(select_core(&cores, None)), Some(3));
        assert_eq!(id(select_core(&cores, Some(1))), Some(1));
        assert_eq!(id(select_core(&cores, Some(4))), None);
        assert_eq!(id(select_core(&[], None)), None);
    }

    #[test]
    fn test_pinning_to_missing_core_does_not_panic() {
        pin_output_thread(Some(usize::MAX));
    }

    // ==========================================================================
    // FrameSource Tests
    // ==========================================================================

    #[test]
    fn test_static_frame_repeats() {
        let frame = Frame::new(30_000, vec![Sample::default(); 3]);
        let mut source = StaticFrame(frame.clone());
        assert_eq!(source.next_frame(&state(0)).unwrap(), frame);
        assert_eq!(source.next_frame(&state(1)).unwrap(), frame);
    }

    #[test]
    fn test_closure_is_a_frame_source() {
        let mut source = |s: &AnimationState| -> Result<Frame> {
            Ok(Frame::new(30_000, vec![Sample::default(); s.tick as usize + 1]))
        };
        assert_eq!(FrameSource::next_frame(&mut source, &state(4)).unwrap().len(), 5);
    }

    #[test]
    fn test_shape_animation_compiles_each_tick() {
        let mut source = ShapeAnimation::new(Compiler::default(), 750, 50_000, |s| {
            let x = 1000.0 + s.tick as f64 * 100.0;
            Shape::dot(Position::new(x, 2048.0), 50.0, Color::WHITE)
        });
        let a = source.next_frame(&state(0)).unwrap();
        let b = source.next_frame(&state(1)).unwrap();
        assert_ne!(a, b);
        assert!(a.len() >= 2000);
        assert_eq!(a.pps, 50_000);
    }

    #[test]
    fn test_shape_animation_surfaces_compile_errors() {
        let mut source = ShapeAnimation::new(Compiler::default(), 5, 50_000, |_| {
            Shape::dot(Position::new(2048.0, 2048.0), 50.0, Color::WHITE)
        });
        assert!(source.next_frame(&state(0)).unwrap_err().is_budget_exhausted());
    }
}

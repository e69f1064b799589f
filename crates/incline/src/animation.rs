//! Frame-driven animation of balls rolling down ramps.
//!
//! Every launched ramp gets a [`Track`]. All tracks of one launch share a
//! single clock: each scheduler tick samples the elapsed time once and
//! moves every unfinished ball forward. Reported numbers are computed before
//! the first frame, so frame jitter only affects smoothness, never results.
//!
//! # Example
//!
//! ```rust
//! use incline::{AnimationSession, Config, RampRegistry, PlaneDimensions};
//! use std::time::Duration;
//!
//! let registry = RampRegistry::with_defaults(PlaneDimensions::default());
//! let mut session = AnimationSession::new(registry.ramps(), 0.1, &Config::default());
//!
//! // Jump far past every duration: all balls land.
//! let frame = session.advance_to(Duration::from_secs(60));
//! assert!(session.is_finished());
//! assert_eq!(frame.balls.len(), 4);
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::{Config, MAX_FPS};
use crate::error::{BusyReason, Error, Result};
use crate::geometry::{ArcLengthTable, CubicBezier, Point, RampPath};
use crate::physics::{Kinematics, RunResult};

/// Returns a time delta (seconds) for a given number of frames per second.
///
/// ```rust
/// use incline::fps;
///
/// assert_eq!(fps(50), 0.02);
/// ```
#[inline]
pub fn fps(n: u32) -> f64 {
    1.0 / f64::from(n.max(1))
}

/// Maps linear progress to eased progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// No easing.
    Linear,
    /// Quadratic ease-in: slow start, accelerating like a released ball.
    #[default]
    QuadIn,
}

impl Easing {
    /// Evaluates the easing at `t`, clamped to `[0, 1]`.
    #[inline]
    pub fn apply(self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Self::Linear => t,
            Self::QuadIn => t * t,
        }
    }
}

/// How eased progress selects a point on the curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pacing {
    /// Eased progress is the Bézier parameter.
    #[default]
    Parametric,
    /// Eased progress is the fraction of arc length travelled.
    ArcLength,
}

/// One sample of a traversal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Eased progress in `[0, 1]`.
    pub t: f64,
    /// Ball position in plane coordinates.
    pub point: Point,
}

/// A ball's trip along one ramp.
///
/// As an [`Iterator`] it yields one [`Sample`] per frame at a fixed frame
/// interval, from `t = 0` up to and including `t = 1`, then stops. The
/// sequence is lazy and can be replayed with [`Traversal::restart`].
/// [`Traversal::sample_at`] samples against a wall clock instead.
///
/// ```rust
/// use incline::{fps, Point, RampPath, RampPoints, Traversal};
///
/// let ramp = RampPath::new(
///     "r",
///     "red",
///     RampPoints::new(
///         Point::new(0.0, 100.0),
///         Point::new(30.0, 60.0),
///         Point::new(60.0, 30.0),
///         Point::new(100.0, 0.0),
///     ),
/// );
/// let samples: Vec<_> = Traversal::new(&ramp, 1.0, fps(10)).collect();
/// assert_eq!(samples.len(), 11);
/// assert_eq!(samples.last().unwrap().point, ramp.points.end);
/// ```
#[derive(Debug, Clone)]
pub struct Traversal {
    curve: CubicBezier,
    table: Option<ArcLengthTable>,
    duration: f64,
    frame: f64,
    easing: Easing,
    next_frame: u64,
    done: bool,
}

impl Traversal {
    /// Creates a quadratic ease-in traversal lasting `duration` seconds,
    /// stepped every `frame_interval` seconds.
    pub fn new(ramp: &RampPath, duration: f64, frame_interval: f64) -> Self {
        let frame = if frame_interval.is_finite() && frame_interval > 0.0 {
            frame_interval
        } else {
            fps(crate::config::DEFAULT_FPS)
        };
        Self {
            curve: ramp.curve(),
            table: None,
            duration: if duration.is_finite() { duration.max(0.0) } else { 0.0 },
            frame,
            easing: Easing::QuadIn,
            next_frame: 0,
            done: false,
        }
    }

    /// Sets the easing.
    #[must_use]
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Sets the pacing; `segments` is the arc length table resolution.
    #[must_use]
    pub fn with_pacing(mut self, pacing: Pacing, segments: usize) -> Self {
        self.table = match pacing {
            Pacing::Parametric => None,
            Pacing::ArcLength => Some(ArcLengthTable::new(self.curve, segments)),
        };
        self
    }

    /// Traversal length in seconds.
    #[inline]
    pub const fn duration(&self) -> f64 {
        self.duration
    }

    /// Number of samples the iterator yields in total.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn frame_count(&self) -> u64 {
        if self.duration <= 0.0 {
            return 1;
        }
        // Index of the first frame whose progress reaches 1, using the same
        // test as `next`. The estimate can be off by one after rounding.
        let reaches_end = |k: u64| self.linear_progress(k as f64 * self.frame) >= 1.0;
        let mut last = (self.duration / self.frame).ceil() as u64;
        while last > 0 && reaches_end(last - 1) {
            last -= 1;
        }
        while !reaches_end(last) {
            last += 1;
        }
        last + 1
    }

    /// Linear progress after `elapsed_secs`, in `[0, 1]`.
    pub fn linear_progress(&self, elapsed_secs: f64) -> f64 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        let p = elapsed_secs / self.duration;
        if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
    }

    /// Samples the traversal after `elapsed` wall-clock time.
    pub fn sample_at(&self, elapsed: Duration) -> Sample {
        self.sample_linear(self.linear_progress(elapsed.as_secs_f64()))
    }

    /// Samples the traversal at a linear progress value.
    pub fn sample_linear(&self, linear: f64) -> Sample {
        let t = self.easing.apply(linear);
        let point = match &self.table {
            Some(table) => table.point_at_length(t * table.length()),
            None => self.curve.point_at(t),
        };
        Sample { t, point }
    }

    /// Rewinds the iterator to the first frame.
    pub fn restart(&mut self) {
        self.next_frame = 0;
        self.done = false;
    }
}

impl Iterator for Traversal {
    type Item = Sample;

    #[allow(clippy::cast_precision_loss)]
    fn next(&mut self) -> Option<Sample> {
        if self.done {
            return None;
        }
        let linear = self.linear_progress(self.next_frame as f64 * self.frame);
        if linear >= 1.0 {
            self.done = true;
        }
        self.next_frame += 1;
        Some(self.sample_linear(linear))
    }
}

/// Lifecycle of one ball within a launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    /// No frame has been sampled yet.
    Idle,
    /// The ball is on the ramp.
    Running,
    /// The ball reached the end.
    Completed,
}

/// Per-ramp state of an [`AnimationSession`].
#[derive(Debug, Clone)]
pub struct Track {
    ramp_id: String,
    kinematics: Kinematics,
    traversal: Traversal,
    progress: f64,
    sample: Sample,
    state: TrackState,
}

impl Track {
    fn new(ramp: &RampPath, speed_factor: f64, config: &Config) -> Self {
        let kinematics = Kinematics::compute(
            ramp,
            config.gravity,
            speed_factor,
            config.arc_length_segments,
            config.fallback_duration_secs,
        );
        let traversal = Traversal::new(ramp, kinematics.duration, fps(config.fps))
            .with_easing(config.easing)
            .with_pacing(config.pacing, config.arc_length_segments);
        Self {
            ramp_id: ramp.id.clone(),
            kinematics,
            traversal,
            progress: 0.0,
            sample: Sample {
                t: 0.0,
                point: ramp.points.start,
            },
            state: TrackState::Idle,
        }
    }

    /// Id of the ramp this track animates.
    pub fn ramp_id(&self) -> &str {
        &self.ramp_id
    }

    /// Precomputed arc length, velocity and duration.
    pub const fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    /// Linear progress (elapsed / duration).
    pub const fn progress(&self) -> f64 {
        self.progress
    }

    /// Latest sample.
    pub const fn sample(&self) -> Sample {
        self.sample
    }

    /// Current state.
    pub const fn state(&self) -> TrackState {
        self.state
    }

    /// Moves the ball to `elapsed`. Progress never goes backwards.
    /// Returns true when this call completed the track.
    fn advance_to(&mut self, elapsed: Duration) -> bool {
        if self.state == TrackState::Completed {
            return false;
        }
        let linear = self
            .traversal
            .linear_progress(elapsed.as_secs_f64())
            .max(self.progress);
        self.progress = linear;
        self.sample = self.traversal.sample_linear(linear);
        if linear >= 1.0 {
            self.state = TrackState::Completed;
            true
        } else {
            self.state = TrackState::Running;
            false
        }
    }

    fn ball(&self, index: usize) -> BallPosition {
        BallPosition {
            index,
            ramp_id: self.ramp_id.clone(),
            t: self.sample.t,
            point: self.sample.point,
            state: self.state,
        }
    }
}

/// Where one ball is on a given frame.
#[derive(Debug, Clone, PartialEq)]
pub struct BallPosition {
    /// Position of the ramp in the launched batch.
    pub index: usize,
    /// Ramp id.
    pub ramp_id: String,
    /// Eased progress.
    pub t: f64,
    /// Plane coordinates.
    pub point: Point,
    /// Track state after this frame.
    pub state: TrackState,
}

/// Everything the render surface needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Time since the launch started.
    pub elapsed: Duration,
    /// One entry per launched ramp, in launch order.
    pub balls: Vec<BallPosition>,
}

/// The per-launch set of tracks.
#[derive(Debug, Clone)]
pub struct AnimationSession {
    tracks: Vec<Track>,
}

impl AnimationSession {
    /// Precomputes kinematics for every ramp.
    pub fn new(ramps: &[RampPath], speed_factor: f64, config: &Config) -> Self {
        Self {
            tracks: ramps
                .iter()
                .map(|ramp| Track::new(ramp, speed_factor, config))
                .collect(),
        }
    }

    /// Tracks in launch order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Number of tracks.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// True when nothing was launched.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// True once every track completed. An empty session is finished.
    pub fn is_finished(&self) -> bool {
        self.tracks.iter().all(|t| t.state == TrackState::Completed)
    }

    /// Longest duration among the tracks, in seconds.
    pub fn longest_duration(&self) -> f64 {
        self.tracks
            .iter()
            .map(|t| t.kinematics.duration)
            .fold(0.0, f64::max)
    }

    /// Advances every unfinished track to `elapsed` on the shared clock.
    pub fn advance_to(&mut self, elapsed: Duration) -> Frame {
        for track in &mut self.tracks {
            if track.advance_to(elapsed) {
                debug!(
                    ramp_id = %track.ramp_id,
                    duration = track.kinematics.duration,
                    terminal_velocity = track.kinematics.terminal_velocity,
                    "Track completed"
                );
            }
        }
        self.frame(elapsed)
    }

    fn frame(&self, elapsed: Duration) -> Frame {
        Frame {
            elapsed,
            balls: self
                .tracks
                .iter()
                .enumerate()
                .map(|(i, t)| t.ball(i))
                .collect(),
        }
    }

    /// Results in launch order, independent of completion order.
    pub fn results(&self) -> Vec<RunResult> {
        self.tracks.iter().map(|t| t.kinematics.result()).collect()
    }
}

/// How a launch ended.
#[derive(Debug, Clone, PartialEq)]
pub enum LaunchOutcome {
    /// Every ball landed; results are in launch order.
    Completed(Vec<RunResult>),
    /// [`Scheduler::cancel`] was called before every ball landed.
    Cancelled,
}

impl LaunchOutcome {
    /// The results, or `None` when cancelled.
    pub fn into_results(self) -> Option<Vec<RunResult>> {
        match self {
            Self::Completed(results) => Some(results),
            Self::Cancelled => None,
        }
    }

    /// True for [`LaunchOutcome::Cancelled`].
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[derive(Debug, Default)]
struct Shared {
    running: AtomicBool,
    generation: AtomicU64,
}

/// Releases the scheduler when a launch ends or is dropped.
#[derive(Debug)]
struct RunningGuard {
    shared: Arc<Shared>,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
    }
}

/// Starts launches and tracks whether one is in flight.
///
/// Cloning yields another handle to the same scheduler, so a clone can
/// cancel a launch that is being awaited elsewhere.
#[derive(Debug, Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
    config: Config,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Scheduler {
    /// Creates an idle scheduler.
    pub fn new(config: Config) -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            config,
        }
    }

    /// The configuration launches are computed with.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// True while a [`Launch`] is alive.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Current cancellation generation.
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::SeqCst)
    }

    /// Prepares a launch of `ramps`.
    ///
    /// Kinematics are computed here, before any frame is drawn.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Busy`] while another launch is alive.
    pub fn launch(&self, ramps: &[RampPath], speed_factor: f64) -> Result<Launch> {
        if self
            .shared
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Launch rejected, scheduler busy");
            return Err(Error::Busy(BusyReason::Animating));
        }
        let guard = RunningGuard {
            shared: Arc::clone(&self.shared),
        };

        let session = AnimationSession::new(ramps, speed_factor, &self.config);
        let generation = self.generation();
        info!(
            ramps = session.len(),
            speed_factor,
            longest_secs = session.longest_duration(),
            generation,
            "Launch started"
        );

        Ok(Launch {
            session,
            generation,
            frame_interval: Duration::from_secs_f64(fps(self.config.fps.clamp(1, MAX_FPS))),
            guard,
        })
    }

    /// Launches `ramps` and waits for every ball to land.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Busy`] while another launch is alive.
    pub async fn run(&self, ramps: &[RampPath], speed_factor: f64) -> Result<LaunchOutcome> {
        Ok(self.launch(ramps, speed_factor)?.run().await)
    }

    /// Cancels the launch in flight, if any.
    ///
    /// The launch notices on its next frame and resolves to
    /// [`LaunchOutcome::Cancelled`] without emitting results.
    pub fn cancel(&self) {
        let previous = self.shared.generation.fetch_add(1, Ordering::SeqCst);
        debug!(generation = previous.wrapping_add(1), "Launch cancellation requested");
    }
}

/// A launch that has been prepared but not yet driven to completion.
///
/// The scheduler stays busy until this value is dropped.
#[derive(Debug)]
pub struct Launch {
    session: AnimationSession,
    generation: u64,
    frame_interval: Duration,
    guard: RunningGuard,
}

impl Launch {
    /// The session being animated.
    pub const fn session(&self) -> &AnimationSession {
        &self.session
    }

    /// Results the launch will report on completion.
    pub fn expected_results(&self) -> Vec<RunResult> {
        self.session.results()
    }

    fn is_cancelled(&self) -> bool {
        self.guard.shared.generation.load(Ordering::SeqCst) != self.generation
    }

    /// Drives the animation to completion without observing frames.
    pub async fn run(self) -> LaunchOutcome {
        self.run_with(|_| {}).await
    }

    /// Drives the animation, handing every frame to `observer`.
    ///
    /// An empty launch resolves immediately without producing frames.
    pub async fn run_with<F>(mut self, mut observer: F) -> LaunchOutcome
    where
        F: FnMut(&Frame),
    {
        if self.session.is_empty() {
            debug!("Empty launch, nothing to animate");
            return LaunchOutcome::Completed(Vec::new());
        }

        let started = Instant::now();
        let mut ticker = interval(self.frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut frames: u64 = 0;

        loop {
            ticker.tick().await;
            if self.is_cancelled() {
                info!(frames, "Launch cancelled");
                return LaunchOutcome::Cancelled;
            }
            let frame = self.session.advance_to(started.elapsed());
            frames += 1;
            observer(&frame);
            if self.session.is_finished() {
                break;
            }
        }

        let results = self.session.results();
        info!(
            ramps = results.len(),
            frames,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Launch completed"
        );
        LaunchOutcome::Completed(results)
    }
}

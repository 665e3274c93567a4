//! # Playback Controller
//!
//! Time-driven traversal of a recorded route. The controller owns all playback
//! state (play/pause, progress, speed, current position and heading) and turns
//! wall-clock time into distance along the route, which the resolver then turns
//! into a position.
//!
//! ## Frames
//!
//! The controller never runs its own timer. While playing it holds exactly one
//! pending [`FrameToken`]; the host calls [`PlaybackController::on_frame`] with
//! that token on its next display refresh (or uses [`PlaybackController::tick`],
//! or the `driver` feature's tokio loop). Pausing, finishing or replacing the
//! route drops the pending token, so a late callback carrying an old token is
//! ignored rather than moving the marker.
//!
//! ## Clock
//!
//! A run is anchored at `(instant, distance)` on its first frame. Every later
//! frame computes `distance = anchor_distance + elapsed * speed`. Play, seek and
//! speed changes clear the anchor, so paused time is never counted and a speed
//! change never rescales time that already elapsed.
//!
//! ## Example
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use route_replay::{GpsPoint, PlaybackController};
//!
//! let route = vec![
//!     GpsPoint::new(0.0, 0.0),
//!     GpsPoint::new(0.0, 0.01),
//!     GpsPoint::new(0.0, 0.02),
//! ];
//! let mut playback = PlaybackController::new(route);
//! playback.set_speed(2.0).unwrap();
//! playback.play();
//!
//! let start = Instant::now();
//! playback.tick(start);
//! playback.tick(start + Duration::from_secs(10));
//!
//! // 60 km/h at 2x for ten seconds
//! assert!((playback.state().distance_traveled - 333.33).abs() < 0.5);
//! ```

use std::fmt;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::geo_utils::bearing;
use crate::resolver::position_at_distance;
use crate::{GpsPoint, RouteProfile};

/// Reference playback speed at 1x: 60 km/h in meters per second.
pub const DEFAULT_BASE_SPEED_MPS: f64 = 50.0 / 3.0;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the playback clock.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaybackConfig {
    /// Simulated travel speed at a multiplier of 1.0, in meters per second.
    /// Default: 16.67 (60 km/h)
    pub base_speed_mps: f64,

    /// Progress at or above which `play()` restarts from the beginning
    /// instead of resuming. Default: 0.99
    pub restart_threshold: f64,

    /// Interval between frames for hosts without their own display timer.
    /// Default: 16ms (~60Hz)
    pub frame_interval_ms: u32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            base_speed_mps: DEFAULT_BASE_SPEED_MPS,
            restart_threshold: 0.99,
            frame_interval_ms: 16,
        }
    }
}

impl PlaybackConfig {
    /// Frame interval as a [`Duration`], never zero.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.frame_interval_ms.max(1)))
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Caller errors rejected by the controller. State is left unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "ffi", derive(uniffi::Error))]
pub enum PlaybackError {
    #[error("speed multiplier must be finite and positive, got {multiplier}")]
    InvalidSpeed { multiplier: f64 },

    #[error("progress must be a number, got {progress}")]
    InvalidProgress { progress: f64 },
}

// ============================================================================
// State
// ============================================================================

/// Observable playback state, published to observers after every change.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaybackState {
    /// True while the clock is advancing
    pub is_playing: bool,
    /// Fraction of the route covered, `[0, 1]`
    pub progress: f64,
    /// Current speed relative to the base speed
    pub speed_multiplier: f64,
    /// Marker position; `None` only for an empty route
    pub current_position: Option<GpsPoint>,
    /// Marker heading in degrees clockwise from north, `[0, 360)`
    pub current_heading: f64,
    /// Simulated distance covered in meters
    pub distance_traveled: f64,
    /// Total route distance in meters
    pub total_distance: f64,
}

/// Handle for the single frame a playing controller is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(u64);

impl FrameToken {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// What happened when a frame was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Position advanced; the next frame is pending under this token
    Continue(FrameToken),
    /// The end of the route was reached and playback stopped
    Finished,
    /// The token was cancelled or superseded; nothing changed
    Stale,
}

/// Receives the playback state after every mutation and every frame.
pub trait PlaybackObserver: Send {
    fn on_update(&self, state: &PlaybackState);
}

impl<F> PlaybackObserver for F
where
    F: Fn(&PlaybackState) + Send,
{
    fn on_update(&self, state: &PlaybackState) {
        self(state)
    }
}

#[derive(Debug, Clone, Copy)]
struct ClockAnchor {
    started_at: Instant,
    start_distance: f64,
}

// ============================================================================
// Controller
// ============================================================================

/// Plays back a single route. One instance per playback session.
pub struct PlaybackController {
    points: Vec<GpsPoint>,
    profile: RouteProfile,
    config: PlaybackConfig,
    state: PlaybackState,
    anchor: Option<ClockAnchor>,
    pending_frame: Option<FrameToken>,
    next_token: u64,
    observer: Option<Box<dyn PlaybackObserver>>,
}

impl fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackController")
            .field("points", &self.points.len())
            .field("state", &self.state)
            .field("pending_frame", &self.pending_frame)
            .field("has_observer", &self.observer.is_some())
            .finish()
    }
}

impl PlaybackController {
    /// Create a controller for `points` with default configuration.
    pub fn new(points: Vec<GpsPoint>) -> Self {
        Self::with_config(points, PlaybackConfig::default())
    }

    /// Create a controller with custom configuration.
    pub fn with_config(points: Vec<GpsPoint>, config: PlaybackConfig) -> Self {
        let mut controller = Self {
            points: Vec::new(),
            profile: RouteProfile::default(),
            config,
            state: PlaybackState {
                is_playing: false,
                progress: 0.0,
                speed_multiplier: 1.0,
                current_position: None,
                current_heading: 0.0,
                distance_traveled: 0.0,
                total_distance: 0.0,
            },
            anchor: None,
            pending_frame: None,
            next_token: 0,
            observer: None,
        };
        controller.load_route(points);
        controller
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn points(&self) -> &[GpsPoint] {
        &self.points
    }

    pub fn profile(&self) -> &RouteProfile {
        &self.profile
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    /// Token of the frame the controller is waiting on, if playing.
    pub fn pending_frame(&self) -> Option<FrameToken> {
        self.pending_frame
    }

    /// Current simulated speed in meters per second.
    pub fn speed_mps(&self) -> f64 {
        self.config.base_speed_mps * self.state.speed_multiplier
    }

    /// Real time needed to play the whole route at the current speed.
    pub fn estimated_duration(&self) -> Duration {
        self.duration_for(self.profile.total_distance)
    }

    /// Real time left until the end of the route at the current speed.
    pub fn remaining_duration(&self) -> Duration {
        self.duration_for(self.profile.total_distance - self.state.distance_traveled)
    }

    fn duration_for(&self, meters: f64) -> Duration {
        let speed = self.speed_mps();
        if meters <= 0.0 || speed <= 0.0 || !speed.is_finite() {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(meters / speed).unwrap_or(Duration::MAX)
    }

    // ========================================================================
    // Observers
    // ========================================================================

    /// Register the observer notified after every state change.
    /// Replaces any previous observer.
    pub fn set_observer(&mut self, observer: impl PlaybackObserver + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    fn notify(&self) {
        if let Some(observer) = &self.observer {
            observer.on_update(&self.state);
        }
    }

    // ========================================================================
    // Controls
    // ========================================================================

    /// Replace the route. Stops playback and rewinds to the new start.
    pub fn set_route(&mut self, points: Vec<GpsPoint>) {
        self.load_route(points);
        self.notify();
    }

    fn load_route(&mut self, points: Vec<GpsPoint>) {
        self.profile = RouteProfile::from_points(&points);
        self.points = points;
        self.pending_frame = None;
        self.anchor = None;

        self.state.is_playing = false;
        self.state.progress = 0.0;
        self.state.total_distance = self.profile.total_distance;
        self.state.current_position = self.points.first().copied();
        self.state.current_heading = match self.points.as_slice() {
            [first, second, ..] => bearing(first, second),
            _ => 0.0,
        };
        self.state.distance_traveled = 0.0;

        info!(
            "[RouteReplay] Loaded route: {} points, {:.0}m",
            self.points.len(),
            self.profile.total_distance
        );

        let invalid = self.points.iter().filter(|p| !p.is_valid()).count();
        if invalid > 0 {
            warn!("[RouteReplay] Route has {} points with invalid coordinates", invalid);
        }
    }

    /// Start or resume playback.
    ///
    /// A run that already reached the end (progress at or above the restart
    /// threshold) starts over from the first waypoint. Calling `play` while
    /// already playing does nothing.
    pub fn play(&mut self) -> Option<FrameToken> {
        if self.state.is_playing {
            return self.pending_frame;
        }

        if self.state.progress >= self.config.restart_threshold {
            debug!("[RouteReplay] Restarting finished playback from the start");
            self.state.progress = 0.0;
            self.move_to_distance(0.0);
        }

        self.anchor = None;
        self.state.is_playing = true;
        let token = self.schedule_frame();
        debug!("[RouteReplay] Play at {:.3} ({:.1}x)", self.state.progress, self.state.speed_multiplier);
        self.notify();
        Some(token)
    }

    /// Stop the clock and cancel the pending frame. Position is kept.
    pub fn pause(&mut self) {
        if !self.state.is_playing {
            return;
        }
        self.state.is_playing = false;
        self.pending_frame = None;
        debug!("[RouteReplay] Paused at {:.3}", self.state.progress);
        self.notify();
    }

    /// Jump to `progress` (clamped to `[0, 1]`) immediately.
    ///
    /// If playing, the next frame continues from the new position.
    pub fn seek(&mut self, progress: f64) -> Result<(), PlaybackError> {
        if progress.is_nan() {
            warn!("[RouteReplay] Rejected seek to NaN");
            return Err(PlaybackError::InvalidProgress { progress });
        }
        let clamped = progress.clamp(0.0, 1.0);
        if clamped != progress {
            warn!("[RouteReplay] Seek {} clamped to {}", progress, clamped);
        }

        self.state.progress = clamped;
        self.move_to_distance(clamped * self.profile.total_distance);
        self.anchor = None;
        self.notify();
        Ok(())
    }

    /// Change the speed multiplier.
    ///
    /// Non-finite or non-positive values are rejected; any other value is
    /// applied as given. Takes effect from the current position, without
    /// rescaling time already played.
    pub fn set_speed(&mut self, multiplier: f64) -> Result<(), PlaybackError> {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            warn!("[RouteReplay] Rejected speed multiplier {}", multiplier);
            return Err(PlaybackError::InvalidSpeed { multiplier });
        }

        debug!("[RouteReplay] Speed set to {}x", multiplier);
        self.state.speed_multiplier = multiplier;
        self.anchor = None;
        self.notify();
        Ok(())
    }

    // ========================================================================
    // Frames
    // ========================================================================

    /// Run the pending frame, if any, at time `now`.
    pub fn tick(&mut self, now: Instant) -> Option<FrameOutcome> {
        let token = self.pending_frame?;
        Some(self.on_frame(token, now))
    }

    /// Deliver a frame scheduled under `token`.
    ///
    /// Only the most recently issued, still pending token is honoured.
    pub fn on_frame(&mut self, token: FrameToken, now: Instant) -> FrameOutcome {
        if self.pending_frame != Some(token) || !self.state.is_playing {
            debug!("[RouteReplay] Ignoring stale frame #{}", token.0);
            return FrameOutcome::Stale;
        }
        self.pending_frame = None;

        let anchor = *self.anchor.get_or_insert(ClockAnchor {
            started_at: now,
            start_distance: self.state.distance_traveled,
        });
        let elapsed = now.saturating_duration_since(anchor.started_at).as_secs_f64();
        let traveled = anchor.start_distance + elapsed * self.speed_mps();
        let total = self.profile.total_distance;

        if total <= 0.0 || traveled >= total {
            self.state.progress = 1.0;
            self.move_to_distance(total);
            self.state.is_playing = false;
            self.anchor = None;
            info!("[RouteReplay] Playback finished ({:.0}m)", total);
            self.notify();
            return FrameOutcome::Finished;
        }

        self.state.progress = traveled / total;
        self.move_to_distance(traveled);
        let next = self.schedule_frame();
        self.notify();
        FrameOutcome::Continue(next)
    }

    fn schedule_frame(&mut self) -> FrameToken {
        self.next_token += 1;
        let token = FrameToken(self.next_token);
        self.pending_frame = Some(token);
        token
    }

    fn move_to_distance(&mut self, distance: f64) {
        self.state.distance_traveled = distance;
        if let Some(resolved) = position_at_distance(&self.points, &self.profile, distance) {
            self.state.current_position = Some(resolved.position);
            self.state.current_heading = resolved.heading;
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

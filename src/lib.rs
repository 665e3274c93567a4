//! # Route Replay
//!
//! Animated playback of recorded GPS routes.
//!
//! This library provides:
//! - Geodesic distance, bearing and interpolation between GPS points
//! - Distance-indexed route profiles and position lookup along a route
//! - A seekable, speed-adjustable playback clock that moves a marker along the route
//!
//! ## Features
//!
//! - **`driver`** - tokio frame loop that drives playback at display refresh rate
//! - **`serde`** - Serialize/Deserialize for the public data types
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use route_replay::{GpsPoint, PlaybackController};
//!
//! let route = vec![
//!     GpsPoint::new(51.5074, -0.1278),
//!     GpsPoint::new(51.5080, -0.1290),
//!     GpsPoint::new(51.5090, -0.1300),
//! ];
//!
//! let mut playback = PlaybackController::new(route);
//! playback.play();
//!
//! // Feed display frames; each one moves the marker along the route
//! let start = Instant::now();
//! playback.tick(start);
//! playback.tick(start + Duration::from_secs(3));
//!
//! let state = playback.state();
//! println!("{:.0}% at heading {:.0}", state.progress * 100.0, state.current_heading);
//!
//! // Scrub to the middle
//! playback.seek(0.5).unwrap();
//! ```

pub mod geo_utils;

pub mod profile;
pub use profile::RouteProfile;

pub mod resolver;
pub use resolver::{position_at_distance, position_at_progress, ResolvedPosition};

pub mod playback;
pub use playback::{
    FrameOutcome, FrameToken, PlaybackConfig, PlaybackController, PlaybackError,
    PlaybackObserver, PlaybackState, DEFAULT_BASE_SPEED_MPS,
};

// Frame loop for hosts without a display timer
#[cfg(feature = "driver")]
pub mod driver;

#[cfg(feature = "driver")]
pub use driver::{PlaybackDriver, SharedController};

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("RouteReplayRust")
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use route_replay::GpsPoint;
/// let point = GpsPoint::new(51.5074, -0.1278); // London
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

// ============================================================================
// FFI Exports (only when feature enabled)
// ============================================================================

#[cfg(feature = "ffi")]
mod ffi {
    use super::*;
    use log::{debug, info};
    use std::sync::{Arc, Mutex, MutexGuard};
    use std::time::Instant;

    /// Callback interface for receiving playback updates.
    /// Implement this in Kotlin/Swift to redraw the map marker.
    ///
    /// Called with the session lock held: do not call back into the session
    /// from inside `on_update`.
    #[uniffi::export(callback_interface)]
    pub trait PlaybackListener: Send + Sync {
        fn on_update(&self, state: PlaybackState);
    }

    struct ListenerObserver(Box<dyn PlaybackListener>);

    impl PlaybackObserver for ListenerObserver {
        fn on_update(&self, state: &PlaybackState) {
            self.0.on_update(state.clone());
        }
    }

    /// One playback session, owned by the mobile side.
    ///
    /// The host calls `tick()` from its display-refresh callback while
    /// `is_playing` is true.
    #[derive(uniffi::Object)]
    pub struct PlaybackSession {
        controller: Mutex<PlaybackController>,
    }

    impl PlaybackSession {
        fn lock(&self) -> MutexGuard<'_, PlaybackController> {
            self.controller.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
        }
    }

    #[uniffi::export]
    impl PlaybackSession {
        #[uniffi::constructor]
        pub fn new(points: Vec<GpsPoint>, config: Option<PlaybackConfig>) -> Arc<Self> {
            init_logging();
            info!("[RouteReplayRust] PlaybackSession created with {} points", points.len());
            let controller = PlaybackController::with_config(points, config.unwrap_or_default());
            Arc::new(Self {
                controller: Mutex::new(controller),
            })
        }

        pub fn set_listener(&self, listener: Box<dyn PlaybackListener>) {
            self.lock().set_observer(ListenerObserver(listener));
        }

        pub fn clear_listener(&self) {
            self.lock().clear_observer();
        }

        pub fn set_route(&self, points: Vec<GpsPoint>) -> PlaybackState {
            let mut controller = self.lock();
            controller.set_route(points);
            controller.state().clone()
        }

        pub fn play(&self) -> PlaybackState {
            let mut controller = self.lock();
            controller.play();
            controller.state().clone()
        }

        pub fn pause(&self) -> PlaybackState {
            let mut controller = self.lock();
            controller.pause();
            controller.state().clone()
        }

        pub fn seek(&self, progress: f64) -> Result<PlaybackState, PlaybackError> {
            let mut controller = self.lock();
            controller.seek(progress)?;
            Ok(controller.state().clone())
        }

        pub fn set_speed(&self, multiplier: f64) -> Result<PlaybackState, PlaybackError> {
            let mut controller = self.lock();
            controller.set_speed(multiplier)?;
            Ok(controller.state().clone())
        }

        /// Advance one frame using the current time.
        pub fn tick(&self) -> PlaybackState {
            let mut controller = self.lock();
            if let Some(outcome) = controller.tick(Instant::now()) {
                debug!("[RouteReplayRust] Frame: {:?}", outcome);
            }
            controller.state().clone()
        }

        pub fn state(&self) -> PlaybackState {
            self.lock().state().clone()
        }

        /// Seconds needed to play the whole route at the current speed.
        pub fn estimated_duration_secs(&self) -> f64 {
            self.lock().estimated_duration().as_secs_f64()
        }
    }

    /// Total route distance in meters.
    #[uniffi::export]
    pub fn route_distance(points: Vec<GpsPoint>) -> f64 {
        RouteProfile::from_points(&points).total_distance
    }

    /// Position and heading at a progress fraction of the route, without a session.
    #[uniffi::export]
    pub fn position_at(points: Vec<GpsPoint>, progress: f64) -> Option<ResolvedPosition> {
        let profile = RouteProfile::from_points(&points);
        position_at_progress(&points, &profile, progress)
    }

    /// Get default playback configuration.
    #[uniffi::export]
    pub fn default_playback_config() -> PlaybackConfig {
        init_logging();
        PlaybackConfig::default()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

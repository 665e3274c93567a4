//! Frame loop for hosts without a display timer.
//!
//! Runs a tokio interval at the controller's configured frame rate and feeds
//! each tick into [`PlaybackController::tick`]. The loop keeps running while
//! playback is paused (ticks are no-ops then) and stops when the driver is
//! dropped or [`PlaybackDriver::stop`] is called. Stopping also pauses the
//! controller, so it never reports playing without a loop behind it.

use std::sync::{Arc, Mutex, MutexGuard};

use log::debug;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::PlaybackController;

/// Controller shared between the frame loop and the code issuing controls.
pub type SharedController = Arc<Mutex<PlaybackController>>;

/// Handle to a running frame loop. Dropping it cancels the loop and pauses
/// the controller.
#[derive(Debug)]
pub struct PlaybackDriver {
    handle: JoinHandle<()>,
    controller: SharedController,
}

impl PlaybackDriver {
    /// Spawn the frame loop on the current tokio runtime.
    ///
    /// Must be called from within a runtime.
    pub fn spawn(controller: SharedController) -> Self {
        let period = lock(&controller).config().frame_interval();
        debug!("[RouteReplay] Starting frame loop every {:?}", period);

        let driven = controller.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                let now = interval.tick().await;
                lock(&driven).tick(now.into_std());
            }
        });

        Self { handle, controller }
    }

    /// True until the loop has been stopped.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop the loop and pause playback. Any frame not yet delivered is
    /// never run.
    pub fn stop(self) {
        // Drop does the work
    }
}

impl Drop for PlaybackDriver {
    fn drop(&mut self) {
        debug!("[RouteReplay] Stopping frame loop");
        self.handle.abort();
        lock(&self.controller).pause();
    }
}

// Observers run under the lock, so a panicking observer poisons it
fn lock(controller: &Mutex<PlaybackController>) -> MutexGuard<'_, PlaybackController> {
    controller.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GpsPoint, PlaybackConfig};
    use std::time::Duration;

    fn shared_route(speed: f64) -> SharedController {
        let route = vec![
            GpsPoint::new(0.0, 0.0),
            GpsPoint::new(0.0, 0.01),
            GpsPoint::new(0.0, 0.02),
        ];
        let mut controller = PlaybackController::with_config(route, PlaybackConfig::default());
        controller.set_speed(speed).unwrap();
        Arc::new(Mutex::new(controller))
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_plays_route_to_the_end() {
        // ~2.2km at 100x (1667 m/s) takes about 1.3s
        let controller = shared_route(100.0);
        let _driver = PlaybackDriver::spawn(controller.clone());

        lock(&controller).play();
        tokio::time::sleep(Duration::from_secs(3)).await;

        let c = lock(&controller);
        assert!(!c.is_playing());
        assert_eq!(c.state().progress, 1.0);
        assert!(c.pending_frame().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_advances_gradually() {
        let controller = shared_route(1.0);
        let _driver = PlaybackDriver::spawn(controller.clone());

        lock(&controller).play();
        tokio::time::sleep(Duration::from_secs(10)).await;

        let distance = lock(&controller).state().distance_traveled;
        // 10s at 16.67 m/s, give or take a frame
        assert!(distance > 160.0 && distance < 170.0, "distance {}", distance);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_playback_stays_put() {
        let controller = shared_route(1.0);
        let _driver = PlaybackDriver::spawn(controller.clone());

        lock(&controller).play();
        tokio::time::sleep(Duration::from_secs(2)).await;
        lock(&controller).pause();
        let paused_at = lock(&controller).state().distance_traveled;

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(lock(&controller).state().distance_traveled, paused_at);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_driver_delivers_no_frames() {
        let controller = shared_route(1.0);
        let driver = PlaybackDriver::spawn(controller.clone());

        lock(&controller).play();
        tokio::time::sleep(Duration::from_secs(1)).await;
        driver.stop();
        let stopped_at = lock(&controller).state().distance_traveled;

        tokio::time::sleep(Duration::from_secs(5)).await;
        let c = lock(&controller);
        assert_eq!(c.state().distance_traveled, stopped_at);
        assert!(!c.is_playing());
        assert!(c.pending_frame().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_driver_pauses_playback() {
        let controller = shared_route(1.0);
        {
            let _driver = PlaybackDriver::spawn(controller.clone());
            lock(&controller).play();
            tokio::time::sleep(Duration::from_millis(500)).await;
        }

        let c = lock(&controller);
        assert!(!c.is_playing());
        assert!(c.state().distance_traveled > 0.0);
    }
}

//! Cumulative-distance profile of a route.
//!
//! A [`RouteProfile`] maps every waypoint index to the distance travelled from
//! the start of the route, which is what lets playback address the route by
//! distance instead of by index. It is a pure function of the points and is
//! rebuilt from scratch whenever the route changes.

use crate::geo_utils::haversine_distance;
use crate::GpsPoint;

/// Distance-indexed view of a route.
///
/// `cumulative_distances[i]` is the length of the polyline from `points[0]`
/// to `points[i]` in meters. The first entry is always `0.0` and the sequence
/// never decreases.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteProfile {
    /// Running distance at each waypoint (meters), same length as the route
    pub cumulative_distances: Vec<f64>,
    /// Total route distance in meters
    pub total_distance: f64,
}

impl RouteProfile {
    /// Build the profile for a route.
    ///
    /// Empty routes produce an empty profile, a single point produces `[0.0]`.
    /// Both have a total distance of zero.
    ///
    /// # Example
    /// ```
    /// use route_replay::{GpsPoint, RouteProfile};
    ///
    /// let route = vec![
    ///     GpsPoint::new(0.0, 0.0),
    ///     GpsPoint::new(0.0, 0.01),
    ///     GpsPoint::new(0.0, 0.02),
    /// ];
    ///
    /// let profile = RouteProfile::from_points(&route);
    /// assert_eq!(profile.cumulative_distances.len(), 3);
    /// assert_eq!(profile.cumulative_distances[0], 0.0);
    /// assert!((profile.total_distance - 2224.0).abs() < 2.0);
    /// ```
    pub fn from_points(points: &[GpsPoint]) -> Self {
        if points.is_empty() {
            return Self::default();
        }

        let mut cumulative_distances = Vec::with_capacity(points.len());
        cumulative_distances.push(0.0);

        let mut total = 0.0;
        for w in points.windows(2) {
            total += haversine_distance(&w[0], &w[1]);
            cumulative_distances.push(total);
        }

        Self {
            cumulative_distances,
            total_distance: total,
        }
    }

    /// Number of waypoints the profile was built from.
    pub fn len(&self) -> usize {
        self.cumulative_distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cumulative_distances.is_empty()
    }

    /// Length of the segment ending at waypoint `end_index`.
    ///
    /// Returns `None` for index 0 or anything past the last waypoint.
    pub fn segment_length(&self, end_index: usize) -> Option<f64> {
        if end_index == 0 || end_index >= self.len() {
            return None;
        }
        Some(self.cumulative_distances[end_index] - self.cumulative_distances[end_index - 1])
    }

    /// Fraction of the route covered at `distance`, clamped to `[0, 1]`.
    ///
    /// Zero-length routes report 0.
    pub fn progress_at_distance(&self, distance: f64) -> f64 {
        if self.total_distance <= 0.0 || distance.is_nan() {
            return 0.0;
        }
        (distance / self.total_distance).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn sample_route() -> Vec<GpsPoint> {
        vec![
            GpsPoint::new(51.5074, -0.1278),
            GpsPoint::new(51.5080, -0.1290),
            GpsPoint::new(51.5080, -0.1290), // GPS dwell
            GpsPoint::new(51.5090, -0.1300),
            GpsPoint::new(51.5100, -0.1310),
        ]
    }

    #[test]
    fn test_empty_route() {
        let profile = RouteProfile::from_points(&[]);
        assert!(profile.cumulative_distances.is_empty());
        assert_eq!(profile.total_distance, 0.0);
    }

    #[test]
    fn test_single_point_route() {
        let profile = RouteProfile::from_points(&[GpsPoint::new(51.5, -0.12)]);
        assert_eq!(profile.cumulative_distances, vec![0.0]);
        assert_eq!(profile.total_distance, 0.0);
    }

    #[test]
    fn test_cumulative_is_non_decreasing_and_ends_at_total() {
        let route = sample_route();
        let profile = RouteProfile::from_points(&route);

        assert_eq!(profile.len(), route.len());
        assert_eq!(profile.cumulative_distances[0], 0.0);
        for w in profile.cumulative_distances.windows(2) {
            assert!(w[1] >= w[0]);
        }
        assert_eq!(*profile.cumulative_distances.last().unwrap(), profile.total_distance);
    }

    #[test]
    fn test_each_step_is_the_segment_distance() {
        let route = sample_route();
        let profile = RouteProfile::from_points(&route);
        for i in 1..route.len() {
            let expected = profile.cumulative_distances[i - 1] + haversine_distance(&route[i - 1], &route[i]);
            assert_eq!(profile.cumulative_distances[i], expected);
        }
    }

    #[test]
    fn test_segment_length() {
        let profile = RouteProfile::from_points(&sample_route());
        assert_eq!(profile.segment_length(0), None);
        assert_eq!(profile.segment_length(2), Some(0.0));
        assert!(profile.segment_length(1).unwrap() > 0.0);
        assert_eq!(profile.segment_length(5), None);
    }

    #[test]
    fn test_progress_at_distance() {
        let profile = RouteProfile::from_points(&sample_route());
        assert_eq!(profile.progress_at_distance(0.0), 0.0);
        assert_eq!(profile.progress_at_distance(profile.total_distance), 1.0);
        assert_eq!(profile.progress_at_distance(profile.total_distance * 2.0), 1.0);
        assert!(approx_eq(profile.progress_at_distance(profile.total_distance / 4.0), 0.25, 1e-12));
        assert_eq!(RouteProfile::default().progress_at_distance(10.0), 0.0);
    }
}

//! Map a distance along a route to a position and heading.
//!
//! The containing segment is found by binary search over the cumulative
//! distances, then the position is interpolated inside it. Heading always comes
//! from the containing segment's direction, so it steps at each waypoint rather
//! than turning smoothly through the corner.

use crate::geo_utils::{bearing, interpolate};
use crate::{GpsPoint, RouteProfile};

/// A simulated position on the route.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolvedPosition {
    /// Interpolated location
    pub position: GpsPoint,
    /// Direction of travel in degrees clockwise from north, `[0, 360)`
    pub heading: f64,
    /// Index of the waypoint that ends the containing segment (always >= 1)
    pub segment_index: u32,
}

/// Resolve the position `target_distance` meters along the route.
///
/// Returns `None` if the route has fewer than 2 points or the profile was not
/// built for it. Distances below zero (or NaN) resolve to the start; distances
/// past the end resolve to the last point with the final segment's heading.
///
/// # Example
/// ```
/// use route_replay::{GpsPoint, RouteProfile, position_at_distance};
///
/// let route = vec![
///     GpsPoint::new(0.0, 0.0),
///     GpsPoint::new(0.0, 0.01),
///     GpsPoint::new(0.0, 0.02),
/// ];
/// let profile = RouteProfile::from_points(&route);
///
/// let at = position_at_distance(&route, &profile, profile.cumulative_distances[1]).unwrap();
/// assert!((at.position.longitude - 0.01).abs() < 1e-9);
/// assert!((at.heading - 90.0).abs() < 1e-6);
/// ```
pub fn position_at_distance(
    points: &[GpsPoint],
    profile: &RouteProfile,
    target_distance: f64,
) -> Option<ResolvedPosition> {
    if points.len() < 2 || profile.len() != points.len() {
        return None;
    }

    let target = if target_distance.is_nan() { 0.0 } else { target_distance.max(0.0) };
    let cumulative = &profile.cumulative_distances;

    // First i >= 1 with target <= cumulative[i]
    let i = 1 + cumulative[1..].partition_point(|&d| d < target);

    if i >= points.len() {
        let last = points.len() - 1;
        return Some(ResolvedPosition {
            position: points[last],
            heading: bearing(&points[last - 1], &points[last]),
            segment_index: last as u32,
        });
    }

    let start = &points[i - 1];
    let end = &points[i];
    let heading = bearing(start, end);
    let segment_length = cumulative[i] - cumulative[i - 1];

    if segment_length <= 0.0 {
        return Some(ResolvedPosition {
            position: *start,
            heading,
            segment_index: i as u32,
        });
    }

    let t = ((target - cumulative[i - 1]) / segment_length).clamp(0.0, 1.0);
    Some(ResolvedPosition {
        position: interpolate(start, end, t),
        heading,
        segment_index: i as u32,
    })
}

/// Resolve the position at a progress fraction of the route.
///
/// `progress` is clamped to `[0, 1]`.
pub fn position_at_progress(
    points: &[GpsPoint],
    profile: &RouteProfile,
    progress: f64,
) -> Option<ResolvedPosition> {
    let progress = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
    position_at_distance(points, profile, progress * profile.total_distance)
}

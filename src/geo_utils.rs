//! # Geographic Utilities
//!
//! Core geographic computation utilities for route playback.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two GPS points |
//! | [`bearing`] | Initial great-circle bearing from one point to another |
//! | [`interpolate`] | Linear interpolation between two points |
//!
//! ## Example
//!
//! ```rust
//! use route_replay::{GpsPoint, geo_utils};
//!
//! let a = GpsPoint::new(0.0, 0.0);
//! let b = GpsPoint::new(0.0, 0.01);
//!
//! let dist = geo_utils::haversine_distance(&a, &b);
//! assert!((dist - 1112.0).abs() < 1.0);
//!
//! let heading = geo_utils::bearing(&a, &b);
//! assert!((heading - 90.0).abs() < 1e-6);
//!
//! let mid = geo_utils::interpolate(&a, &b, 0.5);
//! assert!((mid.longitude - 0.005).abs() < 1e-12);
//! ```
//!
//! ## Algorithm Notes
//!
//! Distance and bearing assume a spherical Earth of radius [`EARTH_RADIUS_M`].
//! Bearing is delegated to [`geo::Haversine`], which is independent of the
//! radius; distance applies the haversine formula to `geo` points directly so
//! the radius stays at 6,371 km rather than `geo`'s 6,371.0088 km mean radius.
//! Interpolation is planar in latitude/longitude, which is
//! fine for the short hops between consecutive GPS fixes but should not be used
//! across long great-circle arcs.

use geo::{Bearing, Coord, Haversine, Point};
use crate::GpsPoint;

/// Radius of the spherical Earth model, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

// =============================================================================
// Distance Functions
// =============================================================================

/// Calculate the great-circle distance between two GPS points using the Haversine formula.
///
/// Returns the distance in meters along the Earth's surface. Symmetric, and
/// exactly `0.0` for coincident points.
///
/// # Example
///
/// ```rust
/// use route_replay::{GpsPoint, geo_utils};
///
/// let london = GpsPoint::new(51.5074, -0.1278);
/// let paris = GpsPoint::new(48.8566, 2.3522);
///
/// let distance = geo_utils::haversine_distance(&london, &paris);
/// assert!((distance - 343_560.0).abs() < 1000.0); // ~344 km
/// ```
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let a = to_point(p1);
    let b = to_point(p2);

    let lat1 = a.y().to_radians();
    let lat2 = b.y().to_radians();
    let half_dlat = (b.y() - a.y()).to_radians() / 2.0;
    let half_dlng = (b.x() - a.x()).to_radians() / 2.0;

    let h = half_dlat.sin().powi(2) + lat1.cos() * lat2.cos() * half_dlng.sin().powi(2);
    // Rounding can push h a hair above 1 for antipodal points
    2.0 * EARTH_RADIUS_M * h.min(1.0).sqrt().asin()
}

// =============================================================================
// Direction Functions
// =============================================================================

/// Initial bearing from `from` to `to` along the great circle, in degrees
/// clockwise from north, normalized to `[0, 360)`.
///
/// The bearing between coincident points is mathematically undefined; this
/// returns `0.0` for that case (and for any input that would produce NaN).
///
/// # Example
///
/// ```rust
/// use route_replay::{GpsPoint, geo_utils};
///
/// let origin = GpsPoint::new(0.0, 0.0);
/// assert!((geo_utils::bearing(&origin, &GpsPoint::new(1.0, 0.0)) - 0.0).abs() < 1e-9);
/// assert!((geo_utils::bearing(&origin, &GpsPoint::new(0.0, -1.0)) - 270.0).abs() < 1e-9);
/// assert_eq!(geo_utils::bearing(&origin, &origin), 0.0);
/// ```
pub fn bearing(from: &GpsPoint, to: &GpsPoint) -> f64 {
    if from == to {
        return 0.0;
    }
    normalize_heading(Haversine::bearing(to_point(from), to_point(to)))
}

/// Wrap any angle in degrees into `[0, 360)`. NaN and infinities map to 0.
#[inline]
pub fn normalize_heading(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

// =============================================================================
// Interpolation
// =============================================================================

/// Linearly interpolate latitude and longitude between `a` and `b`.
///
/// `t = 0.0` yields `a`, `t = 1.0` yields `b`. The fraction is not clamped;
/// callers supply `t` in `[0, 1]`.
#[inline]
pub fn interpolate(a: &GpsPoint, b: &GpsPoint, t: f64) -> GpsPoint {
    let start = to_coord(a);
    let end = to_coord(b);
    let c = start + (end - start) * t;
    GpsPoint::new(c.y, c.x)
}

// geo uses (x = lng, y = lat)
#[inline]
fn to_point(p: &GpsPoint) -> Point<f64> {
    Point::new(p.longitude, p.latitude)
}

#[inline]
fn to_coord(p: &GpsPoint) -> Coord<f64> {
    Coord { x: p.longitude, y: p.latitude }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_haversine_distance_same_point() {
        let p = GpsPoint::new(0.0, 0.0);
        assert_eq!(haversine_distance(&p, &p), 0.0);
    }

    #[test]
    fn test_haversine_distance_known_value() {
        // London to Paris is approximately 344 km
        let london = GpsPoint::new(51.5074, -0.1278);
        let paris = GpsPoint::new(48.8566, 2.3522);
        let dist = haversine_distance(&london, &paris);
        assert!(approx_eq(dist, 343_560.0, 5000.0));
    }

    #[test]
    fn test_haversine_distance_symmetric() {
        let a = GpsPoint::new(47.3769, 8.5417);
        let b = GpsPoint::new(47.3800, 8.5500);
        assert!(approx_eq(haversine_distance(&a, &b), haversine_distance(&b, &a), 1e-9));
    }

    #[test]
    fn test_hundredth_degree_at_equator() {
        let d = haversine_distance(&GpsPoint::new(0.0, 0.0), &GpsPoint::new(0.0, 0.01));
        assert!(approx_eq(d, 1112.0, 3.0), "got {}", d);
    }

    #[test]
    fn test_distance_uses_spherical_earth_radius() {
        let d = haversine_distance(&GpsPoint::new(0.0, 0.0), &GpsPoint::new(0.0, 0.01));
        let expected = 6_371_000.0 * 0.01_f64.to_radians();
        assert!(approx_eq(d, expected, 1e-6), "got {} expected {}", d, expected);
    }

    #[test]
    fn test_distance_along_meridian() {
        // One degree of latitude is R * pi / 180 anywhere on the sphere
        let d = haversine_distance(&GpsPoint::new(45.0, 7.0), &GpsPoint::new(46.0, 7.0));
        assert!(approx_eq(d, EARTH_RADIUS_M * 1.0_f64.to_radians(), 1e-6));
    }

    #[test]
    fn test_distance_antipodal_is_finite() {
        let d = haversine_distance(&GpsPoint::new(0.0, 0.0), &GpsPoint::new(0.0, 180.0));
        assert!(approx_eq(d, EARTH_RADIUS_M * std::f64::consts::PI, 1e-3));
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = GpsPoint::new(0.0, 0.0);
        assert!(approx_eq(bearing(&origin, &GpsPoint::new(0.01, 0.0)), 0.0, 1e-6));
        assert!(approx_eq(bearing(&origin, &GpsPoint::new(0.0, 0.01)), 90.0, 1e-6));
        assert!(approx_eq(bearing(&origin, &GpsPoint::new(-0.01, 0.0)), 180.0, 1e-6));
        assert!(approx_eq(bearing(&origin, &GpsPoint::new(0.0, -0.01)), 270.0, 1e-6));
    }

    #[test]
    fn test_bearing_coincident_is_stable() {
        let p = GpsPoint::new(51.5074, -0.1278);
        let b = bearing(&p, &p);
        assert!(!b.is_nan());
        assert_eq!(b, 0.0);
    }

    #[test]
    fn test_bearing_always_in_range() {
        let a = GpsPoint::new(51.5074, -0.1278);
        for i in 0..36 {
            let angle = (i as f64 * 10.0).to_radians();
            let b = GpsPoint::new(a.latitude + 0.01 * angle.cos(), a.longitude + 0.01 * angle.sin());
            let h = bearing(&a, &b);
            assert!((0.0..360.0).contains(&h), "heading {} out of range", h);
        }
    }

    #[test]
    fn test_normalize_heading() {
        assert_eq!(normalize_heading(360.0), 0.0);
        assert!(approx_eq(normalize_heading(-90.0), 270.0, 1e-12));
        assert!(approx_eq(normalize_heading(725.0), 5.0, 1e-9));
        assert_eq!(normalize_heading(f64::NAN), 0.0);
        assert!(normalize_heading(-1e-20) < 360.0);
    }

    #[test]
    fn test_interpolate_endpoints_and_midpoint() {
        let a = GpsPoint::new(10.0, 20.0);
        let b = GpsPoint::new(12.0, 24.0);
        assert_eq!(interpolate(&a, &b, 0.0), a);
        assert_eq!(interpolate(&a, &b, 1.0), b);
        let mid = interpolate(&a, &b, 0.5);
        assert!(approx_eq(mid.latitude, 11.0, 1e-12));
        assert!(approx_eq(mid.longitude, 22.0, 1e-12));
    }

    #[test]
    fn test_interpolate_is_not_clamped() {
        let a = GpsPoint::new(0.0, 0.0);
        let b = GpsPoint::new(1.0, 1.0);
        let beyond = interpolate(&a, &b, 2.0);
        assert!(approx_eq(beyond.latitude, 2.0, 1e-12));
    }
}

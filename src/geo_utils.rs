//! # Geographic Utilities
//!
//! Bounds and distance computations over GPS fixes.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`bounding_box`] | Tight lat/lon extent of a set of fixes |
//! | [`display_bounds`] | Padded, non-degenerate extent for a viewport |
//! | [`region_from_bounds`] | Center + span form used by host map widgets |
//! | [`haversine_distance`] | Great-circle distance between two fixes |
//! | [`polyline_length`] | Total length of a run of fixes in meters |
//! | [`track_stats`] | Distance and duration summary of a segmented track |
//!
//! ## Example
//!
//! ```rust
//! use trace_track::{Fix, geo_utils};
//!
//! let fixes = vec![
//!     Fix::new(51.5074, -0.1278, 0, "walk"),
//!     Fix::new(51.5080, -0.1290, 5_000, "walk"),
//! ];
//!
//! let bounds = geo_utils::bounding_box(&fixes).unwrap();
//! assert_eq!(bounds.min_lat, 51.5074);
//!
//! let display = geo_utils::display_bounds(&fixes, 0.2, 0.01).unwrap();
//! assert!(display.lat_span() > 0.0099);
//! ```

use geo::{Distance, Haversine, Point};

use crate::{Bounds, Fix};

/// Default fractional padding applied by [`display_bounds`].
pub const DEFAULT_PADDING_RATIO: f64 = 0.2;

/// Default minimum span (degrees) on each axis for [`display_bounds`].
pub const DEFAULT_MIN_DELTA: f64 = 0.01;

// =============================================================================
// Bounding Box Functions
// =============================================================================

/// Compute the bounding box of a set of fixes in a single pass.
///
/// Returns `None` for empty input.
///
/// # Example
///
/// ```rust
/// use trace_track::{Fix, geo_utils};
///
/// let fixes = vec![
///     Fix::new(51.5000, -0.1300, 0, "s"),
///     Fix::new(51.5100, -0.1200, 1, "s"),
///     Fix::new(51.5050, -0.1250, 2, "s"),
/// ];
///
/// let bounds = geo_utils::bounding_box(&fixes).unwrap();
/// assert_eq!(bounds.max_lat, 51.5100);
/// assert_eq!(bounds.min_lon, -0.1300);
/// assert!(geo_utils::bounding_box(&[]).is_none());
/// ```
pub fn bounding_box(fixes: &[Fix]) -> Option<Bounds> {
    let first = fixes.first()?;
    let mut bounds = Bounds {
        min_lat: first.latitude,
        max_lat: first.latitude,
        min_lon: first.longitude,
        max_lon: first.longitude,
    };

    for fix in &fixes[1..] {
        bounds.min_lat = bounds.min_lat.min(fix.latitude);
        bounds.max_lat = bounds.max_lat.max(fix.latitude);
        bounds.min_lon = bounds.min_lon.min(fix.longitude);
        bounds.max_lon = bounds.max_lon.max(fix.longitude);
    }

    Some(bounds)
}

/// Compute display bounds: the bounding box grown around its center by
/// `padding_ratio`, with each axis span floored at `min_delta`.
///
/// The floor keeps the viewport non-degenerate for a single fix or a tight
/// cluster. Returns `None` for empty input.
pub fn display_bounds(fixes: &[Fix], padding_ratio: f64, min_delta: f64) -> Option<Bounds> {
    bounding_box(fixes).map(|bounds| pad_bounds(&bounds, padding_ratio, min_delta))
}

/// Grow `bounds` around its center by `padding_ratio` and floor both spans at `min_delta`.
pub fn pad_bounds(bounds: &Bounds, padding_ratio: f64, min_delta: f64) -> Bounds {
    let center_lat = (bounds.min_lat + bounds.max_lat) / 2.0;
    let center_lon = (bounds.min_lon + bounds.max_lon) / 2.0;
    let lat_delta = (bounds.lat_span() * (1.0 + padding_ratio)).max(min_delta);
    let lon_delta = (bounds.lon_span() * (1.0 + padding_ratio)).max(min_delta);

    Bounds {
        min_lat: center_lat - lat_delta / 2.0,
        max_lat: center_lat + lat_delta / 2.0,
        min_lon: center_lon - lon_delta / 2.0,
        max_lon: center_lon + lon_delta / 2.0,
    }
}

/// Center and span of a bounds, the form host map widgets take as a "region".
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct MapRegion {
    pub latitude: f64,
    pub longitude: f64,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

/// Convert bounds to a [`MapRegion`].
pub fn region_from_bounds(bounds: &Bounds) -> MapRegion {
    let (latitude, longitude) = bounds.center();
    MapRegion {
        latitude,
        longitude,
        latitude_delta: bounds.lat_span(),
        longitude_delta: bounds.lon_span(),
    }
}

// =============================================================================
// Distance Functions
// =============================================================================

/// Great-circle distance in meters between two fixes.
#[inline]
pub fn haversine_distance(a: &Fix, b: &Fix) -> f64 {
    let p1 = Point::new(a.longitude, a.latitude);
    let p2 = Point::new(b.longitude, b.latitude);
    Haversine::distance(p1, p2)
}

/// Total length in meters of a run of fixes. Empty or single-fix runs return 0.0.
pub fn polyline_length(fixes: &[Fix]) -> f64 {
    fixes
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Summary of a segmented track.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct TrackStats {
    pub fix_count: u64,
    pub segment_count: u64,
    /// Sum of per-segment lengths; jumps across gaps are not counted
    pub distance_meters: f64,
    /// Sum of per-segment durations
    pub duration_ms: i64,
}

/// Compute distance and duration over gap-split segments.
pub fn track_stats(segments: &[&[Fix]]) -> TrackStats {
    segments.iter().fold(TrackStats::default(), |mut stats, segment| {
        stats.fix_count += segment.len() as u64;
        stats.segment_count += 1;
        stats.distance_meters += polyline_length(segment);
        if let (Some(first), Some(last)) = (segment.first(), segment.last()) {
            stats.duration_ms = stats
                .duration_ms
                .saturating_add(last.timestamp_ms.saturating_sub(first.timestamp_ms));
        }
        stats
    })
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

    fn fix(lat: f64, lon: f64) -> Fix {
        Fix::new(lat, lon, 0, "s")
    }

    #[test]
    fn test_bounding_box_empty() {
        assert!(bounding_box(&[]).is_none());
        assert!(display_bounds(&[], 0.2, 0.01).is_none());
    }

    #[test]
    fn test_bounding_box_contains_all() {
        let fixes = vec![
            fix(51.50, -0.13),
            fix(51.51, -0.12),
            fix(51.505, -0.125),
            fix(-12.0, 170.0),
        ];
        let bounds = bounding_box(&fixes).unwrap();
        assert!(bounds.min_lat <= bounds.max_lat);
        assert!(bounds.min_lon <= bounds.max_lon);
        for f in &fixes {
            assert!(bounds.contains(f.latitude, f.longitude));
        }
        assert_eq!(bounds.min_lat, -12.0);
        assert_eq!(bounds.max_lon, 170.0);
    }

    #[test]
    fn test_display_bounds_single_point() {
        let fixes = vec![fix(51.5, -0.1), fix(51.5, -0.1)];
        let bounds = display_bounds(&fixes, DEFAULT_PADDING_RATIO, DEFAULT_MIN_DELTA).unwrap();
        assert!(bounds.lat_span() >= DEFAULT_MIN_DELTA - 1e-12);
        assert!(bounds.lon_span() >= DEFAULT_MIN_DELTA - 1e-12);
        let (lat, lon) = bounds.center();
        assert!(approx_eq(lat, 51.5, 1e-9));
        assert!(approx_eq(lon, -0.1, 1e-9));
    }

    #[test]
    fn test_display_bounds_padding() {
        let fixes = vec![fix(10.0, 20.0), fix(11.0, 22.0)];
        let bounds = display_bounds(&fixes, 0.2, 0.01).unwrap();
        assert!(approx_eq(bounds.lat_span(), 1.2, 1e-9));
        assert!(approx_eq(bounds.lon_span(), 2.4, 1e-9));
        assert!(approx_eq(bounds.min_lat, 9.9, 1e-9));
        assert!(approx_eq(bounds.max_lon, 22.2, 1e-9));
    }

    #[test]
    fn test_region_from_bounds() {
        let bounds = Bounds { min_lat: 10.0, max_lat: 12.0, min_lon: 20.0, max_lon: 21.0 };
        let region = region_from_bounds(&bounds);
        assert_eq!(region.latitude, 11.0);
        assert_eq!(region.longitude, 20.5);
        assert_eq!(region.latitude_delta, 2.0);
        assert_eq!(region.longitude_delta, 1.0);
    }

    #[test]
    fn test_haversine_distance_known_value() {
        // London to Paris is approximately 344 km
        let london = fix(51.5074, -0.1278);
        let paris = fix(48.8566, 2.3522);
        assert!(approx_eq(haversine_distance(&london, &paris), 343_560.0, 5000.0));
    }

    #[test]
    fn test_polyline_length_short_runs() {
        assert_eq!(polyline_length(&[]), 0.0);
        assert_eq!(polyline_length(&[fix(51.5, -0.1)]), 0.0);
    }

    #[test]
    fn test_track_stats_ignores_gap_jumps() {
        let a = vec![
            Fix::new(0.0, 0.0, 0, "s"),
            Fix::new(0.0, 0.001, 10_000, "s"),
        ];
        let b = vec![
            Fix::new(1.0, 1.0, 600_000, "s"),
            Fix::new(1.0, 1.001, 605_000, "s"),
        ];
        let stats = track_stats(&[&a, &b]);
        assert_eq!(stats.fix_count, 4);
        assert_eq!(stats.segment_count, 2);
        assert_eq!(stats.duration_ms, 15_000);
        // Two ~111m hops, not the ~157km jump between segments
        assert!(stats.distance_meters > 200.0 && stats.distance_meters < 250.0);
    }

    #[test]
    fn test_track_stats_extreme_timestamps_saturate() {
        let a = vec![Fix::new(0.0, 0.0, i64::MIN, "s"), Fix::new(0.0, 0.0, i64::MAX, "s")];
        let b = vec![Fix::new(0.0, 0.0, 0, "s"), Fix::new(0.0, 0.0, 10, "s")];
        let stats = track_stats(&[&a, &b]);
        assert_eq!(stats.duration_ms, i64::MAX);
    }
}

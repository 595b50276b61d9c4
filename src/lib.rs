//! # Trace Track
//!
//! Geometry pipeline that turns a chronological list of GPS fixes into drawable,
//! replayable tracks.
//!
//! This library provides:
//! - Bounds computation and a Mercator-corrected lat/lon to plane projection
//! - Time-gap segmentation of fix sequences
//! - Douglas-Peucker simplification of long segments
//! - SVG path strings, one per segment
//! - Arc-length replay mapping (stroke reveal + moving indicator)
//! - Static exports (SVG, GPX, GeoJSON, JSON)
//!
//! ## Features
//!
//! - **`export`** (default) - Static export formats
//! - **`parallel`** - Parallel per-segment projection with rayon
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use trace_track::{build_track, Fix, TrackConfig, Viewport};
//!
//! let fixes = vec![
//!     Fix::new(51.5074, -0.1278, 0, "walk"),
//!     Fix::new(51.5080, -0.1290, 5_000, "walk"),
//!     Fix::new(51.5090, -0.1300, 10_000, "walk"),
//! ];
//!
//! let track = build_track(&fixes, &Viewport::new(390.0, 844.0), &TrackConfig::default());
//! assert_eq!(track.paths().len(), 1);
//!
//! let replay = track.replay();
//! let indicator = replay.indicator_position(0.5);
//! assert!(indicator.is_some());
//! ```

use geo::Coord;
use log::debug;

pub mod error;
pub mod geo_utils;
pub mod path;
pub mod projection;
pub mod replay;
pub mod segments;
pub mod simplify;

#[cfg(feature = "export")]
pub mod export;

pub use error::{Result, TrackError};
pub use geo_utils::{bounding_box, display_bounds, MapRegion, TrackStats};
pub use path::build_path;
pub use projection::{HostProjector, MercatorProjector, Projector};
pub use replay::{ReplayInterval, ReplayMapper, StrokeReveal};
pub use segments::{group_sessions, split_by_gap, Session};
pub use simplify::simplify;

#[cfg(feature = "export")]
pub use export::{export_geojson, export_gpx, export_json, export_svg, ExportFormat, SvgOptions};

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
            .with_tag("TraceTrackRust")
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// One timestamped GPS reading.
///
/// # Example
/// ```
/// use trace_track::Fix;
/// let fix = Fix::new(51.5074, -0.1278, 1_700_000_000_000, "session-1").with_accuracy(8.0);
/// assert!(fix.is_valid());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "export", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "export", serde(rename_all = "camelCase"))]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: i64,
    /// Horizontal accuracy in meters, when the receiver reports one
    pub accuracy: Option<f64>,
    /// Recording session this fix belongs to
    pub session_id: String,
}

impl Fix {
    pub fn new(latitude: f64, longitude: f64, timestamp_ms: i64, session_id: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            timestamp_ms,
            accuracy: None,
            session_id: session_id.into(),
        }
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    /// Check if the fix has finite, in-range coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Raw coordinate as x = longitude, y = latitude.
    pub fn coord(&self) -> Coord<f64> {
        Coord { x: self.longitude, y: self.latitude }
    }
}

/// Rectangular lat/lon extent. Invariant: `min_lat <= max_lat`, `min_lon <= max_lon`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Bounds {
    /// Center as `(latitude, longitude)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&latitude)
            && (self.min_lon..=self.max_lon).contains(&longitude)
    }
}

/// A point on the drawing plane.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
}

impl ProjectedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    #[inline]
    pub fn distance_to(&self, other: &ProjectedPoint) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Linear interpolation: `t = 0` gives `self`, `t = 1` gives `other`.
    #[inline]
    pub fn lerp(&self, other: &ProjectedPoint, t: f64) -> ProjectedPoint {
        ProjectedPoint::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

/// Drawing surface size and edge padding, in plane units.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    /// Margin kept free on every edge. 0 when the bounds already carry padding.
    pub padding: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height, padding: 0.0 }
    }

    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Multiplier from the recording interval to the segment gap threshold.
pub const GAP_INTERVAL_FACTOR: i64 = 3;

/// How often fixes are recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum TrackingInterval {
    OneMinute,
    #[default]
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    SixtyMinutes,
}

impl TrackingInterval {
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        match minutes {
            1 => Some(Self::OneMinute),
            5 => Some(Self::FiveMinutes),
            15 => Some(Self::FifteenMinutes),
            30 => Some(Self::ThirtyMinutes),
            60 => Some(Self::SixtyMinutes),
            _ => None,
        }
    }

    pub fn minutes(&self) -> i64 {
        match self {
            Self::OneMinute => 1,
            Self::FiveMinutes => 5,
            Self::FifteenMinutes => 15,
            Self::ThirtyMinutes => 30,
            Self::SixtyMinutes => 60,
        }
    }

    pub fn millis(&self) -> i64 {
        self.minutes() * 60_000
    }

    /// Gap above which consecutive fixes are drawn as separate strokes.
    pub fn gap_threshold_ms(&self) -> i64 {
        self.millis() * GAP_INTERVAL_FACTOR
    }
}

/// Inclusive timestamp range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct TimeWindow {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl TimeWindow {
    pub fn contains(&self, timestamp_ms: i64) -> bool {
        (self.start_ms..=self.end_ms).contains(&timestamp_ms)
    }
}

/// How far back the displayed track reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum TimeRange {
    OneHour,
    SixHours,
    #[default]
    Day,
    Week,
    Month,
    All,
}

impl TimeRange {
    pub fn duration_ms(&self) -> Option<i64> {
        const HOUR: i64 = 60 * 60 * 1000;
        match self {
            Self::OneHour => Some(HOUR),
            Self::SixHours => Some(6 * HOUR),
            Self::Day => Some(24 * HOUR),
            Self::Week => Some(7 * 24 * HOUR),
            Self::Month => Some(30 * 24 * HOUR),
            Self::All => None,
        }
    }

    /// Window ending at `now_ms`, or `None` for an unbounded range.
    pub fn window(&self, now_ms: i64) -> Option<TimeWindow> {
        self.duration_ms().map(|d| TimeWindow {
            start_ms: now_ms.saturating_sub(d),
            end_ms: now_ms,
        })
    }
}

/// Configuration for the track pipeline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct TrackConfig {
    /// Split segments where consecutive fixes are further apart than this.
    /// `None` (or a value <= 0) keeps everything in one segment.
    pub gap_threshold_ms: Option<i64>,

    /// Segments with more fixes than this are simplified before projection.
    /// Default: 100
    pub simplify_min_points: u32,

    /// Douglas-Peucker tolerance in degrees.
    /// Default: 0.0001 (~11 meters)
    pub simplify_tolerance: f64,

    /// Fraction of the bounding box added around the track for display.
    /// Default: 0.2
    pub padding_ratio: f64,

    /// Minimum displayed span in degrees on each axis.
    /// Default: 0.01
    pub min_delta: f64,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            gap_threshold_ms: None,
            simplify_min_points: 100,
            simplify_tolerance: 0.0001,
            padding_ratio: geo_utils::DEFAULT_PADDING_RATIO,
            min_delta: geo_utils::DEFAULT_MIN_DELTA,
        }
    }
}

impl TrackConfig {
    /// Default configuration with a gap threshold derived from the recording interval.
    pub fn for_interval(interval: TrackingInterval) -> Self {
        Self {
            gap_threshold_ms: Some(interval.gap_threshold_ms()),
            ..Self::default()
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// One gap-bounded run, projected and ready to draw.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct RenderedSegment {
    /// Fixes in the segment before simplification
    pub fix_count: u32,
    /// Projected (and possibly simplified) points
    pub points: Vec<ProjectedPoint>,
    /// Path commands; empty for fewer than two points
    pub path: String,
}

/// Output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct RenderedTrack {
    /// Display bounds used for projection; `None` when there were no valid fixes
    pub bounds: Option<Bounds>,
    pub segments: Vec<RenderedSegment>,
    /// Chronologically last fix, projected (for the live position marker)
    pub last_point: Option<ProjectedPoint>,
    pub stats: TrackStats,
    /// Fixes dropped for invalid coordinates
    pub skipped_fixes: u32,
}

impl RenderedTrack {
    /// Path strings of the visible segments, in order.
    pub fn paths(&self) -> Vec<&str> {
        self.segments
            .iter()
            .map(|s| s.path.as_str())
            .filter(|p| !p.is_empty())
            .collect()
    }

    /// Replay mapper over the segments' projected points.
    pub fn replay(&self) -> ReplayMapper {
        let points: Vec<&[ProjectedPoint]> = self.segments.iter().map(|s| s.points.as_slice()).collect();
        ReplayMapper::new(&points)
    }
}

/// Narrow a count for the FFI records, saturating at `u32::MAX`.
pub(crate) fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn prepare_fixes(fixes: &[Fix]) -> segments::SanitizedFixes {
    let mut prepared = segments::sanitize_fixes(fixes);
    segments::sort_by_timestamp(&mut prepared.fixes);
    prepared
}

fn render_segment<P: Projector + ?Sized>(segment: &[Fix], projector: &P, config: &TrackConfig) -> RenderedSegment {
    let kept: Vec<&Fix> = if segment.len() > config.simplify_min_points as usize {
        simplify::simplify(segment, config.simplify_tolerance)
    } else {
        segment.iter().collect()
    };

    let points: Vec<ProjectedPoint> = kept
        .into_iter()
        .map(|f| projector.project_fix(f))
        .filter(ProjectedPoint::is_finite)
        .collect();

    RenderedSegment {
        fix_count: count_u32(segment.len()),
        path: path::build_path(&points),
        points,
    }
}

fn assemble<P: Projector + ?Sized>(
    prepared: &segments::SanitizedFixes,
    bounds: Option<Bounds>,
    segments: Vec<RenderedSegment>,
    split: &[&[Fix]],
    projector: &P,
) -> RenderedTrack {
    let last_point = prepared
        .fixes
        .last()
        .map(|f| projector.project_fix(f))
        .filter(ProjectedPoint::is_finite);

    RenderedTrack {
        bounds,
        segments,
        last_point,
        stats: geo_utils::track_stats(split),
        skipped_fixes: count_u32(prepared.skipped),
    }
}

fn render_prepared<P: Projector + ?Sized>(
    prepared: &segments::SanitizedFixes,
    bounds: Option<Bounds>,
    projector: &P,
    config: &TrackConfig,
) -> RenderedTrack {
    let split = split_by_gap(&prepared.fixes, config.gap_threshold_ms);
    let segments: Vec<RenderedSegment> = split
        .iter()
        .map(|segment| render_segment(segment, projector, config))
        .collect();

    debug!(
        "[TraceTrack] Built track: {} fixes -> {} segments ({} skipped)",
        prepared.fixes.len(),
        segments.len(),
        prepared.skipped
    );

    assemble(prepared, bounds, segments, &split, projector)
}

/// Run the full pipeline with any [`Projector`].
///
/// Fixes are sanitized and sorted, split at time gaps, long segments simplified,
/// then projected and turned into paths. The reported bounds are the display bounds
/// of the valid fixes regardless of which projector is used.
pub fn build_track_with<P: Projector + ?Sized>(fixes: &[Fix], projector: &P, config: &TrackConfig) -> RenderedTrack {
    let prepared = prepare_fixes(fixes);
    let bounds = display_bounds(&prepared.fixes, config.padding_ratio, config.min_delta);
    render_prepared(&prepared, bounds, projector, config)
}

/// Run the full pipeline, projecting into `viewport` with [`MercatorProjector`]
/// over the display bounds of the fixes.
///
/// Empty input (or input with no valid fixes) yields an empty track.
pub fn build_track(fixes: &[Fix], viewport: &Viewport, config: &TrackConfig) -> RenderedTrack {
    let prepared = prepare_fixes(fixes);
    let Some(bounds) = display_bounds(&prepared.fixes, config.padding_ratio, config.min_delta) else {
        return RenderedTrack {
            skipped_fixes: count_u32(prepared.skipped),
            ..RenderedTrack::default()
        };
    };
    let projector = MercatorProjector::new(bounds, *viewport);
    render_prepared(&prepared, Some(bounds), &projector, config)
}

/// Same as [`build_track`], but projects and simplifies segments in parallel.
///
/// Output is identical to the sequential version.
#[cfg(feature = "parallel")]
pub fn build_track_parallel(fixes: &[Fix], viewport: &Viewport, config: &TrackConfig) -> RenderedTrack {
    use rayon::prelude::*;

    let prepared = prepare_fixes(fixes);
    let Some(bounds) = display_bounds(&prepared.fixes, config.padding_ratio, config.min_delta) else {
        return RenderedTrack {
            skipped_fixes: count_u32(prepared.skipped),
            ..RenderedTrack::default()
        };
    };
    let projector = MercatorProjector::new(bounds, *viewport);
    let split = split_by_gap(&prepared.fixes, config.gap_threshold_ms);

    let segments: Vec<RenderedSegment> = split
        .par_iter()
        .map(|segment| render_segment(segment, &projector, config))
        .collect();

    assemble(&prepared, Some(bounds), segments, &split, &projector)
}

// ============================================================================
// FFI Exports
// ============================================================================

#[cfg(feature = "ffi")]
mod ffi {
    use super::*;
    use log::info;

    /// Screen projection provided by the host map view.
    /// Implement this in Kotlin/Swift on top of the map's point-for-coordinate call.
    #[uniffi::export(callback_interface)]
    pub trait ScreenProjection: Send + Sync {
        /// Screen point for a coordinate; return NaN components for points off the map.
        fn point_for_coordinate(&self, latitude: f64, longitude: f64) -> ProjectedPoint;
    }

    /// Build a track projected into a plain viewport.
    #[uniffi::export]
    pub fn ffi_build_track(fixes: Vec<Fix>, viewport: Viewport, config: TrackConfig) -> RenderedTrack {
        init_logging();
        info!("[TraceTrackRust] 🦀 build_track called with {} fixes", fixes.len());

        let start = std::time::Instant::now();
        let track = build_track_parallel(&fixes, &viewport, &config);
        info!(
            "[TraceTrackRust] 🦀 Built {} segments ({} skipped) in {:?}",
            track.segments.len(),
            track.skipped_fixes,
            start.elapsed()
        );
        track
    }

    /// Build a track projected through the host map's own screen projection.
    #[uniffi::export]
    pub fn ffi_build_track_on_map(
        fixes: Vec<Fix>,
        projection: Box<dyn ScreenProjection>,
        config: TrackConfig,
    ) -> RenderedTrack {
        init_logging();
        info!("[TraceTrackRust] 🦀 build_track_on_map called with {} fixes", fixes.len());
        let projector = HostProjector::new(|lat, lon| projection.point_for_coordinate(lat, lon));
        build_track_with(&fixes, &projector, &config)
    }

    /// Display bounds for a set of fixes.
    #[uniffi::export]
    pub fn ffi_display_bounds(fixes: Vec<Fix>, config: TrackConfig) -> Option<Bounds> {
        init_logging();
        let valid = segments::sanitize_fixes(&fixes);
        display_bounds(&valid.fixes, config.padding_ratio, config.min_delta)
    }

    /// Host map region for a set of fixes.
    #[uniffi::export]
    pub fn ffi_map_region(fixes: Vec<Fix>, config: TrackConfig) -> Option<MapRegion> {
        ffi_display_bounds(fixes, config).map(|b| geo_utils::region_from_bounds(&b))
    }

    /// Progress intervals for each segment.
    #[uniffi::export]
    pub fn ffi_replay_intervals(segments: Vec<Vec<ProjectedPoint>>) -> Vec<ReplayInterval> {
        ReplayMapper::new(&segments).intervals().to_vec()
    }

    /// Stroke reveal state of each segment at `progress`.
    #[uniffi::export]
    pub fn ffi_stroke_reveals(segments: Vec<Vec<ProjectedPoint>>, progress: f64) -> Vec<StrokeReveal> {
        ReplayMapper::new(&segments).stroke_reveals(progress)
    }

    /// Replay indicator position at `progress`, or nothing when the track has no length.
    #[uniffi::export]
    pub fn ffi_indicator_position(segments: Vec<Vec<ProjectedPoint>>, progress: f64) -> Option<ProjectedPoint> {
        ReplayMapper::new(&segments).indicator_position(progress)
    }

    /// Get default configuration.
    #[uniffi::export]
    pub fn ffi_default_config() -> TrackConfig {
        init_logging();
        info!("[TraceTrackRust] 🦀 default_config called - Rust is active!");
        TrackConfig::default()
    }

    /// Default configuration for a recording interval given in minutes.
    #[uniffi::export]
    pub fn ffi_config_for_interval(minutes: u32) -> TrackConfig {
        TrackingInterval::from_minutes(minutes)
            .map(TrackConfig::for_interval)
            .unwrap_or_default()
    }

    /// Keep fixes inside the selected time range ending at `now_ms`.
    #[uniffi::export]
    pub fn ffi_filter_time_range(fixes: Vec<Fix>, range: TimeRange, now_ms: i64) -> Vec<Fix> {
        match range.window(now_ms) {
            Some(window) => segments::filter_window(&fixes, &window),
            None => fixes,
        }
    }

    /// Render an export; nothing on failure (the reason is logged).
    #[cfg(feature = "export")]
    #[uniffi::export]
    pub fn ffi_export(format: ExportFormat, fixes: Vec<Fix>, now_ms: i64) -> Option<String> {
        init_logging();
        let sessions = group_sessions(&fixes);
        info!("[TraceTrackRust] 🦀 export {:?} for {} sessions", format, sessions.len());
        match export::export(format, &sessions, now_ms) {
            Ok(contents) => Some(contents),
            Err(e) => {
                log::warn!("[TraceTrackRust] Export failed: {}", e);
                None
            }
        }
    }

    /// Render an SVG export with custom canvas settings.
    #[cfg(feature = "export")]
    #[uniffi::export]
    pub fn ffi_export_svg(fixes: Vec<Fix>, options: SvgOptions) -> Option<String> {
        init_logging();
        export_svg(&group_sessions(&fixes), &options)
            .map_err(|e| log::warn!("[TraceTrackRust] SVG export failed: {}", e))
            .ok()
    }
}

// ============================================================================
// Tests
// ============================================================================

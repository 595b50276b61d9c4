//! Static track exports: SVG, GPX, GeoJSON and JSON.
//!
//! SVG goes through the same projection and path building as live rendering, with
//! an edge padding. GPX, GeoJSON and JSON carry raw coordinates and skip projection.
//!
//! Every export renders to a `String`; [`write_export`] is the only function here
//! that touches the filesystem.

use std::path::Path;

use geo::Point;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};
use gpx::{Gpx, GpxVersion, Metadata, Track, TrackSegment, Waypoint};
use log::debug;
use serde::Serialize;
use serde_json::json;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::{OptionExt, Result, TrackError};
use crate::geo_utils::bounding_box;
use crate::path::build_path;
use crate::projection::{MercatorProjector, Projector};
use crate::segments::{sanitize_fixes, Session};
use crate::{Fix, ProjectedPoint, Viewport};

/// Creator tag written into GPX files.
pub const GPX_CREATOR: &str = "Trace";

/// Track name written into GPX files.
pub const GPX_TRACK_NAME: &str = "Trace Export";

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum ExportFormat {
    Svg,
    Gpx,
    GeoJson,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Svg => "svg",
            ExportFormat::Gpx => "gpx",
            ExportFormat::GeoJson => "geojson",
            ExportFormat::Json => "json",
        }
    }

    /// File name for an export created at `now_ms`.
    pub fn file_name(&self, now_ms: i64) -> String {
        format!("trace-export-{}.{}", now_ms, self.extension())
    }
}

/// Canvas and stroke settings for SVG export.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct SvgOptions {
    pub width: f64,
    pub height: f64,
    /// Edge padding in plane units; the bounds are the raw bounding box
    pub padding: f64,
    pub background: String,
    pub stroke: String,
    pub stroke_width: f64,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 1000.0,
            padding: 40.0,
            background: "#F5F2EB".to_string(),
            stroke: "#2C2C2C".to_string(),
            stroke_width: 2.0,
        }
    }
}

fn datetime(timestamp_ms: i64) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(timestamp_ms as i128 * 1_000_000)
        .map_err(|_| TrackError::InvalidTimestamp { timestamp_ms })
}

fn rfc3339(timestamp_ms: i64) -> Result<String> {
    datetime(timestamp_ms)?
        .format(&Rfc3339)
        .map_err(|_| TrackError::InvalidTimestamp { timestamp_ms })
}

/// Sessions with invalid fixes removed. Sessions left with no fixes are dropped.
fn valid_sessions(sessions: &[Session]) -> Vec<Session> {
    sessions
        .iter()
        .filter_map(|session| {
            let valid = sanitize_fixes(&session.fixes);
            if valid.fixes.is_empty() {
                return None;
            }
            Some(Session {
                id: session.id.clone(),
                fixes: valid.fixes,
            })
        })
        .collect()
}

// ============================================================================
// SVG
// ============================================================================

/// Render sessions as a standalone SVG document, one stroke per session.
///
/// Fails with [`TrackError::EmptyTrack`] when there are no valid fixes.
pub fn export_svg(sessions: &[Session], options: &SvgOptions) -> Result<String> {
    let sessions = valid_sessions(sessions);
    let all: Vec<Fix> = sessions.iter().flat_map(|s| s.fixes.iter().cloned()).collect();
    let bounds = bounding_box(&all).ok_or_empty_track()?;

    let viewport = Viewport::new(options.width, options.height).with_padding(options.padding);
    let projector = MercatorProjector::new(bounds, viewport);

    let mut svg = String::new();
    svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    svg.push_str(&format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        options.width, options.height
    ));
    svg.push_str(&format!(
        "  <rect width=\"{}\" height=\"{}\" fill=\"{}\"/>\n",
        options.width, options.height, options.background
    ));

    for session in &sessions {
        let points: Vec<ProjectedPoint> = session.fixes.iter().map(|f| projector.project_fix(f)).collect();
        let path = build_path(&points);
        if path.is_empty() {
            continue;
        }
        svg.push_str(&format!(
            "  <path d=\"{}\" stroke=\"{}\" stroke-width=\"{}\" fill=\"none\" stroke-linecap=\"round\" stroke-linejoin=\"round\"/>\n",
            path, options.stroke, options.stroke_width
        ));
    }

    svg.push_str("</svg>");
    debug!("[TraceTrack] SVG export: {} sessions, {} bytes", sessions.len(), svg.len());
    Ok(svg)
}

// ============================================================================
// GPX
// ============================================================================

/// Render sessions as GPX 1.1: one track, one segment per session.
///
/// Fixes with invalid coordinates are left out.
pub fn export_gpx(sessions: &[Session], exported_at_ms: i64) -> Result<String> {
    let mut track = Track::new();
    track.name = Some(GPX_TRACK_NAME.to_string());

    for session in &valid_sessions(sessions) {
        let mut segment = TrackSegment::new();
        for fix in &session.fixes {
            let mut waypoint = Waypoint::new(Point::new(fix.longitude, fix.latitude));
            waypoint.time = Some(datetime(fix.timestamp_ms)?.into());
            segment.points.push(waypoint);
        }
        track.segments.push(segment);
    }

    let metadata = Metadata {
        time: Some(datetime(exported_at_ms)?.into()),
        ..Default::default()
    };

    let gpx = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some(GPX_CREATOR.to_string()),
        metadata: Some(metadata),
        tracks: vec![track],
        ..Default::default()
    };

    let mut buf = Vec::new();
    gpx::write(&gpx, &mut buf).map_err(|e| TrackError::Gpx(e.to_string()))?;
    String::from_utf8(buf).map_err(|e| TrackError::Gpx(e.to_string()))
}

// ============================================================================
// GeoJSON
// ============================================================================

fn session_feature(session: &Session) -> Option<Feature> {
    let value = match session.fixes.as_slice() {
        [] => return None,
        [only] => Value::Point(vec![only.longitude, only.latitude]),
        fixes => Value::LineString(fixes.iter().map(|f| vec![f.longitude, f.latitude]).collect()),
    };

    let timestamps: Vec<i64> = session.fixes.iter().map(|f| f.timestamp_ms).collect();
    let accuracies: Vec<Option<f64>> = session.fixes.iter().map(|f| f.accuracy).collect();

    let mut feature = Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: None,
        foreign_members: None,
    };
    feature.set_property("sessionId", session.id.clone());
    feature.set_property("pointCount", session.fixes.len());
    feature.set_property("timestamps", json!(timestamps));
    feature.set_property("accuracies", json!(accuracies));
    Some(feature)
}

/// Render sessions as a GeoJSON FeatureCollection.
///
/// Sessions with two or more valid fixes become `LineString`s and single-fix sessions
/// `Point`s. Invalid fixes and sessions without valid fixes are left out.
pub fn export_geojson(sessions: &[Session]) -> Result<String> {
    let features: Vec<Feature> = valid_sessions(sessions).iter().filter_map(session_feature).collect();
    let gj = GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    });
    Ok(serde_json::to_string_pretty(&gj)?)
}

// ============================================================================
// JSON
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonExport<'a> {
    exported_at: String,
    sessions: Vec<JsonSession<'a>>,
}

#[derive(Serialize)]
struct JsonSession<'a> {
    id: &'a str,
    points: Vec<JsonPoint>,
}

#[derive(Serialize)]
struct JsonPoint {
    lat: f64,
    lon: f64,
    timestamp: i64,
    accuracy: Option<f64>,
}

/// Render sessions as the app's own pretty-printed JSON dump.
///
/// Every point carries an `accuracy` key, `null` when unknown.
pub fn export_json(sessions: &[Session], exported_at_ms: i64) -> Result<String> {
    let sessions = valid_sessions(sessions);
    let export = JsonExport {
        exported_at: rfc3339(exported_at_ms)?,
        sessions: sessions
            .iter()
            .map(|s| JsonSession {
                id: &s.id,
                points: s
                    .fixes
                    .iter()
                    .map(|f| JsonPoint {
                        lat: f.latitude,
                        lon: f.longitude,
                        timestamp: f.timestamp_ms,
                        accuracy: f.accuracy,
                    })
                    .collect(),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&export)?)
}

/// Render sessions in the given format.
pub fn export(format: ExportFormat, sessions: &[Session], now_ms: i64) -> Result<String> {
    match format {
        ExportFormat::Svg => export_svg(sessions, &SvgOptions::default()),
        ExportFormat::Gpx => export_gpx(sessions, now_ms),
        ExportFormat::GeoJson => export_geojson(sessions),
        ExportFormat::Json => export_json(sessions, now_ms),
    }
}

/// Write a rendered export to disk.
pub fn write_export<P: AsRef<Path>>(path: P, contents: &str) -> Result<()> {
    std::fs::write(path.as_ref(), contents)?;
    debug!("[TraceTrack] Wrote export to {}", path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str, coords: &[(f64, f64, i64)]) -> Session {
        Session {
            id: id.to_string(),
            fixes: coords.iter().map(|&(lat, lon, t)| Fix::new(lat, lon, t, id)).collect(),
        }
    }

    #[test]
    fn test_svg_empty_is_error() {
        assert!(matches!(export_svg(&[], &SvgOptions::default()), Err(TrackError::EmptyTrack)));
        let empty = Session { id: "a".into(), fixes: vec![] };
        assert!(matches!(export_svg(&[empty], &SvgOptions::default()), Err(TrackError::EmptyTrack)));
    }

    #[test]
    fn test_svg_one_path_per_multi_fix_session() {
        let sessions = vec![
            session("a", &[(51.50, -0.13, 0), (51.51, -0.12, 1000)]),
            session("b", &[(51.505, -0.125, 5000)]),
        ];
        let svg = export_svg(&sessions, &SvgOptions::default()).unwrap();
        assert!(svg.starts_with("<?xml"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<path ").count(), 1);
        // Raw bounds with 40 units of padding: first fix sits at the bottom-left inset
        assert!(svg.contains("d=\"M 40 960 L 960 40\""));
        assert!(svg.contains("fill=\"#F5F2EB\""));
    }

    #[test]
    fn test_gpx_contains_points_and_times() {
        let sessions = vec![
            session("a", &[(51.5, -0.1, 0), (51.6, -0.2, 60_000)]),
            session("b", &[(40.0, -74.0, 120_000)]),
        ];
        let gpx = export_gpx(&sessions, 1_700_000_000_000).unwrap();
        assert!(gpx.contains("Trace Export"));
        assert!(gpx.contains("51.5"));
        assert!(gpx.contains("-74"));
        assert!(gpx.contains("1970-01-01T00:01:00"));
        assert_eq!(gpx.matches("<trkseg>").count(), 2);
    }

    #[test]
    fn test_invalid_timestamp() {
        let sessions = vec![session("a", &[(51.5, -0.1, i64::MAX)])];
        assert!(matches!(
            export_gpx(&sessions, 0),
            Err(TrackError::InvalidTimestamp { timestamp_ms: i64::MAX })
        ));
    }

    #[test]
    fn test_geojson_geometry_types() {
        let mut with_accuracy = session("line", &[(1.0, 2.0, 10), (3.0, 4.0, 20)]);
        with_accuracy.fixes[0].accuracy = Some(5.0);
        let sessions = vec![
            with_accuracy,
            session("point", &[(5.0, 6.0, 30)]),
            Session { id: "empty".into(), fixes: vec![] },
        ];
        let text = export_geojson(&sessions).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        let features = parsed["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);

        assert_eq!(features[0]["geometry"]["type"], "LineString");
        assert_eq!(features[0]["geometry"]["coordinates"][0], json!([2.0, 1.0]));
        assert_eq!(features[0]["properties"]["sessionId"], "line");
        assert_eq!(features[0]["properties"]["timestamps"], json!([10, 20]));
        assert_eq!(features[0]["properties"]["accuracies"], json!([5.0, null]));

        assert_eq!(features[1]["geometry"]["type"], "Point");
        assert_eq!(features[1]["geometry"]["coordinates"], json!([6.0, 5.0]));
    }

    #[test]
    fn test_json_export_shape() {
        let mut s = session("a", &[(1.0, 2.0, 10)]);
        s.fixes[0].accuracy = Some(3.5);
        let text = export_json(&[s], 0).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["exportedAt"], "1970-01-01T00:00:00Z");
        assert_eq!(parsed["sessions"][0]["id"], "a");
        assert_eq!(parsed["sessions"][0]["points"][0]["lat"], 1.0);
        assert_eq!(parsed["sessions"][0]["points"][0]["lon"], 2.0);
        assert_eq!(parsed["sessions"][0]["points"][0]["accuracy"], 3.5);
    }

    #[test]
    fn test_json_unknown_accuracy_is_null() {
        let text = export_json(&[session("a", &[(1.0, 2.0, 10)])], 0).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        let point = parsed["sessions"][0]["points"][0].as_object().unwrap();
        assert_eq!(point.get("accuracy"), Some(&serde_json::Value::Null));
    }

    fn session_with_nan() -> Session {
        session("a", &[(51.5, -0.1, 0), (f64::NAN, -0.1, 1000), (51.6, -0.2, 2000)])
    }

    #[test]
    fn test_gpx_skips_invalid_fixes() {
        let gpx = export_gpx(&[session_with_nan()], 0).unwrap();
        assert_eq!(gpx.matches("<trkpt").count(), 2);
        assert!(!gpx.contains("NaN"));
    }

    #[test]
    fn test_geojson_skips_invalid_fixes() {
        let nan_only = session("b", &[(f64::NAN, 0.0, 0)]);
        let text = export_geojson(&[session_with_nan(), nan_only]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        let features = parsed["features"].as_array().unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(
            features[0]["geometry"]["coordinates"],
            json!([[-0.1, 51.5], [-0.2, 51.6]])
        );
        assert_eq!(features[0]["properties"]["pointCount"], 2);
        assert_eq!(features[0]["properties"]["timestamps"], json!([0, 2000]));
    }

    #[test]
    fn test_json_skips_invalid_fixes() {
        let text = export_json(&[session_with_nan()], 0).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        let points = parsed["sessions"][0]["points"].as_array().unwrap();
        assert_eq!(points.len(), 2);
        assert!(points.iter().all(|p| p["lat"].is_f64()));
    }

    #[test]
    fn test_svg_skips_invalid_fixes() {
        let svg = export_svg(&[session_with_nan()], &SvgOptions::default()).unwrap();
        assert_eq!(svg.matches("<path ").count(), 1);
        assert!(!svg.contains("NaN"));
    }

    #[test]
    fn test_write_export_round_trip() {
        let path = std::env::temp_dir().join(format!("trace-track-write-{}.gpx", std::process::id()));
        let contents = export(ExportFormat::Gpx, &[session("a", &[(51.5, -0.1, 0)])], 0).unwrap();
        write_export(&path, &contents).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), contents);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_export_missing_directory() {
        let path = std::env::temp_dir()
            .join(format!("trace-track-missing-{}", std::process::id()))
            .join("export.json");
        assert!(matches!(write_export(&path, "{}"), Err(TrackError::Io(_))));
    }

    #[test]
    fn test_file_names() {
        assert_eq!(ExportFormat::Gpx.file_name(42), "trace-export-42.gpx");
        assert_eq!(ExportFormat::GeoJson.extension(), "geojson");
    }
}

//! Arc-length parameterization for animated replay.
//!
//! A [`ReplayMapper`] is built from the same per-segment projected point arrays the
//! paths are drawn from. Given a progress value in `[0, 1]` it answers two questions:
//! how much of each segment's stroke is revealed, and where the moving indicator sits.
//!
//! Progress is split across segments in proportion to their length, so the replay
//! moves at constant plane speed. Jumps across time gaps take no progress.

use crate::ProjectedPoint;

/// Slice of global progress assigned to one segment.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct ReplayInterval {
    pub segment_index: u32,
    pub start_progress: f64,
    pub end_progress: f64,
}

impl ReplayInterval {
    /// Fraction of the segment revealed at progress `p`.
    pub fn visible_fraction(&self, p: f64) -> f64 {
        let p = clamp_progress(p);
        if self.end_progress > self.start_progress {
            ((p - self.start_progress) / (self.end_progress - self.start_progress)).clamp(0.0, 1.0)
        } else if p >= self.end_progress {
            1.0
        } else {
            0.0
        }
    }
}

/// Stroke state of one segment at a given progress.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct StrokeReveal {
    pub segment_index: u32,
    pub length: f64,
    pub visible_fraction: f64,
    /// Dash offset for a dash array of `length`: `length` hides the stroke, 0 shows it all
    pub dash_offset: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ArcPoint {
    point: ProjectedPoint,
    fraction: f64,
}

/// Clamp progress into `[0, 1]`. NaN maps to 0.
#[inline]
pub fn clamp_progress(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

/// Sum of Euclidean distances between consecutive points.
pub fn arc_length(points: &[ProjectedPoint]) -> f64 {
    points.windows(2).map(|w| w[0].distance_to(&w[1])).sum()
}

/// Maps replay progress onto segment reveals and an indicator position.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayMapper {
    segment_lengths: Vec<f64>,
    intervals: Vec<ReplayInterval>,
    arc: Vec<ArcPoint>,
    total_length: f64,
}

impl ReplayMapper {
    /// Build the mapper from per-segment point arrays in recording order.
    pub fn new<S: AsRef<[ProjectedPoint]>>(segments: &[S]) -> Self {
        let segment_lengths: Vec<f64> = segments.iter().map(|s| arc_length(s.as_ref())).collect();
        let total_length: f64 = segment_lengths.iter().sum();
        let intervals = assign_intervals(&segment_lengths, total_length);
        let arc = if total_length > 0.0 {
            build_arc(segments, total_length)
        } else {
            Vec::new()
        };

        Self { segment_lengths, intervals, arc, total_length }
    }

    pub fn total_length(&self) -> f64 {
        self.total_length
    }

    pub fn segment_lengths(&self) -> &[f64] {
        &self.segment_lengths
    }

    pub fn intervals(&self) -> &[ReplayInterval] {
        &self.intervals
    }

    /// Revealed fraction of segment `segment_index` at progress `p`; 0 for an unknown index.
    pub fn visible_fraction(&self, segment_index: usize, p: f64) -> f64 {
        self.intervals
            .get(segment_index)
            .map_or(0.0, |interval| interval.visible_fraction(p))
    }

    /// Stroke-dash offset of segment `segment_index` at progress `p`.
    pub fn dash_offset(&self, segment_index: usize, p: f64) -> f64 {
        let length = self.segment_lengths.get(segment_index).copied().unwrap_or(0.0);
        (1.0 - self.visible_fraction(segment_index, p)) * length
    }

    /// Reveal state of every segment at progress `p`.
    pub fn stroke_reveals(&self, p: f64) -> Vec<StrokeReveal> {
        self.intervals
            .iter()
            .zip(&self.segment_lengths)
            .map(|(interval, &length)| {
                let visible_fraction = interval.visible_fraction(p);
                StrokeReveal {
                    segment_index: interval.segment_index,
                    length,
                    visible_fraction,
                    dash_offset: (1.0 - visible_fraction) * length,
                }
            })
            .collect()
    }

    /// Indicator position at progress `p`, interpolated along the whole track.
    ///
    /// `None` when the track has no length (no points, or all points coincide).
    pub fn indicator_position(&self, p: f64) -> Option<ProjectedPoint> {
        let first = self.arc.first()?;
        let p = clamp_progress(p);

        let upper = self.arc.partition_point(|a| a.fraction < p);
        if upper == 0 {
            return Some(first.point);
        }
        let Some(b) = self.arc.get(upper) else {
            return self.arc.last().map(|a| a.point);
        };
        let a = &self.arc[upper - 1];

        let span = b.fraction - a.fraction;
        if span <= 0.0 {
            return Some(b.point);
        }
        Some(a.point.lerp(&b.point, (p - a.fraction) / span))
    }
}

/// Contiguous intervals covering `[0, 1]`, each as wide as its segment's share of
/// the total length. With no total length, every interval but the last is empty at
/// 0 and the last spans the whole range.
fn assign_intervals(lengths: &[f64], total_length: f64) -> Vec<ReplayInterval> {
    let last_index = lengths.len().saturating_sub(1);
    let mut cumulative = 0.0;
    let mut start = 0.0;

    lengths
        .iter()
        .enumerate()
        .map(|(i, &length)| {
            cumulative += length;
            let end = if i == last_index {
                1.0
            } else if total_length > 0.0 {
                cumulative / total_length
            } else {
                0.0
            };
            let interval = ReplayInterval {
                segment_index: crate::count_u32(i),
                start_progress: start,
                end_progress: end,
            };
            start = end;
            interval
        })
        .collect()
}

fn build_arc<S: AsRef<[ProjectedPoint]>>(segments: &[S], total_length: f64) -> Vec<ArcPoint> {
    let mut arc = Vec::with_capacity(segments.iter().map(|s| s.as_ref().len()).sum());
    let mut cumulative = 0.0;

    for segment in segments {
        let mut prev: Option<&ProjectedPoint> = None;
        for point in segment.as_ref() {
            if let Some(prev) = prev {
                cumulative += prev.distance_to(point);
            }
            arc.push(ArcPoint {
                point: *point,
                fraction: (cumulative / total_length).min(1.0),
            });
            prev = Some(point);
        }
    }
    arc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn line(from_x: f64, n: usize) -> Vec<ProjectedPoint> {
        (0..n).map(|i| ProjectedPoint::new(from_x + i as f64, 0.0)).collect()
    }

    #[test]
    fn test_empty_track() {
        let mapper = ReplayMapper::new::<Vec<ProjectedPoint>>(&[]);
        assert!(mapper.intervals().is_empty());
        assert_eq!(mapper.total_length(), 0.0);
        assert!(mapper.indicator_position(0.5).is_none());
    }

    #[test]
    fn test_intervals_proportional_and_contiguous() {
        let segments = vec![line(0.0, 2), line(10.0, 4), line(20.0, 1), line(30.0, 7)];
        let mapper = ReplayMapper::new(&segments);
        let intervals = mapper.intervals();

        assert_eq!(intervals.len(), 4);
        assert_eq!(intervals[0].start_progress, 0.0);
        assert_eq!(intervals[3].end_progress, 1.0);
        for pair in intervals.windows(2) {
            assert_eq!(pair[0].end_progress, pair[1].start_progress);
        }
        for interval in intervals {
            assert!(interval.start_progress <= interval.end_progress);
        }

        // Lengths 1, 3, 0, 6 over a total of 10
        assert!(approx_eq(intervals[0].end_progress, 0.1, 1e-12));
        assert!(approx_eq(intervals[1].end_progress, 0.4, 1e-12));
        assert_eq!(intervals[2].start_progress, intervals[2].end_progress);
    }

    #[test]
    fn test_zero_length_track_intervals() {
        let point = ProjectedPoint::new(5.0, 5.0);
        let segments = vec![vec![point, point], vec![point]];
        let mapper = ReplayMapper::new(&segments);
        let intervals = mapper.intervals();
        assert_eq!(intervals[0].start_progress, 0.0);
        assert_eq!(intervals[0].end_progress, 0.0);
        assert_eq!(intervals[1].start_progress, 0.0);
        assert_eq!(intervals[1].end_progress, 1.0);
        assert!(mapper.indicator_position(0.3).is_none());
    }

    #[test]
    fn test_stroke_reveal() {
        let segments = vec![line(0.0, 3), line(10.0, 3)];
        let mapper = ReplayMapper::new(&segments);

        assert_eq!(mapper.visible_fraction(0, 0.0), 0.0);
        assert!(approx_eq(mapper.visible_fraction(0, 0.25), 0.5, 1e-12));
        assert_eq!(mapper.visible_fraction(0, 0.6), 1.0);
        assert_eq!(mapper.visible_fraction(1, 0.25), 0.0);
        assert!(approx_eq(mapper.visible_fraction(1, 0.75), 0.5, 1e-12));

        assert_eq!(mapper.dash_offset(0, 0.0), 2.0);
        assert!(approx_eq(mapper.dash_offset(0, 0.25), 1.0, 1e-12));
        assert_eq!(mapper.dash_offset(1, 1.0), 0.0);
        assert_eq!(mapper.visible_fraction(7, 1.0), 0.0);

        let reveals = mapper.stroke_reveals(0.5);
        assert_eq!(reveals.len(), 2);
        assert_eq!(reveals[0].visible_fraction, 1.0);
        assert_eq!(reveals[0].dash_offset, 0.0);
        assert_eq!(reveals[1].dash_offset, 2.0);
    }

    #[test]
    fn test_zero_width_interval_reveal() {
        let interval = ReplayInterval { segment_index: 0, start_progress: 0.4, end_progress: 0.4 };
        assert_eq!(interval.visible_fraction(0.39), 0.0);
        assert_eq!(interval.visible_fraction(0.4), 1.0);
        assert_eq!(interval.visible_fraction(0.9), 1.0);
    }

    #[test]
    fn test_indicator_midpoint_of_uniform_line() {
        // Eleven evenly spaced points: halfway lands on index 5
        let points: Vec<ProjectedPoint> = (0..11).map(|i| ProjectedPoint::new(i as f64 * 3.0, i as f64 * 4.0)).collect();
        let mapper = ReplayMapper::new(&[points.clone()]);
        let pos = mapper.indicator_position(0.5).unwrap();
        assert!(approx_eq(pos.x, points[5].x, 1e-9));
        assert!(approx_eq(pos.y, points[5].y, 1e-9));
    }

    #[test]
    fn test_indicator_between_points() {
        // Ten evenly spaced points: halfway falls between index 4 and 5
        let points = line(0.0, 10);
        let mapper = ReplayMapper::new(&[points]);
        let pos = mapper.indicator_position(0.5).unwrap();
        assert!(approx_eq(pos.x, 4.5, 1e-9));
        assert_eq!(pos.y, 0.0);
    }

    #[test]
    fn test_indicator_clamps_progress() {
        let mapper = ReplayMapper::new(&[line(0.0, 5)]);
        assert_eq!(mapper.indicator_position(-3.0), Some(ProjectedPoint::new(0.0, 0.0)));
        assert_eq!(mapper.indicator_position(0.0), Some(ProjectedPoint::new(0.0, 0.0)));
        assert_eq!(mapper.indicator_position(1.0), Some(ProjectedPoint::new(4.0, 0.0)));
        assert_eq!(mapper.indicator_position(7.0), Some(ProjectedPoint::new(4.0, 0.0)));
        assert_eq!(mapper.indicator_position(f64::NAN), Some(ProjectedPoint::new(0.0, 0.0)));
    }

    #[test]
    fn test_indicator_skips_gap_jump() {
        // Two unit-length segments far apart: the jump between them takes no progress
        let segments = vec![line(0.0, 2), line(100.0, 2)];
        let mapper = ReplayMapper::new(&segments);
        let at_boundary = mapper.indicator_position(0.5).unwrap();
        assert!(approx_eq(at_boundary.x, 1.0, 1e-9));
        let into_second = mapper.indicator_position(0.75).unwrap();
        assert!(approx_eq(into_second.x, 100.5, 1e-9));
    }
}

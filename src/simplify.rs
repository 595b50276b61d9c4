//! Douglas-Peucker simplification over raw lon/lat coordinates.
//!
//! Runs on an explicit worklist of index ranges rather than recursion, so long
//! near-straight runs with outliers cannot exhaust the stack. Distances are
//! Euclidean in degree space, measured before projection.

use geo::Coord;

use crate::Fix;

/// Distance from `point` to the chord `start`-`end`.
///
/// The foot of the perpendicular is clamped to the chord, so points beyond either
/// end measure to the nearest endpoint. A zero-length chord measures to `start`.
pub fn perpendicular_distance(point: Coord<f64>, start: Coord<f64>, end: Coord<f64>) -> f64 {
    let chord = end - start;
    let offset = point - start;
    let len_sq = chord.x * chord.x + chord.y * chord.y;

    let t = if len_sq == 0.0 {
        0.0
    } else {
        ((offset.x * chord.x + offset.y * chord.y) / len_sq).clamp(0.0, 1.0)
    };

    let foot = start + chord * t;
    let dx = point.x - foot.x;
    let dy = point.y - foot.y;
    (dx * dx + dy * dy).sqrt()
}

/// Indices of the points kept by Douglas-Peucker at `tolerance`, ascending.
///
/// The first and last index are always kept. A range collapses to its endpoints
/// when no interior point lies farther than `tolerance` from its chord.
pub fn simplify_indices(coords: &[Coord<f64>], tolerance: f64) -> Vec<usize> {
    let n = coords.len();
    if n <= 2 {
        return (0..n).collect();
    }

    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    let mut worklist = vec![(0usize, n - 1)];
    while let Some((first, last)) = worklist.pop() {
        if last - first < 2 {
            continue;
        }

        let (split, max_dist) = (first + 1..last)
            .map(|i| (i, perpendicular_distance(coords[i], coords[first], coords[last])))
            .fold((first, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });

        if max_dist > tolerance {
            keep[split] = true;
            worklist.push((first, split));
            worklist.push((split, last));
        }
    }

    keep.iter()
        .enumerate()
        .filter_map(|(i, &k)| k.then_some(i))
        .collect()
}

/// Simplify a run of fixes, returning references to the kept fixes in order.
///
/// # Example
///
/// ```rust
/// use trace_track::{Fix, simplify::simplify};
///
/// let fixes: Vec<Fix> = (0..3).map(|i| Fix::new(0.0, i as f64, i, "s")).collect();
/// let kept = simplify(&fixes, 0.01);
/// assert_eq!(kept.len(), 2);
/// assert_eq!(kept[1].timestamp_ms, 2);
/// ```
pub fn simplify(fixes: &[Fix], tolerance: f64) -> Vec<&Fix> {
    let coords: Vec<Coord<f64>> = fixes.iter().map(Fix::coord).collect();
    simplify_indices(&coords, tolerance)
        .into_iter()
        .map(|i| &fixes[i])
        .collect()
}

//! SVG path-command strings from projected points.

use std::fmt::Write;

use crate::ProjectedPoint;

/// Build a `M x y L x y ...` path for one stroke.
///
/// Fewer than two points give an empty string: an isolated fix draws nothing.
///
/// # Example
///
/// ```rust
/// use trace_track::{ProjectedPoint, path::build_path};
///
/// let points = [ProjectedPoint::new(0.0, 0.0), ProjectedPoint::new(10.5, 20.0)];
/// assert_eq!(build_path(&points), "M 0 0 L 10.5 20");
/// assert_eq!(build_path(&points[..1]), "");
/// ```
pub fn build_path(points: &[ProjectedPoint]) -> String {
    let (first, rest) = match points {
        [first, rest @ ..] if !rest.is_empty() => (first, rest),
        _ => return String::new(),
    };

    let mut path = String::with_capacity(points.len() * 24);
    // Writing into a String cannot fail
    let _ = write!(path, "M {} {}", first.x, first.y);
    for p in rest {
        let _ = write!(path, " L {} {}", p.x, p.y);
    }
    path
}

/// Build one path per stroke, keeping empty strings so indices line up with the input.
pub fn build_paths<S: AsRef<[ProjectedPoint]>>(strokes: &[S]) -> Vec<String> {
    strokes.iter().map(|s| build_path(s.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_single() {
        assert_eq!(build_path(&[]), "");
        assert_eq!(build_path(&[ProjectedPoint::new(1.0, 2.0)]), "");
    }

    #[test]
    fn test_commands_in_order() {
        let points = vec![
            ProjectedPoint::new(1.0, 2.0),
            ProjectedPoint::new(3.25, 4.0),
            ProjectedPoint::new(-5.0, 6.5),
        ];
        assert_eq!(build_path(&points), "M 1 2 L 3.25 4 L -5 6.5");
    }

    #[test]
    fn test_build_paths_keeps_alignment() {
        let strokes = vec![
            vec![ProjectedPoint::new(0.0, 0.0)],
            vec![ProjectedPoint::new(0.0, 0.0), ProjectedPoint::new(1.0, 1.0)],
        ];
        let paths = build_paths(&strokes);
        assert_eq!(paths.len(), 2);
        assert!(paths[0].is_empty());
        assert_eq!(paths[1], "M 0 0 L 1 1");
    }
}

//! Ordering, cleaning and splitting of fix sequences.
//!
//! Segments are a rendering concept: chronologically contiguous runs with no gap
//! larger than a threshold. Sessions are a recording concept: fixes sharing a
//! session identifier. The two may diverge.

use log::{debug, warn};

use crate::{Fix, TimeWindow};

/// Fixes that passed [`sanitize_fixes`], plus how many were dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SanitizedFixes {
    pub fixes: Vec<Fix>,
    pub skipped: usize,
}

/// Drop fixes with non-finite or out-of-range coordinates.
///
/// NaN coordinates would otherwise poison bounds and projection arithmetic.
pub fn sanitize_fixes(fixes: &[Fix]) -> SanitizedFixes {
    let kept: Vec<Fix> = fixes.iter().filter(|f| f.is_valid()).cloned().collect();
    let skipped = fixes.len() - kept.len();
    if skipped > 0 {
        warn!("[TraceTrack] Skipped {} of {} fixes with invalid coordinates", skipped, fixes.len());
    }
    SanitizedFixes { fixes: kept, skipped }
}

/// Stable sort by timestamp; fixes sharing a timestamp keep their input order.
pub fn sort_by_timestamp(fixes: &mut [Fix]) {
    fixes.sort_by_key(|f| f.timestamp_ms);
}

/// Keep only fixes whose timestamp falls inside `window` (inclusive on both ends).
pub fn filter_window(fixes: &[Fix], window: &TimeWindow) -> Vec<Fix> {
    fixes
        .iter()
        .filter(|f| window.contains(f.timestamp_ms))
        .cloned()
        .collect()
}

/// Split timestamp-sorted fixes wherever consecutive timestamps differ by more
/// than `gap_threshold_ms`.
///
/// A threshold that is absent or `<= 0` disables splitting: the whole input is one
/// segment (no segments for empty input). Concatenating the returned slices always
/// reproduces the input.
///
/// # Example
///
/// ```rust
/// use trace_track::{Fix, segments::split_by_gap};
///
/// let fixes = vec![
///     Fix::new(0.0, 0.0, 0, "s"),
///     Fix::new(0.0, 0.1, 400, "s"),
///     Fix::new(0.0, 0.2, 2_000, "s"),
/// ];
///
/// let segments = split_by_gap(&fixes, Some(500));
/// assert_eq!(segments.len(), 2);
/// assert_eq!(segments[0].len(), 2);
/// assert_eq!(segments[1].len(), 1);
/// ```
pub fn split_by_gap(fixes: &[Fix], gap_threshold_ms: Option<i64>) -> Vec<&[Fix]> {
    if fixes.is_empty() {
        return vec![];
    }

    let threshold = match gap_threshold_ms {
        Some(t) if t > 0 => t,
        _ => return vec![fixes],
    };

    let segments: Vec<&[Fix]> = fixes
        .chunk_by(|prev, next| next.timestamp_ms.saturating_sub(prev.timestamp_ms) <= threshold)
        .collect();

    debug!(
        "[TraceTrack] Split {} fixes into {} segments (gap > {}ms)",
        fixes.len(),
        segments.len(),
        threshold
    );
    segments
}

/// Fixes that share a recording session identifier.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Session {
    pub id: String,
    pub fixes: Vec<Fix>,
}

/// Group fixes by session, ordered by each session's first appearance.
///
/// The input is sorted by timestamp first, so every session's fixes are chronological.
pub fn group_sessions(fixes: &[Fix]) -> Vec<Session> {
    let mut sorted = fixes.to_vec();
    sort_by_timestamp(&mut sorted);

    let mut sessions: Vec<Session> = Vec::new();
    for fix in sorted {
        match sessions.iter_mut().find(|s| s.id == fix.session_id) {
            Some(session) => session.fixes.push(fix),
            None => sessions.push(Session {
                id: fix.session_id.clone(),
                fixes: vec![fix],
            }),
        }
    }
    sessions
}

//! Error types for the fallible edges of the crate.
//!
//! The geometry pipeline itself is total: empty input yields absent bounds, empty
//! paths and zero lengths. Only the exports (and writing them out) can fail.

/// Result type alias for track exports.
pub type Result<T> = std::result::Result<T, TrackError>;

/// Errors raised while exporting a track.
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("No data to export")]
    EmptyTrack,

    #[error("Timestamp {timestamp_ms}ms is outside the representable date range")]
    InvalidTimestamp { timestamp_ms: i64 },

    #[error("GPX error: {0}")]
    Gpx(String),

    #[cfg(feature = "export")]
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Extension for turning an absent value into a [`TrackError::EmptyTrack`].
pub trait OptionExt<T> {
    fn ok_or_empty_track(self) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_empty_track(self) -> Result<T> {
        self.ok_or(TrackError::EmptyTrack)
    }
}

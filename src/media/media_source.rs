use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for media source operations
pub type MediaResult<T> = Result<T, MediaError>;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("no media source loaded")]
    NoSource,

    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path:?}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("seek to {position:.3}s failed: {message}")]
    Seek { position: f64, message: String },

    #[error("audio output unavailable: {0}")]
    Output(String),
}

/// A seekable, playable media handle
///
/// The segment player drives playback only through this trait:
/// - rodio-backed audio output for the application
/// - a virtual-clock mock for tests
///
/// Times and rates are in seconds and multiples of normal speed.
pub trait MediaSource: Send {
    /// Bind the handle to a media file; does not start playback
    fn set_source(&mut self, path: &Path) -> MediaResult<()>;

    /// Unbind the source, stopping any playback
    fn clear_source(&mut self);

    /// (Re)load the bound source, rewinding to the start in a paused state
    fn load(&mut self) -> MediaResult<()>;

    /// Whether a source has been bound
    fn has_source(&self) -> bool;

    /// Start or resume playback from the current time
    fn play(&mut self) -> MediaResult<()>;

    /// Pause playback, keeping the current time
    fn pause(&mut self);

    /// Whether playback is currently paused (or never started)
    fn is_paused(&self) -> bool;

    /// Current playback offset in seconds
    fn current_time(&self) -> f64;

    /// Seek to an offset in seconds
    fn set_current_time(&mut self, secs: f64) -> MediaResult<()>;

    /// Current playback rate (1.0 = normal)
    fn playback_rate(&self) -> f64;

    /// Change the playback rate
    fn set_playback_rate(&mut self, rate: f64);

    /// Whether the backend honours playback rate changes
    fn supports_playback_rate(&self) -> bool {
        true
    }
}

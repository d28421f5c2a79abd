pub mod player;
pub mod timer;

pub use player::SegmentPlayer;
pub use timer::{OneShotTimer, TimerToken};

/// Segment playback state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackState {
    Idle,
    Playing,
}

/// Segment playback configuration
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    pub segment_length: f64, // seconds, fixed for the session
    pub slow_speed: f64,     // rate used when slow playback is on
    pub slow_playback: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            segment_length: 6.0,
            slow_speed: 0.75,
            slow_playback: true,
        }
    }
}

/// Format seconds as `m:ss`
pub fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

use crate::media::media_source::{MediaError, MediaResult, MediaSource};
use std::path::{Path, PathBuf};
use tokio::time::Instant;

/// Mock media source for testing without an audio device
///
/// Playback time advances on tokio's clock, so tests running with paused
/// time see a deterministic `current_time`.
#[derive(Debug)]
pub struct MockMediaSource {
    path: Option<PathBuf>,
    /// Offset at the moment playback last (re)started or paused
    base_time: f64,
    /// Set while playing
    started_at: Option<Instant>,
    rate: f64,
    rate_supported: bool,
    play_count: u32,
    pause_count: u32,
    seeks: Vec<f64>,
    /// `load` fails with a decode error for this path
    undecodable: Option<PathBuf>,
}

impl Default for MockMediaSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMediaSource {
    pub fn new() -> Self {
        Self {
            path: None,
            base_time: 0.0,
            started_at: None,
            rate: 1.0,
            rate_supported: true,
            play_count: 0,
            pause_count: 0,
            seeks: Vec::new(),
            undecodable: None,
        }
    }

    /// A mock that ignores rate changes, like a host without rate support
    pub fn without_rate_support() -> Self {
        Self {
            rate_supported: false,
            ..Self::new()
        }
    }

    /// A mock with a source already bound
    pub fn with_source(path: &str) -> Self {
        Self {
            path: Some(PathBuf::from(path)),
            ..Self::new()
        }
    }

    /// Make `load` fail for `path`, like a corrupt audio file
    pub fn with_undecodable(mut self, path: &str) -> Self {
        self.undecodable = Some(PathBuf::from(path));
        self
    }

    pub fn play_count(&self) -> u32 {
        self.play_count
    }

    pub fn pause_count(&self) -> u32 {
        self.pause_count
    }

    /// Every seek target, in order
    pub fn seeks(&self) -> &[f64] {
        &self.seeks
    }

    pub fn source(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn elapsed(&self) -> f64 {
        self.started_at
            .map(|t| t.elapsed().as_secs_f64() * self.rate)
            .unwrap_or(0.0)
    }
}

impl MediaSource for MockMediaSource {
    fn set_source(&mut self, path: &Path) -> MediaResult<()> {
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    fn clear_source(&mut self) {
        self.base_time = 0.0;
        self.started_at = None;
        self.path = None;
    }

    fn load(&mut self) -> MediaResult<()> {
        let Some(path) = &self.path else {
            return Err(MediaError::NoSource);
        };
        if self.undecodable.as_ref() == Some(path) {
            return Err(MediaError::Decode {
                path: path.clone(),
                message: "unsupported format".to_string(),
            });
        }
        self.base_time = 0.0;
        self.started_at = None;
        Ok(())
    }

    fn has_source(&self) -> bool {
        self.path.is_some()
    }

    fn play(&mut self) -> MediaResult<()> {
        if self.path.is_none() {
            return Err(MediaError::NoSource);
        }
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
        self.play_count += 1;
        Ok(())
    }

    fn pause(&mut self) {
        self.base_time += self.elapsed();
        self.started_at = None;
        self.pause_count += 1;
    }

    fn is_paused(&self) -> bool {
        self.started_at.is_none()
    }

    fn current_time(&self) -> f64 {
        self.base_time + self.elapsed()
    }

    fn set_current_time(&mut self, secs: f64) -> MediaResult<()> {
        if self.path.is_none() {
            return Err(MediaError::NoSource);
        }
        self.base_time = secs.max(0.0);
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
        self.seeks.push(secs);
        Ok(())
    }

    fn playback_rate(&self) -> f64 {
        self.rate
    }

    fn set_playback_rate(&mut self, rate: f64) {
        if !self.rate_supported {
            return;
        }
        // Fold elapsed time at the old rate before switching
        self.base_time += self.elapsed();
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
        self.rate = rate;
    }

    fn supports_playback_rate(&self) -> bool {
        self.rate_supported
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_mock_clock_advances_while_playing() {
        let mut media = MockMediaSource::with_source("a.wav");
        media.set_playback_rate(0.5);
        media.play().unwrap();

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!((media.current_time() - 2.0).abs() < 1e-9);

        media.pause();
        tokio::time::advance(Duration::from_secs(4)).await;
        assert!((media.current_time() - 2.0).abs() < 1e-9);
        assert_eq!(media.play_count(), 1);
        assert_eq!(media.pause_count(), 1);
    }

    #[test]
    fn test_mock_requires_source() {
        let mut media = MockMediaSource::new();
        assert!(matches!(media.play(), Err(MediaError::NoSource)));
        assert!(matches!(media.set_current_time(3.0), Err(MediaError::NoSource)));
    }

    #[test]
    fn test_mock_without_rate_support() {
        let mut media = MockMediaSource::without_rate_support();
        media.set_playback_rate(0.75);
        assert_eq!(media.playback_rate(), 1.0);
        assert!(!media.supports_playback_rate());
    }
}

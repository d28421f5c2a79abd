use crate::core::{Callback, SharedMarks};
use crate::media::{MediaResult, MediaSource};
use crate::playback::timer::OneShotTimer;
use crate::playback::{PlaybackConfig, PlaybackState};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::debug;

struct PlayerInner<M> {
    media: M,
    config: PlaybackConfig,
    state: PlaybackState,
    timer: OneShotTimer,
}

impl<M: MediaSource> PlayerInner<M> {
    fn speed(&self) -> f64 {
        if self.config.slow_playback && self.media.supports_playback_rate() {
            self.config.slow_speed
        } else {
            1.0
        }
    }

    /// Cancel the auto-pause timer and pause, if a segment is playing
    fn stop_pending(&mut self) {
        if self.timer.cancel() {
            self.media.pause();
        }
        self.state = PlaybackState::Idle;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Plays a media source one fixed-length segment at a time
///
/// The segment start is the top of the shared position stack. `play` seeks
/// there and arms a one-shot timer that pauses the source once the segment
/// has elapsed; `next` and `back` only move the stack, so callers compose
/// `next(); play()` themselves.
///
/// Cheap to clone; clones drive the same player.
pub struct SegmentPlayer<M: MediaSource + 'static> {
    inner: Arc<Mutex<PlayerInner<M>>>,
    on_next: Callback,
    on_back: Callback,
    marks: SharedMarks,
}

impl<M: MediaSource + 'static> Clone for SegmentPlayer<M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            on_next: self.on_next.clone(),
            on_back: self.on_back.clone(),
            marks: self.marks.clone(),
        }
    }
}

impl<M: MediaSource + 'static> SegmentPlayer<M> {
    pub fn new(media: M, marks: SharedMarks, config: PlaybackConfig, runtime: Handle) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PlayerInner {
                media,
                config,
                state: PlaybackState::Idle,
                timer: OneShotTimer::new(runtime),
            })),
            on_next: Callback::new(),
            on_back: Callback::new(),
            marks,
        }
    }

    /// Called after `next` moves to a new segment
    pub fn on_next(&self, f: impl Fn() + Send + Sync + 'static) {
        self.on_next.set(f);
    }

    /// Called after `back` returns to the previous segment
    pub fn on_back(&self, f: impl Fn() + Send + Sync + 'static) {
        self.on_back.set(f);
    }

    pub fn marks(&self) -> &SharedMarks {
        &self.marks
    }

    /// Bind a new media file and return to Idle
    ///
    /// On failure no source is left bound.
    pub fn load(&self, path: &Path) -> MediaResult<()> {
        let mut inner = lock(&self.inner);
        inner.stop_pending();
        let result = match inner.media.set_source(path) {
            Ok(()) => inner.media.load(),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            inner.media.clear_source();
            return Err(e);
        }
        debug!("Player bound to {:?}", path);
        Ok(())
    }

    /// Play the current segment from its start
    pub fn play(&self) -> MediaResult<()> {
        let mut inner = lock(&self.inner);
        inner.stop_pending();

        let position = self.marks.current_position();
        let speed = inner.speed();
        inner.media.set_current_time(position)?;
        inner.media.set_playback_rate(speed);
        inner.media.play()?;

        let delay = Duration::from_secs_f64(inner.config.segment_length / speed);
        let weak = Arc::downgrade(&self.inner);
        inner.timer.arm(delay, move |token| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let mut inner = lock(&inner);
            if inner.timer.claim(token) {
                inner.media.pause();
                inner.state = PlaybackState::Idle;
                debug!("Segment finished at {:.2}s", inner.media.current_time());
            }
        });
        inner.state = PlaybackState::Playing;

        debug!(
            "Playing segment at {:.2}s ({:.2}x, {:.2}s)",
            position,
            speed,
            delay.as_secs_f64()
        );
        Ok(())
    }

    /// Same as `play`: restart the current segment
    pub fn replay(&self) -> MediaResult<()> {
        self.play()
    }

    /// Stop the current segment; no-op when Idle
    pub fn stop(&self) {
        lock(&self.inner).stop_pending();
    }

    /// Advance the position stack by one segment
    pub fn next(&self) {
        let segment_length = lock(&self.inner).config.segment_length;
        self.marks.with(|marks| {
            if marks.is_empty() {
                marks.push(0.0);
            } else {
                let pos = marks.current_position() + segment_length;
                marks.push(pos);
            }
        });
        self.on_next.fire();
    }

    /// Return to the previous segment; no-op at the start
    pub fn back(&self) {
        let moved = self.marks.with(|marks| {
            if marks.current_position() <= 0.0 {
                return false;
            }
            marks.pop();
            true
        });
        if moved {
            self.on_back.fire();
        }
    }

    /// Seek the media to the current position without playing
    ///
    /// Navigation never touches the media; this is how a freshly loaded
    /// transcript lines the media up with its restored position.
    pub fn cue(&self) -> MediaResult<()> {
        let mut inner = lock(&self.inner);
        inner.stop_pending();
        if inner.media.has_source() {
            let position = self.marks.current_position();
            inner.media.set_current_time(position)?;
        }
        Ok(())
    }

    /// Seconds left before the current segment auto-pauses, 0 when Idle
    pub fn remaining_segment_time(&self) -> f64 {
        let inner = lock(&self.inner);
        if inner.state != PlaybackState::Playing {
            return 0.0;
        }
        (self.marks.current_position() + inner.config.segment_length) - inner.media.current_time()
    }

    pub fn state(&self) -> PlaybackState {
        lock(&self.inner).state
    }

    pub fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Playing
    }

    /// Media playback offset, for display
    pub fn current_time(&self) -> f64 {
        lock(&self.inner).media.current_time()
    }

    pub fn current_position(&self) -> f64 {
        self.marks.current_position()
    }

    pub fn segment_length(&self) -> f64 {
        lock(&self.inner).config.segment_length
    }

    /// Rate the next segment will play at
    pub fn speed(&self) -> f64 {
        lock(&self.inner).speed()
    }

    pub fn slow_playback(&self) -> bool {
        lock(&self.inner).config.slow_playback
    }

    /// Toggle slow playback; takes effect from the next `play`
    pub fn set_slow_playback(&self, slow: bool) {
        lock(&self.inner).config.slow_playback = slow;
    }

    pub fn has_source(&self) -> bool {
        lock(&self.inner).media.has_source()
    }

    /// Borrow the media source
    pub fn with_media<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        f(&lock(&self.inner).media)
    }
}

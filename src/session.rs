use crate::core::SharedMarks;
use crate::editor::{AutosaveCoordinator, DEFAULT_AUTOSAVE_INTERVAL};
use crate::media::{MediaError, MediaSource};
use crate::playback::{PlaybackConfig, SegmentPlayer};
use crate::storage::KeyValueStore;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{info, warn};

/// Discrete user commands, bound to buttons and shortcuts by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Advance one segment and play it
    Next,
    /// Go back one segment and play it
    Back,
    /// Play the current segment again
    Replay,
    /// Save the transcript now
    Save,
    /// Stop the current segment
    Stop,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub playback: PlaybackConfig,
    pub autosave_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            playback: PlaybackConfig::default(),
            autosave_interval: DEFAULT_AUTOSAVE_INTERVAL,
        }
    }
}

/// A segment player and an autosave coordinator sharing one position stack
///
/// Moving between segments marks the transcript dirty, so the position
/// history is saved alongside the text.
pub struct Session<M: MediaSource + 'static> {
    player: SegmentPlayer<M>,
    autosave: AutosaveCoordinator,
    media_path: Option<PathBuf>,
}

impl<M: MediaSource + 'static> Session<M> {
    pub fn new(
        media: M,
        store: Arc<dyn KeyValueStore>,
        config: SessionConfig,
        runtime: Handle,
    ) -> Self {
        let marks = SharedMarks::default();
        let player = SegmentPlayer::new(media, marks.clone(), config.playback, runtime.clone());
        let autosave = AutosaveCoordinator::new(store, marks, config.autosave_interval, runtime);

        let on_next = autosave.clone();
        player.on_next(move || on_next.mark_dirty());
        let on_back = autosave.clone();
        player.on_back(move || on_back.mark_dirty());

        Self {
            player,
            autosave,
            media_path: None,
        }
    }

    pub fn player(&self) -> &SegmentPlayer<M> {
        &self.player
    }

    pub fn autosave(&self) -> &AutosaveCoordinator {
        &self.autosave
    }

    pub fn media_path(&self) -> Option<&Path> {
        self.media_path.as_deref()
    }

    /// Open an audio file and the transcript saved under its file name
    ///
    /// The transcript is switched first, so a store failure leaves both the
    /// audio and the transcript on the previous file. If the audio then
    /// fails to load, the previous file and transcript are loaded again.
    pub fn open(&mut self, path: &Path) -> Result<()> {
        let name = transcript_name(path)
            .with_context(|| format!("No file name in {:?}", path))?;
        let previous_name = self.autosave.name();

        self.autosave
            .load(&name)
            .with_context(|| format!("Failed to load transcript {:?}", name))?;

        if let Err(e) = self.player.load(path) {
            self.restore(&previous_name);
            return Err(e).with_context(|| format!("Failed to load audio {:?}", path));
        }
        self.media_path = Some(path.to_path_buf());

        self.player
            .cue()
            .with_context(|| format!("Failed to seek {:?}", path))?;

        info!("Opened {:?} as transcript {:?}", path, name);
        Ok(())
    }

    /// Go back to the previously open file after a failed `open`
    fn restore(&mut self, previous_name: &str) {
        if let Err(e) = self.autosave.load(previous_name) {
            warn!("Failed to reload transcript {:?}: {}", previous_name, e);
        }

        let Some(previous) = self.media_path.clone() else {
            return;
        };
        let reloaded = self.player.load(&previous).and_then(|()| self.player.cue());
        if let Err(e) = reloaded {
            warn!("Failed to reload audio {:?}: {}", previous, e);
            self.media_path = None;
        }
    }

    pub fn handle(&self, command: Command) -> Result<()> {
        match command {
            Command::Next => {
                self.require_source()?;
                self.player.next();
                self.player.play().context("Playback failed")?;
            }
            Command::Back => {
                self.require_source()?;
                self.player.back();
                self.player.play().context("Playback failed")?;
            }
            Command::Replay => {
                self.player.replay().context("Playback failed")?;
            }
            Command::Save => {
                self.autosave.save().context("Save failed")?;
            }
            Command::Stop => self.player.stop(),
        }
        Ok(())
    }

    /// Navigation needs audio; without it the marks must stay untouched
    fn require_source(&self) -> Result<()> {
        if self.player.has_source() {
            Ok(())
        } else {
            Err(MediaError::NoSource).context("Playback failed")
        }
    }
}

/// Transcripts are keyed by the media file's name
pub fn transcript_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TranscriptRecord;
    use crate::media::MockMediaSource;
    use crate::storage::{MemoryStore, StorageError, StorageResult};

    fn session(store: Arc<MemoryStore>) -> Session<MockMediaSource> {
        Session::new(MockMediaSource::new(), store, SessionConfig::default(), Handle::current())
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_is_autosaved() {
        let store = Arc::new(MemoryStore::new());
        let mut session = session(store.clone());
        session.open(Path::new("/tmp/audio/interview.mp3")).unwrap();
        assert_eq!(session.autosave().name(), "interview.mp3");

        session.handle(Command::Next).unwrap();
        session.handle(Command::Next).unwrap();
        assert!(session.autosave().is_dirty());
        assert_eq!(session.player().current_position(), 6.0);

        tokio::time::sleep(Duration::from_secs(6)).await;
        let json = store.get("interview.mp3").unwrap().unwrap();
        let record = TranscriptRecord::from_json(&json).unwrap();
        assert_eq!(record.marks, "[0.0,6.0]");
        assert_eq!(record.text, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_play_the_right_segment() {
        let mut session = session(Arc::new(MemoryStore::new()));
        session.open(Path::new("talk.wav")).unwrap();

        session.handle(Command::Next).unwrap();
        session.handle(Command::Next).unwrap();
        session.handle(Command::Next).unwrap();
        session.handle(Command::Back).unwrap();
        session.handle(Command::Replay).unwrap();

        // cue at open, then one seek per play
        let seeks = session.player().with_media(|m| m.seeks().to_vec());
        assert_eq!(seeks, vec![0.0, 0.0, 6.0, 12.0, 6.0, 6.0]);
        assert!(session.player().is_playing());

        session.handle(Command::Stop).unwrap();
        assert!(!session.player().is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_restores_position_and_text() {
        let store = Arc::new(MemoryStore::new());
        store
            .set("talk.wav", r#"{"text":"hello there","marks":"[0,6,12,18]"}"#)
            .unwrap();

        let mut session = session(store.clone());
        session.open(Path::new("talk.wav")).unwrap();
        assert_eq!(session.autosave().text(), "hello there");
        assert_eq!(session.player().current_position(), 18.0);
        assert_eq!(session.player().with_media(|m| m.seeks().to_vec()), vec![18.0]);

        session.autosave().edit("hello there, general");
        session.handle(Command::Save).unwrap();
        let record = TranscriptRecord::from_json(&store.get("talk.wav").unwrap().unwrap()).unwrap();
        assert_eq!(record.text, "hello there, general");
        assert_eq!(record.marks, "[0.0,6.0,12.0,18.0]");
    }

    #[tokio::test]
    async fn test_back_at_start_does_not_dirty() {
        let mut session = session(Arc::new(MemoryStore::new()));
        session.open(Path::new("talk.wav")).unwrap();
        session.handle(Command::Back).unwrap();
        assert!(!session.autosave().is_dirty());
    }

    /// Accepts reads, rejects every write
    struct ReadOnlyStore(MemoryStore);

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, key: &str) -> StorageResult<Option<String>> {
            self.0.get(key)
        }

        fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::Io {
                path: "transcripts.json".into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }

        fn remove(&self, _key: &str) -> StorageResult<bool> {
            Ok(false)
        }

        fn keys(&self) -> StorageResult<Vec<String>> {
            self.0.keys()
        }
    }

    fn bound_source(session: &Session<MockMediaSource>) -> Option<PathBuf> {
        session.player().with_media(|m| m.source().map(Path::to_path_buf))
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_flush_keeps_previous_file() {
        let mut session = Session::new(
            MockMediaSource::new(),
            Arc::new(ReadOnlyStore(MemoryStore::new())),
            SessionConfig::default(),
            Handle::current(),
        );
        session.open(Path::new("a.wav")).unwrap();
        session.autosave().edit("draft for a");

        let err = session.open(Path::new("b.wav")).unwrap_err();
        assert!(format!("{:#}", err).contains("b.wav"));

        assert_eq!(bound_source(&session), Some(PathBuf::from("a.wav")));
        assert_eq!(session.media_path(), Some(Path::new("a.wav")));
        assert_eq!(session.autosave().name(), "a.wav");
        assert_eq!(session.autosave().text(), "draft for a");
        assert!(session.autosave().is_dirty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_undecodable_audio_restores_previous_file() {
        let store = Arc::new(MemoryStore::new());
        store
            .set("a.wav", r#"{"text":"notes on a","marks":"[0,6]"}"#)
            .unwrap();
        let mut session = Session::new(
            MockMediaSource::new().with_undecodable("broken.wav"),
            store.clone(),
            SessionConfig::default(),
            Handle::current(),
        );
        session.open(Path::new("a.wav")).unwrap();
        session.handle(Command::Next).unwrap();
        session.autosave().edit("notes on a, more");

        assert!(session.open(Path::new("broken.wav")).is_err());

        assert_eq!(bound_source(&session), Some(PathBuf::from("a.wav")));
        assert_eq!(session.media_path(), Some(Path::new("a.wav")));
        assert_eq!(session.autosave().name(), "a.wav");
        // The flush before switching kept the newer text and position
        assert_eq!(session.autosave().text(), "notes on a, more");
        assert_eq!(session.player().current_position(), 12.0);
        assert!(store.get("broken.wav").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_undecodable_first_file_leaves_nothing_open() {
        let mut session = Session::new(
            MockMediaSource::new().with_undecodable("broken.wav"),
            Arc::new(MemoryStore::new()),
            SessionConfig::default(),
            Handle::current(),
        );
        assert!(session.open(Path::new("broken.wav")).is_err());
        assert_eq!(bound_source(&session), None);
        assert_eq!(session.media_path(), None);
        assert_eq!(session.autosave().name(), "");
    }

    #[tokio::test]
    async fn test_navigation_without_audio_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let session = session(store.clone());

        assert!(session.handle(Command::Next).is_err());
        assert!(session.handle(Command::Back).is_err());
        assert!(session.player().marks().is_empty());
        assert!(!session.autosave().is_dirty());
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn test_transcript_name() {
        assert_eq!(transcript_name(Path::new("/a/b/c.mp3")).as_deref(), Some("c.mp3"));
        assert_eq!(transcript_name(Path::new("/")), None);
    }
}

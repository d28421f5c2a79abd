use crate::core::{Callback, PositionStack, SharedMarks, TranscriptRecord};
use crate::playback::{OneShotTimer, TimerToken};
use crate::storage::{KeyValueStore, StorageResult};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

/// Default quiet period before an automatic save
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(5);

struct AutosaveInner {
    name: String,
    text: String,
    dirty: bool,
    interval: Duration,
    timer: OneShotTimer,
}

fn lock(mutex: &Mutex<AutosaveInner>) -> MutexGuard<'_, AutosaveInner> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Keeps the transcript text and the position stack saved
///
/// Every dirty signal (a text edit, or a move between segments) re-arms a
/// debounce timer; the record is written once the signals stop for the
/// configured interval. `on_dirty` fires on the first signal after a save,
/// `on_save` after every successful save.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct AutosaveCoordinator {
    inner: Arc<Mutex<AutosaveInner>>,
    store: Arc<dyn KeyValueStore>,
    marks: SharedMarks,
    on_dirty: Callback,
    on_save: Callback,
}

/// Non-owning handle held by the debounce task
struct WeakAutosave {
    inner: Weak<Mutex<AutosaveInner>>,
    store: Arc<dyn KeyValueStore>,
    marks: SharedMarks,
    on_dirty: Callback,
    on_save: Callback,
}

impl WeakAutosave {
    fn upgrade(&self) -> Option<AutosaveCoordinator> {
        Some(AutosaveCoordinator {
            inner: self.inner.upgrade()?,
            store: self.store.clone(),
            marks: self.marks.clone(),
            on_dirty: self.on_dirty.clone(),
            on_save: self.on_save.clone(),
        })
    }
}

impl AutosaveCoordinator {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        marks: SharedMarks,
        interval: Duration,
        runtime: Handle,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(AutosaveInner {
                name: String::new(),
                text: String::new(),
                dirty: false,
                interval,
                timer: OneShotTimer::new(runtime),
            })),
            store,
            marks,
            on_dirty: Callback::new(),
            on_save: Callback::new(),
        }
    }

    fn downgrade(&self) -> WeakAutosave {
        WeakAutosave {
            inner: Arc::downgrade(&self.inner),
            store: self.store.clone(),
            marks: self.marks.clone(),
            on_dirty: self.on_dirty.clone(),
            on_save: self.on_save.clone(),
        }
    }

    /// Called once per run of unsaved changes
    pub fn on_dirty(&self, f: impl Fn() + Send + Sync + 'static) {
        self.on_dirty.set(f);
    }

    /// Called after each successful save
    pub fn on_save(&self, f: impl Fn() + Send + Sync + 'static) {
        self.on_save.set(f);
    }

    pub fn name(&self) -> String {
        lock(&self.inner).name.clone()
    }

    pub fn text(&self) -> String {
        lock(&self.inner).text.clone()
    }

    pub fn is_dirty(&self) -> bool {
        lock(&self.inner).dirty
    }

    pub fn has_pending_save(&self) -> bool {
        lock(&self.inner).timer.is_armed()
    }

    pub fn marks(&self) -> &SharedMarks {
        &self.marks
    }

    /// Replace the transcript text and treat it as a change
    pub fn edit(&self, text: impl Into<String>) {
        lock(&self.inner).text = text.into();
        self.mark_dirty();
    }

    /// Note a change and restart the debounce window
    pub fn mark_dirty(&self) {
        let first = {
            let mut inner = lock(&self.inner);
            let first = !inner.dirty;
            inner.dirty = true;

            let interval = inner.interval;
            let weak = self.downgrade();
            inner.timer.arm(interval, move |token| {
                if let Some(this) = weak.upgrade() {
                    this.debounce_fired(token);
                }
            });
            first
        };

        if first {
            self.on_dirty.fire();
        }
    }

    fn debounce_fired(&self, token: TimerToken) {
        let result = {
            let mut inner = lock(&self.inner);
            if !inner.timer.claim(token) {
                return;
            }
            self.persist(&mut inner)
        };

        match result {
            Ok(()) => self.on_save.fire(),
            // Stay dirty so the next change retries
            Err(e) => error!("Autosave failed: {}", e),
        }
    }

    fn persist(&self, inner: &mut AutosaveInner) -> StorageResult<()> {
        let record = TranscriptRecord::new(&inner.text, &self.marks.snapshot());
        let json = record.to_json()?;
        self.store.set(&inner.name, &json)?;
        inner.dirty = false;
        debug!("Saved transcript {:?} ({} bytes)", inner.name, json.len());
        Ok(())
    }

    /// Save now, cancelling any pending automatic save
    pub fn save(&self) -> StorageResult<()> {
        {
            let mut inner = lock(&self.inner);
            inner.timer.cancel();
            self.persist(&mut inner)?;
        }
        self.on_save.fire();
        Ok(())
    }

    /// Switch to the transcript stored under `name`
    ///
    /// Unsaved changes to the current transcript are saved first. A missing
    /// record gives an empty transcript and position stack; a malformed one
    /// is logged and treated the same way. Only a failing store is an error.
    pub fn load(&self, name: &str) -> StorageResult<()> {
        if self.is_dirty() {
            self.save()?;
        }

        let stored = self.store.get(name)?;
        let (text, marks) = match stored {
            None => (String::new(), PositionStack::new()),
            Some(json) => match decode_record(&json) {
                Ok(loaded) => loaded,
                Err(e) => {
                    warn!("Error loading {:?}: {}; starting empty", name, e);
                    (String::new(), PositionStack::new())
                }
            },
        };

        let mut inner = lock(&self.inner);
        inner.timer.cancel();
        inner.dirty = false;
        inner.name = name.to_string();
        inner.text = text;
        self.marks.replace(marks);

        info!("Loaded transcript {:?} ({} marks)", name, self.marks.len());
        Ok(())
    }
}

fn decode_record(json: &str) -> serde_json::Result<(String, PositionStack)> {
    let record = TranscriptRecord::from_json(json)?;
    let marks = record.positions()?;
    Ok((record.text, marks))
}

use crate::editor::AutosaveCoordinator;
use chrono::{DateTime, Local};
use imgui::{Condition, Ui};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Time for the save indicator to fade fully in or out
const FADE_TIME: Duration = Duration::from_millis(200);

type Stamp = Arc<Mutex<Option<DateTime<Local>>>>;

fn read(stamp: &Stamp) -> Option<DateTime<Local>> {
    *stamp.lock().unwrap_or_else(PoisonError::into_inner)
}

fn touch(stamp: &Stamp) {
    *stamp.lock().unwrap_or_else(PoisonError::into_inner) = Some(Local::now());
}

/// "Saved" badge that fades out on unsaved changes and back in on save
///
/// Visibility follows the coordinator's dirty flag, read every frame. The
/// save and dirty notifications only stamp the times shown next to it, so
/// a save notification arriving late from the timer thread cannot mark a
/// dirty transcript as saved.
pub struct SaveIndicator {
    last_saved: Stamp,
    unsaved_since: Stamp,
    alpha: f32,
}

impl SaveIndicator {
    pub fn new() -> Self {
        Self {
            last_saved: Stamp::default(),
            unsaved_since: Stamp::default(),
            alpha: 1.0,
        }
    }

    /// Hook the indicator to an autosave coordinator's observers
    pub fn attach(&self, autosave: &AutosaveCoordinator) {
        let unsaved_since = self.unsaved_since.clone();
        autosave.on_dirty(move || touch(&unsaved_since));
        let last_saved = self.last_saved.clone();
        autosave.on_save(move || touch(&last_saved));
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Status text for the current state
    pub fn label(&self, dirty: bool) -> String {
        let (prefix, stamp) = if dirty {
            ("unsaved since", read(&self.unsaved_since))
        } else {
            ("saved", read(&self.last_saved))
        };
        match stamp {
            Some(at) => format!("{} {}", prefix, at.format("%H:%M:%S")),
            None if dirty => "unsaved".to_string(),
            None => String::new(),
        }
    }

    /// Step the fade animation by one frame
    pub fn update(&mut self, delta: Duration, dirty: bool) {
        let target = if dirty { 0.0 } else { 1.0 };
        let step = delta.as_secs_f32() / FADE_TIME.as_secs_f32();
        if self.alpha < target {
            self.alpha = (self.alpha + step).min(target);
        } else {
            self.alpha = (self.alpha - step).max(target);
        }
    }
}

impl Default for SaveIndicator {
    fn default() -> Self {
        Self::new()
    }
}

/// Transcript text editor
pub struct TranscriptEditorWindow {
    buffer: String,
    indicator: SaveIndicator,
}

impl TranscriptEditorWindow {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            indicator: SaveIndicator::new(),
        }
    }

    pub fn attach(&self, autosave: &AutosaveCoordinator) {
        self.indicator.attach(autosave);
    }

    /// Reload the buffer after a transcript switch
    pub fn sync_from(&mut self, autosave: &AutosaveCoordinator) {
        self.buffer = autosave.text();
    }

    pub fn render(&mut self, ui: &Ui, autosave: &AutosaveCoordinator, delta: Duration) {
        let dirty = autosave.is_dirty();
        self.indicator.update(delta, dirty);

        ui.window("Transcript")
            .size([640.0, 480.0], Condition::FirstUseEver)
            .position([20.0, 180.0], Condition::FirstUseEver)
            .build(|| {
                let name = autosave.name();
                ui.text(if name.is_empty() { "(untitled)" } else { name.as_str() });
                ui.same_line();
                ui.text_colored([0.3, 0.8, 0.4, self.indicator.alpha()], "Saved");
                ui.same_line();
                ui.text_disabled(self.indicator.label(dirty));

                let avail = ui.content_region_avail();
                if ui
                    .input_text_multiline("##transcript", &mut self.buffer, avail)
                    .build()
                {
                    autosave.edit(self.buffer.clone());
                }
            });
    }
}

impl Default for TranscriptEditorWindow {
    fn default() -> Self {
        Self::new()
    }
}

use crate::session::Command;
use imgui::{Condition, Ui};
use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Keyboard shortcut manager
pub struct ShortcutManager {
    shortcuts: Vec<Shortcut>,
}

#[derive(Clone)]
pub struct Shortcut {
    pub key: PhysicalKey,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub action: ShortcutAction,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShortcutAction {
    OpenFile,
    Next,
    Back,
    Replay,
    Save,
    Stop,
    Quit,
}

impl ShortcutAction {
    /// The session command this action maps to, if any
    pub fn command(self) -> Option<Command> {
        match self {
            ShortcutAction::Next => Some(Command::Next),
            ShortcutAction::Back => Some(Command::Back),
            ShortcutAction::Replay => Some(Command::Replay),
            ShortcutAction::Save => Some(Command::Save),
            ShortcutAction::Stop => Some(Command::Stop),
            ShortcutAction::OpenFile | ShortcutAction::Quit => None,
        }
    }
}

impl ShortcutManager {
    pub fn new() -> Self {
        let mut manager = Self {
            shortcuts: Vec::new(),
        };
        manager.register_defaults();
        manager
    }

    fn register_defaults(&mut self) {
        // Segment navigation, on the home row
        self.register_alt(KeyCode::KeyJ, ShortcutAction::Back, "Previous segment");
        self.register_alt(KeyCode::KeyK, ShortcutAction::Replay, "Replay segment");
        self.register_alt(KeyCode::KeyL, ShortcutAction::Next, "Next segment");
        self.register(Shortcut {
            key: PhysicalKey::Code(KeyCode::Escape),
            ctrl: false,
            shift: false,
            alt: false,
            action: ShortcutAction::Stop,
            description: "Stop".to_string(),
        });

        // File operations
        self.register_alt(KeyCode::KeyS, ShortcutAction::Save, "Save transcript");
        self.register_alt(KeyCode::KeyO, ShortcutAction::OpenFile, "Open audio file");
        self.register(Shortcut {
            key: PhysicalKey::Code(KeyCode::KeyQ),
            ctrl: true,
            shift: false,
            alt: false,
            action: ShortcutAction::Quit,
            description: "Quit".to_string(),
        });
    }

    fn register_alt(&mut self, code: KeyCode, action: ShortcutAction, description: &str) {
        self.register(Shortcut {
            key: PhysicalKey::Code(code),
            ctrl: false,
            shift: false,
            alt: true,
            action,
            description: description.to_string(),
        });
    }

    fn register(&mut self, shortcut: Shortcut) {
        self.shortcuts.push(shortcut);
    }

    /// Process a key event and return the matching action (if any)
    pub fn process_event(&self, event: &KeyEvent, ctrl: bool, shift: bool, alt: bool) -> Option<ShortcutAction> {
        if event.state != ElementState::Pressed || event.repeat {
            return None;
        }
        self.lookup(event.physical_key, ctrl, shift, alt)
    }

    /// Find the action bound to a key and modifier combination
    pub fn lookup(&self, key: PhysicalKey, ctrl: bool, shift: bool, alt: bool) -> Option<ShortcutAction> {
        self.shortcuts
            .iter()
            .find(|s| s.key == key && s.ctrl == ctrl && s.shift == shift && s.alt == alt)
            .map(|s| s.action)
    }

    /// Render a shortcuts help window
    pub fn render_help(&self, ui: &Ui, is_open: &mut bool) {
        ui.window("Keyboard Shortcuts")
            .size([320.0, 220.0], Condition::FirstUseEver)
            .position([500.0, 200.0], Condition::FirstUseEver)
            .opened(is_open)
            .build(|| {
                for shortcut in &self.shortcuts {
                    ui.text(format!("  {:12} - {}", shortcut_label(shortcut), shortcut.description));
                }
            });
    }
}

fn shortcut_label(shortcut: &Shortcut) -> String {
    let mut label = String::new();
    if shortcut.ctrl {
        label.push_str("Ctrl+");
    }
    if shortcut.shift {
        label.push_str("Shift+");
    }
    if shortcut.alt {
        label.push_str("Alt+");
    }
    label.push_str(&key_to_string(shortcut.key));
    label
}

fn key_to_string(key: PhysicalKey) -> String {
    match key {
        PhysicalKey::Code(code) => match code {
            KeyCode::Escape => "Esc".to_string(),
            KeyCode::KeyJ => "J".to_string(),
            KeyCode::KeyK => "K".to_string(),
            KeyCode::KeyL => "L".to_string(),
            KeyCode::KeyO => "O".to_string(),
            KeyCode::KeyQ => "Q".to_string(),
            KeyCode::KeyS => "S".to_string(),
            _ => format!("{:?}", code),
        },
        _ => "?".to_string(),
    }
}

impl Default for ShortcutManager {
    fn default() -> Self {
        Self::new()
    }
}

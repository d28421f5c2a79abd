pub mod shortcuts;
pub mod dialogs;
pub mod transport;
pub mod editor_window;

pub use shortcuts::{ShortcutManager, ShortcutAction};
pub use dialogs::FileDialogs;
pub use transport::TransportWindow;
pub use editor_window::TranscriptEditorWindow;

use rfd::FileDialog;
use std::path::PathBuf;

/// Audio formats the default rodio decoders handle
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac"];

/// File dialog helper
pub struct FileDialogs;

impl FileDialogs {
    /// Open a file dialog for selecting an audio file to transcribe
    pub fn open_audio_file() -> Option<PathBuf> {
        FileDialog::new()
            .add_filter("Audio Files", AUDIO_EXTENSIONS)
            .add_filter("All Files", &["*"])
            .set_title("Open Audio File")
            .pick_file()
    }
}

use crate::playback::PlaybackConfig;
use crate::session::SessionConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Persistent application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub segment_length_secs: f64,
    pub slow_playback: bool,
    pub slow_speed: f64,
    pub autosave_interval_secs: f64,
    /// Overrides the default transcript store location
    pub store_path: Option<PathBuf>,
    /// Reopened at start-up when no file is given on the command line
    pub last_media: Option<PathBuf>,
    pub show_shortcuts: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        let playback = PlaybackConfig::default();
        Self {
            segment_length_secs: playback.segment_length,
            slow_playback: playback.slow_playback,
            slow_speed: playback.slow_speed,
            autosave_interval_secs: 5.0,
            store_path: None,
            last_media: None,
            show_shortcuts: false,
        }
    }
}

impl AppSettings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("segscribe").join("settings.json"))
    }

    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Read settings, falling back to defaults on any problem
    pub fn load_from(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring unreadable settings {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().context("No config directory on this system")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
        Ok(())
    }

    /// Session parameters, with out-of-range values replaced by defaults
    pub fn session_config(&self) -> SessionConfig {
        let defaults = SessionConfig::default();

        let segment_length = if self.segment_length_secs.is_finite()
            && self.segment_length_secs > 0.0
        {
            self.segment_length_secs
        } else {
            warn!("Invalid segment length {}, using default", self.segment_length_secs);
            defaults.playback.segment_length
        };

        let slow_speed = if self.slow_speed.is_finite()
            && self.slow_speed > 0.0
            && self.slow_speed <= 4.0
        {
            self.slow_speed
        } else {
            warn!("Invalid slow speed {}, using default", self.slow_speed);
            defaults.playback.slow_speed
        };

        let autosave_interval = if self.autosave_interval_secs.is_finite()
            && self.autosave_interval_secs > 0.0
        {
            Duration::from_secs_f64(self.autosave_interval_secs)
        } else {
            warn!(
                "Invalid autosave interval {}, using default",
                self.autosave_interval_secs
            );
            defaults.autosave_interval
        };

        SessionConfig {
            playback: PlaybackConfig {
                segment_length,
                slow_speed,
                slow_playback: self.slow_playback,
            },
            autosave_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_or_broken_settings_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(AppSettings::load_from(&dir.path().join("none.json")), AppSettings::default());

        let path = dir.path().join("settings.json");
        fs::write(&path, "{{{").unwrap();
        assert_eq!(AppSettings::load_from(&path), AppSettings::default());
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"segment_length_secs": 4.0}"#).unwrap();

        let settings = AppSettings::load_from(&path);
        assert_eq!(settings.segment_length_secs, 4.0);
        assert_eq!(settings.slow_speed, 0.75);
        assert!(settings.slow_playback);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg").join("settings.json");
        let settings = AppSettings {
            last_media: Some(PathBuf::from("/music/talk.mp3")),
            slow_playback: false,
            ..AppSettings::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(AppSettings::load_from(&path), settings);
    }

    #[test]
    fn test_session_config_rejects_bad_values() {
        let settings = AppSettings {
            segment_length_secs: 0.0,
            slow_speed: -1.0,
            autosave_interval_secs: f64::NAN,
            ..AppSettings::default()
        };
        let config = settings.session_config();
        assert_eq!(config.playback.segment_length, 6.0);
        assert_eq!(config.playback.slow_speed, 0.75);
        assert_eq!(config.autosave_interval, Duration::from_secs(5));

        let config = AppSettings {
            segment_length_secs: 10.0,
            autosave_interval_secs: 2.5,
            ..AppSettings::default()
        }
        .session_config();
        assert_eq!(config.playback.segment_length, 10.0);
        assert_eq!(config.autosave_interval, Duration::from_millis(2500));
    }
}

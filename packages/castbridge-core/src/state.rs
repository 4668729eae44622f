//! Adapter configuration and persisted user settings.
//!
//! [`Config`] holds everything the adapter reads at invocation time: the
//! control and discovery command names, their fixed argument lists, the
//! default speaker target, and the playable-extension set. It is shared as
//! `Arc<RwLock<Config>>` so the host can mutate it between sessions while
//! live sessions keep their pinned speaker.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

/// Reserved speaker target meaning "broadcast to every known speaker".
pub const ALL_SPEAKERS: &str = "_all_";

/// Environment variable consulted for the initial default speaker.
pub const SPEAKER_ENV_VAR: &str = "CASTBRIDGE_SPEAKER";

/// Shared, mutable configuration handle.
pub type SharedConfig = Arc<RwLock<Config>>;

/// Configuration for the Castbridge adapter.
///
/// All fields have sensible defaults.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    // Control utility
    /// Executable that translates control actions into speaker commands.
    pub command: String,

    /// Fixed flags prepended to every control invocation.
    pub shared_args: Vec<String>,

    // Discovery utility
    /// Executable that enumerates reachable speakers.
    pub discover_command: String,

    /// Fixed flags for the discovery invocation.
    pub discover_args: Vec<String>,

    // Targeting
    /// Speaker identifier (name or network address) or [`ALL_SPEAKERS`].
    pub default_speaker: String,

    // Playability
    /// Lowercase file extensions the adapter will offer to play.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_extensions() -> Vec<String> {
    ["mp3", "m4a", "mp4", "flac", "ogg", "wma", "wav", "aif", "aiff", "aac"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command: "sonos".to_string(),
            shared_args: Vec::new(),
            discover_command: "sonos".to_string(),
            discover_args: vec!["discover".to_string()],
            default_speaker: ALL_SPEAKERS.to_string(),
            extensions: default_extensions(),
        }
    }
}

impl Config {
    /// Creates a configuration from defaults plus the environment override.
    ///
    /// If [`SPEAKER_ENV_VAR`] is set and non-empty, its value becomes the
    /// initial default speaker.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(speaker) = std::env::var(SPEAKER_ENV_VAR) {
            if !speaker.is_empty() {
                config.default_speaker = speaker;
            }
        }
        config
    }

    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.command.is_empty() {
            return Err("command must not be empty".to_string());
        }
        if self.discover_command.is_empty() {
            return Err("discover_command must not be empty".to_string());
        }
        if self.default_speaker.is_empty() {
            return Err("default_speaker must not be empty".to_string());
        }
        Ok(())
    }

    /// Wraps the configuration in the shared handle used across components.
    pub fn into_shared(self) -> SharedConfig {
        Arc::new(RwLock::new(self))
    }

    /// Whether the path's extension is in the playable set (case-insensitive).
    pub fn is_playable_path(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Saved Settings (persisted)
// ─────────────────────────────────────────────────────────────────────────────

const SETTINGS_FILE: &str = "settings.json";

/// Global mutex to serialize all settings file operations.
/// Prevents race conditions from concurrent save operations.
static SETTINGS_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn settings_lock() -> &'static Mutex<()> {
    SETTINGS_LOCK.get_or_init(|| Mutex::new(()))
}

/// Persisted user settings.
///
/// Currently only the chosen default speaker, written when the user picks a
/// target through the selection flow so it survives restarts.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SavedSettings {
    /// The speaker the user last selected, if any.
    pub default_speaker: Option<String>,
}

impl SavedSettings {
    /// Loads saved settings from the data directory.
    ///
    /// Returns default (empty) settings if the file doesn't exist or is invalid.
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(SETTINGS_FILE);
        match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Saves settings to the data directory.
    ///
    /// Uses atomic write (temp file + rename) to prevent corruption on crash.
    /// Creates the directory if it doesn't exist.
    pub fn save(&self, data_dir: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(data_dir)?;
        let path = data_dir.join(SETTINGS_FILE);
        let temp_path = data_dir.join("settings.json.tmp");
        let contents = serde_json::to_string_pretty(self)?;

        // Write to temp file first
        std::fs::write(&temp_path, contents)?;
        // Atomic rename (on most filesystems)
        std::fs::rename(&temp_path, &path)
    }

    /// Atomically records the selected default speaker in the settings file.
    ///
    /// Acquires a lock, loads the settings, updates the speaker, and saves.
    pub fn store_speaker_atomic(data_dir: &Path, speaker: &str) -> std::io::Result<()> {
        let _guard = settings_lock().lock();
        let mut settings = Self::load(data_dir);
        settings.default_speaker = Some(speaker.to_string());
        settings.save(data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn config_default_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_speaker, ALL_SPEAKERS);
        assert_eq!(config.discover_args, vec!["discover"]);
    }

    #[test]
    fn config_rejects_empty_command() {
        let config = Config {
            command: String::new(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn playable_path_matches_case_insensitively() {
        let config = Config::default();
        assert!(config.is_playable_path(&PathBuf::from("/music/a.mp3")));
        assert!(config.is_playable_path(&PathBuf::from("/music/a.MP3")));
        assert!(config.is_playable_path(&PathBuf::from("/music/b.FlAc")));
        assert!(config.is_playable_path(&PathBuf::from("/music/take.aif")));
    }

    #[test]
    fn playable_path_rejects_unknown_and_missing_extensions() {
        let config = Config::default();
        assert!(!config.is_playable_path(&PathBuf::from("/music/a.txt")));
        assert!(!config.is_playable_path(&PathBuf::from("/music/noext")));
    }

    #[test]
    fn covers_required_extension_set() {
        let config = Config::default();
        for ext in ["mp3", "m4a", "mp4", "flac", "ogg", "wma", "wav", "aif"] {
            let path = PathBuf::from(format!("/music/track.{ext}"));
            assert!(config.is_playable_path(&path), "missing {ext}");
        }
    }

    #[test]
    fn saved_settings_missing_file_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SavedSettings::load(dir.path());
        assert!(settings.default_speaker.is_none());
    }

    #[test]
    fn saved_settings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        SavedSettings::store_speaker_atomic(dir.path(), "Kitchen").unwrap();
        let settings = SavedSettings::load(dir.path());
        assert_eq!(settings.default_speaker.as_deref(), Some("Kitchen"));
    }

    #[test]
    fn saved_settings_overwrite_keeps_latest() {
        let dir = tempfile::tempdir().unwrap();
        SavedSettings::store_speaker_atomic(dir.path(), "Kitchen").unwrap();
        SavedSettings::store_speaker_atomic(dir.path(), "Den").unwrap();
        let settings = SavedSettings::load(dir.path());
        assert_eq!(settings.default_speaker.as_deref(), Some("Den"));
    }
}

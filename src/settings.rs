//! Settings persistence using TOML
//!
//! Stores settings in ~/.config/gridfall/settings.toml (or platform equivalent)

use crate::board::{DEFAULT_COLS, DEFAULT_ROWS};
use crate::error::{GameError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Largest board side we accept from the settings file
pub const MAX_BOARD_SIDE: usize = 64;

/// Game settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub player: PlayerSettings,
    pub board: BoardSettings,
    pub network: NetworkSettings,
    pub scores: ScoreSettings,
    pub game: GameSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Name shown on leaderboards and in the score file
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardSettings {
    pub cols: usize,
    pub rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// `host:port` of the game server; solo play when unset
    pub server: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreSettings {
    /// Local high score file; defaults to scores.txt in the data directory
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Fixed RNG seed for reproducible solo games
    pub seed: Option<u64>,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            name: "Player".to_string(),
        }
    }
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
        }
    }
}

impl Settings {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "gridfall", "gridfall")
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("settings.toml"))
    }

    /// Load settings from the default path, or fall back to defaults
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load settings from `path`; a missing or unreadable file gives defaults
    pub fn load_from(path: &Path) -> Self {
        let Ok(contents) = fs::read_to_string(path) else {
            return Self::default();
        };
        match toml::from_str::<Settings>(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring unreadable settings {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::settings_path()
            .ok_or_else(|| GameError::Settings("Could not determine config directory".to_string()))?;
        self.save_to(&path)
    }

    /// Save settings to `path`, creating its directory if needed
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| GameError::Settings(format!("Failed to create config dir: {}", e)))?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| GameError::Settings(format!("Failed to serialize: {}", e)))?;
        fs::write(path, contents)
            .map_err(|e| GameError::Settings(format!("Failed to write settings: {}", e)))?;
        info!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        let BoardSettings { cols, rows } = self.board;
        if !(1..=MAX_BOARD_SIDE).contains(&cols) || !(1..=MAX_BOARD_SIDE).contains(&rows) {
            return Err(GameError::Settings(format!(
                "Board must be between 1x1 and {0}x{0}, got {1}x{2}",
                MAX_BOARD_SIDE, cols, rows
            )));
        }
        if self.player.name.trim().is_empty() || self.player.name.contains([':', '\n']) {
            return Err(GameError::Settings(format!(
                "Invalid player name {:?}",
                self.player.name
            )));
        }
        Ok(())
    }

    /// Where the local high score file lives
    pub fn scores_path(&self) -> PathBuf {
        if let Some(path) = &self.scores.path {
            return path.clone();
        }
        Self::project_dirs()
            .map(|dirs| dirs.data_dir().join("scores.txt"))
            .unwrap_or_else(|| PathBuf::from("scores.txt"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.board.cols, 5);
        assert_eq!(settings.board.rows, 5);
        assert_eq!(settings.network.server, None);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [player]
            name = "alice"

            [network]
            server = "127.0.0.1:4000"
            "#,
        )
        .unwrap();
        assert_eq!(settings.player.name, "alice");
        assert_eq!(settings.network.server.as_deref(), Some("127.0.0.1:4000"));
        assert_eq!(settings.board, BoardSettings::default());
        assert_eq!(settings.game.seed, None);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.board.cols = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.player.name = "a:b".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = std::env::temp_dir().join(format!("gridfall-settings-{}", std::process::id()));
        let path = dir.join("settings.toml");

        let mut settings = Settings::default();
        settings.player.name = "bob".to_string();
        settings.game.seed = Some(42);
        settings.scores.path = Some(dir.join("scores.txt"));
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path);
        assert_eq!(loaded, settings);
        assert_eq!(loaded.scores_path(), dir.join("scores.txt"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_garbage_file_gives_defaults() {
        let dir = std::env::temp_dir().join(format!("gridfall-settings-bad-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.toml");
        fs::write(&path, "[board\ncols = ").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
        let _ = fs::remove_dir_all(&dir);
    }
}

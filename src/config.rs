use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::corpus::Difficulty;
use crate::session::SessionConfig;

/// Test lengths offered by the duration selector, in seconds
pub const DURATION_CHOICES: [u32; 4] = [15, 30, 60, 120];

/// Preferences remembered between runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub duration_secs: u32,
    pub difficulty: Difficulty,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            duration_secs: 60,
            difficulty: Difficulty::Easy,
        }
    }
}

impl Config {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(self.duration_secs, self.difficulty)
    }

    /// Step to the next offered duration. Unlisted values restart at the shortest.
    pub fn cycle_duration(&mut self) {
        self.duration_secs = DURATION_CHOICES
            .iter()
            .position(|d| *d == self.duration_secs)
            .map(|i| DURATION_CHOICES[(i + 1) % DURATION_CHOICES.len()])
            .unwrap_or(DURATION_CHOICES[0]);
    }

    pub fn cycle_difficulty(&mut self) {
        self.difficulty = self.difficulty.next();
    }
}

impl From<&Config> for SessionConfig {
    fn from(cfg: &Config) -> Self {
        cfg.session_config()
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("keypace_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|e| {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable config");
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}

/// Store that never touches disk
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    cfg: std::cell::RefCell<Config>,
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Config {
        self.cfg.borrow().clone()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        *self.cfg.borrow_mut() = cfg.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        assert_eq!(cfg, store.load());
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("nested").join("config.json"));
        let cfg = Config {
            duration_secs: 120,
            difficulty: Difficulty::Hard,
        };
        store.save(&cfg).unwrap();
        assert_eq!(cfg, store.load());
    }

    #[test]
    fn missing_or_garbled_file_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());

        std::fs::write(&path, b"{not json").unwrap();
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, br#"{"difficulty": "medium"}"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.difficulty, Difficulty::Medium);
        assert_eq!(cfg.duration_secs, 60);
    }

    #[test]
    fn cycle_duration_wraps() {
        let mut cfg = Config::default();
        cfg.cycle_duration();
        assert_eq!(cfg.duration_secs, 120);
        cfg.cycle_duration();
        assert_eq!(cfg.duration_secs, 15);

        cfg.duration_secs = 45;
        cfg.cycle_duration();
        assert_eq!(cfg.duration_secs, 15);
    }

    #[test]
    fn session_config_from_config() {
        let cfg = Config {
            duration_secs: 30,
            difficulty: Difficulty::Hard,
        };
        let session: SessionConfig = (&cfg).into();
        assert_eq!(session, SessionConfig::new(30, Difficulty::Hard));
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryConfigStore::default();
        let mut cfg = store.load();
        cfg.cycle_difficulty();
        store.save(&cfg).unwrap();
        assert_eq!(store.load().difficulty, Difficulty::Medium);
    }
}

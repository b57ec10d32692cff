//! Persisted user preferences

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::performance::MAX_RECENT_FILES;
use crate::error::{Result, ViewerError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Narrow column types right after loading
    pub optimize_on_load: bool,
    pub dark_mode: bool,
    /// Most recent first
    pub recent_files: Vec<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            optimize_on_load: true,
            dark_mode: false,
            recent_files: Vec::new(),
        }
    }
}

impl AppSettings {
    /// Read settings; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| ViewerError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Move `path` to the front of the recent list
    pub fn remember_file(&mut self, path: &Path) {
        self.recent_files.retain(|p| p != path);
        self.recent_files.insert(0, path.to_path_buf());
        self.recent_files.truncate(MAX_RECENT_FILES);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = AppSettings::load(&dir.path().join("none.json")).unwrap();
        assert_eq!(settings, AppSettings::default());
        assert!(settings.optimize_on_load);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ms-scope.json");
        let mut settings = AppSettings {
            dark_mode: true,
            ..AppSettings::default()
        };
        settings.remember_file(Path::new("/data/a.parquet"));
        settings.save(&path).unwrap();

        assert_eq!(AppSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_and_invalid_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"dark_mode": true}"#).unwrap();
        let settings = AppSettings::load(&path).unwrap();
        assert!(settings.dark_mode);
        assert!(settings.optimize_on_load);

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(AppSettings::load(&path), Err(ViewerError::Config(_))));
    }

    #[test]
    fn test_recent_files_are_bounded_and_deduplicated() {
        let mut settings = AppSettings::default();
        for i in 0..15 {
            settings.remember_file(Path::new(&format!("/data/{}.parquet", i)));
        }
        settings.remember_file(Path::new("/data/7.parquet"));
        assert_eq!(settings.recent_files.len(), MAX_RECENT_FILES);
        assert_eq!(settings.recent_files[0], PathBuf::from("/data/7.parquet"));
        assert_eq!(
            settings
                .recent_files
                .iter()
                .filter(|p| p.ends_with("7.parquet"))
                .count(),
            1
        );
    }
}

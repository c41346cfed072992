//! Unified path management for deckrank data files.
//!
//! All deckrank session data, backups, and logs are resolved via AppPaths
//! from the version-migrate crate for consistency across all storage.

use std::path::PathBuf;
use version_migrate::AppPaths;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for deckrank.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/deckrank/          # Config directory (AppPaths default)
/// ├── sessions/                # Session files (AsyncDirStorage)
/// ├── backups/                 # Session backup snapshots
/// └── logs/                    # Application logs
/// ```
pub struct DeckrankPaths;

impl DeckrankPaths {
    fn app_paths() -> AppPaths {
        AppPaths::new("deckrank")
    }

    /// Returns the deckrank configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/deckrank/`)
    /// - `Err(PathError::HomeDirNotFound)`: Could not determine directory
    pub fn config_dir() -> Result<PathBuf, PathError> {
        Self::app_paths()
            .config_dir()
            .map_err(|_| PathError::HomeDirNotFound)
    }

    /// Returns the deckrank data directory.
    pub fn data_dir() -> Result<PathBuf, PathError> {
        Self::app_paths()
            .data_dir()
            .map_err(|_| PathError::HomeDirNotFound)
    }

    /// Returns the path to the sessions directory.
    ///
    /// Note: primarily for inspection. AsyncDirSessionRepository manages
    /// this directory via AsyncDirStorage.
    pub fn sessions_dir() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("sessions"))
    }

    /// Returns the path to the backup snapshots directory.
    pub fn backups_dir() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("backups"))
    }

    /// Returns the path to the logs directory.
    pub fn logs_dir() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir() {
        let config_dir = DeckrankPaths::config_dir().unwrap();
        assert!(config_dir.ends_with("deckrank"));
    }

    #[test]
    fn test_sessions_dir() {
        let sessions_dir = DeckrankPaths::sessions_dir().unwrap();
        assert!(sessions_dir.ends_with("sessions"));
        let config_dir = DeckrankPaths::config_dir().unwrap();
        assert!(sessions_dir.starts_with(&config_dir));
    }

    #[test]
    fn test_backups_dir() {
        let backups_dir = DeckrankPaths::backups_dir().unwrap();
        assert!(backups_dir.ends_with("backups"));
        let config_dir = DeckrankPaths::config_dir().unwrap();
        assert!(backups_dir.starts_with(&config_dir));
    }

    #[test]
    fn test_logs_dir() {
        let logs_dir = DeckrankPaths::logs_dir().unwrap();
        assert!(logs_dir.ends_with("logs"));
        let config_dir = DeckrankPaths::config_dir().unwrap();
        assert!(logs_dir.starts_with(&config_dir));
    }
}

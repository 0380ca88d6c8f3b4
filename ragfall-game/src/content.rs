//! Sources for stunts, levels and tuning.
use std::convert::Infallible;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use crate::ContentLoader;
use crate::config::{ConfigError, TuningConfig};
use crate::level::LevelCatalog;
use crate::stunts::{CatalogError, StuntCatalog};

pub const STUNTS_FILE: &str = "stunts.json";
pub const LEVELS_FILE: &str = "levels.json";
pub const TUNING_FILE: &str = "tuning.json";

/// Compiled-in content.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinContent;

impl ContentLoader for BuiltinContent {
    type Error = Infallible;

    fn load_stunts(&self) -> Result<StuntCatalog, Self::Error> {
        Ok(StuntCatalog::default_catalog())
    }

    fn load_levels(&self) -> Result<LevelCatalog, Self::Error> {
        Ok(LevelCatalog::default_levels())
    }

    fn load_tuning(&self) -> Result<TuningConfig, Self::Error> {
        Ok(TuningConfig::default())
    }
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid stunt catalog: {0}")]
    Stunts(#[from] CatalogError),
    #[error("invalid level list: {0}")]
    Levels(#[from] serde_json::Error),
    #[error("invalid tuning: {0}")]
    Tuning(#[from] ConfigError),
}

/// JSON files in one directory. A missing file falls back to the built-in content.
#[derive(Debug, Clone)]
pub struct DirContent {
    root: PathBuf,
}

impl DirContent {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read(&self, name: &str) -> Result<Option<String>, ContentError> {
        let path = self.root.join(name);
        match fs::read_to_string(&path) {
            Ok(json) => Ok(Some(json)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("{} not found, using built-in content", path.display());
                Ok(None)
            }
            Err(source) => Err(ContentError::Io { path, source }),
        }
    }
}

impl ContentLoader for DirContent {
    type Error = ContentError;

    fn load_stunts(&self) -> Result<StuntCatalog, Self::Error> {
        match self.read(STUNTS_FILE)? {
            Some(json) => Ok(StuntCatalog::from_json(&json)?),
            None => Ok(StuntCatalog::default_catalog()),
        }
    }

    fn load_levels(&self) -> Result<LevelCatalog, Self::Error> {
        match self.read(LEVELS_FILE)? {
            Some(json) => Ok(LevelCatalog::from_json(&json)?),
            None => Ok(LevelCatalog::default_levels()),
        }
    }

    fn load_tuning(&self) -> Result<TuningConfig, Self::Error> {
        match self.read(TUNING_FILE)? {
            Some(json) => Ok(TuningConfig::from_json(&json)?),
            None => Ok(TuningConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "ragfall-content-{label}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn empty_directory_serves_builtin_content() {
        let dir = temp_dir("empty");
        let content = DirContent::new(&dir);
        assert_eq!(content.load_stunts().unwrap(), StuntCatalog::default_catalog());
        assert_eq!(content.load_levels().unwrap(), LevelCatalog::default_levels());
        assert_eq!(content.load_tuning().unwrap(), TuningConfig::default());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn files_override_builtins() {
        let dir = temp_dir("override");
        fs::write(dir.join(TUNING_FILE), r#"{ "combo_window_ms": 600 }"#).unwrap();
        fs::write(
            dir.join(LEVELS_FILE),
            r#"{ "levels": [ { "id": 4, "name": "Pit", "ground_y": 900.0, "spawn": [10.0, 0.0] } ] }"#,
        )
        .unwrap();
        let content = DirContent::new(&dir);
        assert_eq!(content.load_tuning().unwrap().combo_window_ms, 600);
        assert_eq!(content.load_levels().unwrap().first().map(|l| l.id), Some(4));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn invalid_files_surface_typed_errors() {
        let dir = temp_dir("invalid");
        fs::write(dir.join(TUNING_FILE), r#"{ "combo_window_ms": 0 }"#).unwrap();
        fs::write(dir.join(STUNTS_FILE), r#"{ "stunts": [] "#).unwrap();
        let content = DirContent::new(&dir);
        assert!(matches!(
            content.load_tuning(),
            Err(ContentError::Tuning(ConfigError::ZeroComboWindow))
        ));
        assert!(matches!(content.load_stunts(), Err(ContentError::Stunts(_))));
        let _ = fs::remove_dir_all(dir);
    }
}

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::error::HazidError;
use crate::reference::builtin::reference_tables;
use crate::reference::{load_reference, ReferenceTables};

pub const CONFIG_FILE_NAME: &str = "hazid.json";

pub const HAZARD_WORKBOOK: &str = "CMS_Safety-List_Preventive_Protective_Measures.xlsx";
pub const LOCATION_WORKBOOK: &str = "CMS_Safety-Location_TSO_Links_Reference.xlsx";

/// Directories searched for the workbooks, relative to the application root.
pub const WORKBOOK_DIRS: &[&str] = &["data/excel", "src/assets", "public"];

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("uploads")
}

/// Application configuration. Every field has a default, so an empty
/// `hazid.json` (or none at all) is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base for every relative path below.
    pub root: PathBuf,
    /// Hazard-list workbooks, tried in order. Empty means the standard
    /// candidate locations.
    pub hazard_workbooks: Vec<PathBuf>,
    /// Building/room and contacts workbooks, tried in order.
    pub location_workbooks: Vec<PathBuf>,
    pub uploads_dir: PathBuf,
    /// Replacement for the embedded reference tables.
    pub reference_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            root: default_root(),
            hazard_workbooks: Vec::new(),
            location_workbooks: Vec::new(),
            uploads_dir: default_uploads_dir(),
            reference_file: None,
        }
    }
}

fn standard_candidates(root: &Path, file_name: &str) -> Vec<PathBuf> {
    WORKBOOK_DIRS
        .iter()
        .map(|dir| root.join(dir).join(file_name))
        .collect()
}

impl AppConfig {
    /// Default configuration rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        AppConfig {
            root: root.into(),
            ..Default::default()
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn hazard_candidates(&self) -> Vec<PathBuf> {
        if self.hazard_workbooks.is_empty() {
            standard_candidates(&self.root, HAZARD_WORKBOOK)
        } else {
            self.hazard_workbooks.iter().map(|p| self.resolve(p)).collect()
        }
    }

    pub fn location_candidates(&self) -> Vec<PathBuf> {
        if self.location_workbooks.is_empty() {
            standard_candidates(&self.root, LOCATION_WORKBOOK)
        } else {
            self.location_workbooks.iter().map(|p| self.resolve(p)).collect()
        }
    }

    pub fn uploads_path(&self) -> PathBuf {
        self.resolve(&self.uploads_dir)
    }

    /// The override tables when configured, otherwise the embedded ones.
    pub fn reference_tables(&self) -> Result<Cow<'static, ReferenceTables>, HazidError> {
        match &self.reference_file {
            Some(path) => Ok(Cow::Owned(load_reference(&self.resolve(path))?)),
            None => Ok(Cow::Borrowed(reference_tables())),
        }
    }
}

/// Load a configuration file. A relative `root` inside the file is taken
/// relative to the file's directory.
pub fn load_config(path: &Path) -> Result<AppConfig, HazidError> {
    let content = std::fs::read_to_string(path).map_err(|e| HazidError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let mut config: AppConfig =
        serde_json::from_str(&content).map_err(|e| HazidError::ConfigLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    if config.root.is_relative() {
        if let Some(dir) = path.parent() {
            config.root = dir.join(&config.root);
        }
    }
    tracing::debug!(path = %path.display(), root = %config.root.display(), "config loaded");
    Ok(config)
}

/// `<root>/hazid.json` when it exists, otherwise the defaults for `root`.
pub fn discover(root: &Path) -> Result<AppConfig, HazidError> {
    let path = root.join(CONFIG_FILE_NAME);
    if path.is_file() {
        load_config(&path)
    } else {
        Ok(AppConfig::with_root(root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_candidates_in_order() {
        let config = AppConfig::with_root("/app");
        let candidates = config.hazard_candidates();
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/app/data/excel").join(HAZARD_WORKBOOK),
                PathBuf::from("/app/src/assets").join(HAZARD_WORKBOOK),
                PathBuf::from("/app/public").join(HAZARD_WORKBOOK),
            ]
        );
        assert_eq!(config.location_candidates()[0], PathBuf::from("/app/data/excel").join(LOCATION_WORKBOOK));
        assert_eq!(config.uploads_path(), PathBuf::from("/app/uploads"));
    }

    #[test]
    fn test_empty_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "{}").unwrap();
        let config = discover(dir.path()).unwrap();
        assert_eq!(config.root, dir.path().join("."));
        assert!(config.hazard_workbooks.is_empty());
        assert!(config.reference_file.is_none());
    }

    #[test]
    fn test_configured_workbooks_resolved_against_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"{ "hazard_workbooks": ["sheets/hazards.xlsx", "/abs/h.xlsx"], "uploads_dir": "files" }"#,
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        let candidates = config.hazard_candidates();
        assert_eq!(candidates[0], dir.path().join(".").join("sheets/hazards.xlsx"));
        assert_eq!(candidates[1], PathBuf::from("/abs/h.xlsx"));
        assert_eq!(config.uploads_path(), dir.path().join(".").join("files"));
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = discover(dir.path()).unwrap();
        assert_eq!(config.root, dir.path());
        assert!(config.reference_tables().unwrap().fallback_hazards.len() > 1);
    }

    #[test]
    fn test_malformed_config_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(load_config(&path), Err(HazidError::ConfigLoad { .. })));
    }

    #[test]
    fn test_bad_reference_override_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            reference_file: Some(dir.path().join("missing.json")),
            ..AppConfig::with_root(dir.path())
        };
        assert!(config.reference_tables().is_err());
    }
}

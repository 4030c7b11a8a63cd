pub mod draft;
pub mod export;
pub mod lookup;
pub mod upload;

use hazid_core::config::{discover, load_config, AppConfig};
use hazid_core::error::HazidError;
use std::path::{Path, PathBuf};

/// Configuration from `--config`, else `<root>/hazid.json`, else defaults.
/// An explicit `--root` wins over the root in the file.
pub fn resolve_config(config: Option<&Path>, root: Option<PathBuf>) -> Result<AppConfig, HazidError> {
    let mut resolved = match config {
        Some(path) => load_config(path)?,
        None => discover(root.as_deref().unwrap_or(Path::new(".")))?,
    };
    if let Some(root) = root {
        resolved.root = root;
    }
    Ok(resolved)
}

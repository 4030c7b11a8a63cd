use chrono::Utc;
use hazid_core::config::AppConfig;
use hazid_core::draft::save_draft;
use hazid_core::error::HazidError;
use hazid_core::form::FormUpdate;
use hazid_core::uploads::{list_uploads, store_upload};
use std::path::Path;

use super::draft::read;

pub fn run(config: &AppConfig, draft: &Path, file: &Path) -> Result<(), HazidError> {
    let state = read(draft)?;
    let stored = store_upload(file, &config.uploads_path(), Utc::now())?;
    tracing::info!(
        name = %stored.name,
        stored = stored.stored_path.as_deref().unwrap_or_default(),
        "attachment stored"
    );

    let state = state.apply(FormUpdate::AddUpload(stored));
    save_draft(&state, Some(draft))?;

    println!("{} file(s) attached", state.uploaded_files.len());
    Ok(())
}

/// Print the files kept in the uploads directory.
pub fn list(config: &AppConfig) -> Result<(), HazidError> {
    let dir = config.uploads_path();
    let files = list_uploads(&dir)?;
    if files.is_empty() {
        eprintln!("No uploads in {}", dir.display());
    }
    for name in files {
        println!("{}", dir.join(name).display());
    }
    Ok(())
}

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::HazidError;
use crate::form::UploadedFile;

pub const STATUS_UPLOADED: &str = "uploaded";

fn upload_error(path: &Path, reason: impl ToString) -> HazidError {
    HazidError::Upload {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Best-effort MIME type from the file extension.
fn mime_type_for(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "doc" => "application/msword",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xls" => "application/vnd.ms-excel",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "txt" => "text/plain",
        "csv" => "text/csv",
        _ => "application/octet-stream",
    }
}

/// Copy `source` into `uploads_dir` as `<unix millis>_<file name>` and
/// describe the stored file.
pub fn store_upload(
    source: &Path,
    uploads_dir: &Path,
    now: DateTime<Utc>,
) -> Result<UploadedFile, HazidError> {
    let name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| upload_error(source, "path has no usable file name"))?
        .to_string();
    let metadata = std::fs::metadata(source).map_err(|e| upload_error(source, e))?;
    if !metadata.is_file() {
        return Err(upload_error(source, "not a regular file"));
    }

    std::fs::create_dir_all(uploads_dir).map_err(|e| upload_error(uploads_dir, e))?;

    let id = now.timestamp_millis().to_string();
    let target: PathBuf = uploads_dir.join(format!("{id}_{name}"));
    let size = std::fs::copy(source, &target).map_err(|e| upload_error(source, e))?;
    tracing::info!(source = %source.display(), target = %target.display(), size, "file stored");

    Ok(UploadedFile {
        id,
        mime_type: mime_type_for(&name).to_string(),
        name,
        size,
        status: STATUS_UPLOADED.to_string(),
        stored_path: Some(target.to_string_lossy().into_owned()),
    })
}

/// Names of the stored files, sorted. A missing directory has no uploads.
pub fn list_uploads(uploads_dir: &Path) -> Result<Vec<String>, HazidError> {
    if !uploads_dir.exists() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(uploads_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

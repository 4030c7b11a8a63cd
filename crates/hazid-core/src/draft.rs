use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::HazidError;
use crate::form::FormState;

fn draft_error(path: &Path, reason: impl ToString) -> HazidError {
    HazidError::Draft {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Write `bytes` to `path` through a temporary file in the same directory,
/// so readers never observe a half-written file.
pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Save the form as indented JSON. `None` means the user cancelled the save
/// dialog and nothing is written.
pub fn save_draft(state: &FormState, path: Option<&Path>) -> Result<Option<PathBuf>, HazidError> {
    let Some(path) = path else {
        tracing::debug!("draft save cancelled");
        return Ok(None);
    };
    let json = serde_json::to_string_pretty(state).map_err(|e| draft_error(path, e))?;
    write_atomically(path, json.as_bytes()).map_err(|e| draft_error(path, e))?;
    tracing::info!(path = %path.display(), "draft saved");
    Ok(Some(path.to_path_buf()))
}

/// Load a draft. Fields missing from the file take their fresh-form
/// defaults. `None` means the user cancelled.
pub fn load_draft(path: Option<&Path>) -> Result<Option<FormState>, HazidError> {
    let Some(path) = path else {
        tracing::debug!("draft load cancelled");
        return Ok(None);
    };
    let content = std::fs::read_to_string(path).map_err(|e| draft_error(path, e))?;
    let state: FormState = serde_json::from_str(&content).map_err(|e| draft_error(path, e))?;
    tracing::info!(path = %path.display(), "draft loaded");
    Ok(Some(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{FormField, FormUpdate, HazardDetail, UploadedFile};

    fn filled_state() -> FormState {
        let mut state = FormState::new_at("2025-03-07");
        for field in FormField::ALL {
            state = state.apply(FormUpdate::SetField(*field, format!("value of {field}")));
        }
        state
            .apply(FormUpdate::SetField(FormField::StartDate, "2025-03-07".into()))
            .apply(FormUpdate::SelectHazard("Chemical".into()))
            .apply(FormUpdate::SetHazardDetail {
                category: "Chemical".into(),
                id: "h1".into(),
                detail: HazardDetail {
                    selected: true,
                    name: "Flammable".into(),
                    details: "5L ethanol".into(),
                    recommendations: String::new(),
                    default_recommendations: "Ventilate.".into(),
                },
            })
            .apply(FormUpdate::AddUpload(UploadedFile {
                id: "1741339200000".into(),
                name: "plan.pdf".into(),
                size: 2048,
                mime_type: "application/pdf".into(),
                status: "uploaded".into(),
                stored_path: Some("uploads/1741339200000_plan.pdf".into()),
            }))
    }

    #[test]
    fn test_round_trip_reproduces_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draft.json");
        let state = filled_state();

        let saved = save_draft(&state, Some(&path)).unwrap();
        assert_eq!(saved.as_deref(), Some(path.as_path()));

        let loaded = load_draft(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_saved_json_is_indented_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draft.json");
        save_draft(&filled_state(), Some(&path)).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"creatorName\""));
        assert!(text.contains("\"hazardDetails\""));
    }

    #[test]
    fn test_partial_draft_gets_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.json");
        std::fs::write(&path, r#"{ "title": "Old draft", "selectedHazards": ["Fire"] }"#).unwrap();

        let loaded = load_draft(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.title, "Old draft");
        assert_eq!(loaded.selected_hazards, vec!["Fire"]);
        assert_eq!(loaded.start_date, crate::dates::today_for_input());
        assert!(loaded.uploaded_files.is_empty());
    }

    #[test]
    fn test_cancelled_dialogs() {
        assert!(save_draft(&FormState::default(), None).unwrap().is_none());
        assert!(load_draft(None).unwrap().is_none());
    }

    #[test]
    fn test_malformed_draft_is_draft_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_draft(Some(&path)).unwrap_err();
        assert!(matches!(err, HazidError::Draft { .. }));
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("draft.json");
        let err = save_draft(&FormState::default(), Some(&path)).unwrap_err();
        assert!(matches!(err, HazidError::Draft { .. }));
        assert!(!path.exists());
    }
}

use chrono::Local;
use hazid_core::config::AppConfig;
use hazid_core::error::HazidError;
use hazid_core::report::ExportFormat;
use hazid_core::sheet::CalamineReader;
use std::path::{Path, PathBuf};

use super::draft::read;

pub fn run(
    config: &AppConfig,
    draft: &Path,
    out: Option<PathBuf>,
    force: bool,
) -> Result<(), HazidError> {
    let form = read(draft)?;

    let status = form.completion_status();
    if !status.is_complete() {
        let missing: Vec<&str> = status.missing.iter().map(|f| f.as_str()).collect();
        if !force {
            return Err(HazidError::Draft {
                path: draft.to_path_buf(),
                reason: format!(
                    "required fields missing: {} (use --force to export anyway)",
                    missing.join(", ")
                ),
            });
        }
        eprintln!("warning: exporting with missing fields: {}", missing.join(", "));
    }

    let out = out.unwrap_or_else(|| draft.with_extension("docx"));
    tracing::debug!(draft = %draft.display(), out = %out.display(), "exporting report");
    let outcome = hazid_core::export_form(
        &form,
        config,
        &CalamineReader::new(),
        &out,
        Local::now().naive_local(),
    )?;

    match outcome.format {
        ExportFormat::Docx => println!("Report written to {}", outcome.path.display()),
        ExportFormat::Text => {
            eprintln!("warning: the Word document could not be written, saved as {} instead", outcome.format);
            println!("Report written to {}", outcome.path.display());
        }
    }
    Ok(())
}

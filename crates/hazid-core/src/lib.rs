pub mod config;
pub mod contacts;
pub mod dates;
pub mod draft;
pub mod error;
pub mod fallback;
pub mod form;
pub mod location;
pub mod model;
pub mod reference;
pub mod report;
pub mod sheet;
pub mod taxonomy;
pub mod uploads;

use std::path::Path;

use chrono::NaiveDateTime;

use config::AppConfig;
use error::HazidError;
use form::FormState;
use report::{ExportOutcome, ReportContext};
use sheet::SheetReader;

/// Main API entry point: export a filled-in form as a report.
///
/// Loads the hazard definitions and the contact bundle from the configured
/// workbooks, falling back to the built-in tables for whichever cannot be
/// read, then writes the report to `out`.
pub fn export_form(
    form: &FormState,
    config: &AppConfig,
    reader: &dyn SheetReader,
    out: &Path,
    generated_at: NaiveDateTime,
) -> Result<ExportOutcome, HazidError> {
    let tables = config.reference_tables()?;

    let taxonomy = taxonomy::load_taxonomy(reader, &config.hazard_candidates(), &tables);
    let contacts = contacts::load_contacts(reader, &config.location_candidates(), &tables);
    tracing::debug!(
        taxonomy = %taxonomy.source,
        contacts = %contacts.source,
        "report data loaded"
    );

    let missing = form.categories_missing_details();
    if !missing.is_empty() {
        tracing::warn!(categories = ?missing, "selected categories without selected sub-hazards");
    }

    let ctx = ReportContext {
        form,
        definitions: &taxonomy.value.definitions,
        contacts: &contacts.value,
        tables: &tables,
        generated_at,
    };
    report::export_report(&ctx, out)
}

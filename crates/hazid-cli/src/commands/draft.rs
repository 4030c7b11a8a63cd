use hazid_core::config::AppConfig;
use hazid_core::dates::display_to_input;
use hazid_core::draft::{load_draft, save_draft};
use hazid_core::error::HazidError;
use hazid_core::form::{DetailField, FormField, FormState, FormUpdate};
use hazid_core::sheet::CalamineReader;
use hazid_core::taxonomy::load_taxonomy;
use std::path::Path;

use crate::output;

pub struct DetailEdits {
    pub name: Option<String>,
    pub details: Option<String>,
    pub recommendations: Option<String>,
    pub unselect: bool,
}

pub fn read(file: &Path) -> Result<FormState, HazidError> {
    Ok(load_draft(Some(file))?.unwrap_or_default())
}

fn write(state: &FormState, file: &Path) -> Result<(), HazidError> {
    save_draft(state, Some(file))?;
    Ok(())
}

/// Load, apply every update in order, save.
fn update(file: &Path, updates: Vec<FormUpdate>) -> Result<FormState, HazidError> {
    let state = updates
        .into_iter()
        .fold(read(file)?, |state, update| state.apply(update));
    write(&state, file)?;
    Ok(state)
}

pub fn new(file: &Path) -> Result<(), HazidError> {
    if file.exists() {
        return Err(HazidError::Draft {
            path: file.to_path_buf(),
            reason: "file already exists".into(),
        });
    }
    write(&FormState::default(), file)?;
    println!("Created draft {}", file.display());
    Ok(())
}

pub fn show(file: &Path, output_format: &str) -> Result<(), HazidError> {
    let state = read(file)?;
    match output_format {
        "json" => output::json::print(&state),
        _ => {
            print!("{}", output::table::format_draft(&state));
            Ok(())
        }
    }
}

pub fn set(file: &Path, field: &str, value: &str) -> Result<(), HazidError> {
    let field: FormField = field.parse()?;
    // Dates may be typed as DD/MM/YYYY.
    let value = match field {
        FormField::StartDate | FormField::EndDate if value.contains('/') => {
            display_to_input(value)
        }
        _ => value.to_string(),
    };
    update(file, vec![FormUpdate::SetField(field, value.clone())])?;
    println!("{field} = {value}");
    Ok(())
}

pub fn select(file: &Path, category: &str) -> Result<(), HazidError> {
    let state = update(file, vec![FormUpdate::SelectHazard(category.to_string())])?;
    println!("Selected: {}", state.selected_hazards.join(", "));
    Ok(())
}

pub fn deselect(file: &Path, category: &str) -> Result<(), HazidError> {
    let state = update(file, vec![FormUpdate::DeselectHazard(category.to_string())])?;
    if state.selected_hazards.is_empty() {
        println!("No categories selected");
    } else {
        println!("Selected: {}", state.selected_hazards.join(", "));
    }
    Ok(())
}

pub fn detail(
    config: &AppConfig,
    file: &Path,
    category: &str,
    id: &str,
    edits: DetailEdits,
) -> Result<(), HazidError> {
    let unselect = edits.unselect;
    let mut updates = vec![FormUpdate::ToggleSubHazard {
        category: category.to_string(),
        id: id.to_string(),
        selected: !unselect,
    }];
    let fields = [
        (DetailField::Name, edits.name),
        (DetailField::Details, edits.details),
        (DetailField::Recommendations, edits.recommendations),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            updates.push(FormUpdate::EditSubHazard {
                category: category.to_string(),
                id: id.to_string(),
                field,
                value,
            });
        }
    }

    let mut state = updates
        .into_iter()
        .fold(read(file)?, |state, update| state.apply(update));

    // A newly selected sub-hazard starts with the hazard list's safety measures.
    if !unselect {
        let tables = config.reference_tables()?;
        let taxonomy = load_taxonomy(&CalamineReader::new(), &config.hazard_candidates(), &tables);
        if let Some(seed) = taxonomy
            .value
            .seed_default_recommendation(&tables, &state, category, id)
        {
            tracing::debug!(category, id, "default recommendation taken from the hazard list");
            state = state.apply(seed);
        }
    }
    write(&state, file)?;

    if !state.selected_hazards.iter().any(|c| c == category) {
        eprintln!("Note: category '{category}' is not selected; run `hazid draft select` to include it in the report.");
    }
    println!("Updated {category} / {id}");
    Ok(())
}

pub fn status(file: &Path) -> Result<(), HazidError> {
    let state = read(file)?;
    print!(
        "{}",
        output::table::format_status(&state.completion_status(), &state.categories_missing_details())
    );
    Ok(())
}

use hazid_core::config::AppConfig;
use hazid_core::contacts::load_contacts;
use hazid_core::error::HazidError;
use hazid_core::fallback::Loaded;
use hazid_core::location::{load_locations, rooms_for_building, unique_buildings};
use hazid_core::model::HazardRow;
use hazid_core::sheet::{CalamineReader, SheetReader};
use hazid_core::taxonomy::load_taxonomy;
use std::path::Path;

use crate::output;

fn note_fallback<T>(loaded: &Loaded<T>, what: &str) {
    if loaded.is_fallback() {
        eprintln!("Note: no readable workbook found, showing built-in {what}.");
    }
}

pub fn hazards(config: &AppConfig, category: Option<&str>, output_format: &str) -> Result<(), HazidError> {
    let tables = config.reference_tables()?;
    let taxonomy = load_taxonomy(&CalamineReader::new(), &config.hazard_candidates(), &tables);
    note_fallback(&taxonomy, "hazard list");

    let wanted = category.map(|c| tables.normalize_category(c));
    let rows: Vec<&HazardRow> = taxonomy
        .value
        .hazards
        .iter()
        .filter(|h| match &wanted {
            Some(key) => tables.normalize_category(&h.category) == *key,
            None => true,
        })
        .collect();

    match output_format {
        "json" => output::json::print(&rows),
        _ => {
            if rows.is_empty() {
                println!("No hazards found.");
            } else {
                print!("{}", output::table::format_hazards(&rows));
            }
            Ok(())
        }
    }
}

pub fn definitions(config: &AppConfig, output_format: &str) -> Result<(), HazidError> {
    let tables = config.reference_tables()?;
    let taxonomy = load_taxonomy(&CalamineReader::new(), &config.hazard_candidates(), &tables);
    note_fallback(&taxonomy, "definitions");

    match output_format {
        "json" => output::json::print(&taxonomy.value.definitions),
        _ => {
            print!("{}", output::table::format_definitions(&taxonomy.value.definitions));
            Ok(())
        }
    }
}

pub fn buildings(config: &AppConfig) -> Result<(), HazidError> {
    let tables = config.reference_tables()?;
    let locations = load_locations(&CalamineReader::new(), &config.location_candidates(), &tables);
    note_fallback(&locations, "building list");
    for building in unique_buildings(&locations.value) {
        println!("{building}");
    }
    Ok(())
}

pub fn rooms(config: &AppConfig, building: &str) -> Result<(), HazidError> {
    let tables = config.reference_tables()?;
    let locations = load_locations(&CalamineReader::new(), &config.location_candidates(), &tables);
    note_fallback(&locations, "building list");
    let rooms = rooms_for_building(&locations.value, building);
    if rooms.is_empty() {
        eprintln!("No rooms known for '{}'.", building.trim());
    }
    for room in rooms {
        println!("{room}");
    }
    Ok(())
}

pub fn contacts(config: &AppConfig, output_format: &str) -> Result<(), HazidError> {
    let tables = config.reference_tables()?;
    let contacts = load_contacts(&CalamineReader::new(), &config.location_candidates(), &tables);
    match output_format {
        "json" => output::json::print(&contacts.value),
        _ => {
            print!("{}", output::table::format_contacts(&contacts.value));
            Ok(())
        }
    }
}

pub fn sheets(workbook: &Path) -> Result<(), HazidError> {
    for name in CalamineReader::new().sheet_names(workbook)? {
        println!("{name}");
    }
    Ok(())
}

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::HazidError;
use crate::fallback::{first_success, load_with_fallback, Loaded};
use crate::model::LocationRecord;
use crate::reference::ReferenceTables;
use crate::sheet::{SheetReader, SheetRow, LOCATION_SHEET};

pub const LOCATION_HEADER_ROW: u32 = 0;

/// Convert raw rows into location records. Header names are matched
/// case-insensitively; rows with neither a building nor a room are dropped.
pub fn records_from_rows(rows: &[SheetRow]) -> Vec<LocationRecord> {
    rows.iter()
        .filter_map(|row| {
            let building = row.get_ci("Building").unwrap_or_default();
            let room = row.get_ci("Room").unwrap_or_default();
            if building.is_empty() && room.is_empty() {
                None
            } else {
                Some(LocationRecord {
                    building: building.to_string(),
                    room: room.to_string(),
                })
            }
        })
        .collect()
}

/// Distinct, trimmed, non-empty building names in alphabetical order.
pub fn unique_buildings(records: &[LocationRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.building.trim())
        .filter(|b| !b.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct, trimmed, non-empty rooms of `building` in alphabetical order.
/// Empty for a blank or unknown building.
pub fn rooms_for_building(records: &[LocationRecord], building: &str) -> Vec<String> {
    let building = building.trim();
    if building.is_empty() {
        return Vec::new();
    }
    records
        .iter()
        .filter(|r| r.building.trim() == building)
        .map(|r| r.room.trim())
        .filter(|room| !room.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn read_locations(
    reader: &dyn SheetReader,
    path: &Path,
) -> Result<Vec<LocationRecord>, HazidError> {
    let records = records_from_rows(&reader.read_sheet(path, LOCATION_SHEET, LOCATION_HEADER_ROW)?);
    if records.is_empty() {
        return Err(HazidError::Workbook {
            path: path.to_path_buf(),
            reason: format!("sheet '{LOCATION_SHEET}' has no building or room rows"),
        });
    }
    Ok(records)
}

/// Load building/room records from the first usable candidate workbook,
/// falling back to the built-in list.
pub fn load_locations(
    reader: &dyn SheetReader,
    candidates: &[PathBuf],
    tables: &ReferenceTables,
) -> Loaded<Vec<LocationRecord>> {
    load_with_fallback(
        "building/room data",
        || first_success(candidates, "building/room data", |path| read_locations(reader, path)),
        || tables.fallback_locations.clone(),
    )
}

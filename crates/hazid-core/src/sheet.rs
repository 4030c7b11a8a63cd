use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};

use crate::error::HazidError;

pub const HAZARD_SHEET: &str = "ENG List of hazards";
pub const DEFINITIONS_SHEET: &str = "HSE Sheet";
pub const LOCATION_SHEET: &str = "Building Room Info";
pub const WEB_CONTACTS_SHEET: &str = "Web Contacts";
pub const EMAIL_CONTACTS_SHEET: &str = "Email Contacts";

/// One data row of a sheet, keyed by the header text of its column.
///
/// Empty cells are not stored, so a missing key and a blank cell read the same.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetRow {
    cells: BTreeMap<String, String>,
}

impl SheetRow {
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut row = SheetRow::default();
        for (k, v) in pairs {
            row.insert(k.into(), v.into());
        }
        row
    }

    pub fn insert(&mut self, header: String, value: String) {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            self.cells.insert(header, trimmed.to_string());
        }
    }

    /// Value under an exact header.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells.get(header).map(String::as_str)
    }

    /// First value found under any of the given headers, in order.
    pub fn get_any(&self, headers: &[&str]) -> Option<&str> {
        headers.iter().find_map(|h| self.get(h))
    }

    /// Value under a header compared case-insensitively and ignoring
    /// surrounding whitespace.
    pub fn get_ci(&self, header: &str) -> Option<&str> {
        let wanted = header.trim().to_lowercase();
        self.cells
            .iter()
            .find(|(k, _)| k.trim().to_lowercase() == wanted)
            .map(|(_, v)| v.as_str())
    }

    /// Values of every column whose header starts with `prefix`
    /// (case-insensitive), in header order.
    pub fn values_with_prefix_ci(&self, prefix: &str) -> Vec<&str> {
        let prefix = prefix.to_lowercase();
        self.cells
            .iter()
            .filter(|(k, _)| k.trim().to_lowercase().starts_with(&prefix))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Trait for spreadsheet backends.
pub trait SheetReader: Send + Sync {
    /// Read the rows of `sheet` in the workbook at `path`. `header_row` is the
    /// 0-based sheet row holding the column headers; data starts below it.
    fn read_sheet(
        &self,
        path: &Path,
        sheet: &str,
        header_row: u32,
    ) -> Result<Vec<SheetRow>, HazidError>;

    /// Names of all sheets in the workbook.
    fn sheet_names(&self, path: &Path) -> Result<Vec<String>, HazidError>;
}

/// Workbook reader backed by calamine (xlsx, xls, xlsb and ods).
pub struct CalamineReader;

impl CalamineReader {
    pub fn new() -> Self {
        CalamineReader
    }
}

impl Default for CalamineReader {
    fn default() -> Self {
        Self::new()
    }
}

impl SheetReader for CalamineReader {
    fn read_sheet(
        &self,
        path: &Path,
        sheet: &str,
        header_row: u32,
    ) -> Result<Vec<SheetRow>, HazidError> {
        let mut workbook = open(path)?;
        if !workbook.sheet_names().iter().any(|name| name == sheet) {
            return Err(HazidError::SheetNotFound {
                path: path.to_path_buf(),
                sheet: sheet.to_string(),
            });
        }
        let range = workbook
            .worksheet_range(sheet)
            .map_err(|e| HazidError::Workbook {
                path: path.to_path_buf(),
                reason: format!("failed to read sheet '{sheet}': {e}"),
            })?;

        let rows = rows_from_range(&range, header_row);
        tracing::debug!(
            path = %path.display(),
            sheet,
            rows = rows.len(),
            "sheet read"
        );
        Ok(rows)
    }

    fn sheet_names(&self, path: &Path) -> Result<Vec<String>, HazidError> {
        Ok(open(path)?.sheet_names())
    }
}

fn open(path: &Path) -> Result<Sheets<BufReader<File>>, HazidError> {
    if !path.is_file() {
        return Err(HazidError::Workbook {
            path: path.to_path_buf(),
            reason: "file not found".into(),
        });
    }
    open_workbook_auto(path).map_err(|e| HazidError::Workbook {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Turn a worksheet range into header-keyed rows.
///
/// Columns without a header are ignored. A repeated header gets a `_N`
/// suffix so neither column is lost. Fully blank rows are dropped.
pub fn rows_from_range(range: &Range<Data>, header_row: u32) -> Vec<SheetRow> {
    let (Some(start), Some(end)) = (range.start(), range.end()) else {
        return Vec::new();
    };
    if header_row < start.0 || header_row > end.0 {
        return Vec::new();
    }

    let mut headers: Vec<(u32, String)> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    for col in start.1..=end.1 {
        let Some(name) = range.get_value((header_row, col)).and_then(cell_as_string) else {
            continue;
        };
        let count = seen.entry(name.clone()).or_insert(0);
        let key = if *count == 0 {
            name
        } else {
            format!("{name}_{count}")
        };
        *count += 1;
        headers.push((col, key));
    }

    let mut rows = Vec::new();
    for row_idx in (header_row + 1)..=end.0 {
        let mut row = SheetRow::default();
        for (col, header) in &headers {
            if let Some(value) = range.get_value((row_idx, *col)).and_then(cell_as_string) {
                row.insert(header.clone(), value);
            }
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }
    rows
}

fn cell_as_string(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Data::Float(f) => Some(f.to_string()),
        Data::Int(i) => Some(i.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::Empty => None,
        _ => Some(format!("{cell}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(cells: &[((u32, u32), Data)]) -> Range<Data> {
        let max_row = cells.iter().map(|((r, _), _)| *r).max().unwrap_or(0);
        let max_col = cells.iter().map(|((_, c), _)| *c).max().unwrap_or(0);
        let mut range = Range::new((0, 0), (max_row, max_col));
        for (pos, value) in cells {
            range.set_value(*pos, value.clone());
        }
        range
    }

    fn s(v: &str) -> Data {
        Data::String(v.into())
    }

    #[test]
    fn header_row_offset_skips_title_row() {
        let r = range(&[
            ((0, 0), s("CMS Safety list")),
            ((1, 0), s("Hazards")),
            ((1, 1), s("Specific Hazards")),
            ((2, 0), s("Chemical")),
            ((2, 1), s("Flammable")),
        ]);
        let rows = rows_from_range(&r, 1);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Hazards"), Some("Chemical"));
        assert_eq!(rows[0].get("Specific Hazards"), Some("Flammable"));
    }

    #[test]
    fn blank_rows_and_headerless_columns_dropped() {
        let r = range(&[
            ((0, 0), s("Building")),
            ((1, 0), s("  ")),
            ((1, 2), s("orphan")),
            ((2, 0), Data::Float(32.0)),
        ]);
        let rows = rows_from_range(&r, 0);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Building"), Some("32"));
    }

    #[test]
    fn duplicate_headers_are_suffixed() {
        let r = range(&[
            ((0, 0), s("HSE Link")),
            ((0, 1), s("HSE Link")),
            ((1, 0), s("https://a")),
            ((1, 1), s("https://b")),
        ]);
        let rows = rows_from_range(&r, 0);
        assert_eq!(rows[0].get("HSE Link"), Some("https://a"));
        assert_eq!(rows[0].get("HSE Link_1"), Some("https://b"));
        assert_eq!(rows[0].values_with_prefix_ci("hse link").len(), 2);
    }

    #[test]
    fn case_insensitive_lookup() {
        let row = SheetRow::from_pairs([("building ", "40"), ("ROOM", "40/4-A01")]);
        assert_eq!(row.get_ci("Building"), Some("40"));
        assert_eq!(row.get_ci("room"), Some("40/4-A01"));
        assert_eq!(row.get("Building"), None);
    }

    #[test]
    fn header_row_past_end_yields_nothing() {
        let r = range(&[((0, 0), s("Email"))]);
        assert!(rows_from_range(&r, 3).is_empty());
    }

    #[test]
    fn missing_workbook_is_an_error() {
        let err = CalamineReader::new()
            .read_sheet(Path::new("/nonexistent/book.xlsx"), HAZARD_SHEET, 1)
            .unwrap_err();
        assert!(matches!(err, HazidError::Workbook { .. }));
    }
}

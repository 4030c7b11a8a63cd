use chrono::{Local, NaiveDate};

pub const INPUT_FORMAT: &str = "%Y-%m-%d";
pub const DISPLAY_FORMAT: &str = "%d/%m/%Y";
pub const NOT_AVAILABLE: &str = "N/A";

/// Today's date in the stored `YYYY-MM-DD` form.
pub fn today_for_input() -> String {
    Local::now().date_naive().format(INPUT_FORMAT).to_string()
}

/// Parse a stored date. Accepts `YYYY-MM-DD` and ISO timestamps that start
/// with one (`2025-03-07T09:00:00Z`).
pub fn parse_input_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, INPUT_FORMAT) {
        return Some(date);
    }
    let prefix = value.get(..10)?;
    if value[10..].starts_with('T') || value[10..].starts_with(' ') {
        NaiveDate::parse_from_str(prefix, INPUT_FORMAT).ok()
    } else {
        None
    }
}

/// Stored date -> `DD/MM/YYYY`. Empty values render as "N/A"; values that
/// are not dates are shown verbatim.
pub fn format_display_date(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return NOT_AVAILABLE.to_string();
    }
    match parse_input_date(trimmed) {
        Some(date) => date.format(DISPLAY_FORMAT).to_string(),
        None => trimmed.to_string(),
    }
}

/// `DD/MM/YYYY` -> stored `YYYY-MM-DD`. Returns an empty string when the
/// value does not have three `/`-separated parts.
pub fn display_to_input(value: &str) -> String {
    let parts: Vec<&str> = value.trim().split('/').collect();
    match parts.as_slice() {
        [day, month, year] => format!("{year}-{month}-{day}"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        assert_eq!(format_display_date("2025-03-07"), "07/03/2025");
        assert_eq!(format_display_date("2025-03-07T10:15:00Z"), "07/03/2025");
    }

    #[test]
    fn test_empty_and_garbage() {
        assert_eq!(format_display_date(""), "N/A");
        assert_eq!(format_display_date("   "), "N/A");
        assert_eq!(format_display_date("next week"), "next week");
        assert_eq!(format_display_date("2025-02-30"), "2025-02-30");
    }

    #[test]
    fn test_display_to_input() {
        assert_eq!(display_to_input("07/03/2025"), "2025-03-07");
        assert_eq!(display_to_input("2025-03-07"), "");
    }

    #[test]
    fn test_today_round_trips() {
        let today = today_for_input();
        assert!(parse_input_date(&today).is_some());
        assert_eq!(display_to_input(&format_display_date(&today)), today);
    }
}

use hazid_core::dates::format_display_date;
use hazid_core::form::{CompletionStatus, FormField, FormState};
use hazid_core::model::{ContactBundle, HazardDefinition, HazardRow};
use std::fmt::Write;

/// First line of a possibly multi-paragraph text, shortened to `max` chars.
fn summary(text: &str, max: usize) -> String {
    let first = text.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    if first.chars().count() > max {
        let cut: String = first.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        first.to_string()
    }
}

pub fn format_hazards(rows: &[&HazardRow]) -> String {
    let mut out = String::new();
    let mut current: Option<&str> = None;
    let width = rows
        .iter()
        .map(|r| r.specific_hazard.chars().count())
        .max()
        .unwrap_or(10);

    for row in rows {
        if current != Some(row.category.as_str()) {
            if current.is_some() {
                out.push('\n');
            }
            let _ = writeln!(out, "=== {} ===\n", row.category);
            current = Some(row.category.as_str());
        }
        let _ = writeln!(
            out,
            "  {:<width$}  {}",
            row.specific_hazard,
            summary(&row.safety_measures, 70),
            width = width
        );
    }
    out
}

pub fn format_definitions(definitions: &[HazardDefinition]) -> String {
    let mut out = String::new();
    let width = definitions
        .iter()
        .map(|d| d.hazard.chars().count())
        .max()
        .unwrap_or(10);
    for d in definitions {
        let _ = writeln!(out, "  {:<7} {:<width$}  {}", d.section, d.hazard, summary(&d.definition, 60), width = width);
        for link in d.reference_link.lines() {
            let _ = writeln!(out, "  {:<7} {:<width$}  -> {}", "", "", link, width = width);
        }
    }
    out
}

pub fn format_contacts(bundle: &ContactBundle) -> String {
    let mut out = String::new();
    if bundle.is_fallback {
        out.push_str("(built-in contacts; the reference workbook could not be read)\n\n");
    }
    if !bundle.web_contacts.is_empty() {
        out.push_str("Web:\n");
        for c in &bundle.web_contacts {
            let _ = writeln!(out, "  {}  <{}>", c.title, c.url);
            if !c.description.is_empty() {
                let _ = writeln!(out, "    {}", c.description);
            }
        }
    }
    if !bundle.email_contacts.is_empty() {
        if !bundle.web_contacts.is_empty() {
            out.push('\n');
        }
        out.push_str("Email:\n");
        for c in &bundle.email_contacts {
            if c.description.is_empty() {
                let _ = writeln!(out, "  {}", c.email);
            } else {
                let _ = writeln!(out, "  {}  {}", c.email, c.description);
            }
        }
    }
    if bundle.is_empty() {
        out.push_str("No contacts.\n");
    }
    out
}

pub fn format_draft(state: &FormState) -> String {
    let mut out = String::new();
    let width = FormField::ALL
        .iter()
        .map(|f| f.as_str().len())
        .max()
        .unwrap_or(20);

    for field in FormField::ALL {
        let raw = field.get(state);
        let value = match field {
            FormField::StartDate | FormField::EndDate => format_display_date(raw),
            _ => summary(raw, 70),
        };
        let _ = writeln!(out, "  {:<width$}  {}", field.as_str(), value, width = width);
    }

    out.push_str("\nHazards:\n");
    if state.selected_hazards.is_empty() {
        out.push_str("  (none selected)\n");
    }
    for category in &state.selected_hazards {
        let _ = writeln!(out, "  {category}");
        for (id, detail) in state.selected_details(category) {
            let name = detail.display_name(id);
            if detail.details.trim().is_empty() {
                let _ = writeln!(out, "    - {name}");
            } else {
                let _ = writeln!(out, "    - {name}: {}", summary(&detail.details, 60));
            }
        }
    }

    if !state.uploaded_files.is_empty() {
        out.push_str("\nAttachments:\n");
        for file in &state.uploaded_files {
            let _ = writeln!(out, "  {} ({} bytes)", file.name, file.size);
        }
    }
    out
}

pub fn format_status(status: &CompletionStatus, missing_details: &[&str]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Required fields: {}/{} ({}%)",
        status.completed, status.total, status.percentage
    );
    if !status.missing.is_empty() {
        let names: Vec<&str> = status.missing.iter().map(|f| f.as_str()).collect();
        let _ = writeln!(out, "  missing: {}", names.join(", "));
    }
    if !missing_details.is_empty() {
        let _ = writeln!(
            out,
            "Categories without selected hazards: {}",
            missing_details.join(", ")
        );
    }
    if status.is_complete() && missing_details.is_empty() {
        out.push_str("Ready to export.\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_keeps_first_line_and_truncates() {
        assert_eq!(summary("\n  Ventilate.\n\nMore", 70), "Ventilate.");
        assert_eq!(summary("abcdefghij", 6), "abc...");
        assert_eq!(summary("", 6), "");
    }

    #[test]
    fn hazards_grouped_under_category_headings() {
        let rows = [
            HazardRow {
                category: "Chemical".into(),
                specific_hazard: "Flammable".into(),
                safety_measures: "Ventilate.\n\nUse cans.".into(),
                hse_link: String::new(),
                definition: String::new(),
            },
            HazardRow {
                category: "Fire".into(),
                specific_hazard: "Hot work".into(),
                safety_measures: String::new(),
                hse_link: String::new(),
                definition: String::new(),
            },
        ];
        let refs: Vec<&HazardRow> = rows.iter().collect();
        let text = format_hazards(&refs);
        assert!(text.starts_with("=== Chemical ===\n\n  Flammable  Ventilate.\n"));
        assert!(text.contains("\n=== Fire ===\n"));
    }

    #[test]
    fn status_lists_missing_fields() {
        let state = FormState::new_at("2025-03-07");
        let text = format_status(&state.completion_status(), &["Fire"]);
        assert!(text.starts_with("Required fields: 1/7 (14%)\n"));
        assert!(text.contains("title"));
        assert!(text.contains("Categories without selected hazards: Fire"));
        assert!(!text.contains("Ready to export"));
    }
}

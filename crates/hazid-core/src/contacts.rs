use std::path::{Path, PathBuf};

use crate::error::HazidError;
use crate::fallback::{load_with_fallback, Loaded};
use crate::model::{ContactBundle, EmailContact, WebContact};
use crate::reference::ReferenceTables;
use crate::sheet::{SheetReader, SheetRow, EMAIL_CONTACTS_SHEET, WEB_CONTACTS_SHEET};

pub const CONTACTS_HEADER_ROW: u32 = 0;

/// Web contacts with both a title and a URL.
pub fn web_contacts_from_rows(rows: &[SheetRow]) -> Vec<WebContact> {
    rows.iter()
        .filter_map(|row| {
            Some(WebContact {
                title: row.get("Title")?.to_string(),
                url: row.get("URL")?.to_string(),
                description: row.get("Description").unwrap_or_default().to_string(),
            })
        })
        .collect()
}

/// Email contacts with an address.
pub fn email_contacts_from_rows(rows: &[SheetRow]) -> Vec<EmailContact> {
    rows.iter()
        .filter_map(|row| {
            Some(EmailContact {
                email: row.get("Email")?.to_string(),
                description: row.get("Description").unwrap_or_default().to_string(),
            })
        })
        .collect()
}

fn read_sheet_or_log<T>(
    reader: &dyn SheetReader,
    path: &Path,
    sheet: &str,
    convert: fn(&[SheetRow]) -> Vec<T>,
) -> Option<Vec<T>> {
    match reader.read_sheet(path, sheet, CONTACTS_HEADER_ROW) {
        Ok(rows) => Some(convert(&rows)),
        Err(e) => {
            tracing::debug!(path = %path.display(), sheet, error = %e, "contact sheet unreadable");
            None
        }
    }
}

/// Find the contact bundle among the candidate workbooks.
///
/// The first workbook where both sheets load wins. Otherwise the first
/// workbook where at least one sheet loaded is used, with the other list
/// left empty. Fails only when no sheet could be read anywhere.
pub fn resolve_contacts(
    reader: &dyn SheetReader,
    candidates: &[PathBuf],
) -> Result<(PathBuf, ContactBundle), HazidError> {
    let mut partial: Option<(PathBuf, ContactBundle)> = None;

    for path in candidates {
        let web = read_sheet_or_log(reader, path, WEB_CONTACTS_SHEET, web_contacts_from_rows);
        let email = read_sheet_or_log(reader, path, EMAIL_CONTACTS_SHEET, email_contacts_from_rows);

        match (web, email) {
            (Some(web_contacts), Some(email_contacts)) => {
                return Ok((
                    path.clone(),
                    ContactBundle {
                        web_contacts,
                        email_contacts,
                        is_fallback: false,
                    },
                ));
            }
            (None, None) => continue,
            (web, email) => {
                if partial.is_none() {
                    tracing::warn!(
                        path = %path.display(),
                        web_loaded = web.is_some(),
                        email_loaded = email.is_some(),
                        "only one contact sheet could be read"
                    );
                    partial = Some((
                        path.clone(),
                        ContactBundle {
                            web_contacts: web.unwrap_or_default(),
                            email_contacts: email.unwrap_or_default(),
                            is_fallback: false,
                        },
                    ));
                }
            }
        }
    }

    partial.ok_or_else(|| HazidError::SourceNotFound {
        what: "contacts".into(),
        tried: candidates.len(),
    })
}

/// The built-in bundle, flagged so callers can warn that it is not
/// authoritative.
pub fn fallback_contacts(tables: &ReferenceTables) -> ContactBundle {
    ContactBundle {
        web_contacts: tables.fallback_contacts.web_contacts.clone(),
        email_contacts: tables.fallback_contacts.email_contacts.clone(),
        is_fallback: true,
    }
}

pub fn load_contacts(
    reader: &dyn SheetReader,
    candidates: &[PathBuf],
    tables: &ReferenceTables,
) -> Loaded<ContactBundle> {
    load_with_fallback(
        "contacts",
        || resolve_contacts(reader, candidates),
        || fallback_contacts(tables),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::builtin::reference_tables;

    #[test]
    fn test_web_contacts_need_title_and_url() {
        let rows = vec![
            SheetRow::from_pairs([
                ("Title", " CERN HSE "),
                ("URL", "https://hse.cern/"),
                ("Description", "Website"),
            ]),
            SheetRow::from_pairs([("Title", "No link")]),
            SheetRow::from_pairs([("URL", "https://no-title")]),
        ];
        let contacts = web_contacts_from_rows(&rows);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].title, "CERN HSE");
        assert_eq!(contacts[0].description, "Website");
    }

    #[test]
    fn test_email_contacts_need_email() {
        let rows = vec![
            SheetRow::from_pairs([("Email", "cms-rso@cern.ch")]),
            SheetRow::from_pairs([("Description", "nobody")]),
        ];
        let contacts = email_contacts_from_rows(&rows);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].description, "");
    }

    #[test]
    fn test_fallback_bundle_is_flagged() {
        let bundle = fallback_contacts(reference_tables());
        assert!(bundle.is_fallback);
        assert!(!bundle.is_empty());
    }
}

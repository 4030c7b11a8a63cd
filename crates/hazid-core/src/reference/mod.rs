pub mod builtin;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::HazidError;
use crate::model::{EmailContact, LocationRecord, WebContact};
use crate::taxonomy::normalize::{fold_category, title_case};

/// A spelling variant folded into its canonical form during category
/// normalization (substring replacement, applied in table order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synonym {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackHazard {
    pub category: String,
    pub specific_hazard: String,
    #[serde(default)]
    pub safety_measures: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FallbackContacts {
    pub web_contacts: Vec<WebContact>,
    pub email_contacts: Vec<EmailContact>,
}

/// Reference tables driving category normalization, section labels and the
/// built-in datasets used when no workbook can be read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceTables {
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub synonyms: Vec<Synonym>,
    /// Canonical key of the catch-all category.
    pub other_category: String,
    /// Fixed display name of the catch-all category.
    pub other_display_name: String,
    pub default_section: String,
    /// Normalized category → section label in the safety template.
    #[serde(default)]
    pub sections: BTreeMap<String, String>,
    /// Normalized category → definition used when no definitions sheet loads.
    #[serde(default)]
    pub fallback_definitions: BTreeMap<String, String>,
    pub default_recommendation: String,
    /// Normalized category → recommendation used when the user gave none.
    #[serde(default)]
    pub category_recommendations: BTreeMap<String, String>,
    pub fallback_hazards: Vec<FallbackHazard>,
    pub fallback_locations: Vec<LocationRecord>,
    pub fallback_contacts: FallbackContacts,
}

impl ReferenceTables {
    /// Canonical lookup key for a category name.
    pub fn normalize_category(&self, raw: &str) -> String {
        fold_category(raw, &self.synonyms)
    }

    pub fn section_for(&self, key: &str) -> &str {
        self.sections
            .get(key)
            .map(String::as_str)
            .unwrap_or(&self.default_section)
    }

    /// Display form of a normalized category key.
    pub fn display_name(&self, key: &str) -> String {
        if key == self.other_category {
            self.other_display_name.clone()
        } else {
            title_case(key)
        }
    }

    /// Recommendation text for a category given under any spelling.
    pub fn category_recommendation(&self, category: &str) -> &str {
        let key = self.normalize_category(category);
        self.category_recommendations
            .get(&key)
            .map(String::as_str)
            .unwrap_or(&self.default_recommendation)
    }
}

/// Load reference tables from a JSON file.
pub fn load_reference(path: &Path) -> Result<ReferenceTables, HazidError> {
    let content = std::fs::read_to_string(path).map_err(|e| HazidError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let tables: ReferenceTables =
        serde_json::from_str(&content).map_err(|e| HazidError::ConfigLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_reference(&tables)?;
    Ok(tables)
}

/// Parse reference tables from a JSON string (no file path context).
pub fn parse_reference_str(json: &str) -> Result<ReferenceTables, HazidError> {
    let tables: ReferenceTables = serde_json::from_str(json)?;
    validate_reference(&tables)?;
    Ok(tables)
}

/// Validate that reference tables are usable by the loaders.
pub fn validate_reference(tables: &ReferenceTables) -> Result<(), HazidError> {
    for synonym in &tables.synonyms {
        if synonym.from.trim().is_empty() {
            return Err(HazidError::ReferenceInvalid(
                "synonym 'from' must not be empty".into(),
            ));
        }
        if synonym.from != synonym.from.to_lowercase() {
            return Err(HazidError::ReferenceInvalid(format!(
                "synonym '{}' must be lowercase (it is matched after lowercasing)",
                synonym.from
            )));
        }
    }

    let keyed = [
        ("sections", tables.sections.keys()),
        ("fallback_definitions", tables.fallback_definitions.keys()),
        (
            "category_recommendations",
            tables.category_recommendations.keys(),
        ),
    ];
    for (table, mut keys) in keyed {
        if let Some(key) = keys.find(|k| tables.normalize_category(k) != **k) {
            return Err(HazidError::ReferenceInvalid(format!(
                "{table} key '{key}' is not a normalized category (expected '{}')",
                tables.normalize_category(key)
            )));
        }
    }

    if tables.default_section.trim().is_empty() {
        return Err(HazidError::ReferenceInvalid(
            "default_section must not be empty".into(),
        ));
    }

    if tables.fallback_hazards.is_empty() {
        return Err(HazidError::ReferenceInvalid(
            "fallback_hazards must not be empty".into(),
        ));
    }
    for hazard in &tables.fallback_hazards {
        if hazard.category.trim().is_empty() || hazard.specific_hazard.trim().is_empty() {
            return Err(HazidError::ReferenceInvalid(
                "fallback hazards need a category and a specific hazard".into(),
            ));
        }
    }

    if tables.fallback_locations.is_empty() {
        return Err(HazidError::ReferenceInvalid(
            "fallback_locations must not be empty".into(),
        ));
    }

    if tables.fallback_contacts.web_contacts.is_empty()
        && tables.fallback_contacts.email_contacts.is_empty()
    {
        return Err(HazidError::ReferenceInvalid(
            "fallback_contacts must not be empty".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "version": "1",
        "synonyms": [{ "from": "other hazards", "to": "others" }],
        "other_category": "others",
        "other_display_name": "Other Hazards",
        "default_section": "§ 9",
        "sections": { "chemical": "§ 1" },
        "default_recommendation": "Be careful",
        "fallback_hazards": [{ "category": "Chemical", "specific_hazard": "Flammable" }],
        "fallback_locations": [{ "building": "B1", "room": "R1" }],
        "fallback_contacts": {
            "web_contacts": [],
            "email_contacts": [{ "email": "a@b.c" }]
        }
    }"#;

    #[test]
    fn parse_minimal_tables() {
        let tables = parse_reference_str(MINIMAL).unwrap();
        assert_eq!(tables.section_for("chemical"), "§ 1");
        assert_eq!(tables.section_for("fire"), "§ 9");
        assert_eq!(tables.display_name("others"), "Other Hazards");
        assert_eq!(tables.category_recommendation("Fire"), "Be careful");
    }

    #[test]
    fn unnormalized_section_key_rejected() {
        let json = MINIMAL.replace(r#""chemical": "§ 1""#, r#""Chemical": "§ 1""#);
        assert!(matches!(
            parse_reference_str(&json),
            Err(HazidError::ReferenceInvalid(_))
        ));
    }

    #[test]
    fn uppercase_synonym_rejected() {
        let json = MINIMAL.replace(r#""from": "other hazards""#, r#""from": "Other Hazards""#);
        assert!(parse_reference_str(&json).is_err());
    }

    #[test]
    fn empty_fallback_hazards_rejected() {
        let json = MINIMAL.replace(
            r#"[{ "category": "Chemical", "specific_hazard": "Flammable" }]"#,
            "[]",
        );
        assert!(parse_reference_str(&json).is_err());
    }
}

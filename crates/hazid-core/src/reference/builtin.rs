use super::ReferenceTables;
use std::sync::LazyLock;

const REFERENCE_JSON: &str = include_str!("../../../../reference/hazid-reference.json");

static REFERENCE: LazyLock<ReferenceTables> = LazyLock::new(|| {
    serde_json::from_str(REFERENCE_JSON).expect("embedded hazid-reference.json is valid")
});

/// Get the embedded reference tables.
pub fn reference_tables() -> &'static ReferenceTables {
    &REFERENCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::validate_reference;

    #[test]
    fn embedded_tables_load_and_validate() {
        let tables = reference_tables();
        validate_reference(tables).unwrap();
        assert!(!tables.fallback_hazards.is_empty());
        assert!(!tables.fallback_locations.is_empty());
    }

    #[test]
    fn every_fallback_definition_has_a_section() {
        let tables = reference_tables();
        for key in tables.fallback_definitions.keys() {
            assert!(
                tables.sections.contains_key(key),
                "fallback definition '{key}' has no section label"
            );
        }
    }

    #[test]
    fn sections_match_template() {
        let tables = reference_tables();
        assert_eq!(tables.section_for("chemical"), "§ 4.1");
        assert_eq!(tables.section_for("non ionizing radiation"), "§ 4.3");
        assert_eq!(tables.section_for("environmental protection"), "§ 5");
        assert_eq!(tables.section_for("cryogenics"), "§ 4.10");
    }

    #[test]
    fn british_spelling_folds_onto_section_key() {
        let tables = reference_tables();
        let key = tables.normalize_category("Non-Ionising Radiation");
        assert_eq!(key, "non ionizing radiation");
        assert_eq!(tables.section_for(&key), "§ 4.3");
    }
}

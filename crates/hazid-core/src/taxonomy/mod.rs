pub mod normalize;

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::error::HazidError;
use crate::fallback::{first_success, load_with_fallback, Loaded};
use crate::form::{DetailField, FormState, FormUpdate};
use crate::model::{HazardDefinition, HazardRow};
use crate::reference::ReferenceTables;
use crate::sheet::{SheetReader, SheetRow, DEFINITIONS_SHEET, HAZARD_SHEET};

/// Header of the category column; also the value a leaked header row carries.
pub const CATEGORY_HEADER: &str = "Hazards";
pub const SPECIFIC_HAZARD_HEADER: &str = "Specific Hazards";
pub const SAFETY_MEASURES_HEADER: &str = "Safety Measures";

/// The hazard list sheet has a title row above its headers.
pub const HAZARD_HEADER_ROW: u32 = 1;
pub const DEFINITIONS_HEADER_ROW: u32 = 0;

/// Placeholder reference shown when a category has no HSE link.
pub const MISSING_LINK: &str = "Link HSE";

/// Canonical hazard list plus the per-category definitions index.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardTaxonomy {
    pub hazards: Vec<HazardRow>,
    pub definitions: Vec<HazardDefinition>,
}

impl HazardTaxonomy {
    /// Hazards grouped by category, categories in first-seen order.
    pub fn group_by_category(&self) -> Vec<(&str, Vec<&HazardRow>)> {
        let mut groups: Vec<(&str, Vec<&HazardRow>)> = Vec::new();
        for row in &self.hazards {
            match groups.iter_mut().find(|(cat, _)| *cat == row.category) {
                Some((_, rows)) => rows.push(row),
                None => groups.push((row.category.as_str(), vec![row])),
            }
        }
        groups
    }

    pub fn categories(&self) -> Vec<&str> {
        self.group_by_category()
            .into_iter()
            .map(|(cat, _)| cat)
            .collect()
    }

    /// Safety measures of a specific hazard. The category is matched under
    /// normalization and the hazard name case-insensitively.
    pub fn safety_measures(
        &self,
        tables: &ReferenceTables,
        category: &str,
        specific_hazard: &str,
    ) -> Option<&str> {
        let key = tables.normalize_category(category);
        let wanted = specific_hazard.trim().to_lowercase();
        self.hazards
            .iter()
            .find(|h| {
                tables.normalize_category(&h.category) == key
                    && h.specific_hazard.trim().to_lowercase() == wanted
            })
            .map(|h| h.safety_measures.as_str())
            .filter(|m| !m.is_empty())
    }

    /// Update giving a sub-hazard the safety measures of its matching hazard
    /// as default recommendation. `None` when the entry already has one or
    /// no hazard matches its display name.
    pub fn seed_default_recommendation(
        &self,
        tables: &ReferenceTables,
        form: &FormState,
        category: &str,
        id: &str,
    ) -> Option<FormUpdate> {
        let detail = form.hazard_details.get(category)?.get(id)?;
        if !detail.default_recommendations.trim().is_empty() {
            return None;
        }
        let measures = self.safety_measures(tables, category, detail.display_name(id))?;
        Some(FormUpdate::EditSubHazard {
            category: category.to_string(),
            id: id.to_string(),
            field: DetailField::DefaultRecommendations,
            value: measures.to_string(),
        })
    }

    /// Definition entry for a category given under any spelling.
    pub fn definition_for(
        &self,
        tables: &ReferenceTables,
        category: &str,
    ) -> Option<&HazardDefinition> {
        let key = tables.normalize_category(category);
        self.definitions
            .iter()
            .find(|d| tables.normalize_category(&d.hazard) == key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct DefinitionEntry {
    definition: String,
    link: String,
}

/// Definitions and HSE links from the auxiliary sheet, keyed by normalized
/// category.
#[derive(Debug, Clone, Default)]
pub struct DefinitionIndex {
    entries: BTreeMap<String, DefinitionEntry>,
}

impl DefinitionIndex {
    pub fn from_rows(rows: &[SheetRow], tables: &ReferenceTables) -> Self {
        let mut index = DefinitionIndex::default();
        for row in rows {
            let Some(category) = row.get_any(&["Hazard Category", "Category"]) else {
                continue;
            };
            let key = tables.normalize_category(category);
            let definition = row.get("Definition").unwrap_or_default();
            let link = row.values_with_prefix_ci("hse link").join("\n");

            let entry = index.entries.entry(key).or_default();
            if !definition.is_empty() {
                entry.definition = definition.to_string();
            }
            if !link.is_empty() {
                entry.link = link;
            }
        }
        index
    }

    pub fn definition(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(|e| e.definition.as_str())
            .filter(|d| !d.is_empty())
    }

    pub fn link(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(|e| e.link.as_str())
            .filter(|l| !l.is_empty())
    }

    /// Number of categories carrying a definition.
    pub fn definition_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| !e.definition.is_empty())
            .count()
    }
}

/// Merge raw hazard-list rows into one `HazardRow` per (category, specific hazard).
///
/// Rows without a category or specific hazard are skipped, as is any row
/// whose category is the header text itself. Later duplicates contribute
/// their safety measures unless the text is already present.
pub fn group_hazard_rows(
    rows: &[SheetRow],
    index: &DefinitionIndex,
    tables: &ReferenceTables,
) -> Vec<HazardRow> {
    let mut grouped: Vec<HazardRow> = Vec::new();
    let mut positions: HashMap<(String, String), usize> = HashMap::new();

    for (row_no, row) in rows.iter().enumerate() {
        let (Some(category), Some(specific)) =
            (row.get(CATEGORY_HEADER), row.get(SPECIFIC_HAZARD_HEADER))
        else {
            tracing::debug!(row = row_no, "hazard row without category or specific hazard skipped");
            continue;
        };
        if category == CATEGORY_HEADER {
            continue;
        }
        let measures = row.get(SAFETY_MEASURES_HEADER).unwrap_or_default();

        let key = (category.to_string(), specific.to_string());
        match positions.get(&key) {
            Some(&pos) => {
                let existing = &mut grouped[pos].safety_measures;
                if !measures.is_empty() && !existing.contains(measures) {
                    if !existing.is_empty() {
                        existing.push_str("\n\n");
                    }
                    existing.push_str(measures);
                }
            }
            None => {
                let norm = tables.normalize_category(category);
                positions.insert(key, grouped.len());
                grouped.push(HazardRow {
                    category: category.to_string(),
                    specific_hazard: specific.to_string(),
                    safety_measures: measures.to_string(),
                    hse_link: index.link(&norm).unwrap_or_default().to_string(),
                    definition: index.definition(&norm).unwrap_or_default().to_string(),
                });
            }
        }
    }

    grouped
}

/// One definition per category of the index, or the fallback definitions
/// when the index carries none. Sorted by section label, then name.
pub fn build_definitions(
    index: &DefinitionIndex,
    tables: &ReferenceTables,
) -> Vec<HazardDefinition> {
    let source: Vec<(String, String)> = if index.definition_count() == 0 {
        tracing::debug!("no definitions loaded, using fallback definitions");
        tables
            .fallback_definitions
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    } else {
        index
            .entries
            .iter()
            .filter(|(_, e)| !e.definition.is_empty())
            .map(|(k, e)| (k.clone(), e.definition.clone()))
            .collect()
    };

    let mut definitions: Vec<HazardDefinition> = source
        .into_iter()
        .map(|(key, definition)| HazardDefinition {
            section: tables.section_for(&key).to_string(),
            hazard: tables.display_name(&key),
            definition,
            reference_link: index.link(&key).unwrap_or(MISSING_LINK).to_string(),
        })
        .collect();

    definitions.sort_by(|a, b| {
        section_sort_key(&a.section)
            .cmp(&section_sort_key(&b.section))
            .then_with(|| a.hazard.cmp(&b.hazard))
    });
    definitions
}

/// "§ 4.10" -> [4, 10], so that 4.2 sorts before 4.10. Unparseable labels
/// sort last.
fn section_sort_key(label: &str) -> (bool, Vec<u32>) {
    let digits = label.trim_start_matches('§').trim();
    let parts: Result<Vec<u32>, _> = digits.split('.').map(str::parse::<u32>).collect();
    match parts {
        Ok(parts) => (false, parts),
        Err(_) => (true, Vec::new()),
    }
}

/// Build a taxonomy from raw sheet rows.
pub fn build_taxonomy(
    hazard_rows: &[SheetRow],
    definition_rows: Option<&[SheetRow]>,
    tables: &ReferenceTables,
) -> HazardTaxonomy {
    let index = definition_rows
        .map(|rows| DefinitionIndex::from_rows(rows, tables))
        .unwrap_or_default();
    HazardTaxonomy {
        hazards: group_hazard_rows(hazard_rows, &index, tables),
        definitions: build_definitions(&index, tables),
    }
}

/// The built-in taxonomy used when no workbook can be read.
pub fn fallback_taxonomy(tables: &ReferenceTables) -> HazardTaxonomy {
    let rows: Vec<SheetRow> = tables
        .fallback_hazards
        .iter()
        .map(|h| {
            SheetRow::from_pairs([
                (CATEGORY_HEADER, h.category.as_str()),
                (SPECIFIC_HAZARD_HEADER, h.specific_hazard.as_str()),
                (SAFETY_MEASURES_HEADER, h.safety_measures.as_str()),
            ])
        })
        .collect();
    build_taxonomy(&rows, None, tables)
}

/// Read the taxonomy from one workbook. The definitions sheet is optional.
pub fn read_taxonomy(
    reader: &dyn SheetReader,
    path: &Path,
    tables: &ReferenceTables,
) -> Result<HazardTaxonomy, HazidError> {
    let hazard_rows = reader.read_sheet(path, HAZARD_SHEET, HAZARD_HEADER_ROW)?;
    let definition_rows = match reader.read_sheet(path, DEFINITIONS_SHEET, DEFINITIONS_HEADER_ROW) {
        Ok(rows) => Some(rows),
        Err(e) => {
            tracing::info!(error = %e, "definitions sheet unavailable, continuing without it");
            None
        }
    };

    let taxonomy = build_taxonomy(&hazard_rows, definition_rows.as_deref(), tables);
    if taxonomy.hazards.is_empty() {
        return Err(HazidError::Workbook {
            path: path.to_path_buf(),
            reason: format!("sheet '{HAZARD_SHEET}' has no rows with a category and specific hazard"),
        });
    }
    Ok(taxonomy)
}

/// Load the taxonomy from the first usable candidate workbook, falling back
/// to the built-in list.
pub fn load_taxonomy(
    reader: &dyn SheetReader,
    candidates: &[PathBuf],
    tables: &ReferenceTables,
) -> Loaded<HazardTaxonomy> {
    load_with_fallback(
        "hazard taxonomy",
        || first_success(candidates, "hazard list", |path| read_taxonomy(reader, path, tables)),
        || fallback_taxonomy(tables),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::builtin::reference_tables;

    fn hazard(cat: &str, specific: &str, measures: &str) -> SheetRow {
        SheetRow::from_pairs([
            (CATEGORY_HEADER, cat),
            (SPECIFIC_HAZARD_HEADER, specific),
            (SAFETY_MEASURES_HEADER, measures),
        ])
    }

    fn definition(cat: &str, text: &str, link: &str) -> SheetRow {
        SheetRow::from_pairs([
            ("Hazard Category", cat),
            ("Definition", text),
            ("HSE Link(s)", link),
        ])
    }

    #[test]
    fn test_seed_default_recommendation_from_measures() {
        let tables = reference_tables();
        let taxonomy = fallback_taxonomy(tables);
        let form = FormState::new_at("2025-03-07").apply(FormUpdate::ToggleSubHazard {
            category: "Chemical".into(),
            id: "Flammable".into(),
            selected: true,
        });

        let update = taxonomy
            .seed_default_recommendation(tables, &form, "Chemical", "Flammable")
            .unwrap();
        let seeded = form.apply(update);
        let detail = &seeded.hazard_details["Chemical"]["Flammable"];
        assert!(detail.default_recommendations.contains("ventilation"));
        assert!(detail.recommendations.is_empty());

        // Already seeded, unknown entry, unknown hazard name.
        assert!(taxonomy
            .seed_default_recommendation(tables, &seeded, "Chemical", "Flammable")
            .is_none());
        assert!(taxonomy
            .seed_default_recommendation(tables, &seeded, "Chemical", "h9")
            .is_none());
        let other = seeded.apply(FormUpdate::ToggleSubHazard {
            category: "Chemical".into(),
            id: "Mystery".into(),
            selected: true,
        });
        assert!(taxonomy
            .seed_default_recommendation(tables, &other, "Chemical", "Mystery")
            .is_none());
    }

    #[test]
    fn test_duplicates_merge_in_first_seen_order() {
        let rows = vec![
            hazard("Chemical", "Flammable", "Ventilate."),
            hazard("Fire", "Hot work", "Fire permit."),
            hazard("Chemical", "Flammable", "Use safety cans."),
            hazard("Chemical", "Flammable", "Ventilate."),
        ];
        let grouped = group_hazard_rows(&rows, &DefinitionIndex::default(), reference_tables());
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].specific_hazard, "Flammable");
        assert_eq!(grouped[0].safety_measures, "Ventilate.\n\nUse safety cans.");
        assert_eq!(grouped[1].category, "Fire");
    }

    #[test]
    fn test_substring_duplicate_not_appended() {
        let rows = vec![
            hazard("Chemical", "Corrosive", "Wear gloves. Use goggles."),
            hazard("Chemical", "Corrosive", "Use goggles."),
        ];
        let grouped = group_hazard_rows(&rows, &DefinitionIndex::default(), reference_tables());
        assert_eq!(grouped[0].safety_measures, "Wear gloves. Use goggles.");
    }

    #[test]
    fn test_measures_from_later_row_fill_empty_entry() {
        let rows = vec![
            hazard("Chemical", "Asbestos", ""),
            hazard("Chemical", "Asbestos", "Notify HSE."),
        ];
        let grouped = group_hazard_rows(&rows, &DefinitionIndex::default(), reference_tables());
        assert_eq!(grouped[0].safety_measures, "Notify HSE.");
    }

    #[test]
    fn test_header_leak_and_incomplete_rows_skipped() {
        let rows = vec![
            hazard("Hazards", "Specific Hazards", "Safety Measures"),
            SheetRow::from_pairs([(CATEGORY_HEADER, "Chemical")]),
            SheetRow::from_pairs([(SPECIFIC_HAZARD_HEADER, "Orphan")]),
            hazard("Electrical", "Electrical equipment design", "Ground it."),
        ];
        let grouped = group_hazard_rows(&rows, &DefinitionIndex::default(), reference_tables());
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].category, "Electrical");
    }

    #[test]
    fn test_group_then_flatten_reproduces_unique_rows() {
        let rows = vec![
            hazard("Chemical", "Flammable", "a"),
            hazard("Fire", "Hot work", "b"),
            hazard("Chemical", "Explosive", "c"),
        ];
        let taxonomy = build_taxonomy(&rows, None, reference_tables());
        let flattened: Vec<&HazardRow> = taxonomy
            .group_by_category()
            .into_iter()
            .flat_map(|(_, rows)| rows)
            .collect();
        assert_eq!(flattened.len(), taxonomy.hazards.len());
        for row in &taxonomy.hazards {
            assert_eq!(flattened.iter().filter(|r| **r == row).count(), 1);
        }
        assert_eq!(taxonomy.categories(), vec!["Chemical", "Fire"]);
    }

    #[test]
    fn test_definitions_attach_by_normalized_category() {
        let tables = reference_tables();
        let defs = vec![
            definition("Non-Ionizing Radiation", "Low energy radiation.", "https://hse/nir"),
            definition("Other hazards", "Everything else.", ""),
        ];
        let rows = vec![hazard("Non ionizing radiation", "Lasers", "Goggles.")];
        let taxonomy = build_taxonomy(&rows, Some(&defs), tables);

        assert_eq!(taxonomy.hazards[0].hse_link, "https://hse/nir");
        assert_eq!(taxonomy.hazards[0].definition, "Low energy radiation.");

        assert_eq!(taxonomy.definitions.len(), 2);
        let nir = &taxonomy.definitions[0];
        assert_eq!(nir.section, "§ 4.3");
        assert_eq!(nir.hazard, "Non Ionizing Radiation");
        assert_eq!(nir.reference_link, "https://hse/nir");
        let other = &taxonomy.definitions[1];
        assert_eq!(other.hazard, "Other Hazards");
        assert_eq!(other.section, "§ 4.10");
        assert_eq!(other.reference_link, MISSING_LINK);
    }

    #[test]
    fn test_multiple_link_columns_joined() {
        let defs = vec![SheetRow::from_pairs([
            ("Category", "Fire"),
            ("Definition", "Fire things."),
            ("HSE Link", "https://a"),
            ("HSE Link 2", "https://b"),
        ])];
        let index = DefinitionIndex::from_rows(&defs, reference_tables());
        assert_eq!(index.link("fire"), Some("https://a\nhttps://b"));
    }

    #[test]
    fn test_fallback_definitions_when_sheet_has_none() {
        let tables = reference_tables();
        let defs = vec![definition("Fire", "", "https://hse/fire")];
        let taxonomy = build_taxonomy(&[], Some(&defs), tables);
        assert_eq!(taxonomy.definitions.len(), tables.fallback_definitions.len());
        let fire = taxonomy
            .definitions
            .iter()
            .find(|d| d.hazard == "Fire")
            .unwrap();
        assert_eq!(fire.reference_link, "https://hse/fire");
        assert_eq!(taxonomy.definitions[0].section, "§ 4.1");
        assert_eq!(taxonomy.definitions.last().unwrap().section, "§ 5");
    }

    #[test]
    fn test_section_sort_key_orders_numerically() {
        assert!(section_sort_key("§ 4.2") < section_sort_key("§ 4.10"));
        assert!(section_sort_key("§ 4.10") < section_sort_key("§ 5"));
        assert!(section_sort_key("§ 5") < section_sort_key("annex"));
    }

    #[test]
    fn test_fallback_taxonomy_not_empty() {
        let taxonomy = fallback_taxonomy(reference_tables());
        assert!(!taxonomy.hazards.is_empty());
        assert!(!taxonomy.definitions.is_empty());
    }

    #[test]
    fn test_safety_measures_lookup() {
        let tables = reference_tables();
        let taxonomy = fallback_taxonomy(tables);
        let measures = taxonomy.safety_measures(tables, "chemical", "flammable");
        assert!(measures.unwrap().contains("ventilation"));
        assert!(taxonomy.safety_measures(tables, "Chemical", "Unicorns").is_none());
    }
}

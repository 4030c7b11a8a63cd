use crate::reference::Synonym;

/// Normalize a hazard category name to its canonical lookup key.
///
/// Steps:
/// 1. Lowercase
/// 2. Collapse runs of whitespace to a single space and trim
/// 3. Apply synonym folding in table order (substring replacement)
/// 4. Collapse and trim again, since a replacement may leave stray spaces
pub fn fold_category(raw: &str, synonyms: &[Synonym]) -> String {
    let mut s = collapse_whitespace(&raw.to_lowercase());

    for synonym in synonyms {
        if s.contains(synonym.from.as_str()) {
            s = s.replace(synonym.from.as_str(), &synonym.to);
        }
    }

    collapse_whitespace(&s)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Uppercase the first letter of every word: "work conditions" -> "Work Conditions".
pub fn title_case(key: &str) -> String {
    key.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synonyms() -> Vec<Synonym> {
        [
            ("non-ionizing", "non ionizing"),
            ("non-ionising", "non ionizing"),
            ("ionising", "ionizing"),
            ("other hazards", "others"),
        ]
        .iter()
        .map(|(from, to)| Synonym {
            from: from.to_string(),
            to: to.to_string(),
        })
        .collect()
    }

    #[test]
    fn test_case_and_whitespace() {
        assert_eq!(fold_category("  Chemical ", &synonyms()), "chemical");
        assert_eq!(
            fold_category("Work   Conditions", &synonyms()),
            "work conditions"
        );
    }

    #[test]
    fn test_hyphen_variants_fold() {
        assert_eq!(
            fold_category("Non-Ionizing Radiation", &synonyms()),
            "non ionizing radiation"
        );
        assert_eq!(
            fold_category("Non-ionising radiation", &synonyms()),
            "non ionizing radiation"
        );
        assert_eq!(
            fold_category("Ionising Radiation", &synonyms()),
            "ionizing radiation"
        );
    }

    #[test]
    fn test_other_hazards_token() {
        assert_eq!(fold_category("Other Hazards", &synonyms()), "others");
        assert_eq!(fold_category("OTHER  HAZARDS", &synonyms()), "others");
    }

    #[test]
    fn test_no_synonyms_is_plain_lowercase() {
        assert_eq!(fold_category("Other Hazards", &[]), "other hazards");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("non ionizing radiation"), "Non Ionizing Radiation");
        assert_eq!(title_case("fire"), "Fire");
        assert_eq!(title_case(""), "");
    }
}

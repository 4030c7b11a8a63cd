use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Where a loaded dataset came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "path")]
pub enum DataSource {
    Workbook(PathBuf),
    Builtin,
}

impl DataSource {
    pub fn is_builtin(&self) -> bool {
        matches!(self, DataSource::Builtin)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Workbook(path) => write!(f, "{}", path.display()),
            DataSource::Builtin => write!(f, "built-in fallback"),
        }
    }
}

/// One specific hazard within a category, after duplicate rows were merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardRow {
    pub category: String,
    pub specific_hazard: String,
    pub safety_measures: String,
    #[serde(default)]
    pub hse_link: String,
    #[serde(default)]
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardDefinition {
    /// Section label in the safety template, e.g. "§ 4.1".
    pub section: String,
    /// Display name of the category.
    pub hazard: String,
    pub definition: String,
    pub reference_link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub building: String,
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebContact {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailContact {
    pub email: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactBundle {
    pub web_contacts: Vec<WebContact>,
    pub email_contacts: Vec<EmailContact>,
    /// Set when the bundle is built-in data rather than read from a workbook.
    #[serde(default)]
    pub is_fallback: bool,
}

impl ContactBundle {
    pub fn is_empty(&self) -> bool {
        self.web_contacts.is_empty() && self.email_contacts.is_empty()
    }
}

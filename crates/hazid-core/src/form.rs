use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::dates::today_for_input;
use crate::error::HazidError;

/// Category → sub-hazard id → detail entry.
pub type HazardDetails = BTreeMap<String, BTreeMap<String, HazardDetail>>;

/// Everything the user entered in the wizard.
///
/// Every field has a default, so partial or older drafts deserialize into a
/// complete state. `null` values are read as the default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormState {
    // Activity information
    #[serde(deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(deserialize_with = "lenient::text")]
    pub creator_name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub creator_department: String,
    #[serde(deserialize_with = "lenient::text")]
    pub responsible_person: String,
    #[serde(deserialize_with = "lenient::text")]
    pub participant_count: String,
    /// Stored as `YYYY-MM-DD`.
    #[serde(deserialize_with = "lenient::start_date")]
    pub start_date: String,
    #[serde(deserialize_with = "lenient::text")]
    pub end_date: String,
    #[serde(deserialize_with = "lenient::text")]
    pub location: String,
    #[serde(deserialize_with = "lenient::text")]
    pub building: String,
    #[serde(deserialize_with = "lenient::text")]
    pub room: String,
    #[serde(deserialize_with = "lenient::text")]
    pub location_details: String,
    #[serde(deserialize_with = "lenient::text")]
    pub cern_support: String,
    #[serde(deserialize_with = "lenient::text")]
    pub cms_support: String,

    // Documents
    #[serde(deserialize_with = "lenient::text")]
    pub safety_documents: String,
    #[serde(deserialize_with = "lenient::text")]
    pub technical_documents: String,
    #[serde(deserialize_with = "lenient::text")]
    pub other_documents: String,
    #[serde(deserialize_with = "lenient::text")]
    pub hse_support: String,
    #[serde(deserialize_with = "lenient::text")]
    pub reference_documents: String,

    #[serde(deserialize_with = "lenient::text")]
    pub activity_description: String,

    // Hazards
    /// Selected categories in the order the user picked them.
    #[serde(deserialize_with = "lenient::or_default")]
    pub selected_hazards: Vec<String>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub hazard_details: HazardDetails,

    #[serde(deserialize_with = "lenient::or_default")]
    pub uploaded_files: Vec<UploadedFile>,
}

impl Default for FormState {
    fn default() -> Self {
        FormState::new_at(&today_for_input())
    }
}

impl FormState {
    /// A fresh form whose start date is `start_date` (`YYYY-MM-DD`).
    pub fn new_at(start_date: &str) -> Self {
        FormState {
            title: String::new(),
            creator_name: String::new(),
            creator_department: String::new(),
            responsible_person: String::new(),
            participant_count: String::new(),
            start_date: start_date.to_string(),
            end_date: String::new(),
            location: String::new(),
            building: String::new(),
            room: String::new(),
            location_details: String::new(),
            cern_support: String::new(),
            cms_support: String::new(),
            safety_documents: String::new(),
            technical_documents: String::new(),
            other_documents: String::new(),
            hse_support: String::new(),
            reference_documents: String::new(),
            activity_description: String::new(),
            selected_hazards: Vec::new(),
            hazard_details: HazardDetails::new(),
            uploaded_files: Vec::new(),
        }
    }
}

/// User input for one sub-hazard of a category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct HazardDetail {
    #[serde(deserialize_with = "lenient::flag")]
    pub selected: bool,
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub details: String,
    #[serde(deserialize_with = "lenient::text")]
    pub recommendations: String,
    #[serde(
        deserialize_with = "lenient::text",
        skip_serializing_if = "String::is_empty"
    )]
    pub default_recommendations: String,
}

impl HazardDetail {
    /// Name shown in the report: the stored name, else the sub-hazard id.
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        if self.name.trim().is_empty() {
            id
        } else {
            self.name.trim()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadedFile {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    pub size: u64,
    #[serde(rename = "type", deserialize_with = "lenient::text")]
    pub mime_type: String,
    #[serde(deserialize_with = "lenient::text")]
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_path: Option<String>,
}

/// The scalar text fields of the form, addressable by their JSON names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Title,
    CreatorName,
    CreatorDepartment,
    ResponsiblePerson,
    ParticipantCount,
    StartDate,
    EndDate,
    Location,
    Building,
    Room,
    LocationDetails,
    CernSupport,
    CmsSupport,
    SafetyDocuments,
    TechnicalDocuments,
    OtherDocuments,
    HseSupport,
    ReferenceDocuments,
    ActivityDescription,
}

impl FormField {
    pub const ALL: &'static [FormField] = &[
        FormField::Title,
        FormField::CreatorName,
        FormField::CreatorDepartment,
        FormField::ResponsiblePerson,
        FormField::ParticipantCount,
        FormField::StartDate,
        FormField::EndDate,
        FormField::Location,
        FormField::Building,
        FormField::Room,
        FormField::LocationDetails,
        FormField::CernSupport,
        FormField::CmsSupport,
        FormField::SafetyDocuments,
        FormField::TechnicalDocuments,
        FormField::OtherDocuments,
        FormField::HseSupport,
        FormField::ReferenceDocuments,
        FormField::ActivityDescription,
    ];

    /// Fields that must be filled before a report is exported.
    pub const REQUIRED: &'static [FormField] = &[
        FormField::Title,
        FormField::CreatorName,
        FormField::CreatorDepartment,
        FormField::ResponsiblePerson,
        FormField::StartDate,
        FormField::Building,
        FormField::ActivityDescription,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::Title => "title",
            FormField::CreatorName => "creatorName",
            FormField::CreatorDepartment => "creatorDepartment",
            FormField::ResponsiblePerson => "responsiblePerson",
            FormField::ParticipantCount => "participantCount",
            FormField::StartDate => "startDate",
            FormField::EndDate => "endDate",
            FormField::Location => "location",
            FormField::Building => "building",
            FormField::Room => "room",
            FormField::LocationDetails => "locationDetails",
            FormField::CernSupport => "cernSupport",
            FormField::CmsSupport => "cmsSupport",
            FormField::SafetyDocuments => "safetyDocuments",
            FormField::TechnicalDocuments => "technicalDocuments",
            FormField::OtherDocuments => "otherDocuments",
            FormField::HseSupport => "hseSupport",
            FormField::ReferenceDocuments => "referenceDocuments",
            FormField::ActivityDescription => "activityDescription",
        }
    }

    pub fn get<'a>(&self, state: &'a FormState) -> &'a str {
        match self {
            FormField::Title => &state.title,
            FormField::CreatorName => &state.creator_name,
            FormField::CreatorDepartment => &state.creator_department,
            FormField::ResponsiblePerson => &state.responsible_person,
            FormField::ParticipantCount => &state.participant_count,
            FormField::StartDate => &state.start_date,
            FormField::EndDate => &state.end_date,
            FormField::Location => &state.location,
            FormField::Building => &state.building,
            FormField::Room => &state.room,
            FormField::LocationDetails => &state.location_details,
            FormField::CernSupport => &state.cern_support,
            FormField::CmsSupport => &state.cms_support,
            FormField::SafetyDocuments => &state.safety_documents,
            FormField::TechnicalDocuments => &state.technical_documents,
            FormField::OtherDocuments => &state.other_documents,
            FormField::HseSupport => &state.hse_support,
            FormField::ReferenceDocuments => &state.reference_documents,
            FormField::ActivityDescription => &state.activity_description,
        }
    }

    fn slot<'a>(&self, state: &'a mut FormState) -> &'a mut String {
        match self {
            FormField::Title => &mut state.title,
            FormField::CreatorName => &mut state.creator_name,
            FormField::CreatorDepartment => &mut state.creator_department,
            FormField::ResponsiblePerson => &mut state.responsible_person,
            FormField::ParticipantCount => &mut state.participant_count,
            FormField::StartDate => &mut state.start_date,
            FormField::EndDate => &mut state.end_date,
            FormField::Location => &mut state.location,
            FormField::Building => &mut state.building,
            FormField::Room => &mut state.room,
            FormField::LocationDetails => &mut state.location_details,
            FormField::CernSupport => &mut state.cern_support,
            FormField::CmsSupport => &mut state.cms_support,
            FormField::SafetyDocuments => &mut state.safety_documents,
            FormField::TechnicalDocuments => &mut state.technical_documents,
            FormField::OtherDocuments => &mut state.other_documents,
            FormField::HseSupport => &mut state.hse_support,
            FormField::ReferenceDocuments => &mut state.reference_documents,
            FormField::ActivityDescription => &mut state.activity_description,
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormField {
    type Err = HazidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormField::ALL
            .iter()
            .copied()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| HazidError::UnknownField(s.to_string()))
    }
}

/// Editable text fields of a sub-hazard entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailField {
    Name,
    Details,
    Recommendations,
    DefaultRecommendations,
}

/// One edit made by a wizard step.
#[derive(Debug, Clone, PartialEq)]
pub enum FormUpdate {
    SetField(FormField, String),
    SelectHazard(String),
    DeselectHazard(String),
    SetHazardDetail {
        category: String,
        id: String,
        detail: HazardDetail,
    },
    ToggleSubHazard {
        category: String,
        id: String,
        selected: bool,
    },
    EditSubHazard {
        category: String,
        id: String,
        field: DetailField,
        value: String,
    },
    AddUpload(UploadedFile),
    RemoveUpload(String),
    /// Wholesale replacement, used when a draft is loaded.
    Replace(FormState),
}

impl FormState {
    /// Return the state that results from applying `update`; `self` is left
    /// untouched.
    pub fn apply(&self, update: FormUpdate) -> FormState {
        let mut next = self.clone();
        match update {
            FormUpdate::SetField(field, value) => *field.slot(&mut next) = value,
            FormUpdate::SelectHazard(category) => {
                if !next.selected_hazards.contains(&category) {
                    next.selected_hazards.push(category);
                }
            }
            FormUpdate::DeselectHazard(category) => {
                next.selected_hazards.retain(|c| *c != category);
            }
            FormUpdate::SetHazardDetail {
                category,
                id,
                detail,
            } => {
                next.hazard_details
                    .entry(category)
                    .or_default()
                    .insert(id, detail);
            }
            FormUpdate::ToggleSubHazard {
                category,
                id,
                selected,
            } => {
                next.detail_entry(category, id).selected = selected;
            }
            FormUpdate::EditSubHazard {
                category,
                id,
                field,
                value,
            } => {
                let entry = next.detail_entry(category, id);
                match field {
                    DetailField::Name => entry.name = value,
                    DetailField::Details => entry.details = value,
                    DetailField::Recommendations => entry.recommendations = value,
                    DetailField::DefaultRecommendations => entry.default_recommendations = value,
                }
            }
            FormUpdate::AddUpload(file) => next.uploaded_files.push(file),
            FormUpdate::RemoveUpload(id) => next.uploaded_files.retain(|f| f.id != id),
            FormUpdate::Replace(state) => next = state,
        }
        next
    }

    fn detail_entry(&mut self, category: String, id: String) -> &mut HazardDetail {
        self.hazard_details
            .entry(category)
            .or_default()
            .entry(id.clone())
            .or_insert_with(|| HazardDetail {
                name: id,
                ..Default::default()
            })
    }

    /// Sub-hazards marked selected in `category`, ordered by id.
    pub fn selected_details(&self, category: &str) -> Vec<(&str, &HazardDetail)> {
        self.hazard_details
            .get(category)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(_, d)| d.selected)
                    .map(|(id, d)| (id.as_str(), d))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Selected categories with no selected sub-hazard.
    pub fn categories_missing_details(&self) -> Vec<&str> {
        self.selected_hazards
            .iter()
            .filter(|c| self.selected_details(c).is_empty())
            .map(String::as_str)
            .collect()
    }

    pub fn completion_status(&self) -> CompletionStatus {
        let missing: Vec<FormField> = FormField::REQUIRED
            .iter()
            .copied()
            .filter(|f| f.get(self).trim().is_empty())
            .collect();
        let total = FormField::REQUIRED.len();
        let completed = total - missing.len();
        CompletionStatus {
            completed,
            total,
            percentage: (completed * 100 + total / 2) / total,
            missing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionStatus {
    pub completed: usize,
    pub total: usize,
    pub percentage: usize,
    pub missing: Vec<FormField>,
}

impl CompletionStatus {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Deserializers that read what older drafts actually contain: numbers
/// where text is expected, `"true"` for booleans, `null` for anything.
mod lenient {
    use serde::de::{Deserializer, Error};
    use serde::Deserialize;
    use serde_json::Value;

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(String::new()),
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(D::Error::custom(format!("expected text, found {other}"))),
        }
    }

    pub fn start_date<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        let value = text(d)?;
        if value.trim().is_empty() {
            Ok(crate::dates::today_for_input())
        } else {
            Ok(value)
        }
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(b),
            Value::String(s) => Ok(s.trim().eq_ignore_ascii_case("true")),
            Value::Number(n) => Ok(n.as_f64().is_some_and(|v| v != 0.0)),
            other => Err(D::Error::custom(format!("expected a boolean, found {other}"))),
        }
    }

    pub fn or_default<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
    }
}

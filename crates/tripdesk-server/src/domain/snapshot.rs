//! Traveler profile snapshots and their drift from the live contact record.
//!
//! When a contact joins a trip, the profile fields that matter for ticketing
//! are copied onto the traveler. Later edits to the contact do not flow into
//! booked trips automatically; instead the back-office reviews the diff and
//! refreshes all or some of the fields.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Snapshot errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("Unknown profile field: {0}")]
    UnknownField(String),
}

/// Ticketing-relevant profile of a traveler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TravelerProfile {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub passport_number: Option<String>,
    #[serde(default)]
    pub passport_expiry: Option<NaiveDate>,
    #[serde(default)]
    pub passport_country: Option<String>,
    #[serde(default)]
    pub known_traveler_number: Option<String>,
    #[serde(default)]
    pub redress_number: Option<String>,
    #[serde(default)]
    pub dietary_requirements: Option<String>,
}

/// One field that differs between snapshot and live record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub snapshot: Option<String>,
    pub current: Option<String>,
}

#[derive(Clone, Copy)]
enum Normalize {
    Text,
    CaseInsensitive,
    Phone,
    Document,
}

impl Normalize {
    fn apply(self, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }
        let normalized = match self {
            Normalize::Text => trimmed.to_string(),
            Normalize::CaseInsensitive => trimmed.to_lowercase(),
            Normalize::Phone => trimmed
                .chars()
                .enumerate()
                .filter(|&(i, c)| c.is_ascii_digit() || (i == 0 && c == '+'))
                .map(|(_, c)| c)
                .collect(),
            Normalize::Document => trimmed
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_uppercase(),
        };
        Some(normalized)
    }
}

struct ProfileField {
    name: &'static str,
    normalize: Normalize,
}

const FIELDS: &[ProfileField] = &[
    ProfileField { name: "first_name", normalize: Normalize::Text },
    ProfileField { name: "last_name", normalize: Normalize::Text },
    ProfileField { name: "email", normalize: Normalize::CaseInsensitive },
    ProfileField { name: "phone", normalize: Normalize::Phone },
    ProfileField { name: "date_of_birth", normalize: Normalize::Text },
    ProfileField { name: "nationality", normalize: Normalize::CaseInsensitive },
    ProfileField { name: "passport_number", normalize: Normalize::Document },
    ProfileField { name: "passport_expiry", normalize: Normalize::Text },
    ProfileField { name: "passport_country", normalize: Normalize::CaseInsensitive },
    ProfileField { name: "known_traveler_number", normalize: Normalize::Document },
    ProfileField { name: "redress_number", normalize: Normalize::Document },
    ProfileField { name: "dietary_requirements", normalize: Normalize::Text },
];

fn date(value: Option<NaiveDate>) -> Option<String> {
    value.map(|d| d.format("%Y-%m-%d").to_string())
}

impl TravelerProfile {
    fn read(&self, field: &str) -> Option<String> {
        match field {
            "first_name" => Some(self.first_name.clone()),
            "last_name" => Some(self.last_name.clone()),
            "email" => self.email.clone(),
            "phone" => self.phone.clone(),
            "date_of_birth" => date(self.date_of_birth),
            "nationality" => self.nationality.clone(),
            "passport_number" => self.passport_number.clone(),
            "passport_expiry" => date(self.passport_expiry),
            "passport_country" => self.passport_country.clone(),
            "known_traveler_number" => self.known_traveler_number.clone(),
            "redress_number" => self.redress_number.clone(),
            "dietary_requirements" => self.dietary_requirements.clone(),
            _ => None,
        }
    }

    fn copy_from(&mut self, other: &TravelerProfile, field: &str) {
        match field {
            "first_name" => self.first_name = other.first_name.clone(),
            "last_name" => self.last_name = other.last_name.clone(),
            "email" => self.email = other.email.clone(),
            "phone" => self.phone = other.phone.clone(),
            "date_of_birth" => self.date_of_birth = other.date_of_birth,
            "nationality" => self.nationality = other.nationality.clone(),
            "passport_number" => self.passport_number = other.passport_number.clone(),
            "passport_expiry" => self.passport_expiry = other.passport_expiry,
            "passport_country" => self.passport_country = other.passport_country.clone(),
            "known_traveler_number" => {
                self.known_traveler_number = other.known_traveler_number.clone()
            }
            "redress_number" => self.redress_number = other.redress_number.clone(),
            "dietary_requirements" => {
                self.dietary_requirements = other.dietary_requirements.clone()
            }
            _ => {}
        }
    }
}

/// Names of all comparable profile fields, in diff order.
pub fn field_names() -> impl Iterator<Item = &'static str> {
    FIELDS.iter().map(|f| f.name)
}

fn changed(field: &ProfileField, snapshot: &TravelerProfile, live: &TravelerProfile) -> Option<FieldChange> {
    let old = snapshot.read(field.name);
    let new = live.read(field.name);
    let same = old.as_deref().and_then(|v| field.normalize.apply(v))
        == new.as_deref().and_then(|v| field.normalize.apply(v));
    if same {
        return None;
    }
    Some(FieldChange {
        field: field.name.to_string(),
        snapshot: old,
        current: new,
    })
}

/// Fields where the live record no longer matches the snapshot.
pub fn diff(snapshot: &TravelerProfile, live: &TravelerProfile) -> Vec<FieldChange> {
    FIELDS
        .iter()
        .filter_map(|f| changed(f, snapshot, live))
        .collect()
}

/// Copy changed fields from `live` into `snapshot`.
///
/// With `fields = None` every changed field is refreshed; otherwise only the
/// named ones. Returns the changes that were applied.
pub fn refresh(
    snapshot: &mut TravelerProfile,
    live: &TravelerProfile,
    fields: Option<&[String]>,
) -> Result<Vec<FieldChange>, SnapshotError> {
    if let Some(requested) = fields {
        if let Some(unknown) = requested
            .iter()
            .find(|name| !FIELDS.iter().any(|f| f.name == name.as_str()))
        {
            return Err(SnapshotError::UnknownField(unknown.clone()));
        }
    }

    let mut applied = Vec::new();
    for field in FIELDS {
        let wanted = fields.map_or(true, |names| names.iter().any(|n| n == field.name));
        if !wanted {
            continue;
        }
        if let Some(change) = changed(field, snapshot, live) {
            snapshot.copy_from(live, field.name);
            applied.push(change);
        }
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> TravelerProfile {
        TravelerProfile {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: Some("ada@example.com".to_string()),
            phone: Some("+44 20 7946 0000".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(1815, 12, 10),
            passport_number: Some("ab 123456".to_string()),
            passport_expiry: NaiveDate::from_ymd_opt(2030, 1, 31),
            ..Default::default()
        }
    }

    #[test]
    fn test_identical_profiles_have_no_diff() {
        assert!(diff(&ada(), &ada()).is_empty());
    }

    #[test]
    fn test_normalized_values_are_equal() {
        let mut live = ada();
        live.email = Some("  ADA@Example.com ".to_string());
        live.phone = Some("+44 (20) 7946-0000".to_string());
        live.passport_number = Some("AB123456".to_string());
        live.dietary_requirements = Some("   ".to_string());
        assert!(diff(&ada(), &live).is_empty());
    }

    #[test]
    fn test_diff_reports_in_field_order() {
        let mut live = ada();
        live.passport_expiry = NaiveDate::from_ymd_opt(2035, 6, 1);
        live.last_name = "King".to_string();

        let changes = diff(&ada(), &live);
        assert_eq!(
            changes,
            vec![
                FieldChange {
                    field: "last_name".to_string(),
                    snapshot: Some("Lovelace".to_string()),
                    current: Some("King".to_string()),
                },
                FieldChange {
                    field: "passport_expiry".to_string(),
                    snapshot: Some("2030-01-31".to_string()),
                    current: Some("2035-06-01".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_cleared_field_is_a_change() {
        let mut live = ada();
        live.phone = None;
        let changes = diff(&ada(), &live);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "phone");
        assert_eq!(changes[0].current, None);
    }

    #[test]
    fn test_refresh_selected_fields() {
        let mut snapshot = ada();
        let mut live = ada();
        live.last_name = "King".to_string();
        live.email = Some("countess@example.com".to_string());

        let applied = refresh(&mut snapshot, &live, Some(&["email".to_string()])).unwrap();
        assert_eq!(applied.len(), 1);
        assert_eq!(snapshot.email.as_deref(), Some("countess@example.com"));
        assert_eq!(snapshot.last_name, "Lovelace");

        let remaining = diff(&snapshot, &live);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].field, "last_name");
    }

    #[test]
    fn test_refresh_all() {
        let mut snapshot = ada();
        let mut live = ada();
        live.last_name = "King".to_string();
        live.known_traveler_number = Some("TT12345".to_string());

        let applied = refresh(&mut snapshot, &live, None).unwrap();
        assert_eq!(applied.len(), 2);
        assert_eq!(snapshot, live);
    }

    #[test]
    fn test_refresh_rejects_unknown_field() {
        let mut snapshot = ada();
        assert_eq!(
            refresh(&mut snapshot, &ada(), Some(&["shoe_size".to_string()])),
            Err(SnapshotError::UnknownField("shoe_size".to_string()))
        );
    }

    #[test]
    fn test_field_names() {
        let names: Vec<&str> = field_names().collect();
        assert_eq!(names.first(), Some(&"first_name"));
        assert!(names.contains(&"known_traveler_number"));
        assert_eq!(names.len(), 12);
    }
}

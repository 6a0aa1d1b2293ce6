//! Contact model.
//!
//! Travel documents are kept in a sealed `documents` column and only opened
//! when a caller asks for them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::domain::TravelerProfile;

/// Contact row as stored.
#[derive(Debug, Clone, FromRow)]
pub struct ContactRow {
    pub id: i64,
    pub agency_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub nationality: Option<String>,
    pub dietary_requirements: Option<String>,
    pub notes: Option<String>,
    /// Sealed [`TravelDocuments`]
    pub documents: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sensitive identity documents of a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TravelDocuments {
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
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
}

impl TravelDocuments {
    pub fn is_empty(&self) -> bool {
        *self == TravelDocuments::default()
    }
}

impl ContactRow {
    /// Live profile used for traveler snapshots.
    pub fn profile(&self, documents: &TravelDocuments) -> TravelerProfile {
        TravelerProfile {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            date_of_birth: documents.date_of_birth,
            nationality: self.nationality.clone(),
            passport_number: documents.passport_number.clone(),
            passport_expiry: documents.passport_expiry,
            passport_country: documents.passport_country.clone(),
            known_traveler_number: documents.known_traveler_number.clone(),
            redress_number: documents.redress_number.clone(),
            dietary_requirements: self.dietary_requirements.clone(),
        }
    }
}

/// Request to create a contact.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactCreateRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub dietary_requirements: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub documents: Option<TravelDocuments>,
}

/// Partial update of a contact.
///
/// Absent fields are left alone; a blank string clears an optional field.
/// `documents` replaces the whole document set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactUpdateRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub dietary_requirements: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub documents: Option<TravelDocuments>,
}

/// Contact as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct ContactResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dietary_requirements: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub has_documents: bool,
    /// Only present when requested with `include_documents=true`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<TravelDocuments>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for listing contacts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactListQuery {
    /// Case-insensitive match on name, email or phone
    #[serde(default)]
    pub q: Option<String>,
}

/// Query parameters for reading one contact.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactGetQuery {
    #[serde(default)]
    pub include_documents: bool,
}

//! Trip and trip-traveler models.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{FieldChange, PriceBreakdown, TravelerProfile, TravelerShare, TripTotals};
use crate::error::AppError;

/// Lifecycle of a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Planning,
    Quoted,
    Booked,
    InProgress,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub const ALL: [TripStatus; 6] = [
        TripStatus::Planning,
        TripStatus::Quoted,
        TripStatus::Booked,
        TripStatus::InProgress,
        TripStatus::Completed,
        TripStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Planning => "planning",
            TripStatus::Quoted => "quoted",
            TripStatus::Booked => "booked",
            TripStatus::InProgress => "in_progress",
            TripStatus::Completed => "completed",
            TripStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for TripStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TripStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("Unknown trip status: {}", s)))
    }
}

/// Trip row.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Trip {
    pub id: i64,
    #[serde(skip_serializing)]
    pub agency_id: i64,
    pub name: String,
    pub status: String,
    pub currency: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub advisor_name: Option<String>,
    /// Overrides the agency's advisor share when set
    pub advisor_share_bps: Option<i32>,
    /// Public handle for the client portal
    pub share_token: Uuid,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    pub fn status(&self) -> Result<TripStatus, AppError> {
        self.status.parse()
    }
}

/// Request to create a trip.
#[derive(Debug, Clone, Deserialize)]
pub struct TripCreateRequest {
    pub name: String,
    #[serde(default)]
    pub status: Option<TripStatus>,
    /// Defaults to the agency currency
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub advisor_name: Option<String>,
    #[serde(default)]
    pub advisor_share_bps: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update of a trip. `null` clears nullable fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripUpdateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<TripStatus>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub end_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub advisor_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub advisor_share_bps: Option<Option<i32>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub notes: Option<Option<String>>,
}

/// Query parameters for listing trips.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripListQuery {
    #[serde(default)]
    pub status: Option<TripStatus>,
}

/// Trip traveler row; `snapshot` holds a sealed [`TravelerProfile`].
#[derive(Debug, Clone, FromRow)]
pub struct TripTravelerRow {
    pub id: i64,
    pub trip_id: i64,
    pub contact_id: i64,
    pub position: i32,
    pub is_primary: bool,
    pub snapshot: Vec<u8>,
    pub snapshot_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Request to add a contact to a trip.
#[derive(Debug, Clone, Deserialize)]
pub struct AddTravelerRequest {
    pub contact_id: i64,
    #[serde(default)]
    pub is_primary: bool,
}

/// Request to refresh a traveler snapshot from the live contact.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshTravelerRequest {
    /// Field names to refresh; all changed fields when absent
    #[serde(default)]
    pub fields: Option<Vec<String>>,
}

/// Traveler as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct TravelerResponse {
    pub id: i64,
    pub contact_id: i64,
    pub position: i32,
    pub is_primary: bool,
    pub display_name: String,
    pub profile: TravelerProfile,
    pub snapshot_at: DateTime<Utc>,
    /// Live contact no longer matches the snapshot
    pub has_changes: bool,
}

/// Snapshot drift for one traveler.
#[derive(Debug, Clone, Serialize)]
pub struct TravelerDiffResponse {
    pub traveler_id: i64,
    pub has_changes: bool,
    pub changes: Vec<FieldChange>,
}

/// Result of a snapshot refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TravelerRefreshResponse {
    pub traveler: TravelerResponse,
    pub applied: Vec<FieldChange>,
}

/// Price and split of one activity in a trip summary.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityPricing {
    pub activity_id: i64,
    pub day_number: i32,
    pub name: String,
    pub kind: String,
    pub price: PriceBreakdown,
    pub shares: Vec<TravelerShare>,
}

/// One traveler's total across the trip.
#[derive(Debug, Clone, Serialize)]
pub struct TravelerTotal {
    pub traveler_id: i64,
    pub contact_id: i64,
    pub display_name: String,
    pub amount_cents: i64,
}

/// Money view of a whole trip.
#[derive(Debug, Clone, Serialize)]
pub struct TripSummary {
    pub trip_id: i64,
    pub currency: String,
    pub advisor_share_bps: i32,
    pub activities: Vec<ActivityPricing>,
    pub totals: TripTotals,
    pub travelers: Vec<TravelerTotal>,
    /// Client total not assigned to any traveler (trip has no travelers)
    pub unallocated_cents: i64,
    /// Human-readable amounts, e.g. `"USD 1,234.56"`
    pub formatted: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_through_str() {
        for status in TripStatus::ALL {
            assert_eq!(status.as_str().parse::<TripStatus>().unwrap(), status);
        }
        assert!("archived".parse::<TripStatus>().is_err());
    }

    #[test]
    fn test_update_request_clears_dates() {
        let req: TripUpdateRequest =
            serde_json::from_str(r#"{"end_date": null, "status": "booked"}"#).unwrap();
        assert_eq!(req.end_date, Some(None));
        assert_eq!(req.start_date, None);
        assert_eq!(req.status, Some(TripStatus::Booked));
    }
}

//! Itinerary day and activity models.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::domain::{
    ActivityDetails, ActivityKind, ActivityLocation, CascadeReport, DayLocation, GeoPoint,
    LocationSource, PriceBreakdown, PriceInputs, PricingModel, SplitRule, TravelerShare,
};
use crate::error::AppResult;

/// Itinerary day row.
#[derive(Debug, Clone, FromRow)]
pub struct DayRow {
    pub id: i64,
    pub trip_id: i64,
    pub day_number: i32,
    pub date: Option<NaiveDate>,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub location: Option<Json<GeoPoint>>,
    pub location_source: String,
    pub lodging_activity_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DayRow {
    pub fn source(&self) -> LocationSource {
        LocationSource::from_columns(&self.location_source, self.lodging_activity_id)
    }

    pub fn location_state(&self) -> DayLocation {
        DayLocation {
            day_id: self.id,
            day_number: self.day_number,
            location: self.location.as_ref().map(|l| l.0.clone()),
            source: self.source(),
        }
    }
}

/// Activity row.
#[derive(Debug, Clone, FromRow)]
pub struct ActivityRow {
    pub id: i64,
    pub trip_id: i64,
    pub day_id: i64,
    pub kind: String,
    pub name: String,
    pub details: Json<ActivityDetails>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub position: i32,
    pub location: Option<Json<GeoPoint>>,
    pub location_inherited: bool,
    pub pricing_model: String,
    pub cost_cents: i64,
    pub markup_bps: i32,
    pub sell_price_cents: Option<i64>,
    pub commission_bps: i32,
    pub tax_cents: i64,
    pub service_fee_cents: i64,
    pub split_rule: Option<Json<SplitRule>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ActivityRow {
    pub fn kind(&self) -> AppResult<ActivityKind> {
        Ok(self.kind.parse()?)
    }

    pub fn price_inputs(&self) -> AppResult<PriceInputs> {
        let model: PricingModel = self.pricing_model.parse()?;
        Ok(PriceInputs {
            model,
            cost_cents: self.cost_cents,
            markup_bps: self.markup_bps,
            sell_price_cents: self.sell_price_cents,
            commission_bps: self.commission_bps,
            tax_cents: self.tax_cents,
            service_fee_cents: self.service_fee_cents,
        })
    }

    /// Stored rule, or the equal split across all travelers.
    pub fn split_rule(&self) -> SplitRule {
        self.split_rule
            .as_ref()
            .map(|r| r.0.clone())
            .unwrap_or_default()
    }

    pub fn location_state(&self) -> ActivityLocation {
        ActivityLocation {
            activity_id: self.id,
            day_id: self.day_id,
            location: self.location.as_ref().map(|l| l.0.clone()),
            inherited: self.location_inherited,
        }
    }
}

/// Request to add a day to an itinerary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DayCreateRequest {
    /// Insert at this day number, shifting later days; appends when absent
    #[serde(default)]
    pub day_number: Option<i32>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update of a day.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DayUpdateRequest {
    #[serde(default, deserialize_with = "super::nullable")]
    pub date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub notes: Option<Option<String>>,
}

/// Pin a day's location, or `null` to inherit from earlier days.
#[derive(Debug, Clone, Deserialize)]
pub struct DayLocationRequest {
    pub location: Option<GeoPoint>,
}

/// Day as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct DayResponse {
    pub id: i64,
    pub day_number: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub location: Option<GeoPoint>,
    pub location_source: LocationSource,
    pub activities: Vec<ActivityResponse>,
}

/// Result of a change that moves locations around.
#[derive(Debug, Clone, Serialize)]
pub struct LocationChangeResponse<T> {
    #[serde(flatten)]
    pub item: T,
    pub cascade: CascadeReport,
}

/// Request to create an activity under a day.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityCreateRequest {
    pub kind: ActivityKind,
    /// Generated from the details when blank or absent
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub details: ActivityDetails,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    /// Explicit location; the activity follows its day when absent
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub pricing: PriceInputs,
}

/// Partial update of an activity.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityUpdateRequest {
    #[serde(default)]
    pub kind: Option<ActivityKind>,
    /// Blank regenerates the name from the details
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub details: Option<ActivityDetails>,
    /// Move to another day of the same trip
    #[serde(default)]
    pub day_id: Option<i64>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub start_time: Option<Option<NaiveTime>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub end_time: Option<Option<NaiveTime>>,
    /// `null` makes the activity follow its day again
    #[serde(default, deserialize_with = "super::nullable")]
    pub location: Option<Option<GeoPoint>>,
    /// Replaces all pricing fields
    #[serde(default)]
    pub pricing: Option<PriceInputs>,
}

/// Activity as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityResponse {
    pub id: i64,
    pub day_id: i64,
    pub kind: String,
    pub name: String,
    pub details: ActivityDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    pub position: i32,
    pub location: Option<GeoPoint>,
    pub location_inherited: bool,
    pub pricing: PriceInputs,
    pub price: PriceBreakdown,
    /// `null` when the default equal split applies
    pub split_rule: Option<SplitRule>,
}

/// Split of one activity's client total.
#[derive(Debug, Clone, Serialize)]
pub struct SplitResponse {
    pub activity_id: i64,
    pub total_cents: i64,
    pub rule: SplitRule,
    pub is_default: bool,
    pub shares: Vec<TravelerShare>,
    pub unallocated_cents: i64,
}

/// Replace an activity's split rule; `null` restores the default.
#[derive(Debug, Clone, Deserialize)]
pub struct SplitUpdateRequest {
    pub rule: Option<SplitRule>,
}

/// Render a name without saving anything.
#[derive(Debug, Clone, Deserialize)]
pub struct NamePreviewRequest {
    pub kind: ActivityKind,
    #[serde(default)]
    pub details: ActivityDetails,
    /// Try out a template instead of the agency's
    #[serde(default)]
    pub template: Option<String>,
    /// Names already used on the day, for disambiguation
    #[serde(default)]
    pub existing: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamePreviewResponse {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_create_defaults() {
        let req: ActivityCreateRequest =
            serde_json::from_str(r#"{"kind": "dining", "details": {"venue": "Noma"}}"#).unwrap();
        assert_eq!(req.kind, ActivityKind::Dining);
        assert!(req.name.is_none());
        assert_eq!(req.pricing, PriceInputs::default());
        assert_eq!(req.details.venue.as_deref(), Some("Noma"));
    }

    #[test]
    fn test_split_request_accepts_null() {
        let req: SplitUpdateRequest = serde_json::from_str(r#"{"rule": null}"#).unwrap();
        assert!(req.rule.is_none());

        let req: SplitUpdateRequest = serde_json::from_str(
            r#"{"rule": {"mode": "shares", "allocations": [{"traveler_id": 1, "share_bps": 10000}]}}"#,
        )
        .unwrap();
        assert!(matches!(req.rule, Some(SplitRule::Shares { .. })));
    }

    #[test]
    fn test_day_location_request() {
        let req: DayLocationRequest = serde_json::from_str(
            r#"{"location": {"name": "Rome", "latitude": 41.9, "longitude": 12.5}}"#,
        )
        .unwrap();
        assert_eq!(req.location.map(|l| l.name), Some("Rome".to_string()));
    }
}

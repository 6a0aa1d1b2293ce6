//! Client portal view of a trip.
//!
//! Only what the client may see: no supplier cost, markup, commission or
//! advisor payouts.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::domain::GeoPoint;

#[derive(Debug, Clone, Serialize)]
pub struct PortalTrip {
    pub name: String,
    pub status: String,
    pub currency: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub days: Vec<PortalDay>,
    pub travelers: Vec<PortalTraveler>,
    pub client_total_cents: i64,
    pub paid_cents: i64,
    pub balance_due_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortalDay {
    pub day_number: i32,
    pub date: Option<NaiveDate>,
    pub title: Option<String>,
    pub location: Option<GeoPoint>,
    pub activities: Vec<PortalActivity>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortalActivity {
    pub name: String,
    pub kind: String,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub location: Option<GeoPoint>,
    /// What the client pays for this activity, taxes and fees included
    pub client_total_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortalTraveler {
    pub display_name: String,
    pub amount_cents: i64,
}

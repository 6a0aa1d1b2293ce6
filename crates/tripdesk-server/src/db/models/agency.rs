//! Agency (tenant) model.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A travel agency; every other row belongs to exactly one.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Agency {
    pub id: i64,
    pub name: String,
    /// URL-safe unique handle
    pub slug: String,
    pub default_currency: String,
    /// Advisor share of agency revenue, used when a trip has no override
    pub advisor_share_bps: i32,
    /// Activity kind -> minijinja name template
    pub naming_templates: Json<HashMap<String, String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create an agency.
#[derive(Debug, Clone, Deserialize)]
pub struct AgencyCreateRequest {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub default_currency: Option<String>,
    #[serde(default)]
    pub advisor_share_bps: Option<i32>,
    #[serde(default)]
    pub naming_templates: HashMap<String, String>,
}

/// Request to update the current agency.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgencyUpdateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub default_currency: Option<String>,
    #[serde(default)]
    pub advisor_share_bps: Option<i32>,
    /// Replaces the whole template map when present
    #[serde(default)]
    pub naming_templates: Option<HashMap<String, String>>,
}

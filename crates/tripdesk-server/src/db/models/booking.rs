//! Supplier booking model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

/// Booking lifecycle: `pending -> confirmed -> ticketed`, and any
/// non-cancelled state may be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Ticketed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Ticketed => "ticketed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Confirmed, Ticketed) | (Pending | Confirmed | Ticketed, Cancelled)
        ) || self == next
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "ticketed" => Ok(BookingStatus::Ticketed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(AppError::Validation(format!(
                "Unknown booking status: {}",
                other
            ))),
        }
    }
}

/// Booking row.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Booking {
    pub id: i64,
    pub trip_id: i64,
    pub activity_id: Option<i64>,
    pub supplier: String,
    pub confirmation_number: Option<String>,
    pub status: String,
    pub amount_paid_cents: i64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a booking.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingCreateRequest {
    pub supplier: String,
    #[serde(default)]
    pub activity_id: Option<i64>,
    #[serde(default)]
    pub confirmation_number: Option<String>,
    #[serde(default)]
    pub status: Option<BookingStatus>,
    #[serde(default)]
    pub amount_paid_cents: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update of a booking.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingUpdateRequest {
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub activity_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub confirmation_number: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<BookingStatus>,
    #[serde(default)]
    pub amount_paid_cents: Option<i64>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub notes: Option<Option<String>>,
}

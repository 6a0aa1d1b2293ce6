//! Supplier bookings and payments against a trip.

use crate::db::models::{
    clean, Booking, BookingCreateRequest, BookingStatus, BookingUpdateRequest,
};
use crate::db::queries::booking::{self as queries, BookingFields};
use crate::db::queries::itinerary as itinerary_queries;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};

use super::agency::required;
use super::trip::find_trip;

/// Service for booking operations.
#[derive(Clone)]
pub struct BookingService {
    pool: DbPool,
}

fn check_amount(amount_paid_cents: i64) -> AppResult<i64> {
    if amount_paid_cents < 0 {
        return Err(AppError::Validation(format!(
            "amount_paid_cents must not be negative, got {}",
            amount_paid_cents
        )));
    }
    Ok(amount_paid_cents)
}

fn check_transition(current: BookingStatus, next: BookingStatus) -> AppResult<BookingStatus> {
    if !current.can_transition_to(next) {
        return Err(AppError::Validation(format!(
            "Booking cannot move from {} to {}",
            current.as_str(),
            next.as_str()
        )));
    }
    Ok(next)
}

impl BookingService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, agency_id: i64, trip_id: i64) -> AppResult<Vec<Booking>> {
        find_trip(&self.pool, agency_id, trip_id).await?;
        queries::list_bookings(&self.pool, trip_id).await
    }

    pub async fn create(
        &self,
        agency_id: i64,
        trip_id: i64,
        request: BookingCreateRequest,
    ) -> AppResult<Booking> {
        find_trip(&self.pool, agency_id, trip_id).await?;

        let supplier = required(Some(request.supplier), "supplier")?;
        let amount_paid_cents = check_amount(request.amount_paid_cents)?;
        if let Some(activity_id) = request.activity_id {
            self.check_activity(trip_id, activity_id).await?;
        }
        let confirmation_number = clean(request.confirmation_number);
        let notes = clean(request.notes);

        let fields = BookingFields {
            activity_id: request.activity_id,
            supplier: &supplier,
            confirmation_number: confirmation_number.as_deref(),
            status: request.status.unwrap_or(BookingStatus::Pending),
            amount_paid_cents,
            notes: notes.as_deref(),
        };
        let id = queries::insert_booking(&self.pool, trip_id, &fields).await?;

        tracing::info!(trip_id, booking_id = id, supplier = %supplier, "Booking created");
        self.find(trip_id, id).await
    }

    pub async fn update(
        &self,
        agency_id: i64,
        trip_id: i64,
        booking_id: i64,
        request: BookingUpdateRequest,
    ) -> AppResult<Booking> {
        find_trip(&self.pool, agency_id, trip_id).await?;
        let booking = self.find(trip_id, booking_id).await?;
        let current: BookingStatus = booking.status.parse()?;

        let supplier = match request.supplier {
            Some(supplier) => required(Some(supplier), "supplier")?,
            None => booking.supplier.clone(),
        };
        let status = match request.status {
            Some(next) => check_transition(current, next)?,
            None => current,
        };
        let amount_paid_cents =
            check_amount(request.amount_paid_cents.unwrap_or(booking.amount_paid_cents))?;
        let activity_id = request.activity_id.unwrap_or(booking.activity_id);
        if let Some(activity_id) = activity_id.filter(|id| Some(*id) != booking.activity_id) {
            self.check_activity(trip_id, activity_id).await?;
        }
        let confirmation_number = match request.confirmation_number {
            Some(v) => clean(v),
            None => booking.confirmation_number.clone(),
        };
        let notes = match request.notes {
            Some(v) => clean(v),
            None => booking.notes.clone(),
        };

        let fields = BookingFields {
            activity_id,
            supplier: &supplier,
            confirmation_number: confirmation_number.as_deref(),
            status,
            amount_paid_cents,
            notes: notes.as_deref(),
        };
        queries::update_booking(&self.pool, booking_id, &fields).await?;

        if status != current {
            tracing::info!(
                trip_id,
                booking_id,
                from = current.as_str(),
                to = status.as_str(),
                "Booking status changed"
            );
        }
        self.find(trip_id, booking_id).await
    }

    pub async fn delete(&self, agency_id: i64, trip_id: i64, booking_id: i64) -> AppResult<()> {
        find_trip(&self.pool, agency_id, trip_id).await?;
        if !queries::delete_booking(&self.pool, trip_id, booking_id).await? {
            return Err(AppError::NotFound(format!("Booking {} not found", booking_id)));
        }
        tracing::info!(trip_id, booking_id, "Booking deleted");
        Ok(())
    }

    async fn find(&self, trip_id: i64, booking_id: i64) -> AppResult<Booking> {
        queries::get_booking(&self.pool, trip_id, booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", booking_id)))
    }

    async fn check_activity(&self, trip_id: i64, activity_id: i64) -> AppResult<()> {
        match itinerary_queries::get_activity(&self.pool, trip_id, activity_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::Validation(format!(
                "Activity {} is not part of trip {}",
                activity_id, trip_id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_amount_rejected() {
        assert_eq!(check_amount(0).unwrap(), 0);
        assert!(matches!(check_amount(-1), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_transition_errors_are_validation() {
        use BookingStatus::*;
        assert_eq!(check_transition(Pending, Confirmed).unwrap(), Confirmed);
        let err = check_transition(Cancelled, Confirmed).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("cancelled to confirmed"));
    }
}

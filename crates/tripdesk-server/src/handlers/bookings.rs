//! Booking handlers.

use axum::{extract::State, http::StatusCode};

use crate::db::models::{Booking, BookingCreateRequest, BookingUpdateRequest};
use crate::error::AppResult;
use crate::extract::{Json, Path};
use crate::services::BookingService;
use crate::tenant::Tenant;

/// `GET /api/v1/trips/{id}/bookings`
pub async fn list(
    State(service): State<BookingService>,
    tenant: Tenant,
    Path(trip_id): Path<i64>,
) -> AppResult<Json<Vec<Booking>>> {
    Ok(Json(service.list(tenant.agency_id, trip_id).await?))
}

/// `POST /api/v1/trips/{id}/bookings`
///
/// ```json
/// {"supplier": "Hotel Artemide", "activity_id": 12, "amount_paid_cents": 45000}
/// ```
pub async fn create(
    State(service): State<BookingService>,
    tenant: Tenant,
    Path(trip_id): Path<i64>,
    Json(request): Json<BookingCreateRequest>,
) -> AppResult<(StatusCode, Json<Booking>)> {
    let booking = service.create(tenant.agency_id, trip_id, request).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Update a booking. Status moves `pending -> confirmed -> ticketed`, or to
/// `cancelled`; anything else is `400`.
///
/// `PATCH /api/v1/trips/{id}/bookings/{bid}`
pub async fn update(
    State(service): State<BookingService>,
    tenant: Tenant,
    Path((trip_id, booking_id)): Path<(i64, i64)>,
    Json(request): Json<BookingUpdateRequest>,
) -> AppResult<Json<Booking>> {
    let booking = service
        .update(tenant.agency_id, trip_id, booking_id, request)
        .await?;
    Ok(Json(booking))
}

/// `DELETE /api/v1/trips/{id}/bookings/{bid}`
pub async fn delete(
    State(service): State<BookingService>,
    tenant: Tenant,
    Path((trip_id, booking_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    service.delete(tenant.agency_id, trip_id, booking_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

//! Itinerary day handlers.

use axum::{extract::State, http::StatusCode};

use crate::db::models::{
    DayCreateRequest, DayLocationRequest, DayResponse, DayUpdateRequest, LocationChangeResponse,
};
use crate::domain::CascadeReport;
use crate::error::AppResult;
use crate::extract::{Json, Path};
use crate::services::ItineraryService;
use crate::tenant::Tenant;

/// Days in order, each with its activities.
///
/// `GET /api/v1/trips/{id}/days`
pub async fn list(
    State(service): State<ItineraryService>,
    tenant: Tenant,
    Path(trip_id): Path<i64>,
) -> AppResult<Json<Vec<DayResponse>>> {
    Ok(Json(service.list_days(tenant.agency_id, trip_id).await?))
}

/// Append a day, or insert it at `day_number` and shift the rest.
///
/// `POST /api/v1/trips/{id}/days`
pub async fn create(
    State(service): State<ItineraryService>,
    tenant: Tenant,
    Path(trip_id): Path<i64>,
    Json(request): Json<DayCreateRequest>,
) -> AppResult<(StatusCode, Json<DayResponse>)> {
    let day = service.create_day(tenant.agency_id, trip_id, request).await?;
    Ok((StatusCode::CREATED, Json(day)))
}

/// `PATCH /api/v1/trips/{id}/days/{day}`
pub async fn update(
    State(service): State<ItineraryService>,
    tenant: Tenant,
    Path((trip_id, day_id)): Path<(i64, i64)>,
    Json(request): Json<DayUpdateRequest>,
) -> AppResult<Json<DayResponse>> {
    let day = service
        .update_day(tenant.agency_id, trip_id, day_id, request)
        .await?;
    Ok(Json(day))
}

/// Delete a day; later days are renumbered. Returns the location cascade.
///
/// `DELETE /api/v1/trips/{id}/days/{day}`
pub async fn delete(
    State(service): State<ItineraryService>,
    tenant: Tenant,
    Path((trip_id, day_id)): Path<(i64, i64)>,
) -> AppResult<Json<CascadeReport>> {
    Ok(Json(service.delete_day(tenant.agency_id, trip_id, day_id).await?))
}

/// Pin the day's location (`{"location": {...}}`) or release it (`{"location": null}`).
///
/// `PUT /api/v1/trips/{id}/days/{day}/location`
pub async fn set_location(
    State(service): State<ItineraryService>,
    tenant: Tenant,
    Path((trip_id, day_id)): Path<(i64, i64)>,
    Json(request): Json<DayLocationRequest>,
) -> AppResult<Json<LocationChangeResponse<DayResponse>>> {
    let response = service
        .set_day_location(tenant.agency_id, trip_id, day_id, request.location)
        .await?;
    Ok(Json(response))
}

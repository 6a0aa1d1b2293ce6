//! Trip handlers.

use axum::{extract::State, http::StatusCode};

use crate::db::models::{Trip, TripCreateRequest, TripListQuery, TripSummary, TripUpdateRequest};
use crate::error::AppResult;
use crate::extract::{Json, Path, Query};
use crate::services::TripService;
use crate::tenant::Tenant;

/// `GET /api/v1/trips?status=`
pub async fn list(
    State(service): State<TripService>,
    tenant: Tenant,
    Query(query): Query<TripListQuery>,
) -> AppResult<Json<Vec<Trip>>> {
    Ok(Json(service.list(tenant.agency_id, query.status).await?))
}

/// Create a trip.
///
/// `POST /api/v1/trips`
///
/// With both `start_date` and `end_date`, one itinerary day is generated per
/// date.
///
/// ```json
/// {"name": "Italy in May", "start_date": "2026-05-01", "end_date": "2026-05-10"}
/// ```
pub async fn create(
    State(service): State<TripService>,
    tenant: Tenant,
    Json(request): Json<TripCreateRequest>,
) -> AppResult<(StatusCode, Json<Trip>)> {
    let trip = service.create(tenant.agency_id, request).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

/// `GET /api/v1/trips/{id}`
pub async fn get(
    State(service): State<TripService>,
    tenant: Tenant,
    Path(trip_id): Path<i64>,
) -> AppResult<Json<Trip>> {
    Ok(Json(service.get(tenant.agency_id, trip_id).await?))
}

/// `PATCH /api/v1/trips/{id}`
pub async fn update(
    State(service): State<TripService>,
    tenant: Tenant,
    Path(trip_id): Path<i64>,
    Json(request): Json<TripUpdateRequest>,
) -> AppResult<Json<Trip>> {
    Ok(Json(service.update(tenant.agency_id, trip_id, request).await?))
}

/// `DELETE /api/v1/trips/{id}`
pub async fn delete(
    State(service): State<TripService>,
    tenant: Tenant,
    Path(trip_id): Path<i64>,
) -> AppResult<StatusCode> {
    service.delete(tenant.agency_id, trip_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Money view of a trip: per-activity pricing, totals, traveler shares,
/// paid and balance due.
///
/// `GET /api/v1/trips/{id}/summary`
pub async fn summary(
    State(service): State<TripService>,
    tenant: Tenant,
    Path(trip_id): Path<i64>,
) -> AppResult<Json<TripSummary>> {
    Ok(Json(service.summary(tenant.agency_id, trip_id).await?))
}

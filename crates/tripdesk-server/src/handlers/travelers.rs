//! Trip traveler handlers.

use axum::{extract::State, http::StatusCode};

use crate::db::models::{
    AddTravelerRequest, RefreshTravelerRequest, TravelerDiffResponse, TravelerRefreshResponse,
    TravelerResponse,
};
use crate::error::AppResult;
use crate::extract::{Json, Path};
use crate::services::TravelerService;
use crate::tenant::Tenant;

/// `GET /api/v1/trips/{id}/travelers`
pub async fn list(
    State(service): State<TravelerService>,
    tenant: Tenant,
    Path(trip_id): Path<i64>,
) -> AppResult<Json<Vec<TravelerResponse>>> {
    Ok(Json(service.list(tenant.agency_id, trip_id).await?))
}

/// Add a contact to the trip, snapshotting their profile.
///
/// `POST /api/v1/trips/{id}/travelers`
pub async fn add(
    State(service): State<TravelerService>,
    tenant: Tenant,
    Path(trip_id): Path<i64>,
    Json(request): Json<AddTravelerRequest>,
) -> AppResult<(StatusCode, Json<TravelerResponse>)> {
    let traveler = service.add(tenant.agency_id, trip_id, request).await?;
    Ok((StatusCode::CREATED, Json(traveler)))
}

/// `DELETE /api/v1/trips/{id}/travelers/{tid}`
pub async fn remove(
    State(service): State<TravelerService>,
    tenant: Tenant,
    Path((trip_id, traveler_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    service.remove(tenant.agency_id, trip_id, traveler_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fields where the snapshot and the live contact disagree.
///
/// `GET /api/v1/trips/{id}/travelers/{tid}/diff`
pub async fn diff(
    State(service): State<TravelerService>,
    tenant: Tenant,
    Path((trip_id, traveler_id)): Path<(i64, i64)>,
) -> AppResult<Json<TravelerDiffResponse>> {
    Ok(Json(service.diff(tenant.agency_id, trip_id, traveler_id).await?))
}

/// `POST /api/v1/trips/{id}/travelers/{tid}/refresh`
///
/// An empty object refreshes every changed field.
///
/// ```json
/// {"fields": ["passport_number", "passport_expiry"]}
/// ```
pub async fn refresh(
    State(service): State<TravelerService>,
    tenant: Tenant,
    Path((trip_id, traveler_id)): Path<(i64, i64)>,
    Json(request): Json<RefreshTravelerRequest>,
) -> AppResult<Json<TravelerRefreshResponse>> {
    let response = service
        .refresh(tenant.agency_id, trip_id, traveler_id, request.fields)
        .await?;
    Ok(Json(response))
}

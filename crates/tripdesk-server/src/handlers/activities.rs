//! Activity handlers, including cost splits and name previews.

use axum::{extract::State, http::StatusCode};

use crate::db::models::{
    ActivityCreateRequest, ActivityResponse, ActivityUpdateRequest, LocationChangeResponse,
    NamePreviewRequest, NamePreviewResponse, SplitResponse, SplitUpdateRequest,
};
use crate::domain::CascadeReport;
use crate::error::AppResult;
use crate::extract::{Json, Path};
use crate::services::activity::preview_default_name;
use crate::services::ActivityService;
use crate::tenant::Tenant;

/// Add an activity to a day. Without a `name`, one is generated.
///
/// `POST /api/v1/trips/{id}/days/{day}/activities`
///
/// ```json
/// {
///   "kind": "hotel",
///   "details": {"property_name": "Hotel Artemide", "nights": 3},
///   "location": {"name": "Rome", "latitude": 41.9, "longitude": 12.49},
///   "pricing": {"model": "commissionable", "cost_cents": 90000, "commission_bps": 1000}
/// }
/// ```
pub async fn create(
    State(service): State<ActivityService>,
    tenant: Tenant,
    Path((trip_id, day_id)): Path<(i64, i64)>,
    Json(request): Json<ActivityCreateRequest>,
) -> AppResult<(StatusCode, Json<LocationChangeResponse<ActivityResponse>>)> {
    let response = service
        .create(tenant.agency_id, trip_id, day_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /api/v1/trips/{id}/activities/{aid}`
pub async fn get(
    State(service): State<ActivityService>,
    tenant: Tenant,
    Path((trip_id, activity_id)): Path<(i64, i64)>,
) -> AppResult<Json<ActivityResponse>> {
    Ok(Json(service.get(tenant.agency_id, trip_id, activity_id).await?))
}

/// `PATCH /api/v1/trips/{id}/activities/{aid}`
pub async fn update(
    State(service): State<ActivityService>,
    tenant: Tenant,
    Path((trip_id, activity_id)): Path<(i64, i64)>,
    Json(request): Json<ActivityUpdateRequest>,
) -> AppResult<Json<LocationChangeResponse<ActivityResponse>>> {
    let response = service
        .update(tenant.agency_id, trip_id, activity_id, request)
        .await?;
    Ok(Json(response))
}

/// `DELETE /api/v1/trips/{id}/activities/{aid}`
pub async fn delete(
    State(service): State<ActivityService>,
    tenant: Tenant,
    Path((trip_id, activity_id)): Path<(i64, i64)>,
) -> AppResult<Json<CascadeReport>> {
    Ok(Json(service.delete(tenant.agency_id, trip_id, activity_id).await?))
}

/// `GET /api/v1/trips/{id}/activities/{aid}/split`
pub async fn get_split(
    State(service): State<ActivityService>,
    tenant: Tenant,
    Path((trip_id, activity_id)): Path<(i64, i64)>,
) -> AppResult<Json<SplitResponse>> {
    let split = service
        .get_split(tenant.agency_id, trip_id, activity_id)
        .await?;
    Ok(Json(split))
}

/// Store a split rule; `{"rule": null}` restores the equal split.
///
/// `PUT /api/v1/trips/{id}/activities/{aid}/split`
pub async fn set_split(
    State(service): State<ActivityService>,
    tenant: Tenant,
    Path((trip_id, activity_id)): Path<(i64, i64)>,
    Json(request): Json<SplitUpdateRequest>,
) -> AppResult<Json<SplitResponse>> {
    let split = service
        .set_split(tenant.agency_id, trip_id, activity_id, request.rule)
        .await?;
    Ok(Json(split))
}

/// Render an activity name without saving.
///
/// `POST /api/v1/activities/name-preview`
///
/// With `X-Agency-Id` the agency's templates apply; without it, the built-in ones.
pub async fn name_preview(
    State(service): State<ActivityService>,
    tenant: Option<Tenant>,
    Json(request): Json<NamePreviewRequest>,
) -> AppResult<Json<NamePreviewResponse>> {
    let response = match tenant {
        Some(tenant) => service.preview_name(tenant.agency_id, request).await?,
        None => NamePreviewResponse {
            name: preview_default_name(&request)?,
        },
    };
    Ok(Json(response))
}

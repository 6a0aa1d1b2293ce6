//! Agency handlers.

use axum::{extract::State, http::StatusCode};

use crate::db::models::{Agency, AgencyCreateRequest, AgencyUpdateRequest};
use crate::error::AppResult;
use crate::extract::Json;
use crate::services::AgencyService;
use crate::tenant::Tenant;

/// Register an agency.
///
/// `POST /api/v1/admin/agencies`
///
/// ```json
/// {"name": "Wanderlust Travel", "slug": "wanderlust", "default_currency": "EUR"}
/// ```
pub async fn create(
    State(service): State<AgencyService>,
    Json(request): Json<AgencyCreateRequest>,
) -> AppResult<(StatusCode, Json<Agency>)> {
    let agency = service.create(request).await?;
    Ok((StatusCode::CREATED, Json(agency)))
}

/// `GET /api/v1/agency`
pub async fn get(State(service): State<AgencyService>, tenant: Tenant) -> AppResult<Json<Agency>> {
    Ok(Json(service.get(tenant.agency_id).await?))
}

/// Update the current agency, including its naming templates.
///
/// `PATCH /api/v1/agency`
pub async fn update(
    State(service): State<AgencyService>,
    tenant: Tenant,
    Json(request): Json<AgencyUpdateRequest>,
) -> AppResult<Json<Agency>> {
    Ok(Json(service.update(tenant.agency_id, request).await?))
}

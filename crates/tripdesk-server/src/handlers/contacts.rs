//! Contact handlers.

use axum::{extract::State, http::StatusCode};

use crate::db::models::{
    ContactCreateRequest, ContactGetQuery, ContactListQuery, ContactResponse, ContactUpdateRequest,
};
use crate::error::AppResult;
use crate::extract::{Json, Path, Query};
use crate::services::ContactService;
use crate::tenant::Tenant;

/// List contacts alphabetically by last then first name.
///
/// `GET /api/v1/contacts?q=`
pub async fn list(
    State(service): State<ContactService>,
    tenant: Tenant,
    Query(query): Query<ContactListQuery>,
) -> AppResult<Json<Vec<ContactResponse>>> {
    let contacts = service.list(tenant.agency_id, query.q.as_deref()).await?;
    Ok(Json(contacts))
}

/// `POST /api/v1/contacts`
pub async fn create(
    State(service): State<ContactService>,
    tenant: Tenant,
    Json(request): Json<ContactCreateRequest>,
) -> AppResult<(StatusCode, Json<ContactResponse>)> {
    let contact = service.create(tenant.agency_id, request).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

/// Read one contact. Travel documents are only opened when asked for.
///
/// `GET /api/v1/contacts/{id}?include_documents=true`
pub async fn get(
    State(service): State<ContactService>,
    tenant: Tenant,
    Path(id): Path<i64>,
    Query(query): Query<ContactGetQuery>,
) -> AppResult<Json<ContactResponse>> {
    let contact = service
        .get(tenant.agency_id, id, query.include_documents)
        .await?;
    Ok(Json(contact))
}

/// `PATCH /api/v1/contacts/{id}`
pub async fn update(
    State(service): State<ContactService>,
    tenant: Tenant,
    Path(id): Path<i64>,
    Json(request): Json<ContactUpdateRequest>,
) -> AppResult<Json<ContactResponse>> {
    Ok(Json(service.update(tenant.agency_id, id, request).await?))
}

/// Delete a contact; `409 Conflict` while they travel on any trip.
///
/// `DELETE /api/v1/contacts/{id}`
pub async fn delete(
    State(service): State<ContactService>,
    tenant: Tenant,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    service.delete(tenant.agency_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

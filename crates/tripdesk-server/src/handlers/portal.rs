//! Client portal handler. No tenant header: the share token is the key.

use axum::extract::State;
use uuid::Uuid;

use crate::db::models::PortalTrip;
use crate::error::AppResult;
use crate::extract::{Json, Path};
use crate::services::PortalService;

/// `GET /api/v1/portal/{share_token}`
pub async fn get_trip(
    State(service): State<PortalService>,
    Path(share_token): Path<Uuid>,
) -> AppResult<Json<PortalTrip>> {
    Ok(Json(service.trip(share_token).await?))
}

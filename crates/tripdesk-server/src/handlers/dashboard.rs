//! Dashboard handler.

use axum::extract::State;

use crate::error::AppResult;
use crate::extract::Json;
use crate::services::dashboard::DashboardStats;
use crate::services::DashboardService;
use crate::tenant::Tenant;

/// Trip counts by status, upcoming departures and revenue per currency
/// across non-cancelled trips.
///
/// `GET /api/v1/dashboard`
pub async fn get_stats(
    State(service): State<DashboardService>,
    tenant: Tenant,
) -> AppResult<Json<DashboardStats>> {
    Ok(Json(service.stats(tenant.agency_id).await?))
}

//! Database administration handlers.

use axum::extract::State;

use crate::db::schema::{init_schema, validate_schema, SchemaReport};
use crate::db::DbPool;
use crate::error::AppResult;
use crate::extract::Json;

/// Apply the embedded schema.
///
/// `POST /api/v1/admin/db/init`
///
/// Safe to repeat: every statement is `IF NOT EXISTS`.
pub async fn init_database(State(db): State<DbPool>) -> AppResult<Json<SchemaReport>> {
    Ok(Json(init_schema(&db).await?))
}

/// Report which required tables exist.
///
/// `GET /api/v1/admin/db/validate`
pub async fn validate_database(State(db): State<DbPool>) -> AppResult<Json<SchemaReport>> {
    let report = validate_schema(&db).await?;
    if !report.valid {
        tracing::warn!(missing = ?report.missing, "Database schema incomplete");
    }
    Ok(Json(report))
}

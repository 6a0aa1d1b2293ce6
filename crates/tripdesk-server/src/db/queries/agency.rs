//! Agency queries.

use std::collections::HashMap;

use sqlx::types::Json;

use crate::db::models::Agency;
use crate::db::DbPool;
use crate::error::AppResult;

const AGENCY_COLUMNS: &str = "id, name, slug, default_currency, advisor_share_bps, \
                              naming_templates, created_at, updated_at";

/// Insert an agency and return its id.
pub async fn insert_agency(
    pool: &DbPool,
    name: &str,
    slug: &str,
    default_currency: &str,
    advisor_share_bps: i32,
    naming_templates: &HashMap<String, String>,
) -> AppResult<i64> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO tripdesk.agencies (name, slug, default_currency, advisor_share_bps, naming_templates)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(slug)
    .bind(default_currency)
    .bind(advisor_share_bps)
    .bind(Json(naming_templates))
    .fetch_one(pool)
    .await?;

    Ok(id)
}

pub async fn get_agency(pool: &DbPool, id: i64) -> AppResult<Option<Agency>> {
    let agency = sqlx::query_as::<_, Agency>(&format!(
        "SELECT {} FROM tripdesk.agencies WHERE id = $1",
        AGENCY_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(agency)
}

/// Overwrite the mutable agency fields.
pub async fn update_agency(
    pool: &DbPool,
    id: i64,
    name: &str,
    default_currency: &str,
    advisor_share_bps: i32,
    naming_templates: &HashMap<String, String>,
) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE tripdesk.agencies
        SET name = $2, default_currency = $3, advisor_share_bps = $4,
            naming_templates = $5, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(default_currency)
    .bind(advisor_share_bps)
    .bind(Json(naming_templates))
    .execute(pool)
    .await?;

    Ok(())
}

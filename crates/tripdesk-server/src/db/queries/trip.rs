//! Trip queries.

use chrono::NaiveDate;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::db::models::{Trip, TripStatus};
use crate::db::DbPool;
use crate::error::AppResult;

const TRIP_COLUMNS: &str = "id, agency_id, name, status, currency, start_date, end_date, \
                            advisor_name, advisor_share_bps, share_token, notes, \
                            created_at, updated_at";

/// Column values of a trip, shared by insert and update.
pub struct TripFields<'a> {
    pub name: &'a str,
    pub status: TripStatus,
    pub currency: &'a str,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub advisor_name: Option<&'a str>,
    pub advisor_share_bps: Option<i32>,
    pub notes: Option<&'a str>,
}

pub async fn insert_trip<'e, E: PgExecutor<'e>>(
    executor: E,
    agency_id: i64,
    fields: &TripFields<'_>,
    share_token: Uuid,
) -> AppResult<i64> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO tripdesk.trips
            (agency_id, name, status, currency, start_date, end_date,
             advisor_name, advisor_share_bps, share_token, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id
        "#,
    )
    .bind(agency_id)
    .bind(fields.name)
    .bind(fields.status.as_str())
    .bind(fields.currency)
    .bind(fields.start_date)
    .bind(fields.end_date)
    .bind(fields.advisor_name)
    .bind(fields.advisor_share_bps)
    .bind(share_token)
    .bind(fields.notes)
    .fetch_one(executor)
    .await?;

    Ok(id)
}

pub async fn update_trip<'e, E: PgExecutor<'e>>(
    executor: E,
    agency_id: i64,
    id: i64,
    fields: &TripFields<'_>,
) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE tripdesk.trips
        SET name = $3, status = $4, currency = $5, start_date = $6, end_date = $7,
            advisor_name = $8, advisor_share_bps = $9, notes = $10, updated_at = NOW()
        WHERE agency_id = $1 AND id = $2
        "#,
    )
    .bind(agency_id)
    .bind(id)
    .bind(fields.name)
    .bind(fields.status.as_str())
    .bind(fields.currency)
    .bind(fields.start_date)
    .bind(fields.end_date)
    .bind(fields.advisor_name)
    .bind(fields.advisor_share_bps)
    .bind(fields.notes)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn get_trip<'e, E: PgExecutor<'e>>(
    executor: E,
    agency_id: i64,
    id: i64,
) -> AppResult<Option<Trip>> {
    let trip = sqlx::query_as::<_, Trip>(&format!(
        "SELECT {} FROM tripdesk.trips WHERE agency_id = $1 AND id = $2",
        TRIP_COLUMNS
    ))
    .bind(agency_id)
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(trip)
}

/// Trip by its portal token, across agencies.
pub async fn get_trip_by_share_token(pool: &DbPool, token: Uuid) -> AppResult<Option<Trip>> {
    let trip = sqlx::query_as::<_, Trip>(&format!(
        "SELECT {} FROM tripdesk.trips WHERE share_token = $1",
        TRIP_COLUMNS
    ))
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(trip)
}

/// Trips of an agency, soonest first, undated trips last.
pub async fn list_trips(
    pool: &DbPool,
    agency_id: i64,
    status: Option<TripStatus>,
) -> AppResult<Vec<Trip>> {
    let trips = sqlx::query_as::<_, Trip>(&format!(
        r#"
        SELECT {} FROM tripdesk.trips
        WHERE agency_id = $1 AND ($2::text IS NULL OR status = $2)
        ORDER BY start_date ASC NULLS LAST, id ASC
        "#,
        TRIP_COLUMNS
    ))
    .bind(agency_id)
    .bind(status.map(|s| s.as_str()))
    .fetch_all(pool)
    .await?;

    Ok(trips)
}

pub async fn delete_trip(pool: &DbPool, agency_id: i64, id: i64) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM tripdesk.trips WHERE agency_id = $1 AND id = $2")
        .bind(agency_id)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// `(status, count)` for every status in use.
pub async fn count_trips_by_status(pool: &DbPool, agency_id: i64) -> AppResult<Vec<(String, i64)>> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT status, COUNT(*) FROM tripdesk.trips
        WHERE agency_id = $1
        GROUP BY status
        "#,
    )
    .bind(agency_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Trips that are not cancelled or completed and start within the window.
pub async fn list_upcoming_trips(
    pool: &DbPool,
    agency_id: i64,
    from: NaiveDate,
    until: NaiveDate,
) -> AppResult<Vec<Trip>> {
    let trips = sqlx::query_as::<_, Trip>(&format!(
        r#"
        SELECT {} FROM tripdesk.trips
        WHERE agency_id = $1
          AND status NOT IN ('cancelled', 'completed')
          AND start_date BETWEEN $2 AND $3
        ORDER BY start_date ASC, id ASC
        "#,
        TRIP_COLUMNS
    ))
    .bind(agency_id)
    .bind(from)
    .bind(until)
    .fetch_all(pool)
    .await?;

    Ok(trips)
}

/// Non-cancelled trips of an agency.
pub async fn list_active_trips(pool: &DbPool, agency_id: i64) -> AppResult<Vec<Trip>> {
    let trips = sqlx::query_as::<_, Trip>(&format!(
        "SELECT {} FROM tripdesk.trips WHERE agency_id = $1 AND status <> 'cancelled'",
        TRIP_COLUMNS
    ))
    .bind(agency_id)
    .fetch_all(pool)
    .await?;

    Ok(trips)
}

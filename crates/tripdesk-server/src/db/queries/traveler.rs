//! Trip traveler queries.

use sqlx::PgExecutor;

use crate::db::models::TripTravelerRow;
use crate::error::AppResult;

const TRAVELER_COLUMNS: &str =
    "id, trip_id, contact_id, position, is_primary, snapshot, snapshot_at, created_at";

/// Travelers of a trip in display order.
pub async fn list_travelers<'e, E: PgExecutor<'e>>(
    executor: E,
    trip_id: i64,
) -> AppResult<Vec<TripTravelerRow>> {
    let rows = sqlx::query_as::<_, TripTravelerRow>(&format!(
        "SELECT {} FROM tripdesk.trip_travelers WHERE trip_id = $1 ORDER BY position, id",
        TRAVELER_COLUMNS
    ))
    .bind(trip_id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

pub async fn get_traveler<'e, E: PgExecutor<'e>>(
    executor: E,
    trip_id: i64,
    id: i64,
) -> AppResult<Option<TripTravelerRow>> {
    let row = sqlx::query_as::<_, TripTravelerRow>(&format!(
        "SELECT {} FROM tripdesk.trip_travelers WHERE trip_id = $1 AND id = $2",
        TRAVELER_COLUMNS
    ))
    .bind(trip_id)
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

/// Append a traveler at the end of the trip's list.
pub async fn insert_traveler<'e, E: PgExecutor<'e>>(
    executor: E,
    trip_id: i64,
    contact_id: i64,
    is_primary: bool,
    snapshot: &[u8],
) -> AppResult<i64> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO tripdesk.trip_travelers (trip_id, contact_id, position, is_primary, snapshot)
        VALUES (
            $1, $2,
            (SELECT COALESCE(MAX(position), 0) + 1 FROM tripdesk.trip_travelers WHERE trip_id = $1),
            $3, $4
        )
        RETURNING id
        "#,
    )
    .bind(trip_id)
    .bind(contact_id)
    .bind(is_primary)
    .bind(snapshot)
    .fetch_one(executor)
    .await?;

    Ok(id)
}

/// Only one primary traveler per trip.
pub async fn clear_primary<'e, E: PgExecutor<'e>>(executor: E, trip_id: i64) -> AppResult<()> {
    sqlx::query("UPDATE tripdesk.trip_travelers SET is_primary = FALSE WHERE trip_id = $1")
        .bind(trip_id)
        .execute(executor)
        .await?;

    Ok(())
}

pub async fn update_snapshot<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i64,
    snapshot: &[u8],
) -> AppResult<()> {
    sqlx::query(
        "UPDATE tripdesk.trip_travelers SET snapshot = $2, snapshot_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(snapshot)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn delete_traveler<'e, E: PgExecutor<'e>>(
    executor: E,
    trip_id: i64,
    id: i64,
) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM tripdesk.trip_travelers WHERE trip_id = $1 AND id = $2")
        .bind(trip_id)
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

//! Booking queries.

use crate::db::models::{Booking, BookingStatus};
use crate::db::DbPool;
use crate::error::AppResult;

const BOOKING_COLUMNS: &str = "id, trip_id, activity_id, supplier, confirmation_number, status, \
                               amount_paid_cents, notes, created_at, updated_at";

/// Column values of a booking, shared by insert and update.
pub struct BookingFields<'a> {
    pub activity_id: Option<i64>,
    pub supplier: &'a str,
    pub confirmation_number: Option<&'a str>,
    pub status: BookingStatus,
    pub amount_paid_cents: i64,
    pub notes: Option<&'a str>,
}

pub async fn list_bookings(pool: &DbPool, trip_id: i64) -> AppResult<Vec<Booking>> {
    let rows = sqlx::query_as::<_, Booking>(&format!(
        "SELECT {} FROM tripdesk.bookings WHERE trip_id = $1 ORDER BY id",
        BOOKING_COLUMNS
    ))
    .bind(trip_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn get_booking(pool: &DbPool, trip_id: i64, id: i64) -> AppResult<Option<Booking>> {
    let row = sqlx::query_as::<_, Booking>(&format!(
        "SELECT {} FROM tripdesk.bookings WHERE trip_id = $1 AND id = $2",
        BOOKING_COLUMNS
    ))
    .bind(trip_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub async fn insert_booking(pool: &DbPool, trip_id: i64, fields: &BookingFields<'_>) -> AppResult<i64> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO tripdesk.bookings
            (trip_id, activity_id, supplier, confirmation_number, status, amount_paid_cents, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(trip_id)
    .bind(fields.activity_id)
    .bind(fields.supplier)
    .bind(fields.confirmation_number)
    .bind(fields.status.as_str())
    .bind(fields.amount_paid_cents)
    .bind(fields.notes)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

pub async fn update_booking(pool: &DbPool, id: i64, fields: &BookingFields<'_>) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE tripdesk.bookings
        SET activity_id = $2, supplier = $3, confirmation_number = $4, status = $5,
            amount_paid_cents = $6, notes = $7, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(fields.activity_id)
    .bind(fields.supplier)
    .bind(fields.confirmation_number)
    .bind(fields.status.as_str())
    .bind(fields.amount_paid_cents)
    .bind(fields.notes)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete_booking(pool: &DbPool, trip_id: i64, id: i64) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM tripdesk.bookings WHERE trip_id = $1 AND id = $2")
        .bind(trip_id)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Amount paid across the non-cancelled bookings of each trip.
pub async fn paid_by_trip(pool: &DbPool, trip_ids: &[i64]) -> AppResult<Vec<(i64, i64)>> {
    let rows: Vec<(i64, i64)> = sqlx::query_as(
        r#"
        SELECT trip_id, COALESCE(SUM(amount_paid_cents), 0)::bigint
        FROM tripdesk.bookings
        WHERE trip_id = ANY($1) AND status <> 'cancelled'
        GROUP BY trip_id
        "#,
    )
    .bind(trip_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

//! Itinerary day and activity queries.

use chrono::{NaiveDate, NaiveTime};
use sqlx::types::Json;
use sqlx::PgExecutor;

use crate::db::models::{ActivityRow, DayRow};
use crate::db::DbPool;
use crate::domain::{ActivityDetails, ActivityKind, GeoPoint, LocationSource, PriceInputs, SplitRule};
use crate::error::AppResult;

const DAY_COLUMNS: &str = "id, trip_id, day_number, date, title, notes, location, \
                           location_source, lodging_activity_id, created_at, updated_at";

const ACTIVITY_COLUMNS: &str = "a.id, a.trip_id, a.day_id, a.kind, a.name, a.details, \
                                a.start_time, a.end_time, a.position, a.location, \
                                a.location_inherited, a.pricing_model, a.cost_cents, \
                                a.markup_bps, a.sell_price_cents, a.commission_bps, \
                                a.tax_cents, a.service_fee_cents, a.split_rule, \
                                a.created_at, a.updated_at";

// ---------------------------------------------------------------------------
// Days
// ---------------------------------------------------------------------------

pub async fn list_days<'e, E: PgExecutor<'e>>(executor: E, trip_id: i64) -> AppResult<Vec<DayRow>> {
    let rows = sqlx::query_as::<_, DayRow>(&format!(
        "SELECT {} FROM tripdesk.itinerary_days WHERE trip_id = $1 ORDER BY day_number",
        DAY_COLUMNS
    ))
    .bind(trip_id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

pub async fn get_day<'e, E: PgExecutor<'e>>(
    executor: E,
    trip_id: i64,
    id: i64,
) -> AppResult<Option<DayRow>> {
    let row = sqlx::query_as::<_, DayRow>(&format!(
        "SELECT {} FROM tripdesk.itinerary_days WHERE trip_id = $1 AND id = $2",
        DAY_COLUMNS
    ))
    .bind(trip_id)
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

pub async fn max_day_number<'e, E: PgExecutor<'e>>(executor: E, trip_id: i64) -> AppResult<i32> {
    let max: Option<i32> =
        sqlx::query_scalar("SELECT MAX(day_number) FROM tripdesk.itinerary_days WHERE trip_id = $1")
            .bind(trip_id)
            .fetch_one(executor)
            .await?;

    Ok(max.unwrap_or(0))
}

pub async fn insert_day<'e, E: PgExecutor<'e>>(
    executor: E,
    trip_id: i64,
    day_number: i32,
    date: Option<NaiveDate>,
    title: Option<&str>,
    notes: Option<&str>,
) -> AppResult<i64> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO tripdesk.itinerary_days (trip_id, day_number, date, title, notes)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(trip_id)
    .bind(day_number)
    .bind(date)
    .bind(title)
    .bind(notes)
    .fetch_one(executor)
    .await?;

    Ok(id)
}

/// Add `delta` to the number of every day at or after `from_number`.
///
/// The `(trip_id, day_number)` constraint is deferred, so this must run in a
/// transaction that leaves the numbering unique.
pub async fn shift_days<'e, E: PgExecutor<'e>>(
    executor: E,
    trip_id: i64,
    from_number: i32,
    delta: i32,
) -> AppResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE tripdesk.itinerary_days
        SET day_number = day_number + $3,
            date = CASE WHEN date IS NULL THEN NULL ELSE date + $3 END,
            updated_at = NOW()
        WHERE trip_id = $1 AND day_number >= $2
        "#,
    )
    .bind(trip_id)
    .bind(from_number)
    .bind(delta)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Re-date every day from a new trip start date.
pub async fn redate_days<'e, E: PgExecutor<'e>>(
    executor: E,
    trip_id: i64,
    start_date: NaiveDate,
) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE tripdesk.itinerary_days
        SET date = $2 + (day_number - 1), updated_at = NOW()
        WHERE trip_id = $1
        "#,
    )
    .bind(trip_id)
    .bind(start_date)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn update_day<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i64,
    date: Option<NaiveDate>,
    title: Option<&str>,
    notes: Option<&str>,
) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE tripdesk.itinerary_days
        SET date = $2, title = $3, notes = $4, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(date)
    .bind(title)
    .bind(notes)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn update_day_location<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i64,
    location: Option<&GeoPoint>,
    source: LocationSource,
) -> AppResult<()> {
    let (source, lodging_activity_id) = source.to_columns();
    sqlx::query(
        r#"
        UPDATE tripdesk.itinerary_days
        SET location = $2, location_source = $3, lodging_activity_id = $4, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(location.map(Json))
    .bind(source)
    .bind(lodging_activity_id)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn delete_day<'e, E: PgExecutor<'e>>(executor: E, trip_id: i64, id: i64) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM tripdesk.itinerary_days WHERE trip_id = $1 AND id = $2")
        .bind(trip_id)
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// Activities
// ---------------------------------------------------------------------------

/// Column values of an activity, shared by insert and update.
pub struct ActivityFields<'a> {
    pub day_id: i64,
    pub kind: ActivityKind,
    pub name: &'a str,
    pub details: &'a ActivityDetails,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub pricing: &'a PriceInputs,
}

/// Activities of a trip in itinerary order.
pub async fn list_activities<'e, E: PgExecutor<'e>>(
    executor: E,
    trip_id: i64,
) -> AppResult<Vec<ActivityRow>> {
    let rows = sqlx::query_as::<_, ActivityRow>(&format!(
        r#"
        SELECT {} FROM tripdesk.activities a
        JOIN tripdesk.itinerary_days d ON d.id = a.day_id
        WHERE a.trip_id = $1
        ORDER BY d.day_number, a.start_time NULLS LAST, a.position, a.id
        "#,
        ACTIVITY_COLUMNS
    ))
    .bind(trip_id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Activities of several trips at once.
pub async fn list_activities_for_trips(pool: &DbPool, trip_ids: &[i64]) -> AppResult<Vec<ActivityRow>> {
    let rows = sqlx::query_as::<_, ActivityRow>(&format!(
        "SELECT {} FROM tripdesk.activities a WHERE a.trip_id = ANY($1)",
        ACTIVITY_COLUMNS
    ))
    .bind(trip_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn get_activity<'e, E: PgExecutor<'e>>(
    executor: E,
    trip_id: i64,
    id: i64,
) -> AppResult<Option<ActivityRow>> {
    let row = sqlx::query_as::<_, ActivityRow>(&format!(
        "SELECT {} FROM tripdesk.activities a WHERE a.trip_id = $1 AND a.id = $2",
        ACTIVITY_COLUMNS
    ))
    .bind(trip_id)
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

/// Names already used on a day, optionally ignoring one activity.
pub async fn names_on_day<'e, E: PgExecutor<'e>>(
    executor: E,
    day_id: i64,
    exclude_activity: Option<i64>,
) -> AppResult<Vec<String>> {
    let names: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT name FROM tripdesk.activities
        WHERE day_id = $1 AND ($2::bigint IS NULL OR id <> $2)
        "#,
    )
    .bind(day_id)
    .bind(exclude_activity)
    .fetch_all(executor)
    .await?;

    Ok(names)
}

/// Insert an activity at the end of its day. It starts out following the
/// day's location.
pub async fn insert_activity<'e, E: PgExecutor<'e>>(
    executor: E,
    trip_id: i64,
    fields: &ActivityFields<'_>,
) -> AppResult<i64> {
    let pricing = fields.pricing;
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO tripdesk.activities
            (trip_id, day_id, kind, name, details, start_time, end_time, position,
             pricing_model, cost_cents, markup_bps, sell_price_cents, commission_bps,
             tax_cents, service_fee_cents)
        VALUES (
            $1, $2, $3, $4, $5, $6, $7,
            (SELECT COALESCE(MAX(position), 0) + 1 FROM tripdesk.activities WHERE day_id = $2),
            $8, $9, $10, $11, $12, $13, $14
        )
        RETURNING id
        "#,
    )
    .bind(trip_id)
    .bind(fields.day_id)
    .bind(fields.kind.as_str())
    .bind(fields.name)
    .bind(Json(fields.details))
    .bind(fields.start_time)
    .bind(fields.end_time)
    .bind(pricing.model.as_str())
    .bind(pricing.cost_cents)
    .bind(pricing.markup_bps)
    .bind(pricing.sell_price_cents)
    .bind(pricing.commission_bps)
    .bind(pricing.tax_cents)
    .bind(pricing.service_fee_cents)
    .fetch_one(executor)
    .await?;

    Ok(id)
}

pub async fn update_activity<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i64,
    fields: &ActivityFields<'_>,
) -> AppResult<()> {
    let pricing = fields.pricing;
    sqlx::query(
        r#"
        UPDATE tripdesk.activities
        SET day_id = $2, kind = $3, name = $4, details = $5, start_time = $6, end_time = $7,
            pricing_model = $8, cost_cents = $9, markup_bps = $10, sell_price_cents = $11,
            commission_bps = $12, tax_cents = $13, service_fee_cents = $14, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(fields.day_id)
    .bind(fields.kind.as_str())
    .bind(fields.name)
    .bind(Json(fields.details))
    .bind(fields.start_time)
    .bind(fields.end_time)
    .bind(pricing.model.as_str())
    .bind(pricing.cost_cents)
    .bind(pricing.markup_bps)
    .bind(pricing.sell_price_cents)
    .bind(pricing.commission_bps)
    .bind(pricing.tax_cents)
    .bind(pricing.service_fee_cents)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn update_activity_location<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i64,
    location: Option<&GeoPoint>,
    inherited: bool,
) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE tripdesk.activities
        SET location = $2, location_inherited = $3, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(location.map(Json))
    .bind(inherited)
    .execute(executor)
    .await?;

    Ok(())
}

/// Store a split rule; `None` restores the default equal split.
pub async fn update_split_rule<'e, E: PgExecutor<'e>>(
    executor: E,
    id: i64,
    rule: Option<&SplitRule>,
) -> AppResult<()> {
    sqlx::query("UPDATE tripdesk.activities SET split_rule = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(rule.map(Json))
        .execute(executor)
        .await?;

    Ok(())
}

pub async fn delete_activity<'e, E: PgExecutor<'e>>(
    executor: E,
    trip_id: i64,
    id: i64,
) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM tripdesk.activities WHERE trip_id = $1 AND id = $2")
        .bind(trip_id)
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

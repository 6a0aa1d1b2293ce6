//! Contact queries. Every query is scoped by agency.

use crate::db::models::ContactRow;
use crate::db::DbPool;
use crate::error::AppResult;

const CONTACT_COLUMNS: &str = "id, agency_id, first_name, last_name, email, phone, nationality, \
                               dietary_requirements, notes, documents, created_at, updated_at";

/// Column values of a contact, shared by insert and update.
pub struct ContactFields<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub nationality: Option<&'a str>,
    pub dietary_requirements: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub documents: Option<&'a [u8]>,
}

pub async fn insert_contact(
    pool: &DbPool,
    agency_id: i64,
    fields: &ContactFields<'_>,
) -> AppResult<i64> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO tripdesk.contacts
            (agency_id, first_name, last_name, email, phone, nationality,
             dietary_requirements, notes, documents)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id
        "#,
    )
    .bind(agency_id)
    .bind(fields.first_name)
    .bind(fields.last_name)
    .bind(fields.email)
    .bind(fields.phone)
    .bind(fields.nationality)
    .bind(fields.dietary_requirements)
    .bind(fields.notes)
    .bind(fields.documents)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

pub async fn update_contact(
    pool: &DbPool,
    agency_id: i64,
    id: i64,
    fields: &ContactFields<'_>,
) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE tripdesk.contacts
        SET first_name = $3, last_name = $4, email = $5, phone = $6, nationality = $7,
            dietary_requirements = $8, notes = $9, documents = $10, updated_at = NOW()
        WHERE agency_id = $1 AND id = $2
        "#,
    )
    .bind(agency_id)
    .bind(id)
    .bind(fields.first_name)
    .bind(fields.last_name)
    .bind(fields.email)
    .bind(fields.phone)
    .bind(fields.nationality)
    .bind(fields.dietary_requirements)
    .bind(fields.notes)
    .bind(fields.documents)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_contact(pool: &DbPool, agency_id: i64, id: i64) -> AppResult<Option<ContactRow>> {
    let row = sqlx::query_as::<_, ContactRow>(&format!(
        "SELECT {} FROM tripdesk.contacts WHERE agency_id = $1 AND id = $2",
        CONTACT_COLUMNS
    ))
    .bind(agency_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// All contacts of an agency. Filtering and ordering are left to the caller.
pub async fn list_contacts(pool: &DbPool, agency_id: i64) -> AppResult<Vec<ContactRow>> {
    let rows = sqlx::query_as::<_, ContactRow>(&format!(
        "SELECT {} FROM tripdesk.contacts WHERE agency_id = $1",
        CONTACT_COLUMNS
    ))
    .bind(agency_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Contacts by id within an agency.
pub async fn get_contacts(pool: &DbPool, agency_id: i64, ids: &[i64]) -> AppResult<Vec<ContactRow>> {
    let rows = sqlx::query_as::<_, ContactRow>(&format!(
        "SELECT {} FROM tripdesk.contacts WHERE agency_id = $1 AND id = ANY($2)",
        CONTACT_COLUMNS
    ))
    .bind(agency_id)
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Number of trips the contact travels on.
pub async fn count_trips_for_contact(pool: &DbPool, contact_id: i64) -> AppResult<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM tripdesk.trip_travelers WHERE contact_id = $1")
            .bind(contact_id)
            .fetch_one(pool)
            .await?;

    Ok(count)
}

pub async fn delete_contact(pool: &DbPool, agency_id: i64, id: i64) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM tripdesk.contacts WHERE agency_id = $1 AND id = $2")
        .bind(agency_id)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn count_contacts(pool: &DbPool, agency_id: i64) -> AppResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tripdesk.contacts WHERE agency_id = $1")
        .bind(agency_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

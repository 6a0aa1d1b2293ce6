//! Contact service.

use crate::crypto::Encryptor;
use crate::db::models::{
    clean, ContactCreateRequest, ContactResponse, ContactRow, ContactUpdateRequest,
    TravelDocuments,
};
use crate::db::queries::contact::{self as queries, ContactFields};
use crate::db::DbPool;
use crate::domain::text::{contains_ci, display_name, sort_alphabetically};
use crate::domain::TravelerProfile;
use crate::error::{is_foreign_key_violation, AppError, AppResult};
use crate::result_ext::ResultExt;

use super::agency::{required, AgencyService};

/// Service for contact operations.
#[derive(Clone)]
pub struct ContactService {
    pool: DbPool,
    agencies: AgencyService,
    encryptor: Encryptor,
}

impl ContactService {
    pub fn new(pool: DbPool, agencies: AgencyService, encryptor: Encryptor) -> Self {
        Self {
            pool,
            agencies,
            encryptor,
        }
    }

    /// Contacts sorted by last then first name, ignoring case.
    pub async fn list(&self, agency_id: i64, search: Option<&str>) -> AppResult<Vec<ContactResponse>> {
        let rows = queries::list_contacts(&self.pool, agency_id).await?;

        let mut contacts: Vec<ContactResponse> = rows
            .into_iter()
            .filter(|row| search.map_or(true, |q| matches_search(row, q)))
            .map(|row| self.to_response(row, None))
            .collect();

        // Stable sorts: the last one is the primary key.
        sort_alphabetically(&mut contacts, |c| c.first_name.as_str());
        sort_alphabetically(&mut contacts, |c| c.last_name.as_str());
        Ok(contacts)
    }

    pub async fn create(
        &self,
        agency_id: i64,
        request: ContactCreateRequest,
    ) -> AppResult<ContactResponse> {
        self.agencies.get(agency_id).await?;

        let first_name = required(Some(request.first_name), "first_name")?;
        let last_name = required(Some(request.last_name), "last_name")?;
        let email = clean(request.email);
        let phone = clean(request.phone);
        let nationality = clean(request.nationality);
        let dietary = clean(request.dietary_requirements);
        let notes = clean(request.notes);
        let documents = self.seal_documents(request.documents.as_ref())?;

        let id = queries::insert_contact(
            &self.pool,
            agency_id,
            &ContactFields {
                first_name: &first_name,
                last_name: &last_name,
                email: email.as_deref(),
                phone: phone.as_deref(),
                nationality: nationality.as_deref(),
                dietary_requirements: dietary.as_deref(),
                notes: notes.as_deref(),
                documents: documents.as_deref(),
            },
        )
        .await?;

        tracing::info!(agency_id, contact_id = id, "Contact created");
        self.get(agency_id, id, false).await
    }

    pub async fn get(
        &self,
        agency_id: i64,
        id: i64,
        include_documents: bool,
    ) -> AppResult<ContactResponse> {
        let row = self.find(agency_id, id).await?;
        let documents = if include_documents {
            Some(self.open_documents(&row)?)
        } else {
            None
        };
        Ok(self.to_response(row, documents))
    }

    pub async fn update(
        &self,
        agency_id: i64,
        id: i64,
        request: ContactUpdateRequest,
    ) -> AppResult<ContactResponse> {
        let row = self.find(agency_id, id).await?;

        let first_name = match request.first_name {
            Some(v) => required(Some(v), "first_name")?,
            None => row.first_name.clone(),
        };
        let last_name = match request.last_name {
            Some(v) => required(Some(v), "last_name")?,
            None => row.last_name.clone(),
        };
        let keep = |patch: Option<String>, current: &Option<String>| match patch {
            Some(v) => clean(Some(v)),
            None => current.clone(),
        };
        let email = keep(request.email, &row.email);
        let phone = keep(request.phone, &row.phone);
        let nationality = keep(request.nationality, &row.nationality);
        let dietary = keep(request.dietary_requirements, &row.dietary_requirements);
        let notes = keep(request.notes, &row.notes);
        let documents = match request.documents {
            Some(docs) => self.seal_documents(Some(&docs))?,
            None => row.documents.clone(),
        };

        queries::update_contact(
            &self.pool,
            agency_id,
            id,
            &ContactFields {
                first_name: &first_name,
                last_name: &last_name,
                email: email.as_deref(),
                phone: phone.as_deref(),
                nationality: nationality.as_deref(),
                dietary_requirements: dietary.as_deref(),
                notes: notes.as_deref(),
                documents: documents.as_deref(),
            },
        )
        .await?;

        tracing::debug!(agency_id, contact_id = id, "Contact updated");
        self.get(agency_id, id, false).await
    }

    /// Delete a contact that is not traveling on any trip.
    pub async fn delete(&self, agency_id: i64, id: i64) -> AppResult<()> {
        self.find(agency_id, id).await?;

        let trips = queries::count_trips_for_contact(&self.pool, id).await?;
        if trips > 0 {
            return Err(AppError::Conflict(format!(
                "Contact {} is a traveler on {} trip(s)",
                id, trips
            )));
        }

        // A traveler row added since the count still blocks the delete.
        queries::delete_contact(&self.pool, agency_id, id)
            .await
            .map_err(|e| still_traveling(e, id))?;
        tracing::info!(agency_id, contact_id = id, "Contact deleted");
        Ok(())
    }

    /// Live profile of a contact, documents included.
    pub async fn profile(&self, agency_id: i64, id: i64) -> AppResult<TravelerProfile> {
        let row = self.find(agency_id, id).await?;
        self.profile_of(&row)
    }

    /// Live profiles of several contacts, keyed by contact id.
    pub async fn profiles(
        &self,
        agency_id: i64,
        ids: &[i64],
    ) -> AppResult<std::collections::HashMap<i64, TravelerProfile>> {
        queries::get_contacts(&self.pool, agency_id, ids)
            .await?
            .iter()
            .map(|row| Ok((row.id, self.profile_of(row)?)))
            .collect()
    }

    fn profile_of(&self, row: &ContactRow) -> AppResult<TravelerProfile> {
        let documents = self.open_documents(row)?;
        Ok(row.profile(&documents))
    }

    async fn find(&self, agency_id: i64, id: i64) -> AppResult<ContactRow> {
        queries::get_contact(&self.pool, agency_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Contact {} not found", id)))
    }

    fn seal_documents(&self, documents: Option<&TravelDocuments>) -> AppResult<Option<Vec<u8>>> {
        match documents {
            Some(docs) if !docs.is_empty() => Ok(Some(self.encryptor.seal_json(docs)?)),
            _ => Ok(None),
        }
    }

    fn open_documents(&self, row: &ContactRow) -> AppResult<TravelDocuments> {
        match &row.documents {
            Some(sealed) => self
                .encryptor
                .open_json(sealed)
                .log(format!("opening documents of contact {}", row.id)),
            None => Ok(TravelDocuments::default()),
        }
    }

    fn to_response(&self, row: ContactRow, documents: Option<TravelDocuments>) -> ContactResponse {
        ContactResponse {
            id: row.id,
            display_name: display_name(&row.first_name, &row.last_name),
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            nationality: row.nationality,
            dietary_requirements: row.dietary_requirements,
            notes: row.notes,
            has_documents: row.documents.is_some(),
            documents,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn still_traveling(err: AppError, id: i64) -> AppError {
    match err {
        AppError::Database(e) if is_foreign_key_violation(&e) => {
            AppError::Conflict(format!("Contact {} is a traveler on a trip", id))
        }
        other => other,
    }
}

fn matches_search(row: &ContactRow, query: &str) -> bool {
    contains_ci(&display_name(&row.first_name, &row.last_name), query)
        || row.email.as_deref().is_some_and(|e| contains_ci(e, query))
        || row.phone.as_deref().is_some_and(|p| contains_ci(p, query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::tests::foreign_key_violation;
    use chrono::Utc;

    fn row(first: &str, last: &str, email: Option<&str>) -> ContactRow {
        ContactRow {
            id: 1,
            agency_id: 1,
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: email.map(str::to_string),
            phone: Some("+1 555 0100".to_string()),
            nationality: None,
            dietary_requirements: None,
            notes: None,
            documents: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_matches_search() {
        let ada = row("Ada", "Lovelace", Some("ada@example.com"));
        assert!(matches_search(&ada, "ada love"));
        assert!(matches_search(&ada, "EXAMPLE"));
        assert!(matches_search(&ada, "555"));
        assert!(!matches_search(&ada, "babbage"));
    }

    #[test]
    fn test_delete_race_is_conflict() {
        let err = still_traveling(AppError::Database(foreign_key_violation()), 7);
        assert!(matches!(&err, AppError::Conflict(msg) if msg.contains("Contact 7")));
        assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);

        let err = still_traveling(AppError::Database(sqlx::Error::PoolTimedOut), 7);
        assert!(matches!(err, AppError::Database(_)));
    }
}

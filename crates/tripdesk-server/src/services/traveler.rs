//! Trip traveler service: snapshots of contacts and their drift.

use crate::crypto::Encryptor;
use crate::db::models::{
    AddTravelerRequest, TravelerDiffResponse, TravelerRefreshResponse, TravelerResponse,
    TripTravelerRow,
};
use crate::db::queries::{itinerary as itinerary_queries, traveler as queries};
use crate::db::DbPool;
use crate::domain::snapshot::{diff, refresh};
use crate::domain::text::display_name;
use crate::domain::TravelerProfile;
use crate::error::{is_unique_violation, AppError, AppResult};
use crate::result_ext::ResultExt;

use super::contact::ContactService;
use super::trip::find_trip;

/// Service for trip traveler operations.
#[derive(Clone)]
pub struct TravelerService {
    pool: DbPool,
    contacts: ContactService,
    encryptor: Encryptor,
}

impl TravelerService {
    pub fn new(pool: DbPool, contacts: ContactService, encryptor: Encryptor) -> Self {
        Self {
            pool,
            contacts,
            encryptor,
        }
    }

    /// Travelers in display order, each flagged when its contact has drifted.
    pub async fn list(&self, agency_id: i64, trip_id: i64) -> AppResult<Vec<TravelerResponse>> {
        find_trip(&self.pool, agency_id, trip_id).await?;
        let rows = queries::list_travelers(&self.pool, trip_id).await?;

        let contact_ids: Vec<i64> = rows.iter().map(|r| r.contact_id).collect();
        let live = self.contacts.profiles(agency_id, &contact_ids).await?;

        rows.into_iter()
            .map(|row| {
                let snapshot = self.open(&row)?;
                let has_changes = live
                    .get(&row.contact_id)
                    .is_some_and(|current| !diff(&snapshot, current).is_empty());
                Ok(to_response(row, snapshot, has_changes))
            })
            .collect()
    }

    /// Add a contact to the trip, snapshotting their current profile.
    pub async fn add(
        &self,
        agency_id: i64,
        trip_id: i64,
        request: AddTravelerRequest,
    ) -> AppResult<TravelerResponse> {
        find_trip(&self.pool, agency_id, trip_id).await?;
        let profile = self.contacts.profile(agency_id, request.contact_id).await?;
        let sealed = self.encryptor.seal_json(&profile)?;

        let mut tx = self.pool.begin().await?;
        if request.is_primary {
            queries::clear_primary(&mut *tx, trip_id).await?;
        }
        let id = queries::insert_traveler(
            &mut *tx,
            trip_id,
            request.contact_id,
            request.is_primary,
            &sealed,
        )
        .await
        .map_err(|e| match e {
            AppError::Database(ref db) if is_unique_violation(db) => AppError::Conflict(format!(
                "Contact {} is already on trip {}",
                request.contact_id, trip_id
            )),
            other => other,
        })?;
        tx.commit().await?;

        tracing::info!(trip_id, traveler_id = id, contact_id = request.contact_id, "Traveler added");
        let row = self.find(trip_id, id).await?;
        Ok(to_response(row, profile, false))
    }

    /// Remove a traveler. Split rules that named them fall back to the
    /// default equal split.
    pub async fn remove(&self, agency_id: i64, trip_id: i64, traveler_id: i64) -> AppResult<()> {
        find_trip(&self.pool, agency_id, trip_id).await?;

        let mut tx = self.pool.begin().await?;
        if !queries::delete_traveler(&mut *tx, trip_id, traveler_id).await? {
            return Err(AppError::NotFound(format!("Traveler {} not found", traveler_id)));
        }

        let activities = itinerary_queries::list_activities(&mut *tx, trip_id).await?;
        let mut reset = 0;
        for activity in activities
            .iter()
            .filter(|a| a.split_rule.as_ref().is_some_and(|r| r.0.mentions(traveler_id)))
        {
            itinerary_queries::update_split_rule(&mut *tx, activity.id, None).await?;
            reset += 1;
        }
        tx.commit().await?;

        tracing::info!(trip_id, traveler_id, reset_splits = reset, "Traveler removed");
        Ok(())
    }

    /// Fields where the live contact no longer matches the snapshot.
    pub async fn diff(
        &self,
        agency_id: i64,
        trip_id: i64,
        traveler_id: i64,
    ) -> AppResult<TravelerDiffResponse> {
        find_trip(&self.pool, agency_id, trip_id).await?;
        let row = self.find(trip_id, traveler_id).await?;
        let snapshot = self.open(&row)?;
        let live = self.contacts.profile(agency_id, row.contact_id).await?;

        let changes = diff(&snapshot, &live);
        Ok(TravelerDiffResponse {
            traveler_id,
            has_changes: !changes.is_empty(),
            changes,
        })
    }

    /// Copy changed fields (all, or the named ones) from the live contact.
    pub async fn refresh(
        &self,
        agency_id: i64,
        trip_id: i64,
        traveler_id: i64,
        fields: Option<Vec<String>>,
    ) -> AppResult<TravelerRefreshResponse> {
        find_trip(&self.pool, agency_id, trip_id).await?;
        let row = self.find(trip_id, traveler_id).await?;
        let mut snapshot = self.open(&row)?;
        let live = self.contacts.profile(agency_id, row.contact_id).await?;

        let applied = refresh(&mut snapshot, &live, fields.as_deref())?;
        if !applied.is_empty() {
            let sealed = self.encryptor.seal_json(&snapshot)?;
            queries::update_snapshot(&self.pool, traveler_id, &sealed).await?;
            tracing::info!(
                trip_id,
                traveler_id,
                fields = applied.len(),
                "Traveler snapshot refreshed"
            );
        }

        let has_changes = !diff(&snapshot, &live).is_empty();
        let row = self.find(trip_id, traveler_id).await?;
        Ok(TravelerRefreshResponse {
            traveler: to_response(row, snapshot, has_changes),
            applied,
        })
    }

    async fn find(&self, trip_id: i64, traveler_id: i64) -> AppResult<TripTravelerRow> {
        queries::get_traveler(&self.pool, trip_id, traveler_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Traveler {} not found", traveler_id)))
    }

    fn open(&self, row: &TripTravelerRow) -> AppResult<TravelerProfile> {
        self.encryptor
            .open_json(&row.snapshot)
            .log(format!("opening snapshot of traveler {}", row.id))
    }
}

fn to_response(row: TripTravelerRow, profile: TravelerProfile, has_changes: bool) -> TravelerResponse {
    TravelerResponse {
        id: row.id,
        contact_id: row.contact_id,
        position: row.position,
        is_primary: row.is_primary,
        display_name: display_name(&profile.first_name, &profile.last_name),
        profile,
        snapshot_at: row.snapshot_at,
        has_changes,
    }
}

//! Itinerary days and the location cascade.
//!
//! Every change that can move a location loads the trip's days and
//! activities inside a transaction, runs the cascade in memory and writes
//! back only the rows whose location state changed.

use chrono::Duration;
use sqlx::PgConnection;

use crate::db::models::{
    clean, ActivityRow, DayCreateRequest, DayResponse, DayRow, DayUpdateRequest,
    LocationChangeResponse, Trip,
};
use crate::db::queries::itinerary as queries;
use crate::db::DbPool;
use crate::domain::{
    ActivityDetails, ActivityKind, ActivityLocation, CascadeReport, GeoPoint, Itinerary,
};
use crate::error::{AppError, AppResult};
use crate::result_ext::OptionResultExt;

use super::activity::to_response as activity_response;
use super::agency::AgencyService;
use super::trip::find_trip;

/// Service for itinerary days.
#[derive(Clone)]
pub struct ItineraryService {
    pool: DbPool,
    agencies: AgencyService,
}

/// In-memory location view of stored rows.
pub(crate) fn build_itinerary(days: &[DayRow], activities: &[ActivityRow]) -> Itinerary {
    Itinerary::new(
        days.iter().map(DayRow::location_state).collect(),
        activities.iter().map(ActivityRow::location_state).collect(),
    )
}

/// Load the trip's itinerary within the caller's transaction.
pub(crate) async fn load_itinerary(
    conn: &mut PgConnection,
    trip_id: i64,
) -> AppResult<(Vec<DayRow>, Vec<ActivityRow>, Itinerary)> {
    let days = queries::list_days(&mut *conn, trip_id).await?;
    let activities = queries::list_activities(&mut *conn, trip_id).await?;
    let itinerary = build_itinerary(&days, &activities);
    Ok((days, activities, itinerary))
}

/// Write back days and activities whose location state differs from `before`.
pub(crate) async fn persist_locations(
    conn: &mut PgConnection,
    before: &Itinerary,
    after: &Itinerary,
) -> AppResult<usize> {
    let mut written = 0;
    for day in after.days() {
        let unchanged = before
            .day(day.day_id)
            .is_some_and(|b| b.location == day.location && b.source == day.source);
        if !unchanged {
            queries::update_day_location(&mut *conn, day.day_id, day.location.as_ref(), day.source)
                .await?;
            written += 1;
        }
    }
    for activity in after.activities() {
        let unchanged = before.activity(activity.activity_id).is_some_and(|b| {
            b.location == activity.location && b.inherited == activity.inherited
        });
        if !unchanged {
            queries::update_activity_location(
                &mut *conn,
                activity.activity_id,
                activity.location.as_ref(),
                activity.inherited,
            )
            .await?;
            written += 1;
        }
    }
    Ok(written)
}

/// Hotel stay held by an activity: nights and where, when both are known.
pub(crate) fn lodging_of(
    kind: ActivityKind,
    details: &ActivityDetails,
    location: &ActivityLocation,
) -> Option<(u32, GeoPoint)> {
    if kind != ActivityKind::Hotel || location.inherited {
        return None;
    }
    Some((details.nights?, location.location.clone()?))
}

/// Place or release an activity's hotel stay to match its current state.
pub(crate) fn sync_lodging(
    itinerary: &mut Itinerary,
    activity_id: i64,
    kind: ActivityKind,
    details: &ActivityDetails,
) -> AppResult<CascadeReport> {
    let Some(state) = itinerary
        .activity(activity_id)
        .cloned()
        .log_none(format!("activity {} missing from itinerary", activity_id))
    else {
        return Ok(CascadeReport::default());
    };
    match lodging_of(kind, details, &state) {
        Some((nights, location)) => {
            Ok(itinerary.apply_lodging(activity_id, state.day_id, nights, location)?)
        }
        None => Ok(itinerary.release_lodging(activity_id)),
    }
}

/// Advisor share in effect for a trip.
pub(crate) async fn advisor_share(agencies: &AgencyService, trip: &Trip) -> AppResult<i32> {
    match trip.advisor_share_bps {
        Some(bps) => Ok(bps),
        None => Ok(agencies.get(trip.agency_id).await?.advisor_share_bps),
    }
}

fn day_response(day: DayRow, activities: &[ActivityRow], share: i32) -> AppResult<DayResponse> {
    let source = day.source();
    let activities = activities
        .iter()
        .filter(|a| a.day_id == day.id)
        .map(|a| activity_response(a.clone(), share))
        .collect::<AppResult<Vec<_>>>()?;
    Ok(DayResponse {
        id: day.id,
        day_number: day.day_number,
        date: day.date,
        title: day.title,
        notes: day.notes,
        location: day.location.map(|l| l.0),
        location_source: source,
        activities,
    })
}

impl ItineraryService {
    pub fn new(pool: DbPool, agencies: AgencyService) -> Self {
        Self { pool, agencies }
    }

    /// Days in order with their activities.
    pub async fn list_days(&self, agency_id: i64, trip_id: i64) -> AppResult<Vec<DayResponse>> {
        let trip = find_trip(&self.pool, agency_id, trip_id).await?;
        let share = advisor_share(&self.agencies, &trip).await?;
        let days = queries::list_days(&self.pool, trip_id).await?;
        let activities = queries::list_activities(&self.pool, trip_id).await?;

        days.into_iter()
            .map(|day| day_response(day, &activities, share))
            .collect()
    }

    /// Insert a day, appending by default. Later days are renumbered.
    pub async fn create_day(
        &self,
        agency_id: i64,
        trip_id: i64,
        request: DayCreateRequest,
    ) -> AppResult<DayResponse> {
        let trip = find_trip(&self.pool, agency_id, trip_id).await?;

        let mut tx = self.pool.begin().await?;
        let last = queries::max_day_number(&mut *tx, trip_id).await?;
        let number = match request.day_number {
            Some(n) if (1..=last + 1).contains(&n) => n,
            Some(n) => {
                return Err(AppError::Validation(format!(
                    "day_number must be between 1 and {}, got {}",
                    last + 1,
                    n
                )))
            }
            None => last + 1,
        };
        let date = request.date.or_else(|| {
            trip.start_date
                .map(|start| start + Duration::days(i64::from(number) - 1))
        });
        let title = clean(request.title);
        let notes = clean(request.notes);

        queries::shift_days(&mut *tx, trip_id, number, 1).await?;
        let day_id =
            queries::insert_day(&mut *tx, trip_id, number, date, title.as_deref(), notes.as_deref())
                .await?;

        // The new day inherits from whatever precedes it.
        let (_, _, before) = load_itinerary(&mut tx, trip_id).await?;
        let mut after = before.clone();
        after.propagate();
        persist_locations(&mut tx, &before, &after).await?;
        tx.commit().await?;

        tracing::info!(trip_id, day_id, day_number = number, "Itinerary day added");
        self.get_day(&trip, day_id).await
    }

    pub async fn update_day(
        &self,
        agency_id: i64,
        trip_id: i64,
        day_id: i64,
        request: DayUpdateRequest,
    ) -> AppResult<DayResponse> {
        let trip = find_trip(&self.pool, agency_id, trip_id).await?;
        let day = self.find_day(trip_id, day_id).await?;

        let date = request.date.unwrap_or(day.date);
        let title = match request.title {
            Some(v) => clean(v),
            None => day.title.clone(),
        };
        let notes = match request.notes {
            Some(v) => clean(v),
            None => day.notes.clone(),
        };

        queries::update_day(&self.pool, day_id, date, title.as_deref(), notes.as_deref()).await?;
        self.get_day(&trip, day_id).await
    }

    /// Delete a day with its activities and close the numbering gap.
    pub async fn delete_day(
        &self,
        agency_id: i64,
        trip_id: i64,
        day_id: i64,
    ) -> AppResult<CascadeReport> {
        find_trip(&self.pool, agency_id, trip_id).await?;

        let mut tx = self.pool.begin().await?;
        let (days, activities, _) = load_itinerary(&mut tx, trip_id).await?;
        let day = days
            .iter()
            .find(|d| d.id == day_id)
            .ok_or_else(|| AppError::NotFound(format!("Day {} not found", day_id)))?;
        let number = day.day_number;

        let remaining_days: Vec<DayRow> = days.iter().filter(|d| d.id != day_id).cloned().collect();
        let (removed, remaining_activities): (Vec<ActivityRow>, Vec<ActivityRow>) =
            activities.into_iter().partition(|a| a.day_id == day_id);

        let before = build_itinerary(&remaining_days, &remaining_activities);
        let mut after = before.clone();
        let mut report = after.propagate();
        for activity in &removed {
            report.merge(after.release_lodging(activity.id));
        }

        queries::delete_day(&mut *tx, trip_id, day_id).await?;
        queries::shift_days(&mut *tx, trip_id, number + 1, -1).await?;
        persist_locations(&mut tx, &before, &after).await?;
        tx.commit().await?;

        tracing::info!(
            trip_id,
            day_id,
            removed_activities = removed.len(),
            "Itinerary day deleted"
        );
        Ok(report)
    }

    /// Pin a day's location, or let it inherit again with `None`.
    pub async fn set_day_location(
        &self,
        agency_id: i64,
        trip_id: i64,
        day_id: i64,
        location: Option<GeoPoint>,
    ) -> AppResult<LocationChangeResponse<DayResponse>> {
        let trip = find_trip(&self.pool, agency_id, trip_id).await?;

        let mut tx = self.pool.begin().await?;
        let (_, _, before) = load_itinerary(&mut tx, trip_id).await?;
        if before.day(day_id).is_none() {
            return Err(AppError::NotFound(format!("Day {} not found", day_id)));
        }
        let mut after = before.clone();
        let cascade = after.set_day_location(day_id, location)?;
        persist_locations(&mut tx, &before, &after).await?;
        tx.commit().await?;

        tracing::debug!(
            trip_id,
            day_id,
            days = cascade.days.len(),
            activities = cascade.activities.len(),
            "Day location cascaded"
        );
        Ok(LocationChangeResponse {
            item: self.get_day(&trip, day_id).await?,
            cascade,
        })
    }

    async fn find_day(&self, trip_id: i64, day_id: i64) -> AppResult<DayRow> {
        queries::get_day(&self.pool, trip_id, day_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Day {} not found", day_id)))
    }

    async fn get_day(&self, trip: &Trip, day_id: i64) -> AppResult<DayResponse> {
        let share = advisor_share(&self.agencies, trip).await?;
        let day = self.find_day(trip.id, day_id).await?;
        let activities = queries::list_activities(&self.pool, trip.id).await?;
        day_response(day, &activities, share)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LocationSource;
    use crate::services::trip::tests::{activity, day};
    use sqlx::types::Json;

    fn hotel_in(location: Option<GeoPoint>) -> ActivityLocation {
        ActivityLocation {
            activity_id: 5,
            day_id: 1,
            inherited: location.is_none(),
            location,
        }
    }

    fn ritz() -> GeoPoint {
        GeoPoint {
            name: "The Ritz".to_string(),
            latitude: 51.507,
            longitude: -0.142,
            country_code: Some("GB".to_string()),
            timezone: None,
        }
    }

    #[test]
    fn test_lodging_needs_hotel_nights_and_location() {
        let details = ActivityDetails {
            nights: Some(2),
            ..Default::default()
        };
        assert!(lodging_of(ActivityKind::Hotel, &details, &hotel_in(Some(ritz()))).is_some());
        assert!(lodging_of(ActivityKind::Hotel, &details, &hotel_in(None)).is_none());
        assert!(lodging_of(ActivityKind::Tour, &details, &hotel_in(Some(ritz()))).is_none());
        assert!(
            lodging_of(ActivityKind::Hotel, &ActivityDetails::default(), &hotel_in(Some(ritz())))
                .is_none()
        );
    }

    #[test]
    fn test_sync_lodging_holds_and_releases_days() {
        let days = vec![day(1, 1), day(2, 2), day(3, 3)];
        let mut hotel = activity(5, 1, 0, 0);
        hotel.kind = "hotel".to_string();
        hotel.location = Some(Json(ritz()));
        hotel.location_inherited = false;
        let mut itinerary = build_itinerary(&days, &[hotel]);

        let details = ActivityDetails {
            nights: Some(2),
            ..Default::default()
        };
        let report = sync_lodging(&mut itinerary, 5, ActivityKind::Hotel, &details).unwrap();
        assert_eq!(report.days, vec![1, 2, 3]);
        assert_eq!(
            itinerary.day(2).map(|d| d.source),
            Some(LocationSource::Lodging { activity_id: 5 })
        );
        // day 3 is past checkout but inherits the last known location
        assert_eq!(itinerary.day(3).map(|d| d.source), Some(LocationSource::Inherited));

        let released = sync_lodging(&mut itinerary, 5, ActivityKind::Hotel, &ActivityDetails::default())
            .unwrap();
        assert_eq!(released.days, vec![1, 2, 3]);
        assert!(itinerary.days().iter().all(|d| d.location.is_none()));
    }

    #[test]
    fn test_sync_lodging_unknown_activity_is_noop() {
        let mut itinerary = build_itinerary(&[day(1, 1)], &[]);
        let report = sync_lodging(&mut itinerary, 99, ActivityKind::Hotel, &ActivityDetails::default())
            .unwrap();
        assert!(report.is_empty());
    }
}

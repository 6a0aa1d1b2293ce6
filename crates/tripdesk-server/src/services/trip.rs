//! Trip service: trip CRUD, day generation and the money summary.

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::crypto::Encryptor;
use crate::db::models::{
    clean, ActivityPricing, ActivityRow, DayRow, Trip, TripCreateRequest, TripStatus,
    TripSummary, TripTravelerRow, TripUpdateRequest, TravelerTotal,
};
use crate::db::queries::trip::{self as queries, TripFields};
use crate::db::queries::{booking as booking_queries, itinerary as itinerary_queries, traveler as traveler_queries};
use crate::db::DbPool;
use crate::domain::money::format_minor;
use crate::domain::split::per_traveler_totals;
use crate::domain::text::display_name;
use crate::domain::{distribute, quote, PriceBreakdown, TravelerProfile, TripTotals};
use crate::error::{AppError, AppResult};
use crate::result_ext::ResultExt;

use super::agency::{currency_or, required, share_bps, AgencyService};

/// Longest itinerary generated from trip dates.
pub const MAX_TRIP_DAYS: i64 = 366;

/// Service for trip operations.
#[derive(Clone)]
pub struct TripService {
    pool: DbPool,
    agencies: AgencyService,
    encryptor: Encryptor,
}

/// Load a trip of the agency or fail with 404.
pub(crate) async fn find_trip<'e, E: PgExecutor<'e>>(
    executor: E,
    agency_id: i64,
    trip_id: i64,
) -> AppResult<Trip> {
    queries::get_trip(executor, agency_id, trip_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Trip {} not found", trip_id)))
}

/// A traveler as shown in money views.
#[derive(Debug, Clone)]
pub(crate) struct TravelerRef {
    pub traveler_id: i64,
    pub contact_id: i64,
    pub display_name: String,
}

impl TravelerRef {
    pub(crate) fn from_row(row: &TripTravelerRow, encryptor: &Encryptor) -> AppResult<Self> {
        let profile: TravelerProfile = encryptor
            .open_json(&row.snapshot)
            .log(format!("opening snapshot of traveler {}", row.id))?;
        Ok(Self {
            traveler_id: row.id,
            contact_id: row.contact_id,
            display_name: display_name(&profile.first_name, &profile.last_name),
        })
    }
}

impl TripService {
    pub fn new(pool: DbPool, agencies: AgencyService, encryptor: Encryptor) -> Self {
        Self {
            pool,
            agencies,
            encryptor,
        }
    }

    pub async fn list(&self, agency_id: i64, status: Option<TripStatus>) -> AppResult<Vec<Trip>> {
        queries::list_trips(&self.pool, agency_id, status).await
    }

    /// Create a trip; with both dates set, one itinerary day per date.
    pub async fn create(&self, agency_id: i64, request: TripCreateRequest) -> AppResult<Trip> {
        let agency = self.agencies.get(agency_id).await?;

        let name = required(Some(request.name), "name")?;
        let currency = currency_or(request.currency, &agency.default_currency)?;
        let span = trip_span(request.start_date, request.end_date)?;
        let advisor_share_bps = request.advisor_share_bps.map(share_bps).transpose()?;
        let advisor_name = clean(request.advisor_name);
        let notes = clean(request.notes);

        let fields = TripFields {
            name: &name,
            status: request.status.unwrap_or(TripStatus::Planning),
            currency: &currency,
            start_date: request.start_date,
            end_date: request.end_date,
            advisor_name: advisor_name.as_deref(),
            advisor_share_bps,
            notes: notes.as_deref(),
        };

        let mut tx = self.pool.begin().await?;
        let trip_id = queries::insert_trip(&mut *tx, agency_id, &fields, Uuid::new_v4()).await?;

        if let (Some(start), Some(days)) = (request.start_date, span) {
            for offset in 0..days {
                let date = start + Duration::days(offset);
                itinerary_queries::insert_day(&mut *tx, trip_id, offset as i32 + 1, Some(date), None, None)
                    .await?;
            }
        }
        tx.commit().await?;

        tracing::info!(agency_id, trip_id, days = span.unwrap_or(0), "Trip created");
        self.get(agency_id, trip_id).await
    }

    pub async fn get(&self, agency_id: i64, trip_id: i64) -> AppResult<Trip> {
        find_trip(&self.pool, agency_id, trip_id).await
    }

    /// Update a trip. A new start date re-dates the existing days.
    pub async fn update(
        &self,
        agency_id: i64,
        trip_id: i64,
        request: TripUpdateRequest,
    ) -> AppResult<Trip> {
        let trip = self.get(agency_id, trip_id).await?;

        let name = match request.name {
            Some(name) => required(Some(name), "name")?,
            None => trip.name.clone(),
        };
        let status = match request.status {
            Some(status) => status,
            None => trip.status()?,
        };
        let currency = currency_or(request.currency, &trip.currency)?;
        let start_date = request.start_date.unwrap_or(trip.start_date);
        let end_date = request.end_date.unwrap_or(trip.end_date);
        trip_span(start_date, end_date)?;
        let advisor_share_bps = request
            .advisor_share_bps
            .unwrap_or(trip.advisor_share_bps)
            .map(share_bps)
            .transpose()?;
        let advisor_name = match request.advisor_name {
            Some(v) => clean(v),
            None => trip.advisor_name.clone(),
        };
        let notes = match request.notes {
            Some(v) => clean(v),
            None => trip.notes.clone(),
        };

        let fields = TripFields {
            name: &name,
            status,
            currency: &currency,
            start_date,
            end_date,
            advisor_name: advisor_name.as_deref(),
            advisor_share_bps,
            notes: notes.as_deref(),
        };

        let mut tx = self.pool.begin().await?;
        queries::update_trip(&mut *tx, agency_id, trip_id, &fields).await?;
        if let Some(start) = start_date.filter(|s| Some(*s) != trip.start_date) {
            itinerary_queries::redate_days(&mut *tx, trip_id, start).await?;
        }
        tx.commit().await?;

        if status != trip.status()? {
            tracing::info!(agency_id, trip_id, status = status.as_str(), "Trip status changed");
        }
        self.get(agency_id, trip_id).await
    }

    pub async fn delete(&self, agency_id: i64, trip_id: i64) -> AppResult<()> {
        if !queries::delete_trip(&self.pool, agency_id, trip_id).await? {
            return Err(AppError::NotFound(format!("Trip {} not found", trip_id)));
        }
        tracing::info!(agency_id, trip_id, "Trip deleted");
        Ok(())
    }

    /// Pricing per activity, totals, per-traveler shares and balance due.
    pub async fn summary(&self, agency_id: i64, trip_id: i64) -> AppResult<TripSummary> {
        let trip = self.get(agency_id, trip_id).await?;
        let share = match trip.advisor_share_bps {
            Some(bps) => bps,
            None => self.agencies.get(agency_id).await?.advisor_share_bps,
        };

        let days = itinerary_queries::list_days(&self.pool, trip_id).await?;
        let activities = itinerary_queries::list_activities(&self.pool, trip_id).await?;
        let travelers = traveler_queries::list_travelers(&self.pool, trip_id)
            .await?
            .iter()
            .map(|row| TravelerRef::from_row(row, &self.encryptor))
            .collect::<AppResult<Vec<_>>>()?;
        let paid = booking_queries::paid_by_trip(&self.pool, &[trip_id])
            .await?
            .into_iter()
            .map(|(_, paid)| paid)
            .sum();

        summarize(&trip, share, &days, &activities, &travelers, paid)
    }
}

/// Number of days from `start` to `end` inclusive, when both are set.
fn trip_span(start: Option<NaiveDate>, end: Option<NaiveDate>) -> AppResult<Option<i64>> {
    match (start, end) {
        (Some(start), Some(end)) => {
            if end < start {
                return Err(AppError::Validation(format!(
                    "end_date {} is before start_date {}",
                    end, start
                )));
            }
            let days = (end - start).num_days() + 1;
            if days > MAX_TRIP_DAYS {
                return Err(AppError::Validation(format!(
                    "Trips are limited to {} days, got {}",
                    MAX_TRIP_DAYS, days
                )));
            }
            Ok(Some(days))
        }
        _ => Ok(None),
    }
}

/// Price every activity and split it between travelers.
pub(crate) fn summarize(
    trip: &Trip,
    advisor_share_bps: i32,
    days: &[DayRow],
    activities: &[ActivityRow],
    travelers: &[TravelerRef],
    paid_cents: i64,
) -> AppResult<TripSummary> {
    let day_numbers: HashMap<i64, i32> = days.iter().map(|d| (d.id, d.day_number)).collect();
    let traveler_ids: Vec<i64> = travelers.iter().map(|t| t.traveler_id).collect();

    let mut priced = Vec::with_capacity(activities.len());
    let mut unallocated_cents = 0;
    for activity in activities {
        let price = quote(&activity.price_inputs()?, advisor_share_bps)?;
        let shares = if traveler_ids.is_empty() {
            unallocated_cents += price.client_total_cents;
            Vec::new()
        } else {
            distribute(price.client_total_cents, &activity.split_rule(), &traveler_ids)?
        };
        priced.push(ActivityPricing {
            activity_id: activity.id,
            day_number: day_numbers.get(&activity.day_id).copied().unwrap_or_default(),
            name: activity.name.clone(),
            kind: activity.kind.clone(),
            price,
            shares,
        });
    }

    let totals = TripTotals::from_breakdowns(priced.iter().map(|p| &p.price), paid_cents);
    let per_traveler = per_traveler_totals(priced.iter().map(|p| p.shares.as_slice()));
    let travelers = travelers
        .iter()
        .map(|t| TravelerTotal {
            traveler_id: t.traveler_id,
            contact_id: t.contact_id,
            display_name: t.display_name.clone(),
            amount_cents: per_traveler.get(&t.traveler_id).copied().unwrap_or(0),
        })
        .collect();

    let mut formatted = BTreeMap::new();
    for (key, cents) in [
        ("client_total", totals.client_total_cents),
        ("paid", totals.paid_cents),
        ("balance_due", totals.balance_due_cents),
        ("agency_revenue", totals.agency_revenue_cents),
    ] {
        formatted.insert(key.to_string(), format_minor(cents, &trip.currency));
    }

    Ok(TripSummary {
        trip_id: trip.id,
        currency: trip.currency.clone(),
        advisor_share_bps,
        activities: priced,
        totals,
        travelers,
        unallocated_cents,
        formatted,
    })
}

/// Price of one activity row.
pub(crate) fn price_of(activity: &ActivityRow, advisor_share_bps: i32) -> AppResult<PriceBreakdown> {
    Ok(quote(&activity.price_inputs()?, advisor_share_bps)?)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::types::Json;

    use crate::domain::{ActivityDetails, AmountAllocation, SplitRule};

    pub(crate) fn trip() -> Trip {
        Trip {
            id: 10,
            agency_id: 1,
            name: "Italy".to_string(),
            status: "planning".to_string(),
            currency: "EUR".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 5, 1),
            end_date: NaiveDate::from_ymd_opt(2026, 5, 3),
            advisor_name: None,
            advisor_share_bps: None,
            share_token: Uuid::nil(),
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub(crate) fn day(id: i64, number: i32) -> DayRow {
        DayRow {
            id,
            trip_id: 10,
            day_number: number,
            date: None,
            title: None,
            notes: None,
            location: None,
            location_source: "inherited".to_string(),
            lodging_activity_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub(crate) fn activity(id: i64, day_id: i64, cost: i64, markup_bps: i32) -> ActivityRow {
        ActivityRow {
            id,
            trip_id: 10,
            day_id,
            kind: "tour".to_string(),
            name: format!("Tour {}", id),
            details: Json(ActivityDetails::default()),
            start_time: None,
            end_time: None,
            position: 1,
            location: None,
            location_inherited: true,
            pricing_model: "net".to_string(),
            cost_cents: cost,
            markup_bps,
            sell_price_cents: None,
            commission_bps: 0,
            tax_cents: 0,
            service_fee_cents: 0,
            split_rule: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn traveler(id: i64, name: &str) -> TravelerRef {
        TravelerRef {
            traveler_id: id,
            contact_id: id * 100,
            display_name: name.to_string(),
        }
    }

    #[test]
    fn test_trip_span() {
        let d = |day| NaiveDate::from_ymd_opt(2026, 5, day);
        assert_eq!(trip_span(d(1), d(3)).unwrap(), Some(3));
        assert_eq!(trip_span(d(1), d(1)).unwrap(), Some(1));
        assert_eq!(trip_span(d(1), None).unwrap(), None);
        assert!(matches!(trip_span(d(3), d(1)), Err(AppError::Validation(_))));

        let far = NaiveDate::from_ymd_opt(2028, 5, 1);
        assert!(trip_span(d(1), far).is_err());
    }

    #[test]
    fn test_summary_splits_between_travelers() {
        let days = vec![day(1, 1), day(2, 2)];
        let mut dinner = activity(2, 2, 10_001, 0);
        dinner.split_rule = Some(Json(SplitRule::Amounts {
            allocations: vec![
                AmountAllocation { traveler_id: 1, amount_cents: 10_001 },
                AmountAllocation { traveler_id: 2, amount_cents: 0 },
            ],
        }));
        let activities = vec![activity(1, 1, 100_000, 1_000), dinner];
        let travelers = vec![traveler(1, "Ada Lovelace"), traveler(2, "Charles Babbage")];

        let summary = summarize(&trip(), 5_000, &days, &activities, &travelers, 50_000).unwrap();

        assert_eq!(summary.activities.len(), 2);
        assert_eq!(summary.activities[1].day_number, 2);
        assert_eq!(summary.totals.client_total_cents, 120_001);
        assert_eq!(summary.totals.balance_due_cents, 70_001);
        assert_eq!(summary.unallocated_cents, 0);
        assert_eq!(summary.travelers[0].amount_cents, 55_000 + 10_001);
        assert_eq!(summary.travelers[1].amount_cents, 55_000);
        assert_eq!(summary.formatted["balance_due"], "EUR 700.01");
    }

    #[test]
    fn test_summary_without_travelers_is_unallocated() {
        let summary = summarize(
            &trip(),
            7_000,
            &[day(1, 1)],
            &[activity(1, 1, 20_000, 0)],
            &[],
            0,
        )
        .unwrap();
        assert_eq!(summary.unallocated_cents, 20_000);
        assert!(summary.travelers.is_empty());
        assert!(summary.activities[0].shares.is_empty());
    }

    #[test]
    fn test_summary_rejects_bad_pricing_rows() {
        let mut bad = activity(1, 1, 100, 0);
        bad.pricing_model = "barter".to_string();
        assert!(matches!(
            summarize(&trip(), 7_000, &[day(1, 1)], &[bad], &[], 0),
            Err(AppError::Validation(_))
        ));
    }
}

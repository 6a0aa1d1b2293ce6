//! Agency dashboard: pipeline counts, upcoming departures and revenue.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::config::AppConfig;
use crate::db::models::{ActivityRow, Trip, TripStatus};
use crate::db::queries::{
    booking as booking_queries, contact as contact_queries, itinerary as itinerary_queries,
    trip as trip_queries,
};
use crate::db::DbPool;
use crate::domain::{quote, PriceBreakdown, TripTotals};
use crate::error::AppResult;

use super::agency::AgencyService;

/// Upcoming trip line on the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct UpcomingTrip {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub start_date: Option<NaiveDate>,
    pub days_until: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    /// Trip count per status; every status is present.
    pub trips_by_status: BTreeMap<String, i64>,
    pub total_trips: i64,
    pub total_contacts: i64,
    pub upcoming_window_days: i64,
    pub upcoming: Vec<UpcomingTrip>,
    /// Money across non-cancelled trips, keyed by currency. Amounts in
    /// different currencies are never added together.
    pub revenue: BTreeMap<String, TripTotals>,
}

#[derive(Clone)]
pub struct DashboardService {
    pool: DbPool,
    agencies: AgencyService,
    config: Arc<AppConfig>,
}

impl DashboardService {
    pub fn new(pool: DbPool, agencies: AgencyService, config: Arc<AppConfig>) -> Self {
        Self {
            pool,
            agencies,
            config,
        }
    }

    pub async fn stats(&self, agency_id: i64) -> AppResult<DashboardStats> {
        let agency = self.agencies.get(agency_id).await?;
        let today = Utc::now().date_naive();
        let window = self.config.upcoming_window_days;

        let counts = trip_queries::count_trips_by_status(&self.pool, agency_id).await?;
        let total_contacts = contact_queries::count_contacts(&self.pool, agency_id).await?;
        let upcoming = trip_queries::list_upcoming_trips(
            &self.pool,
            agency_id,
            today,
            today + Duration::days(window),
        )
        .await?;

        let active = trip_queries::list_active_trips(&self.pool, agency_id).await?;
        let trip_ids: Vec<i64> = active.iter().map(|t| t.id).collect();
        let activities = itinerary_queries::list_activities_for_trips(&self.pool, &trip_ids).await?;
        let paid = booking_queries::paid_by_trip(&self.pool, &trip_ids).await?;
        let revenue = revenue(&active, &activities, agency.advisor_share_bps, &paid)?;

        let trips_by_status = status_counts(counts);
        tracing::debug!(
            agency_id,
            trips = trips_by_status.values().sum::<i64>(),
            upcoming = upcoming.len(),
            "Dashboard computed"
        );

        Ok(DashboardStats {
            total_trips: trips_by_status.values().sum(),
            trips_by_status,
            total_contacts,
            upcoming_window_days: window,
            upcoming: upcoming
                .into_iter()
                .map(|trip| UpcomingTrip {
                    days_until: trip.start_date.map(|start| (start - today).num_days()),
                    id: trip.id,
                    name: trip.name,
                    status: trip.status,
                    start_date: trip.start_date,
                })
                .collect(),
            revenue,
        })
    }
}

fn status_counts(rows: Vec<(String, i64)>) -> BTreeMap<String, i64> {
    let mut counts: BTreeMap<String, i64> = TripStatus::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), 0))
        .collect();
    for (status, count) in rows {
        *counts.entry(status).or_insert(0) += count;
    }
    counts
}

/// Totals per trip currency. Each activity is priced at its own trip's
/// advisor share; `paid` holds `(trip_id, paid_cents)` pairs.
fn revenue(
    trips: &[Trip],
    activities: &[ActivityRow],
    agency_share_bps: i32,
    paid: &[(i64, i64)],
) -> AppResult<BTreeMap<String, TripTotals>> {
    let by_trip: HashMap<i64, (&str, i32)> = trips
        .iter()
        .map(|t| {
            let share = t.advisor_share_bps.unwrap_or(agency_share_bps);
            (t.id, (t.currency.as_str(), share))
        })
        .collect();

    let mut breakdowns: BTreeMap<&str, Vec<PriceBreakdown>> = trips
        .iter()
        .map(|t| (t.currency.as_str(), Vec::new()))
        .collect();
    for activity in activities {
        let Some(&(currency, share)) = by_trip.get(&activity.trip_id) else {
            continue;
        };
        let breakdown = quote(&activity.price_inputs()?, share)?;
        breakdowns.entry(currency).or_default().push(breakdown);
    }

    let mut paid_by_currency: HashMap<&str, i64> = HashMap::new();
    for (trip_id, cents) in paid {
        if let Some(&(currency, _)) = by_trip.get(trip_id) {
            let total = paid_by_currency.entry(currency).or_insert(0);
            *total = total.saturating_add(*cents);
        }
    }

    Ok(breakdowns
        .into_iter()
        .map(|(currency, items)| {
            let paid_cents = paid_by_currency.get(currency).copied().unwrap_or(0);
            (
                currency.to_string(),
                TripTotals::from_breakdowns(items.iter(), paid_cents),
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::trip::tests::{activity, trip};

    #[test]
    fn test_status_counts_fill_every_status() {
        let counts = status_counts(vec![("planning".to_string(), 3), ("booked".to_string(), 1)]);
        assert_eq!(counts.len(), TripStatus::ALL.len());
        assert_eq!(counts["planning"], 3);
        assert_eq!(counts["cancelled"], 0);
    }

    #[test]
    fn test_revenue_uses_trip_share() {
        let mut own_share = trip();
        own_share.advisor_share_bps = Some(5_000);
        let activities = vec![activity(1, 1, 10_000, 2_000)];

        let revenue_by_currency = revenue(&[own_share], &activities, 7_000, &[(10, 4_000)]).unwrap();
        let totals = &revenue_by_currency["EUR"];
        assert_eq!(totals.agency_revenue_cents, 2_000);
        assert_eq!(totals.advisor_payout_cents, 1_000);
        assert_eq!(totals.balance_due_cents, 8_000);

        let totals = revenue(&[trip()], &activities, 7_000, &[]).unwrap();
        assert_eq!(totals["EUR"].advisor_payout_cents, 1_400);
    }

    #[test]
    fn test_revenue_keeps_currencies_apart() {
        let euro = trip();
        let mut yen = trip();
        yen.id = 11;
        yen.currency = "JPY".to_string();

        let mut tokyo_tour = activity(2, 1, 10_000, 0);
        tokyo_tour.trip_id = 11;
        let activities = vec![activity(1, 1, 10_000, 0), tokyo_tour];

        let totals = revenue(&[euro, yen], &activities, 7_000, &[(11, 2_500)]).unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals["EUR"].client_total_cents, 10_000);
        assert_eq!(totals["EUR"].paid_cents, 0);
        assert_eq!(totals["JPY"].client_total_cents, 10_000);
        assert_eq!(totals["JPY"].paid_cents, 2_500);
        assert_eq!(totals["JPY"].balance_due_cents, 7_500);
    }

    #[test]
    fn test_revenue_lists_currencies_without_activities() {
        let totals = revenue(&[trip()], &[], 7_000, &[]).unwrap();
        assert_eq!(totals["EUR"].activity_count, 0);
    }

    #[test]
    fn test_revenue_skips_unknown_trips() {
        let totals = revenue(&[], &[activity(1, 1, 10_000, 0)], 7_000, &[(99, 500)]).unwrap();
        assert!(totals.is_empty());
    }
}

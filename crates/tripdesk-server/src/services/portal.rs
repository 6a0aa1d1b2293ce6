//! Read-only client view of a trip, reached through its share token.

use std::collections::HashMap;

use uuid::Uuid;

use crate::crypto::Encryptor;
use crate::db::models::{
    ActivityRow, DayRow, PortalActivity, PortalDay, PortalTraveler, PortalTrip, Trip, TripStatus,
    TripSummary,
};
use crate::db::queries::{
    booking as booking_queries, itinerary as itinerary_queries, traveler as traveler_queries,
    trip as trip_queries,
};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};

use super::agency::AgencyService;
use super::itinerary::advisor_share;
use super::trip::{summarize, TravelerRef};

#[derive(Clone)]
pub struct PortalService {
    pool: DbPool,
    agencies: AgencyService,
    encryptor: Encryptor,
}

impl PortalService {
    pub fn new(pool: DbPool, agencies: AgencyService, encryptor: Encryptor) -> Self {
        Self {
            pool,
            agencies,
            encryptor,
        }
    }

    /// The shared trip; unknown tokens and cancelled trips are both 404.
    pub async fn trip(&self, share_token: Uuid) -> AppResult<PortalTrip> {
        let not_found = || AppError::NotFound("Trip not found".to_string());
        let trip = trip_queries::get_trip_by_share_token(&self.pool, share_token)
            .await?
            .ok_or_else(not_found)?;
        if trip.status()? == TripStatus::Cancelled {
            return Err(not_found());
        }

        let share = advisor_share(&self.agencies, &trip).await?;
        let days = itinerary_queries::list_days(&self.pool, trip.id).await?;
        let activities = itinerary_queries::list_activities(&self.pool, trip.id).await?;
        let travelers = traveler_queries::list_travelers(&self.pool, trip.id)
            .await?
            .iter()
            .map(|row| TravelerRef::from_row(row, &self.encryptor))
            .collect::<AppResult<Vec<_>>>()?;
        let paid = booking_queries::paid_by_trip(&self.pool, &[trip.id])
            .await?
            .into_iter()
            .map(|(_, paid)| paid)
            .sum();

        let summary = summarize(&trip, share, &days, &activities, &travelers, paid)?;
        tracing::debug!(trip_id = trip.id, "Portal trip viewed");
        Ok(client_view(trip, days, activities, &summary))
    }
}

fn client_view(
    trip: Trip,
    days: Vec<DayRow>,
    activities: Vec<ActivityRow>,
    summary: &TripSummary,
) -> PortalTrip {
    let totals: HashMap<i64, i64> = summary
        .activities
        .iter()
        .map(|a| (a.activity_id, a.price.client_total_cents))
        .collect();

    let mut by_day: HashMap<i64, Vec<PortalActivity>> = HashMap::new();
    for activity in activities {
        by_day
            .entry(activity.day_id)
            .or_default()
            .push(PortalActivity {
                client_total_cents: totals.get(&activity.id).copied().unwrap_or(0),
                name: activity.name,
                kind: activity.kind,
                start_time: activity.start_time,
                end_time: activity.end_time,
                location: activity.location.map(|l| l.0),
            });
    }

    let days = days
        .into_iter()
        .map(|day| PortalDay {
            activities: by_day.remove(&day.id).unwrap_or_default(),
            day_number: day.day_number,
            date: day.date,
            title: day.title,
            location: day.location.map(|l| l.0),
        })
        .collect();

    PortalTrip {
        name: trip.name,
        status: trip.status,
        currency: trip.currency,
        start_date: trip.start_date,
        end_date: trip.end_date,
        days,
        travelers: summary
            .travelers
            .iter()
            .map(|t| PortalTraveler {
                display_name: t.display_name.clone(),
                amount_cents: t.amount_cents,
            })
            .collect(),
        client_total_cents: summary.totals.client_total_cents,
        paid_cents: summary.totals.paid_cents,
        balance_due_cents: summary.totals.balance_due_cents,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::trip::tests::{activity, day, trip};

    #[test]
    fn test_client_view_hides_internal_pricing() {
        let trip = trip();
        let days = vec![day(1, 1), day(2, 2)];
        let activities = vec![activity(7, 2, 10_000, 2_500)];
        let summary = summarize(&trip, 7_000, &days, &activities, &[], 5_000).unwrap();

        let view = client_view(trip, days, activities, &summary);
        assert_eq!(view.days.len(), 2);
        assert!(view.days[0].activities.is_empty());
        assert_eq!(view.days[1].activities[0].client_total_cents, 12_500);
        assert_eq!(view.client_total_cents, 12_500);
        assert_eq!(view.balance_due_cents, 7_500);

        let json = serde_json::to_value(&view).unwrap();
        let text = json.to_string();
        for hidden in ["cost_cents", "markup", "commission", "advisor", "agency_revenue"] {
            assert!(!text.contains(hidden), "portal leaked {}", hidden);
        }
    }
}

//! Activities: naming, pricing, location and cost splits.

use crate::db::models::{
    clean, ActivityCreateRequest, ActivityResponse, ActivityRow, ActivityUpdateRequest,
    LocationChangeResponse, NamePreviewRequest, NamePreviewResponse, SplitResponse,
};
use crate::db::queries::itinerary::{self as queries, ActivityFields};
use crate::db::queries::traveler as traveler_queries;
use crate::db::DbPool;
use crate::domain::{
    disambiguate, distribute, quote, ActivityDetails, ActivityNamer, CascadeReport,
    PriceInputs, SplitError, SplitRule,
};
use crate::error::{AppError, AppResult};

use super::agency::AgencyService;
use super::itinerary::{
    advisor_share, build_itinerary, load_itinerary, persist_locations, sync_lodging,
};
use super::trip::{find_trip, price_of};

/// Service for activity operations.
#[derive(Clone)]
pub struct ActivityService {
    pool: DbPool,
    agencies: AgencyService,
}

/// API view of an activity priced at `advisor_share_bps`.
pub(crate) fn to_response(row: ActivityRow, advisor_share_bps: i32) -> AppResult<ActivityResponse> {
    let price = price_of(&row, advisor_share_bps)?;
    let pricing = row.price_inputs()?;
    Ok(ActivityResponse {
        id: row.id,
        day_id: row.day_id,
        kind: row.kind,
        name: row.name,
        details: row.details.0,
        start_time: row.start_time,
        end_time: row.end_time,
        position: row.position,
        location: row.location.map(|l| l.0),
        location_inherited: row.location_inherited,
        pricing,
        price,
        split_rule: row.split_rule.map(|r| r.0),
    })
}

/// An amounts rule only fits the total it was written for.
fn rule_survives(rule: &SplitRule, total_cents: i64, travelers: &[i64]) -> bool {
    match rule {
        SplitRule::Amounts { .. } => distribute(total_cents, rule, travelers).is_ok(),
        _ => true,
    }
}

impl ActivityService {
    pub fn new(pool: DbPool, agencies: AgencyService) -> Self {
        Self { pool, agencies }
    }

    /// Add an activity to a day. A blank name is generated from the details.
    pub async fn create(
        &self,
        agency_id: i64,
        trip_id: i64,
        day_id: i64,
        request: ActivityCreateRequest,
    ) -> AppResult<LocationChangeResponse<ActivityResponse>> {
        let trip = find_trip(&self.pool, agency_id, trip_id).await?;
        self.check_day(trip_id, day_id).await?;
        request.pricing.validate()?;
        if let Some(location) = &request.location {
            location.validate()?;
        }

        let name = match clean(request.name) {
            Some(name) => name,
            None => {
                let namer = self.agencies.namer(agency_id).await?;
                let generated = namer.generate(request.kind, &request.details);
                let taken = queries::names_on_day(&self.pool, day_id, None).await?;
                disambiguate(&generated, &taken)
            }
        };

        let fields = ActivityFields {
            day_id,
            kind: request.kind,
            name: &name,
            details: &request.details,
            start_time: request.start_time,
            end_time: request.end_time,
            pricing: &request.pricing,
        };

        let mut tx = self.pool.begin().await?;
        let activity_id = queries::insert_activity(&mut *tx, trip_id, &fields).await?;

        let (_, _, before) = load_itinerary(&mut tx, trip_id).await?;
        let mut after = before.clone();
        let mut cascade = after.set_activity_location(activity_id, request.location)?;
        cascade.merge(sync_lodging(&mut after, activity_id, request.kind, &request.details)?);
        persist_locations(&mut tx, &before, &after).await?;
        tx.commit().await?;

        tracing::info!(
            trip_id,
            activity_id,
            kind = request.kind.as_str(),
            "Activity created"
        );
        let share = advisor_share(&self.agencies, &trip).await?;
        Ok(LocationChangeResponse {
            item: to_response(self.find(trip_id, activity_id).await?, share)?,
            cascade,
        })
    }

    pub async fn get(
        &self,
        agency_id: i64,
        trip_id: i64,
        activity_id: i64,
    ) -> AppResult<ActivityResponse> {
        let trip = find_trip(&self.pool, agency_id, trip_id).await?;
        let share = advisor_share(&self.agencies, &trip).await?;
        to_response(self.find(trip_id, activity_id).await?, share)
    }

    /// Partial update. Moving, relocating or resizing a hotel moves its stay.
    pub async fn update(
        &self,
        agency_id: i64,
        trip_id: i64,
        activity_id: i64,
        request: ActivityUpdateRequest,
    ) -> AppResult<LocationChangeResponse<ActivityResponse>> {
        let trip = find_trip(&self.pool, agency_id, trip_id).await?;
        let share = advisor_share(&self.agencies, &trip).await?;
        let row = self.find(trip_id, activity_id).await?;

        let kind = match request.kind {
            Some(kind) => kind,
            None => row.kind()?,
        };
        let details: ActivityDetails = request.details.unwrap_or_else(|| row.details.0.clone());
        let day_id = match request.day_id {
            Some(day_id) => {
                self.check_day(trip_id, day_id).await?;
                day_id
            }
            None => row.day_id,
        };
        let pricing: PriceInputs = match request.pricing {
            Some(pricing) => {
                pricing.validate()?;
                pricing
            }
            None => row.price_inputs()?,
        };
        if let Some(Some(location)) = &request.location {
            location.validate()?;
        }

        let name = match request.name {
            Some(name) => match clean(Some(name)) {
                Some(name) => name,
                None => {
                    let namer = self.agencies.namer(agency_id).await?;
                    let generated = namer.generate(kind, &details);
                    let taken = queries::names_on_day(&self.pool, day_id, Some(activity_id)).await?;
                    disambiguate(&generated, &taken)
                }
            },
            None => row.name.clone(),
        };

        let fields = ActivityFields {
            day_id,
            kind,
            name: &name,
            details: &details,
            start_time: request.start_time.unwrap_or(row.start_time),
            end_time: request.end_time.unwrap_or(row.end_time),
            pricing: &pricing,
        };

        let mut tx = self.pool.begin().await?;
        queries::update_activity(&mut *tx, activity_id, &fields).await?;

        if let Some(rule) = row.split_rule.as_ref().map(|r| &r.0) {
            let total = quote(&pricing, share)?.client_total_cents;
            let travelers: Vec<i64> = traveler_queries::list_travelers(&mut *tx, trip_id)
                .await?
                .iter()
                .map(|t| t.id)
                .collect();
            if !rule_survives(rule, total, &travelers) {
                queries::update_split_rule(&mut *tx, activity_id, None).await?;
                tracing::warn!(
                    trip_id,
                    activity_id,
                    total_cents = total,
                    "Split amounts no longer match the activity total, reset to equal"
                );
            }
        }

        let (_, _, before) = load_itinerary(&mut tx, trip_id).await?;
        let mut after = before.clone();
        let mut cascade = match request.location {
            Some(location) => after.set_activity_location(activity_id, location)?,
            None => after.propagate(),
        };
        cascade.merge(sync_lodging(&mut after, activity_id, kind, &details)?);
        // `before` was loaded after the row update, so a day move is not in it.
        if day_id != row.day_id && !cascade.activities.contains(&activity_id) {
            cascade.activities.push(activity_id);
        }
        persist_locations(&mut tx, &before, &after).await?;
        tx.commit().await?;

        tracing::info!(trip_id, activity_id, "Activity updated");
        Ok(LocationChangeResponse {
            item: to_response(self.find(trip_id, activity_id).await?, share)?,
            cascade,
        })
    }

    /// Delete an activity, releasing any hotel stay it held.
    pub async fn delete(
        &self,
        agency_id: i64,
        trip_id: i64,
        activity_id: i64,
    ) -> AppResult<CascadeReport> {
        find_trip(&self.pool, agency_id, trip_id).await?;

        let mut tx = self.pool.begin().await?;
        let (days, activities, _) = load_itinerary(&mut tx, trip_id).await?;
        if !activities.iter().any(|a| a.id == activity_id) {
            return Err(AppError::NotFound(format!("Activity {} not found", activity_id)));
        }
        let remaining: Vec<ActivityRow> =
            activities.into_iter().filter(|a| a.id != activity_id).collect();

        let before = build_itinerary(&days, &remaining);
        let mut after = before.clone();
        let cascade = after.release_lodging(activity_id);

        queries::delete_activity(&mut *tx, trip_id, activity_id).await?;
        persist_locations(&mut tx, &before, &after).await?;
        tx.commit().await?;

        tracing::info!(trip_id, activity_id, days = cascade.days.len(), "Activity deleted");
        Ok(cascade)
    }

    /// Current split of the activity's client total.
    pub async fn get_split(
        &self,
        agency_id: i64,
        trip_id: i64,
        activity_id: i64,
    ) -> AppResult<SplitResponse> {
        let trip = find_trip(&self.pool, agency_id, trip_id).await?;
        let share = advisor_share(&self.agencies, &trip).await?;
        let row = self.find(trip_id, activity_id).await?;
        let travelers = self.traveler_ids(trip_id).await?;

        let total_cents = price_of(&row, share)?.client_total_cents;
        let rule = row.split_rule();
        let (shares, unallocated_cents) = if travelers.is_empty() {
            (Vec::new(), total_cents)
        } else {
            (distribute(total_cents, &rule, &travelers)?, 0)
        };

        Ok(SplitResponse {
            activity_id,
            total_cents,
            is_default: row.split_rule.is_none(),
            rule,
            shares,
            unallocated_cents,
        })
    }

    /// Store a split rule, or go back to the equal default with `None`.
    pub async fn set_split(
        &self,
        agency_id: i64,
        trip_id: i64,
        activity_id: i64,
        rule: Option<SplitRule>,
    ) -> AppResult<SplitResponse> {
        let trip = find_trip(&self.pool, agency_id, trip_id).await?;
        let share = advisor_share(&self.agencies, &trip).await?;
        let row = self.find(trip_id, activity_id).await?;

        if let Some(rule) = &rule {
            let travelers = self.traveler_ids(trip_id).await?;
            if travelers.is_empty() {
                return Err(SplitError::NoTravelers.into());
            }
            let total_cents = price_of(&row, share)?.client_total_cents;
            distribute(total_cents, rule, &travelers)?;
        }

        queries::update_split_rule(&self.pool, activity_id, rule.as_ref()).await?;
        tracing::debug!(trip_id, activity_id, custom = rule.is_some(), "Split rule saved");
        self.get_split(agency_id, trip_id, activity_id).await
    }

    /// Render a name without saving anything.
    pub async fn preview_name(
        &self,
        agency_id: i64,
        request: NamePreviewRequest,
    ) -> AppResult<NamePreviewResponse> {
        let mut namer = self.agencies.namer(agency_id).await?;
        if let Some(template) = request.template {
            namer.set_template(request.kind, template)?;
        }
        let generated = namer.generate(request.kind, &request.details);
        Ok(NamePreviewResponse {
            name: disambiguate(&generated, &request.existing),
        })
    }

    async fn find(&self, trip_id: i64, activity_id: i64) -> AppResult<ActivityRow> {
        queries::get_activity(&self.pool, trip_id, activity_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Activity {} not found", activity_id)))
    }

    async fn check_day(&self, trip_id: i64, day_id: i64) -> AppResult<()> {
        queries::get_day(&self.pool, trip_id, day_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Day {} not found", day_id)))
    }

    async fn traveler_ids(&self, trip_id: i64) -> AppResult<Vec<i64>> {
        Ok(traveler_queries::list_travelers(&self.pool, trip_id)
            .await?
            .iter()
            .map(|t| t.id)
            .collect())
    }
}

/// Name for a kind without agency overrides, used by the stateless preview.
pub fn preview_default_name(request: &NamePreviewRequest) -> AppResult<String> {
    let mut namer = ActivityNamer::new();
    if let Some(template) = &request.template {
        namer.set_template(request.kind, template.clone())?;
    }
    Ok(disambiguate(
        &namer.generate(request.kind, &request.details),
        &request.existing,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActivityKind, AmountAllocation, PricingModel};
    use crate::services::trip::tests::activity;

    #[test]
    fn test_to_response_prices_row() {
        let row = activity(3, 1, 10_000, 2_000);
        let response = to_response(row, 7_000).unwrap();
        assert_eq!(response.price.client_total_cents, 12_000);
        assert_eq!(response.pricing.model, PricingModel::Net);
        assert!(response.split_rule.is_none());
        assert!(response.location_inherited);
    }

    #[test]
    fn test_amounts_rule_must_match_total() {
        let rule = SplitRule::Amounts {
            allocations: vec![
                AmountAllocation { traveler_id: 1, amount_cents: 600 },
                AmountAllocation { traveler_id: 2, amount_cents: 400 },
            ],
        };
        assert!(rule_survives(&rule, 1_000, &[1, 2]));
        assert!(!rule_survives(&rule, 1_200, &[1, 2]));
        assert!(rule_survives(&SplitRule::default(), 1_200, &[1, 2]));
    }

    #[test]
    fn test_preview_default_name() {
        let request: NamePreviewRequest = serde_json::from_value(serde_json::json!({
            "kind": "dining",
            "details": {"venue": "Noma", "meal": "Dinner"},
            "existing": ["dinner at noma"]
        }))
        .unwrap();
        assert_eq!(preview_default_name(&request).unwrap(), "Dinner at Noma (2)");
    }

    #[test]
    fn test_preview_rejects_bad_template() {
        let request = NamePreviewRequest {
            kind: ActivityKind::Tour,
            details: ActivityDetails::default(),
            template: Some("{{ title".to_string()),
            existing: Vec::new(),
        };
        assert!(matches!(
            preview_default_name(&request),
            Err(AppError::Validation(_))
        ));
    }
}

//! Geolocation cascade across itinerary days.
//!
//! Each day either pins its own location (`Manual`), borrows it from a hotel
//! stay (`Lodging`), or inherits whatever the previous days established
//! (`Inherited`). Activities follow their day unless they carry an explicit
//! location. Every mutation re-runs a single forward pass over the days so the
//! stored locations always agree with the sources.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Geolocation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("Location name must not be blank")]
    BlankName,

    #[error("Latitude {0} is outside -90..=90")]
    LatitudeOutOfRange(f64),

    #[error("Longitude {0} is outside -180..=180")]
    LongitudeOutOfRange(f64),

    #[error("Day {0} is not part of this itinerary")]
    UnknownDay(i64),

    #[error("Activity {0} is not part of this itinerary")]
    UnknownActivity(i64),
}

/// A named point on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl GeoPoint {
    pub fn validate(&self) -> Result<(), GeoError> {
        if self.name.trim().is_empty() {
            return Err(GeoError::BlankName);
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(GeoError::LatitudeOutOfRange(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(GeoError::LongitudeOutOfRange(self.longitude));
        }
        Ok(())
    }
}

/// Where a day's location comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocationSource {
    Manual,
    #[default]
    Inherited,
    Lodging { activity_id: i64 },
}

impl LocationSource {
    /// Database representation: `(source, lodging_activity_id)`.
    pub fn to_columns(self) -> (&'static str, Option<i64>) {
        match self {
            LocationSource::Manual => ("manual", None),
            LocationSource::Inherited => ("inherited", None),
            LocationSource::Lodging { activity_id } => ("lodging", Some(activity_id)),
        }
    }

    /// Inverse of [`LocationSource::to_columns`]; unknown values read as inherited.
    pub fn from_columns(source: &str, lodging_activity_id: Option<i64>) -> Self {
        match (source, lodging_activity_id) {
            ("manual", _) => LocationSource::Manual,
            ("lodging", Some(activity_id)) => LocationSource::Lodging { activity_id },
            _ => LocationSource::Inherited,
        }
    }

    fn pins(self) -> bool {
        !matches!(self, LocationSource::Inherited)
    }
}

/// Location state of one itinerary day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayLocation {
    pub day_id: i64,
    pub day_number: i32,
    pub location: Option<GeoPoint>,
    pub source: LocationSource,
}

/// Location state of one activity.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityLocation {
    pub activity_id: i64,
    pub day_id: i64,
    pub location: Option<GeoPoint>,
    pub inherited: bool,
}

/// Ids whose stored location changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeReport {
    pub days: Vec<i64>,
    pub activities: Vec<i64>,
}

impl CascadeReport {
    pub fn is_empty(&self) -> bool {
        self.days.is_empty() && self.activities.is_empty()
    }

    /// Fold a later report into this one, keeping ids unique.
    pub fn merge(&mut self, other: CascadeReport) {
        for id in other.days {
            if !self.days.contains(&id) {
                self.days.push(id);
            }
        }
        for id in other.activities {
            if !self.activities.contains(&id) {
                self.activities.push(id);
            }
        }
    }
}

/// In-memory view of a trip's itinerary locations.
#[derive(Debug, Clone, Default)]
pub struct Itinerary {
    days: Vec<DayLocation>,
    activities: Vec<ActivityLocation>,
}

impl Itinerary {
    pub fn new(mut days: Vec<DayLocation>, activities: Vec<ActivityLocation>) -> Self {
        days.sort_by_key(|d| d.day_number);
        Self { days, activities }
    }

    pub fn days(&self) -> &[DayLocation] {
        &self.days
    }

    pub fn activities(&self) -> &[ActivityLocation] {
        &self.activities
    }

    pub fn day(&self, day_id: i64) -> Option<&DayLocation> {
        self.days.iter().find(|d| d.day_id == day_id)
    }

    pub fn activity(&self, activity_id: i64) -> Option<&ActivityLocation> {
        self.activities.iter().find(|a| a.activity_id == activity_id)
    }

    /// Pin a day's location, or release it back to inheritance with `None`.
    pub fn set_day_location(
        &mut self,
        day_id: i64,
        location: Option<GeoPoint>,
    ) -> Result<CascadeReport, GeoError> {
        if let Some(point) = &location {
            point.validate()?;
        }
        let before = self.clone();
        let day = self
            .days
            .iter_mut()
            .find(|d| d.day_id == day_id)
            .ok_or(GeoError::UnknownDay(day_id))?;

        match location {
            Some(point) => {
                day.location = Some(point);
                day.source = LocationSource::Manual;
            }
            None => day.source = LocationSource::Inherited,
        }

        Ok(self.propagate_from(&before))
    }

    /// Hold a hotel's location on the nights of its stay.
    ///
    /// Days already pinned manually keep their own location.
    pub fn apply_lodging(
        &mut self,
        activity_id: i64,
        start_day_id: i64,
        nights: u32,
        location: GeoPoint,
    ) -> Result<CascadeReport, GeoError> {
        location.validate()?;
        let start = self
            .days
            .iter()
            .position(|d| d.day_id == start_day_id)
            .ok_or(GeoError::UnknownDay(start_day_id))?;
        let before = self.clone();

        // Replace any previous placement of the same stay.
        self.clear_lodging(activity_id);

        let span = nights.max(1) as usize;

        for day in self.days.iter_mut().skip(start).take(span) {
            if day.source == LocationSource::Manual {
                continue;
            }
            day.location = Some(location.clone());
            day.source = LocationSource::Lodging { activity_id };
        }

        Ok(self.propagate_from(&before))
    }

    /// Drop a hotel stay; its days fall back to inheritance.
    pub fn release_lodging(&mut self, activity_id: i64) -> CascadeReport {
        let before = self.clone();
        self.clear_lodging(activity_id);
        self.propagate_from(&before)
    }

    /// Give an activity its own location, or let it follow its day with `None`.
    pub fn set_activity_location(
        &mut self,
        activity_id: i64,
        location: Option<GeoPoint>,
    ) -> Result<CascadeReport, GeoError> {
        if let Some(point) = &location {
            point.validate()?;
        }
        let before = self.clone();
        let activity = self
            .activities
            .iter_mut()
            .find(|a| a.activity_id == activity_id)
            .ok_or(GeoError::UnknownActivity(activity_id))?;

        match location {
            Some(point) => {
                activity.location = Some(point);
                activity.inherited = false;
            }
            None => activity.inherited = true,
        }

        Ok(self.propagate_from(&before))
    }

    /// Recompute every inherited location and report what changed.
    pub fn propagate(&mut self) -> CascadeReport {
        let before = self.clone();
        self.propagate_from(&before)
    }

    fn clear_lodging(&mut self, activity_id: i64) {
        for day in &mut self.days {
            if day.source == (LocationSource::Lodging { activity_id }) {
                day.source = LocationSource::Inherited;
            }
        }
    }

    fn propagate_from(&mut self, before: &Itinerary) -> CascadeReport {
        let mut carried: Option<GeoPoint> = None;
        for day in &mut self.days {
            if day.source.pins() {
                carried = day.location.clone();
            } else {
                day.location = carried.clone();
            }
        }

        for activity in &mut self.activities {
            if !activity.inherited {
                continue;
            }
            activity.location = self
                .days
                .iter()
                .find(|d| d.day_id == activity.day_id)
                .and_then(|d| d.location.clone());
        }

        self.diff(before)
    }

    fn diff(&self, before: &Itinerary) -> CascadeReport {
        let days = self
            .days
            .iter()
            .filter(|d| before.day(d.day_id) != Some(d))
            .map(|d| d.day_id)
            .collect();
        let activities = self
            .activities
            .iter()
            .filter(|a| before.activity(a.activity_id) != Some(a))
            .map(|a| a.activity_id)
            .collect();
        CascadeReport { days, activities }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(name: &str) -> GeoPoint {
        GeoPoint {
            name: name.to_string(),
            latitude: 41.9,
            longitude: 12.5,
            country_code: None,
            timezone: None,
        }
    }

    fn day(id: i64, number: i32) -> DayLocation {
        DayLocation {
            day_id: id,
            day_number: number,
            location: None,
            source: LocationSource::Inherited,
        }
    }

    fn inherited_activity(id: i64, day_id: i64) -> ActivityLocation {
        ActivityLocation {
            activity_id: id,
            day_id,
            location: None,
            inherited: true,
        }
    }

    fn five_days() -> Itinerary {
        Itinerary::new(
            (1..=5).map(|n| day(n * 10, n as i32)).collect(),
            vec![inherited_activity(100, 20), inherited_activity(101, 40)],
        )
    }

    fn names(it: &Itinerary) -> Vec<Option<String>> {
        it.days()
            .iter()
            .map(|d| d.location.as_ref().map(|p| p.name.clone()))
            .collect()
    }

    #[test]
    fn test_manual_location_cascades_until_next_pin() {
        let mut it = five_days();
        it.set_day_location(40, Some(point("Florence"))).unwrap();
        let report = it.set_day_location(10, Some(point("Rome"))).unwrap();

        assert_eq!(
            names(&it),
            vec![
                Some("Rome".into()),
                Some("Rome".into()),
                Some("Rome".into()),
                Some("Florence".into()),
                Some("Florence".into()),
            ]
        );
        assert_eq!(report.days, vec![10, 20, 30]);
        assert_eq!(report.activities, vec![100]);
        assert_eq!(it.activity(101).unwrap().location.as_ref().unwrap().name, "Florence");
    }

    #[test]
    fn test_clearing_a_day_inherits_from_previous() {
        let mut it = five_days();
        it.set_day_location(10, Some(point("Rome"))).unwrap();
        it.set_day_location(30, Some(point("Naples"))).unwrap();

        let report = it.set_day_location(30, None).unwrap();
        assert_eq!(names(&it), vec![Some("Rome".into()); 5]);
        assert_eq!(report.days, vec![30, 40, 50]);
        assert_eq!(report.activities, vec![101]);
    }

    #[test]
    fn test_leading_days_without_location_stay_empty() {
        let mut it = five_days();
        it.set_day_location(30, Some(point("Venice"))).unwrap();
        assert_eq!(names(&it)[0], None);
        assert_eq!(names(&it)[1], None);
        assert_eq!(names(&it)[2], Some("Venice".into()));
    }

    #[test]
    fn test_explicit_activity_location_is_kept() {
        let mut it = five_days();
        it.set_activity_location(100, Some(point("Vatican Museums"))).unwrap();
        let report = it.set_day_location(10, Some(point("Rome"))).unwrap();

        assert!(!report.activities.contains(&100));
        assert_eq!(it.activity(100).unwrap().location.as_ref().unwrap().name, "Vatican Museums");

        let report = it.set_activity_location(100, None).unwrap();
        assert_eq!(report.activities, vec![100]);
        assert_eq!(it.activity(100).unwrap().location.as_ref().unwrap().name, "Rome");
    }

    #[test]
    fn test_lodging_holds_nights_and_respects_manual_days() {
        let mut it = five_days();
        it.set_day_location(30, Some(point("Day trip to Pompeii"))).unwrap();
        it.apply_lodging(900, 20, 3, point("Hotel de Russie")).unwrap();

        assert_eq!(it.day(20).unwrap().source, LocationSource::Lodging { activity_id: 900 });
        assert_eq!(it.day(30).unwrap().source, LocationSource::Manual);
        assert_eq!(it.day(40).unwrap().source, LocationSource::Lodging { activity_id: 900 });
        assert_eq!(it.day(50).unwrap().source, LocationSource::Inherited);
        assert_eq!(names(&it)[4], Some("Hotel de Russie".into()));

        let report = it.release_lodging(900);
        assert_eq!(it.day(20).unwrap().source, LocationSource::Inherited);
        assert_eq!(names(&it)[1], None);
        assert_eq!(names(&it)[3], Some("Day trip to Pompeii".into()));
        assert_eq!(report.days, vec![20, 40, 50]);
    }

    #[test]
    fn test_reapplying_lodging_moves_the_stay() {
        let mut it = five_days();
        it.apply_lodging(900, 10, 2, point("Hotel A")).unwrap();
        it.apply_lodging(900, 30, 1, point("Hotel A")).unwrap();

        assert_eq!(it.day(10).unwrap().source, LocationSource::Inherited);
        assert_eq!(it.day(20).unwrap().source, LocationSource::Inherited);
        assert_eq!(it.day(30).unwrap().source, LocationSource::Lodging { activity_id: 900 });
    }

    #[test]
    fn test_lodging_on_unknown_day_keeps_the_current_stay() {
        let mut it = five_days();
        it.apply_lodging(900, 10, 2, point("Hotel A")).unwrap();

        assert_eq!(
            it.apply_lodging(900, 99, 2, point("Hotel A")),
            Err(GeoError::UnknownDay(99))
        );
        assert_eq!(it.day(10).unwrap().source, LocationSource::Lodging { activity_id: 900 });
        assert_eq!(it.day(20).unwrap().source, LocationSource::Lodging { activity_id: 900 });
        assert_eq!(names(&it)[2], Some("Hotel A".into()));
    }

    #[test]
    fn test_zero_nights_still_covers_check_in_day() {
        let mut it = five_days();
        it.apply_lodging(5, 50, 0, point("Airport hotel")).unwrap();
        assert_eq!(it.day(50).unwrap().source, LocationSource::Lodging { activity_id: 5 });
    }

    #[test]
    fn test_no_op_reports_nothing() {
        let mut it = five_days();
        it.set_day_location(10, Some(point("Rome"))).unwrap();
        let report = it.set_day_location(10, Some(point("Rome"))).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_errors() {
        let mut it = five_days();
        assert_eq!(
            it.set_day_location(99, Some(point("Nowhere"))),
            Err(GeoError::UnknownDay(99))
        );

        let mut bad = point("Pole");
        bad.latitude = 91.0;
        assert_eq!(
            it.set_day_location(10, Some(bad)),
            Err(GeoError::LatitudeOutOfRange(91.0))
        );
        assert_eq!(
            it.set_day_location(10, Some(point("  "))),
            Err(GeoError::BlankName)
        );
        assert_eq!(
            it.set_activity_location(5, None),
            Err(GeoError::UnknownActivity(5))
        );
    }

    #[test]
    fn test_source_columns_round_trip() {
        for source in [
            LocationSource::Manual,
            LocationSource::Inherited,
            LocationSource::Lodging { activity_id: 4 },
        ] {
            let (name, id) = source.to_columns();
            assert_eq!(LocationSource::from_columns(name, id), source);
        }
        assert_eq!(
            LocationSource::from_columns("lodging", None),
            LocationSource::Inherited
        );
    }

    #[test]
    fn test_merge_reports_keeps_ids_unique() {
        let mut report = CascadeReport {
            days: vec![10, 20],
            activities: vec![100],
        };
        report.merge(CascadeReport {
            days: vec![20, 30],
            activities: vec![100, 101],
        });
        assert_eq!(report.days, vec![10, 20, 30]);
        assert_eq!(report.activities, vec![100, 101]);
    }
}

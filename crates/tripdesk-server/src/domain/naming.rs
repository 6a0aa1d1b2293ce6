//! Activity-name generation.
//!
//! Each activity kind has a built-in minijinja template rendered against the
//! activity's details. Agencies can override the template per kind.

use std::collections::HashMap;

use minijinja::Environment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::text::find_ci;

/// Naming errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamingError {
    #[error("Unknown activity kind: {0}")]
    UnknownKind(String),

    #[error("Invalid name template for {kind}: {message}")]
    InvalidTemplate { kind: String, message: String },
}

/// Kind of bookable unit on an itinerary day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Flight,
    Hotel,
    Cruise,
    Dining,
    Tour,
    Transfer,
    CarRental,
    Rail,
    Other,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 9] = [
        ActivityKind::Flight,
        ActivityKind::Hotel,
        ActivityKind::Cruise,
        ActivityKind::Dining,
        ActivityKind::Tour,
        ActivityKind::Transfer,
        ActivityKind::CarRental,
        ActivityKind::Rail,
        ActivityKind::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Flight => "flight",
            ActivityKind::Hotel => "hotel",
            ActivityKind::Cruise => "cruise",
            ActivityKind::Dining => "dining",
            ActivityKind::Tour => "tour",
            ActivityKind::Transfer => "transfer",
            ActivityKind::CarRental => "car_rental",
            ActivityKind::Rail => "rail",
            ActivityKind::Other => "other",
        }
    }

    /// Fallback name when the details say nothing useful.
    pub fn label(&self) -> &'static str {
        match self {
            ActivityKind::Flight => "Flight",
            ActivityKind::Hotel => "Hotel",
            ActivityKind::Cruise => "Cruise",
            ActivityKind::Dining => "Dining",
            ActivityKind::Tour => "Tour",
            ActivityKind::Transfer => "Transfer",
            ActivityKind::CarRental => "Car rental",
            ActivityKind::Rail => "Train",
            ActivityKind::Other => "Activity",
        }
    }

    fn default_template(&self) -> &'static str {
        match self {
            ActivityKind::Flight => {
                "{% if carrier or flight_number %}{{ carrier }} {{ flight_number }}{% else %}Flight{% endif %}\
                 {% if origin and destination %}: {{ origin }} → {{ destination }}{% endif %}"
            }
            ActivityKind::Hotel => {
                "{% if property_name %}{{ property_name }}{% else %}Hotel{% endif %}\
                 {% if nights %} ({{ nights }} night{% if nights != 1 %}s{% endif %}){% endif %}"
            }
            ActivityKind::Cruise => {
                "{% if ship %}{{ ship }}{% else %}Cruise{% endif %}\
                 {% if cruise_line %} · {{ cruise_line }}{% endif %}\
                 {% if nights %} ({{ nights }} night{% if nights != 1 %}s{% endif %}){% endif %}"
            }
            ActivityKind::Dining => {
                "{% if meal %}{{ meal }}{% else %}Dining{% endif %}{% if venue %} at {{ venue }}{% endif %}"
            }
            ActivityKind::Tour => {
                "{% if title %}{{ title }}{% else %}Tour{% endif %}{% if provider %} with {{ provider }}{% endif %}"
            }
            ActivityKind::Transfer => {
                "Transfer{% if pickup and dropoff %}: {{ pickup }} → {{ dropoff }}\
                 {% elif dropoff %} to {{ dropoff }}{% elif pickup %} from {{ pickup }}{% endif %}"
            }
            ActivityKind::CarRental => {
                "Car rental{% if provider %}: {{ provider }}{% endif %}{% if pickup %} ({{ pickup }}){% endif %}"
            }
            ActivityKind::Rail => {
                "{% if provider %}{{ provider }} {% endif %}{% if train_number %}{{ train_number }}{% else %}Train{% endif %}\
                 {% if origin and destination %}: {{ origin }} → {{ destination }}{% endif %}"
            }
            ActivityKind::Other => "{% if title %}{{ title }}{% else %}Activity{% endif %}",
        }
    }
}

impl std::str::FromStr for ActivityKind {
    type Err = NamingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| NamingError::UnknownKind(s.to_string()))
    }
}

/// Kind-specific details of an activity.
///
/// Absent fields are left out of the template context so `{% if field %}`
/// is false for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ActivityDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nights: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cruise_line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropoff: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train_number: Option<String>,
    /// Free-form extras, available to custom templates.
    #[serde(flatten, default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Renders activity names from details.
pub struct ActivityNamer {
    env: Environment<'static>,
}

impl Default for ActivityNamer {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityNamer {
    /// Namer with the built-in template for every kind.
    pub fn new() -> Self {
        let mut env = Environment::new();
        for kind in ActivityKind::ALL {
            if let Err(e) = env.add_template(kind.as_str(), kind.default_template()) {
                // `generate` falls back to the kind label.
                tracing::error!(
                    kind = kind.as_str(),
                    error = %e,
                    "Built-in name template rejected"
                );
            }
        }
        Self { env }
    }

    /// Namer with agency overrides (`kind -> template source`) applied.
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Result<Self, NamingError> {
        let mut namer = Self::new();
        for (kind, source) in overrides {
            let kind: ActivityKind = kind.parse()?;
            namer.set_template(kind, source.clone())?;
        }
        Ok(namer)
    }

    /// Replace the template for one kind.
    pub fn set_template(&mut self, kind: ActivityKind, source: String) -> Result<(), NamingError> {
        self.env
            .add_template_owned(kind.as_str().to_string(), source)
            .map_err(|e| NamingError::InvalidTemplate {
                kind: kind.as_str().to_string(),
                message: e.to_string(),
            })
    }

    /// Generate a name; falls back to the kind label when rendering yields nothing.
    pub fn generate(&self, kind: ActivityKind, details: &ActivityDetails) -> String {
        let rendered = self
            .env
            .get_template(kind.as_str())
            .and_then(|t| t.render(details))
            .unwrap_or_else(|e| {
                tracing::warn!(kind = kind.as_str(), error = %e, "Activity name template failed");
                String::new()
            });

        let collapsed = collapse_whitespace(&rendered);
        if collapsed.is_empty() {
            kind.label().to_string()
        } else {
            collapsed
        }
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Make `name` unique among `existing`, ignoring case: `Dinner`, `Dinner (2)`, ...
pub fn disambiguate(name: &str, existing: &[String]) -> String {
    let taken = |candidate: &str| find_ci(existing, |s| s.as_str(), candidate).is_some();
    if !taken(name) {
        return name.to_string();
    }
    (2..)
        .map(|n| format!("{} ({})", name, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(json: serde_json::Value) -> ActivityDetails {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_every_builtin_template_loads() {
        let namer = ActivityNamer::new();
        for kind in ActivityKind::ALL {
            assert!(namer.env.get_template(kind.as_str()).is_ok(), "{}", kind.as_str());
        }
    }

    #[test]
    fn test_flight_name() {
        let namer = ActivityNamer::new();
        let d = details(serde_json::json!({
            "carrier": "UA", "flight_number": "123", "origin": "SFO", "destination": "JFK"
        }));
        assert_eq!(namer.generate(ActivityKind::Flight, &d), "UA 123: SFO → JFK");
    }

    #[test]
    fn test_flight_without_details_uses_label() {
        let namer = ActivityNamer::new();
        let d = details(serde_json::json!({"origin": "SFO"}));
        assert_eq!(namer.generate(ActivityKind::Flight, &d), "Flight");
    }

    #[test]
    fn test_hotel_nights_pluralization() {
        let namer = ActivityNamer::new();
        let d = details(serde_json::json!({"property_name": "The Ritz", "nights": 3}));
        assert_eq!(namer.generate(ActivityKind::Hotel, &d), "The Ritz (3 nights)");

        let d = details(serde_json::json!({"nights": 1}));
        assert_eq!(namer.generate(ActivityKind::Hotel, &d), "Hotel (1 night)");
    }

    #[test]
    fn test_dining_transfer_and_rail() {
        let namer = ActivityNamer::new();
        let d = details(serde_json::json!({"meal": "Dinner", "venue": "Noma"}));
        assert_eq!(namer.generate(ActivityKind::Dining, &d), "Dinner at Noma");

        let d = details(serde_json::json!({"dropoff": "Hotel Arts"}));
        assert_eq!(namer.generate(ActivityKind::Transfer, &d), "Transfer to Hotel Arts");

        let d = details(serde_json::json!({
            "provider": "Trenitalia", "train_number": "FR 9517",
            "origin": "Roma Termini", "destination": "Firenze SMN"
        }));
        assert_eq!(
            namer.generate(ActivityKind::Rail, &d),
            "Trenitalia FR 9517: Roma Termini → Firenze SMN"
        );
    }

    #[test]
    fn test_agency_override() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "dining".to_string(),
            "Reservation: {{ venue }} ({{ party_size }} guests)".to_string(),
        );
        let namer = ActivityNamer::with_overrides(&overrides).unwrap();
        let d = details(serde_json::json!({"venue": "Noma", "party_size": 4}));
        assert_eq!(
            namer.generate(ActivityKind::Dining, &d),
            "Reservation: Noma (4 guests)"
        );
        // other kinds keep their defaults
        assert_eq!(namer.generate(ActivityKind::Tour, &ActivityDetails::default()), "Tour");
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let mut overrides = HashMap::new();
        overrides.insert("hotel".to_string(), "{% if %}".to_string());
        assert!(matches!(
            ActivityNamer::with_overrides(&overrides),
            Err(NamingError::InvalidTemplate { .. })
        ));

        let mut overrides = HashMap::new();
        overrides.insert("spa".to_string(), "Spa".to_string());
        assert!(matches!(
            ActivityNamer::with_overrides(&overrides),
            Err(NamingError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_blank_render_falls_back_to_label() {
        let mut namer = ActivityNamer::new();
        namer
            .set_template(ActivityKind::Other, "{{ nothing }}".to_string())
            .unwrap();
        assert_eq!(
            namer.generate(ActivityKind::Other, &ActivityDetails::default()),
            "Activity"
        );
    }

    #[test]
    fn test_disambiguate() {
        let existing = vec!["Dinner at Noma".to_string(), "dinner at noma (2)".to_string()];
        assert_eq!(disambiguate("Dinner at Noma", &existing), "Dinner at Noma (3)");
        assert_eq!(disambiguate("Lunch", &existing), "Lunch");
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("car_rental".parse::<ActivityKind>().unwrap(), ActivityKind::CarRental);
        assert!("spa".parse::<ActivityKind>().is_err());
    }
}

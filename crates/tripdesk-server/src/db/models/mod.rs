//! Database models for Tripdesk.
//!
//! Row types derive `FromRow`; request and response DTOs for the REST API
//! live beside the rows they map to.

pub mod agency;
pub mod booking;
pub mod contact;
pub mod itinerary;
pub mod portal;
pub mod trip;

pub use agency::*;
pub use booking::*;
pub use contact::*;
pub use itinerary::*;
pub use portal::*;
pub use trip::*;

use serde::{Deserialize, Deserializer};

/// Distinguishes an absent PATCH field (`None`) from an explicit `null`
/// (`Some(None)`). Use with `#[serde(default, deserialize_with = "nullable")]`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trim, treating an empty result as absent.
pub(crate) fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        notes: Option<Option<String>>,
    }

    #[test]
    fn test_nullable_distinguishes_null_from_absent() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.notes, None);

        let null: Patch = serde_json::from_str(r#"{"notes": null}"#).unwrap();
        assert_eq!(null.notes, Some(None));

        let set: Patch = serde_json::from_str(r#"{"notes": "window seat"}"#).unwrap();
        assert_eq!(set.notes, Some(Some("window seat".to_string())));
    }

    #[test]
    fn test_clean() {
        assert_eq!(clean(Some("  ".to_string())), None);
        assert_eq!(clean(Some(" a ".to_string())), Some("a".to_string()));
        assert_eq!(clean(None), None);
    }
}

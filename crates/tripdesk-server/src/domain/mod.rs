//! Pure trip-planning rules, free of I/O.
//!
//! Services load rows, hand them to these modules, and persist the results.

pub mod geo;
pub mod money;
pub mod naming;
pub mod pricing;
pub mod snapshot;
pub mod split;
pub mod text;

pub use geo::{
    ActivityLocation, CascadeReport, DayLocation, GeoError, GeoPoint, Itinerary, LocationSource,
};
pub use naming::{disambiguate, ActivityDetails, ActivityKind, ActivityNamer, NamingError};
pub use pricing::{quote, PriceBreakdown, PriceInputs, PricingError, PricingModel, TripTotals};
pub use snapshot::{FieldChange, SnapshotError, TravelerProfile};
pub use split::{
    distribute, AmountAllocation, ShareAllocation, SplitError, SplitRule, TravelerShare,
};

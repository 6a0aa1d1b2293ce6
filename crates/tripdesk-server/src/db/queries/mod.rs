//! Database queries for Tripdesk, one module per table group.
//!
//! Functions used inside transactions take any `PgExecutor`, so they run
//! against the pool or `&mut *tx` alike.

pub mod agency;
pub mod booking;
pub mod contact;
pub mod itinerary;
pub mod traveler;
pub mod trip;

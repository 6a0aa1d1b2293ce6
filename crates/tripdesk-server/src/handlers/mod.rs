//! HTTP handlers for the Tripdesk API, one module per resource.

pub mod activities;
pub mod agency;
pub mod bookings;
pub mod contacts;
pub mod dashboard;
pub mod database;
pub mod health;
pub mod itinerary;
pub mod portal;
pub mod pricing;
pub mod travelers;
pub mod trips;

pub use health::{api_health, health_check};

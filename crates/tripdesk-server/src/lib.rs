//! Tripdesk server library
//!
//! Back office for travel agencies, handling:
//!
//! - **Trips**: itineraries of days and activities, with locations that
//!   cascade from day to day and from hotels over the nights of a stay
//! - **Pricing**: net and commissionable pricing, advisor payouts and trip
//!   totals in integer cents
//! - **Travelers**: contacts with encrypted travel documents, snapshotted
//!   onto trips and diffed against the live record
//! - **Bookings**: supplier confirmations and payments
//! - **Client portal**: a read-only trip view reached through a share token
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from environment variables
//! - [`domain`]: Pure business rules (money, pricing, splits, geo, naming)
//! - [`db`]: Database connectivity, schema, models and queries
//! - [`services`]: Business operations over the database
//! - [`handlers`] and [`routes`]: HTTP surface
//! - [`tenant`]: Agency scoping of requests
//!
//! ## Example
//!
//! ```ignore
//! use tripdesk_server::{
//!     config::{AppConfig, DatabaseConfig},
//!     db::create_pool,
//!     routes::router,
//!     state::AppState,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db_pool = create_pool(&DatabaseConfig::from_env()?).await?;
//!     let state = AppState::new(db_pool, AppConfig::from_env()?)?;
//!     let app = router(state);
//!     // ... bind and serve
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crypto;
pub mod db;
pub mod domain;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod result_ext;
pub mod routes;
pub mod services;
pub mod state;
pub mod tenant;

pub use error::{AppError, AppResult};
pub use result_ext::ResultExt;

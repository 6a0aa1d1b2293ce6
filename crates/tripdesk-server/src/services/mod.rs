//! Service layer for Tripdesk.
//!
//! Services own the business rules, coordinating queries and the pure
//! `domain` modules. Every tenant-scoped method takes the agency id first.

pub mod activity;
pub mod agency;
pub mod booking;
pub mod contact;
pub mod dashboard;
pub mod itinerary;
pub mod portal;
pub mod traveler;
pub mod trip;

use std::sync::Arc;

pub use activity::ActivityService;
pub use agency::AgencyService;
pub use booking::BookingService;
pub use contact::ContactService;
pub use dashboard::DashboardService;
pub use itinerary::ItineraryService;
pub use portal::PortalService;
pub use traveler::TravelerService;
pub use trip::TripService;

use crate::config::AppConfig;
use crate::crypto::Encryptor;
use crate::db::DbPool;

/// All services, wired to one pool and one encryptor.
#[derive(Clone)]
pub struct Services {
    pub agencies: AgencyService,
    pub contacts: ContactService,
    pub trips: TripService,
    pub travelers: TravelerService,
    pub itinerary: ItineraryService,
    pub activities: ActivityService,
    pub bookings: BookingService,
    pub portal: PortalService,
    pub dashboard: DashboardService,
}

impl Services {
    pub fn new(pool: DbPool, config: Arc<AppConfig>, encryptor: Encryptor) -> Self {
        let agencies = AgencyService::new(pool.clone(), config.clone());
        let contacts = ContactService::new(pool.clone(), agencies.clone(), encryptor.clone());
        Self {
            trips: TripService::new(pool.clone(), agencies.clone(), encryptor.clone()),
            travelers: TravelerService::new(pool.clone(), contacts.clone(), encryptor.clone()),
            itinerary: ItineraryService::new(pool.clone(), agencies.clone()),
            activities: ActivityService::new(pool.clone(), agencies.clone()),
            bookings: BookingService::new(pool.clone()),
            portal: PortalService::new(pool.clone(), agencies.clone(), encryptor),
            dashboard: DashboardService::new(pool, agencies.clone(), config),
            agencies,
            contacts,
        }
    }
}

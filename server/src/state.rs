//! Application state for the Seatbook HTTP server.

use seatbook_core::Clock;
use seatbook_runtime::{
    AllocationEngine, Availability, EngineConfig, PeopleRegistry, ReservationQueries,
    SeatCatalog, Stores, UsageReports,
};
use seatbook_web::ReadinessProbe;
use std::sync::Arc;

/// Services shared across all HTTP handlers.
///
/// Every field is cheap to clone (`Arc` inside), so the state is cloned per
/// request.
#[derive(Clone)]
pub struct AppState {
    /// Book, cancel, modify and assign
    pub engine: AllocationEngine,
    /// Per-date seat listings
    pub availability: Availability,
    /// Administrator seat management
    pub catalog: SeatCatalog,
    /// Person records from the identity side
    pub people: PeopleRegistry,
    /// Reservation listings
    pub queries: ReservationQueries,
    /// Usage reports
    pub usage: UsageReports,
    /// Backing store health for `/ready`
    pub readiness: Arc<dyn ReadinessProbe>,
}

impl AppState {
    /// Wire every service onto the same stores.
    #[must_use]
    pub fn new(
        stores: Stores,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
        readiness: Arc<dyn ReadinessProbe>,
    ) -> Self {
        Self {
            engine: AllocationEngine::new(stores.clone(), clock, config),
            availability: Availability::new(stores.clone()),
            catalog: SeatCatalog::new(Arc::clone(&stores.seats)),
            people: PeopleRegistry::new(Arc::clone(&stores.people)),
            queries: ReservationQueries::new(stores.clone()),
            usage: UsageReports::new(stores),
            readiness,
        }
    }
}

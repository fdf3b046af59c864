//! Shared handles to the storage collaborators.

use seatbook_core::{PersonDirectory, ReservationLedger, SeatDirectory};
use std::sync::Arc;

/// The seat directory, person directory and ledger used by every service.
///
/// All three must be backed by the same transactional store: seat deletion
/// and the ledger's conditional insert are serialized against each other.
#[derive(Clone)]
pub struct Stores {
    /// Seat records
    pub seats: Arc<dyn SeatDirectory>,
    /// Persons known to the identity collaborator
    pub people: Arc<dyn PersonDirectory>,
    /// Reservation ledger
    pub ledger: Arc<dyn ReservationLedger>,
}

impl Stores {
    /// Use one store for all three roles.
    #[must_use]
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: SeatDirectory + PersonDirectory + ReservationLedger + 'static,
    {
        Self {
            seats: Arc::clone(&store) as Arc<dyn SeatDirectory>,
            people: Arc::clone(&store) as Arc<dyn PersonDirectory>,
            ledger: store,
        }
    }
}

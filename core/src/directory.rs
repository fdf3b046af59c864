//! Seat and person directories.
//!
//! The seat directory is plain durable storage: its only invariant is the
//! uniqueness of `(seat_number, offered_date)`. The person directory mirrors
//! the identity collaborator: records arrive through
//! [`PersonDirectory::upsert_person`] and are otherwise read-only here.
//!
//! # Seat deletion
//!
//! `delete_seat` must refuse with [`DirectoryError::SeatInUse`] while an
//! active reservation references the seat, and that check must be atomic with
//! respect to a concurrent [`ReservationLedger::insert_active`] for the same
//! seat. Both backends satisfy this by keeping seats and reservations in the
//! same transactional store.
//!
//! [`ReservationLedger::insert_active`]: crate::ledger::ReservationLedger::insert_active

use crate::BoxFuture;
use crate::types::{NewSeat, Person, PersonId, Seat, SeatId, SeatUpdate};
use chrono::NaiveDate;
use thiserror::Error;

/// Errors from directory operations.
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// A seat with this number already exists for the date.
    #[error("Seat {seat_number} already exists for {date}")]
    DuplicateSeat {
        /// Seat number
        seat_number: u32,
        /// Offered date
        date: NaiveDate,
    },

    /// No seat with this id.
    #[error("Seat not found: {0}")]
    SeatNotFound(SeatId),

    /// The seat is referenced by an active reservation.
    #[error("Seat {0} has an active reservation")]
    SeatInUse(SeatId),

    /// Storage backend failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Durable set of seat records.
pub trait SeatDirectory: Send + Sync {
    /// Point lookup by id.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Storage`] if the backend fails.
    fn seat(&self, id: SeatId) -> BoxFuture<'_, Result<Option<Seat>, DirectoryError>>;

    /// Lookup by natural key.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Storage`] if the backend fails.
    fn seat_by_number(
        &self,
        seat_number: u32,
        date: NaiveDate,
    ) -> BoxFuture<'_, Result<Option<Seat>, DirectoryError>>;

    /// Seats offered on `date`, ordered by seat number.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Storage`] if the backend fails.
    fn seats_on(&self, date: NaiveDate) -> BoxFuture<'_, Result<Vec<Seat>, DirectoryError>>;

    /// Every seat, ordered by (date, seat number).
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Storage`] if the backend fails.
    fn all_seats(&self) -> BoxFuture<'_, Result<Vec<Seat>, DirectoryError>>;

    /// Create a seat.
    ///
    /// # Errors
    ///
    /// - [`DirectoryError::DuplicateSeat`] when the natural key is taken
    /// - [`DirectoryError::Storage`] if the backend fails
    fn create_seat(&self, seat: NewSeat) -> BoxFuture<'_, Result<Seat, DirectoryError>>;

    /// Edit location and amenities.
    ///
    /// # Errors
    ///
    /// - [`DirectoryError::SeatNotFound`] for an unknown id
    /// - [`DirectoryError::Storage`] if the backend fails
    fn update_seat(
        &self,
        id: SeatId,
        update: SeatUpdate,
    ) -> BoxFuture<'_, Result<Seat, DirectoryError>>;

    /// Delete a seat with no active reservation.
    ///
    /// Cancelled reservations keep their (now dangling) seat reference.
    ///
    /// # Errors
    ///
    /// - [`DirectoryError::SeatNotFound`] for an unknown id
    /// - [`DirectoryError::SeatInUse`] while an active reservation references it
    /// - [`DirectoryError::Storage`] if the backend fails
    fn delete_seat(&self, id: SeatId) -> BoxFuture<'_, Result<Seat, DirectoryError>>;
}

/// Persons known to the identity collaborator.
pub trait PersonDirectory: Send + Sync {
    /// Point lookup by id.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Storage`] if the backend fails.
    fn person(&self, id: PersonId) -> BoxFuture<'_, Result<Option<Person>, DirectoryError>>;

    /// Batch lookup. Unknown ids are skipped; order is unspecified.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Storage`] if the backend fails.
    fn people(&self, ids: Vec<PersonId>) -> BoxFuture<'_, Result<Vec<Person>, DirectoryError>>;

    /// Insert a person or replace the record with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Storage`] if the backend fails.
    fn upsert_person(&self, person: Person) -> BoxFuture<'_, Result<Person, DirectoryError>>;
}

//! Reservation ledger contract.
//!
//! The ledger is an append-only set of reservations. Records are never
//! deleted; cancellation flips the status and frees the slots.
//!
//! # The conditional insert
//!
//! [`ReservationLedger::insert_active`] is the single primitive that keeps the
//! uniqueness invariants. It must, as one indivisible step:
//!
//! 1. verify the seat exists and is offered on the reservation's date
//! 2. verify the person holds no active reservation on that date
//! 3. verify the seat holds no active reservation on that date
//! 4. insert the reservation
//!
//! and report the first failing check. Implementations may use a single lock,
//! a serializable transaction, or storage uniqueness constraints, but never a
//! read followed by a separate write.
//!
//! # Implementations
//!
//! - `InMemoryStore` (in `seatbook-testing`): one `RwLock` over all tables
//! - `PostgresStore` (in `seatbook-postgres`): partial unique indexes

use crate::BoxFuture;
use crate::types::{PersonId, Reservation, ReservationId, SeatId};
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The seat does not exist or is not offered on the date.
    #[error("Seat {seat} is not offered on {date}")]
    SeatUnavailable {
        /// Seat
        seat: SeatId,
        /// Requested date
        date: NaiveDate,
    },

    /// The person already holds an active reservation on the date.
    #[error("Person {person} already has a reservation on {date}")]
    PersonBooked {
        /// Person
        person: PersonId,
        /// Date
        date: NaiveDate,
    },

    /// The seat already holds an active reservation on the date.
    #[error("Seat {seat} is already reserved on {date}")]
    SeatTaken {
        /// Seat
        seat: SeatId,
        /// Date
        date: NaiveDate,
    },

    /// No active reservation with this id belongs to the person.
    #[error("Reservation not found: {0}")]
    NotFound(ReservationId),

    /// Transient write conflict; the write did not happen and may be retried.
    #[error("Write conflict: {0}")]
    Conflict(String),

    /// Storage backend failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Whether retrying the same operation from scratch may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Durable, append-only set of reservations.
///
/// # Dyn Compatibility
///
/// Methods return boxed futures so the ledger can be shared as
/// `Arc<dyn ReservationLedger>`.
pub trait ReservationLedger: Send + Sync {
    /// Insert `reservation` (which must be active) if no conflicting active
    /// reservation exists. See the module docs for the required atomicity.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::SeatUnavailable`]: seat missing or offered on another date
    /// - [`LedgerError::PersonBooked`]: the person already holds the date
    /// - [`LedgerError::SeatTaken`]: the seat is already held on the date
    /// - [`LedgerError::Conflict`]: transient conflict, nothing was written
    /// - [`LedgerError::Storage`]: backend failure
    fn insert_active(
        &self,
        reservation: Reservation,
    ) -> BoxFuture<'_, Result<Reservation, LedgerError>>;

    /// Cancel the active reservation `id` owned by `owner`.
    ///
    /// The status change and the freeing of both slots are one step.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotFound`]: no such active reservation owned by `owner`
    /// - [`LedgerError::Conflict`]: transient conflict, nothing was written
    /// - [`LedgerError::Storage`]: backend failure
    fn cancel_active(
        &self,
        id: ReservationId,
        owner: PersonId,
        at: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Reservation, LedgerError>>;

    /// Point lookup by id, any status.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] if the backend fails.
    fn reservation(
        &self,
        id: ReservationId,
    ) -> BoxFuture<'_, Result<Option<Reservation>, LedgerError>>;

    /// Active reservations on `date`, read from a single snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] if the backend fails.
    fn active_on(&self, date: NaiveDate) -> BoxFuture<'_, Result<Vec<Reservation>, LedgerError>>;

    /// All reservations (any status) on `date`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] if the backend fails.
    fn all_on(&self, date: NaiveDate) -> BoxFuture<'_, Result<Vec<Reservation>, LedgerError>>;

    /// All reservations (any status) held by `person`, newest date first.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] if the backend fails.
    fn for_person(
        &self,
        person: PersonId,
    ) -> BoxFuture<'_, Result<Vec<Reservation>, LedgerError>>;

    /// Active reservations with `start <= date <= end`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] if the backend fails.
    fn active_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BoxFuture<'_, Result<Vec<Reservation>, LedgerError>>;
}

//! # Seatbook Core
//!
//! Domain types and storage contracts for day-scoped seat reservations.
//!
//! A fixed pool of physical seats is offered per calendar date. Members claim
//! one seat for one date, may cancel, and administrators manage seats and
//! assignments. This crate holds everything the allocation logic and its
//! storage backends agree on:
//!
//! - **Types**: `Seat`, `Person`, `Reservation` and their identifiers
//! - **Capabilities**: `Caller` and `AdminCapability` for role-based dispatch
//! - **Contracts**: the `SeatDirectory`, `PersonDirectory` and
//!   `ReservationLedger` traits
//! - **Errors**: storage errors and the caller-facing `AllocationError`
//!
//! ## Invariants
//!
//! Every ledger implementation must uphold, at all times:
//!
//! - at most one active reservation per (seat, date)
//! - at most one active reservation per (person, date)
//! - a reservation's date equals its seat's offered date
//! - `active → cancelled` is the only status transition
//!
//! The first three are enforced by [`ledger::ReservationLedger::insert_active`],
//! which must check and write as a single indivisible step.
//!
//! ## Example
//!
//! ```ignore
//! use seatbook_core::{Caller, PersonId, Role};
//!
//! let caller = Caller::new(PersonId::new(), Role::Administrator);
//! let admin = caller.admin_capability().ok_or(AllocationError::Forbidden)?;
//! ```

pub mod directory;
pub mod environment;
pub mod error;
pub mod ledger;
pub mod types;

// Re-export commonly used types
pub use chrono::{DateTime, NaiveDate, Utc};
pub use directory::{DirectoryError, PersonDirectory, SeatDirectory};
pub use environment::{Clock, SystemClock};
pub use error::{AllocationError, ErrorKind};
pub use ledger::{LedgerError, ReservationLedger};
pub use types::{
    AdminCapability, Caller, NewSeat, Person, PersonId, Reservation, ReservationId,
    ReservationStatus, Role, Seat, SeatId, SeatUpdate, start_of_day,
};

/// Boxed, sendable future returned by the storage traits.
///
/// The traits use explicit boxed futures instead of `async fn` so they stay
/// dyn-compatible (`Arc<dyn ReservationLedger>`).
pub type BoxFuture<'a, T> = std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

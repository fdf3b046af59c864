//! Domain types for seat reservations.
//!
//! Identifiers are UUID newtypes so a `SeatId` can never be passed where a
//! `PersonId` is expected. Calendar dates are `NaiveDate`: a reservation date
//! carries no time zone and no time of day.

use crate::error::AllocationError;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Create a `", stringify!($name), "` from a `Uuid`")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

uuid_id! {
    /// Unique identifier for a seat record (one seat number on one date)
    SeatId
}

uuid_id! {
    /// Unique identifier for a person, issued by the identity collaborator
    PersonId
}

uuid_id! {
    /// Unique identifier for a reservation
    ReservationId
}

// ============================================================================
// Roles and capabilities
// ============================================================================

/// Role of a verified caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular member booking seats for themselves
    Member,
    /// Administrator managing seats, assignments and reports
    Administrator,
}

impl Role {
    /// Canonical lowercase name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Administrator => "administrator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role name is not recognised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown role: {0}")]
pub struct ParseRoleError(String);

impl FromStr for Role {
    type Err = ParseRoleError;

    /// Accepts the canonical names plus the legacy `intern` / `admin` aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "member" | "intern" => Ok(Self::Member),
            "administrator" | "admin" => Ok(Self::Administrator),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

/// A verified caller, as handed over by the identity collaborator.
///
/// The core trusts this value and performs no identity verification of its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    /// The calling person
    pub person: PersonId,
    /// The caller's role
    pub role: Role,
}

impl Caller {
    /// Creates a new `Caller`
    #[must_use]
    pub const fn new(person: PersonId, role: Role) -> Self {
        Self { person, role }
    }

    /// Shorthand for a member caller.
    #[must_use]
    pub const fn member(person: PersonId) -> Self {
        Self::new(person, Role::Member)
    }

    /// Shorthand for an administrator caller.
    #[must_use]
    pub const fn administrator(person: PersonId) -> Self {
        Self::new(person, Role::Administrator)
    }

    /// Whether the caller holds the administrator role.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Administrator)
    }

    /// Derive the administrator capability, if the role grants it.
    #[must_use]
    pub const fn admin_capability(&self) -> Option<AdminCapability> {
        if self.is_admin() {
            Some(AdminCapability { admin: self.person })
        } else {
            None
        }
    }

    /// Derive the administrator capability or fail with `Forbidden`.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::Forbidden`] for non-administrators.
    pub fn require_admin(&self) -> Result<AdminCapability, AllocationError> {
        self.admin_capability().ok_or(AllocationError::Forbidden)
    }
}

/// Proof that an administrator operation may proceed.
///
/// Only obtainable through [`Caller::admin_capability`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdminCapability {
    admin: PersonId,
}

impl AdminCapability {
    /// The administrator exercising the capability.
    #[must_use]
    pub const fn admin(&self) -> PersonId {
        self.admin
    }
}

// ============================================================================
// Seats
// ============================================================================

/// Location used when an administrator does not give one.
pub const DEFAULT_LOCATION: &str = "Main Floor";

/// A bookable seat offered for exactly one calendar date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    /// Seat identifier
    pub id: SeatId,
    /// Human-facing seat number, unique per date
    pub seat_number: u32,
    /// Date the seat is offered for
    pub offered_date: NaiveDate,
    /// Free-text location
    pub location: String,
    /// Amenities (monitor, window, ...)
    pub amenities: BTreeSet<String>,
}

impl Seat {
    /// Whether this seat can be reserved for `date`.
    #[must_use]
    pub fn is_offered_on(&self, date: NaiveDate) -> bool {
        self.offered_date == date
    }

    /// Apply an administrator edit. Seat number and date never change.
    pub fn apply(&mut self, update: &SeatUpdate) {
        if let Some(location) = &update.location {
            self.location.clone_from(location);
        }
        if let Some(amenities) = &update.amenities {
            self.amenities.clone_from(amenities);
        }
    }
}

/// Input for creating a seat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSeat {
    /// Seat number (must be positive)
    pub seat_number: u32,
    /// Date the seat is offered for
    pub offered_date: NaiveDate,
    /// Location, defaults to [`DEFAULT_LOCATION`]
    #[serde(default)]
    pub location: Option<String>,
    /// Amenities
    #[serde(default)]
    pub amenities: BTreeSet<String>,
}

impl NewSeat {
    /// Creates a `NewSeat` with the default location and no amenities.
    #[must_use]
    pub const fn new(seat_number: u32, offered_date: NaiveDate) -> Self {
        Self {
            seat_number,
            offered_date,
            location: None,
            amenities: BTreeSet::new(),
        }
    }

    /// Set the location.
    #[must_use]
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Add an amenity.
    #[must_use]
    pub fn with_amenity(mut self, amenity: impl Into<String>) -> Self {
        self.amenities.insert(amenity.into());
        self
    }

    /// Materialize the seat record under the given id.
    #[must_use]
    pub fn into_seat(self, id: SeatId) -> Seat {
        Seat {
            id,
            seat_number: self.seat_number,
            offered_date: self.offered_date,
            location: self
                .location
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            amenities: self.amenities,
        }
    }
}

/// Administrator edit of a seat. `None` leaves the field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatUpdate {
    /// New location
    #[serde(default)]
    pub location: Option<String>,
    /// Replacement amenity set
    #[serde(default)]
    pub amenities: Option<BTreeSet<String>>,
}

// ============================================================================
// People
// ============================================================================

/// A person known to the identity collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Person identifier
    pub id: PersonId,
    /// Role
    pub role: Role,
    /// Name shown to administrators
    pub display_name: String,
    /// Contact email shown to administrators
    pub email: String,
}

// ============================================================================
// Reservations
// ============================================================================

/// Lifecycle status of a reservation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// Occupies its (seat, date) and (person, date) slots
    Active,
    /// Terminal; frees both slots
    Cancelled,
}

impl ReservationStatus {
    /// Storage name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("Unknown reservation status: {other}")),
        }
    }
}

/// A binding of one person to one seat for one date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Reservation identifier
    pub id: ReservationId,
    /// Reserved seat
    pub seat_id: SeatId,
    /// Holder
    pub person_id: PersonId,
    /// Reserved date, copied from the seat at creation
    pub date: NaiveDate,
    /// Lifecycle status
    pub status: ReservationStatus,
    /// When the reservation was created
    pub created_at: DateTime<Utc>,
    /// When the reservation was cancelled
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Reservation {
    /// Build a new active reservation of `seat` for `person`.
    ///
    /// The date is taken from the seat, so a reservation's date always equals
    /// its seat's offered date.
    #[must_use]
    pub fn new_active(seat: &Seat, person_id: PersonId, created_at: DateTime<Utc>) -> Self {
        Self {
            id: ReservationId::new(),
            seat_id: seat.id,
            person_id,
            date: seat.offered_date,
            status: ReservationStatus::Active,
            created_at,
            cancelled_at: None,
        }
    }

    /// Whether the reservation still occupies its slots.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.status, ReservationStatus::Active)
    }

    /// Transition `active → cancelled`.
    ///
    /// Returns `false` (and changes nothing) when already cancelled.
    pub fn cancel(&mut self, at: DateTime<Utc>) -> bool {
        if !self.is_active() {
            return false;
        }
        self.status = ReservationStatus::Cancelled;
        self.cancelled_at = Some(at);
        true
    }
}

/// Start of a calendar date as a UTC instant.
///
/// Booking lead time is measured from this instant.
#[must_use]
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn role_parses_canonical_names_and_aliases() {
        assert_eq!("member".parse::<Role>().unwrap(), Role::Member);
        assert_eq!("intern".parse::<Role>().unwrap(), Role::Member);
        assert_eq!("Administrator".parse::<Role>().unwrap(), Role::Administrator);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Administrator);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn only_administrators_get_the_capability() {
        let person = PersonId::new();
        assert!(Caller::member(person).admin_capability().is_none());

        let cap = Caller::administrator(person).admin_capability().unwrap();
        assert_eq!(cap.admin(), person);

        assert!(matches!(
            Caller::member(person).require_admin(),
            Err(AllocationError::Forbidden)
        ));
    }

    #[test]
    fn new_seat_defaults_location() {
        let seat = NewSeat::new(4, date("2025-06-10")).into_seat(SeatId::new());
        assert_eq!(seat.location, DEFAULT_LOCATION);

        let seat = NewSeat::new(4, date("2025-06-10"))
            .at("  ")
            .into_seat(SeatId::new());
        assert_eq!(seat.location, DEFAULT_LOCATION);
    }

    #[test]
    fn seat_update_keeps_number_and_date() {
        let mut seat = NewSeat::new(7, date("2025-06-10"))
            .with_amenity("monitor")
            .into_seat(SeatId::new());

        seat.apply(&SeatUpdate {
            location: Some("Quiet Room".to_string()),
            amenities: None,
        });

        assert_eq!(seat.seat_number, 7);
        assert_eq!(seat.offered_date, date("2025-06-10"));
        assert_eq!(seat.location, "Quiet Room");
        assert!(seat.amenities.contains("monitor"));
    }

    #[test]
    fn reservation_copies_date_from_seat() {
        let seat = NewSeat::new(1, date("2025-06-10")).into_seat(SeatId::new());
        let reservation = Reservation::new_active(&seat, PersonId::new(), Utc::now());

        assert_eq!(reservation.date, seat.offered_date);
        assert_eq!(reservation.seat_id, seat.id);
        assert!(reservation.is_active());
    }

    #[test]
    fn cancellation_is_terminal() {
        let seat = NewSeat::new(1, date("2025-06-10")).into_seat(SeatId::new());
        let mut reservation = Reservation::new_active(&seat, PersonId::new(), Utc::now());

        let first = Utc::now();
        assert!(reservation.cancel(first));
        assert!(!reservation.cancel(Utc::now()));
        assert_eq!(reservation.status, ReservationStatus::Cancelled);
        assert_eq!(reservation.cancelled_at, Some(first));
    }

    #[test]
    fn start_of_day_is_utc_midnight() {
        let instant = start_of_day(date("2025-06-10"));
        assert_eq!(instant.to_rfc3339(), "2025-06-10T00:00:00+00:00");
    }

    #[test]
    fn ids_serialize_as_plain_uuids() {
        let id = SeatId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }
}

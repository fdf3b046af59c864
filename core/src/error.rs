//! Caller-facing error taxonomy.
//!
//! Every variant except [`AllocationError::Internal`] is an expected outcome:
//! it is returned to the caller with enough detail to render a message and is
//! never logged as a failure. `Internal` covers storage unavailability and
//! contract violations; callers show a generic message for it.

use crate::directory::DirectoryError;
use crate::ledger::LedgerError;
use crate::types::{PersonId, ReservationId, SeatId};
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Coarse error kinds, stable across transports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed or missing input
    Validation,
    /// Referenced seat, person or reservation does not exist (or is not the caller's)
    NotFound,
    /// Booking date is inside the lead-time window
    TooLate,
    /// Seat/date slot already taken
    SeatTaken,
    /// Person already holds the date
    PersonAlreadyBooked,
    /// Transient write conflict; safe to retry from scratch
    ConflictRetryable,
    /// Caller lacks the administrator capability
    Forbidden,
    /// Seat catalog conflict (duplicate seat, seat in use)
    CatalogConflict,
    /// Storage failure or contract violation
    Internal,
}

impl ErrorKind {
    /// Wire name of the kind, as serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION",
            Self::NotFound => "NOT_FOUND",
            Self::TooLate => "TOO_LATE",
            Self::SeatTaken => "SEAT_TAKEN",
            Self::PersonAlreadyBooked => "PERSON_ALREADY_BOOKED",
            Self::ConflictRetryable => "CONFLICT_RETRYABLE",
            Self::Forbidden => "FORBIDDEN",
            Self::CatalogConflict => "CATALOG_CONFLICT",
            Self::Internal => "INTERNAL",
        }
    }
}

/// Errors returned by allocation, availability and catalog operations.
#[derive(Error, Debug)]
pub enum AllocationError {
    /// Malformed or missing input.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// The seat does not exist, or is not offered on the requested date.
    #[error("Seat not found: {0}")]
    SeatNotFound(SeatId),

    /// The person is unknown to the identity collaborator.
    #[error("Person not found: {0}")]
    PersonNotFound(PersonId),

    /// No active reservation with this id belongs to the caller.
    #[error("Reservation not found: {0}")]
    ReservationNotFound(ReservationId),

    /// The booking date starts less than the lead time from now.
    #[error("Bookings for {date} must be made at least {lead_minutes} minutes in advance")]
    TooLate {
        /// Requested date
        date: NaiveDate,
        /// Required lead time in minutes
        lead_minutes: i64,
    },

    /// The seat is already reserved on the date.
    #[error("Seat {seat} is already taken on {date}")]
    SeatTaken {
        /// Seat
        seat: SeatId,
        /// Date
        date: NaiveDate,
    },

    /// The person already has a seat on the date.
    #[error("Person {person} already has a seat on {date}")]
    PersonAlreadyBooked {
        /// Person
        person: PersonId,
        /// Date
        date: NaiveDate,
    },

    /// Transient write conflict that survived internal retries.
    #[error("Write conflict, please retry: {0}")]
    ConflictRetryable(String),

    /// The caller is not an administrator.
    #[error("Administrator role required")]
    Forbidden,

    /// A seat with this number already exists for the date.
    #[error("Seat {seat_number} already exists for {date}")]
    DuplicateSeat {
        /// Seat number
        seat_number: u32,
        /// Date
        date: NaiveDate,
    },

    /// The seat still has an active reservation.
    #[error("Seat {0} has an active reservation and cannot be deleted")]
    SeatInUse(SeatId),

    /// Storage unavailable or contract violation.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AllocationError {
    /// The coarse kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::SeatNotFound(_) | Self::PersonNotFound(_) | Self::ReservationNotFound(_) => {
                ErrorKind::NotFound
            },
            Self::TooLate { .. } => ErrorKind::TooLate,
            Self::SeatTaken { .. } => ErrorKind::SeatTaken,
            Self::PersonAlreadyBooked { .. } => ErrorKind::PersonAlreadyBooked,
            Self::ConflictRetryable(_) => ErrorKind::ConflictRetryable,
            Self::Forbidden => ErrorKind::Forbidden,
            Self::DuplicateSeat { .. } | Self::SeatInUse(_) => ErrorKind::CatalogConflict,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether this is an ordinary business outcome rather than a failure.
    #[must_use]
    pub const fn is_expected(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }
}

impl From<LedgerError> for AllocationError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::SeatUnavailable { seat, .. } => Self::SeatNotFound(seat),
            LedgerError::PersonBooked { person, date } => {
                Self::PersonAlreadyBooked { person, date }
            },
            LedgerError::SeatTaken { seat, date } => Self::SeatTaken { seat, date },
            LedgerError::NotFound(id) => Self::ReservationNotFound(id),
            LedgerError::Conflict(detail) => Self::ConflictRetryable(detail),
            LedgerError::Storage(detail) => Self::Internal(detail),
        }
    }
}

impl From<DirectoryError> for AllocationError {
    fn from(error: DirectoryError) -> Self {
        match error {
            DirectoryError::DuplicateSeat { seat_number, date } => {
                Self::DuplicateSeat { seat_number, date }
            },
            DirectoryError::SeatNotFound(id) => Self::SeatNotFound(id),
            DirectoryError::SeatInUse(id) => Self::SeatInUse(id),
            DirectoryError::Storage(detail) => Self::Internal(detail),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ledger_outcomes_map_to_business_errors() {
        let date: NaiveDate = "2025-06-10".parse().unwrap();
        let seat = SeatId::new();

        let err = AllocationError::from(LedgerError::SeatTaken { seat, date });
        assert_eq!(err.kind(), ErrorKind::SeatTaken);
        assert!(err.is_expected());

        let err = AllocationError::from(LedgerError::Conflict("serialization".into()));
        assert_eq!(err.kind(), ErrorKind::ConflictRetryable);

        let err = AllocationError::from(LedgerError::SeatUnavailable { seat, date });
        assert!(matches!(err, AllocationError::SeatNotFound(id) if id == seat));
    }

    #[test]
    fn storage_failures_are_internal() {
        let err = AllocationError::from(LedgerError::Storage("connection reset".into()));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(!err.is_expected());

        let err = AllocationError::from(DirectoryError::Storage("pool timed out".into()));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn too_late_message_names_the_lead_time() {
        let err = AllocationError::TooLate {
            date: "2025-06-10".parse().unwrap(),
            lead_minutes: 60,
        };
        assert_eq!(
            err.to_string(),
            "Bookings for 2025-06-10 must be made at least 60 minutes in advance"
        );
    }

    #[test]
    fn kind_names_match_serialization() {
        let json = serde_json::to_string(&ErrorKind::PersonAlreadyBooked).unwrap();
        assert_eq!(json, format!("\"{}\"", ErrorKind::PersonAlreadyBooked.as_str()));
    }
}

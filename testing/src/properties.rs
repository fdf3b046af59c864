//! Property-based testing utilities using proptest.
//!
//! Operation sequences index into small pools of people, seats and dates so
//! that collisions, the interesting case, are frequent.

use proptest::prelude::*;
use seatbook_core::{NewSeat, Reservation, Seat};
use std::collections::HashSet;

/// One step against the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerOp {
    /// Person `person` books seat `seat` (an index into the seat pool).
    Book {
        /// Person index
        person: usize,
        /// Seat index
        seat: usize,
    },
    /// Person `person` cancels their `nth` reservation ever made, if any.
    Cancel {
        /// Person index
        person: usize,
        /// Reservation index among the person's reservations
        nth: usize,
    },
}

/// Strategy for a single [`LedgerOp`] over `people` persons and `seats` seats.
pub fn ledger_op(people: usize, seats: usize) -> impl Strategy<Value = LedgerOp> {
    prop_oneof![
        3 => (0..people, 0..seats).prop_map(|(person, seat)| LedgerOp::Book { person, seat }),
        1 => (0..people, 0..4usize).prop_map(|(person, nth)| LedgerOp::Cancel { person, nth }),
    ]
}

/// Strategy for sequences of up to `max_len` operations.
pub fn ledger_ops(
    people: usize,
    seats: usize,
    max_len: usize,
) -> impl Strategy<Value = Vec<LedgerOp>> {
    prop::collection::vec(ledger_op(people, seats), 1..=max_len)
}

/// A pool of seats: numbers `1..=per_day` on each of `days` consecutive dates
/// starting 2025-06-10.
#[must_use]
pub fn seat_pool(per_day: u32, days: u32) -> Vec<NewSeat> {
    let first = chrono::NaiveDate::from_ymd_opt(2025, 6, 10).unwrap_or_default();
    (0..days)
        .filter_map(|offset| first.checked_add_days(chrono::Days::new(u64::from(offset))))
        .flat_map(|date| (1..=per_day).map(move |number| NewSeat::new(number, date)))
        .collect()
}

/// Check the ledger invariants over a full reservation history.
///
/// - at most one active reservation per (seat, date)
/// - at most one active reservation per (person, date)
/// - every reservation's date equals its seat's offered date
///
/// # Errors
///
/// Returns a description of the first violation found.
pub fn check_invariants(reservations: &[Reservation], seats: &[Seat]) -> Result<(), String> {
    let mut seat_slots = HashSet::new();
    let mut person_slots = HashSet::new();

    for reservation in reservations {
        if let Some(seat) = seats.iter().find(|s| s.id == reservation.seat_id) {
            if seat.offered_date != reservation.date {
                return Err(format!(
                    "reservation {} dated {} but seat offered on {}",
                    reservation.id, reservation.date, seat.offered_date
                ));
            }
        }

        if !reservation.is_active() {
            continue;
        }
        if !seat_slots.insert((reservation.seat_id, reservation.date)) {
            return Err(format!(
                "seat {} double-booked on {}",
                reservation.seat_id, reservation.date
            ));
        }
        if !person_slots.insert((reservation.person_id, reservation.date)) {
            return Err(format!(
                "person {} holds two seats on {}",
                reservation.person_id, reservation.date
            ));
        }
    }

    Ok(())
}

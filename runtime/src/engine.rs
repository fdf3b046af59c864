//! Allocation engine: book, cancel, manual assignment and modify.
//!
//! Every write goes through a single ledger primitive
//! ([`ReservationLedger::insert_active`] or
//! [`ReservationLedger::cancel_active`]) that checks and writes in one step,
//! so concurrent requests for the same seat, date or person are resolved by
//! the store: the first valid request wins and the rest see `SeatTaken` or
//! `PersonAlreadyBooked`.
//!
//! Reads performed here before the write (seat lookup, person lookup) only
//! produce early, friendlier errors. They are never relied on for the
//! uniqueness invariants.
//!
//! [`ReservationLedger::insert_active`]: seatbook_core::ReservationLedger::insert_active
//! [`ReservationLedger::cancel_active`]: seatbook_core::ReservationLedger::cancel_active

use crate::metrics;
use crate::retry::{RetryPolicy, retry_transient};
use crate::stores::Stores;
use chrono::{DateTime, NaiveDate, Utc};
use seatbook_core::{
    AdminCapability, AllocationError, Clock, LedgerError, PersonId, Reservation, ReservationId,
    Seat, SeatId, start_of_day,
};
use std::sync::Arc;
use std::time::Instant;

/// Engine tuning.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minimum time between now and the start of a self-service booking date
    pub lead_time: chrono::Duration,
    /// Backoff for transient ledger conflicts
    pub retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lead_time: chrono::Duration::hours(1),
            retry: RetryPolicy::default(),
        }
    }
}

/// Decides whether reservation writes may proceed.
#[derive(Clone)]
pub struct AllocationEngine {
    stores: Stores,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl AllocationEngine {
    /// Creates a new `AllocationEngine`
    #[must_use]
    pub fn new(stores: Stores, clock: Arc<dyn Clock>, config: EngineConfig) -> Self {
        Self {
            stores,
            clock,
            config,
        }
    }

    /// Engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Book `seat` on `date` for `person`, using the injected clock for "now".
    ///
    /// # Errors
    ///
    /// See [`AllocationEngine::book_at`].
    pub async fn book(
        &self,
        person: PersonId,
        seat: SeatId,
        date: NaiveDate,
    ) -> Result<Reservation, AllocationError> {
        self.book_at(person, seat, date, self.clock.now()).await
    }

    /// Book `seat` on `date` for `person` as of `now`.
    ///
    /// Preconditions, in order: lead time, seat offered on `date`, person has
    /// no active reservation on `date`, seat has no active reservation on
    /// `date`. The last three are decided atomically by the ledger.
    ///
    /// # Errors
    ///
    /// - [`AllocationError::TooLate`] inside the lead-time window
    /// - [`AllocationError::SeatNotFound`] for a missing seat or one offered on another date
    /// - [`AllocationError::PersonAlreadyBooked`] / [`AllocationError::SeatTaken`]
    /// - [`AllocationError::ConflictRetryable`] when transient conflicts outlive retries
    /// - [`AllocationError::Internal`] on storage failure
    #[tracing::instrument(skip(self))]
    pub async fn book_at(
        &self,
        person: PersonId,
        seat: SeatId,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Reservation, AllocationError> {
        let started = Instant::now();
        let result = async {
            self.check_lead_time(date, now)?;
            let seat = self.offered_seat(seat, date).await?;
            self.insert(&seat, person, now).await
        }
        .await;

        metrics::record_allocation("book", &result, started.elapsed());
        log_outcome("book", &result);
        result
    }

    /// Cancel `reservation`, which must be `person`'s active reservation.
    ///
    /// # Errors
    ///
    /// - [`AllocationError::ReservationNotFound`] unless the reservation exists,
    ///   belongs to `person` and is active
    /// - [`AllocationError::ConflictRetryable`] / [`AllocationError::Internal`]
    #[tracing::instrument(skip(self))]
    pub async fn cancel(
        &self,
        person: PersonId,
        reservation: ReservationId,
    ) -> Result<Reservation, AllocationError> {
        let started = Instant::now();
        let now = self.clock.now();
        let result = retry_transient(
            &self.config.retry,
            || self.stores.ledger.cancel_active(reservation, person, now),
            LedgerError::is_transient,
        )
        .await
        .map_err(AllocationError::from);

        metrics::record_allocation("cancel", &result, started.elapsed());
        log_outcome("cancel", &result);
        result
    }

    /// Assign `seat` on `date` to `person` on an administrator's behalf.
    ///
    /// Same as [`AllocationEngine::book_at`] without the lead-time check, and
    /// the person must be known to the identity collaborator.
    ///
    /// # Errors
    ///
    /// - [`AllocationError::SeatNotFound`] / [`AllocationError::PersonNotFound`]
    /// - [`AllocationError::PersonAlreadyBooked`] / [`AllocationError::SeatTaken`]
    /// - [`AllocationError::ConflictRetryable`] / [`AllocationError::Internal`]
    #[tracing::instrument(skip(self, admin), fields(admin = %admin.admin()))]
    pub async fn manual_assign(
        &self,
        admin: &AdminCapability,
        person: PersonId,
        seat: SeatId,
        date: NaiveDate,
    ) -> Result<Reservation, AllocationError> {
        let started = Instant::now();
        let now = self.clock.now();
        let result = async {
            let seat = self.offered_seat(seat, date).await?;
            if self.stores.people.person(person).await?.is_none() {
                return Err(AllocationError::PersonNotFound(person));
            }
            self.insert(&seat, person, now).await
        }
        .await;

        metrics::record_allocation("manual_assign", &result, started.elapsed());
        log_outcome("manual_assign", &result);
        result
    }

    /// Move `person`'s active reservation to `new_seat` on the same date.
    ///
    /// Runs as a cancel followed by a book. Before cancelling, it verifies
    /// without writing that the reservation is the caller's active one, that
    /// `new_seat` is offered on the same date and that the lead time still
    /// holds. If the book step then loses a race, the original seat is
    /// re-booked when still free and the book error is returned.
    ///
    /// A restored booking is a new reservation with a new id; the id passed
    /// in stays cancelled. Callers find the restored one through
    /// [`ReservationQueries::my_reservations`](crate::ReservationQueries::my_reservations).
    ///
    /// Moving to the seat already held returns the reservation unchanged.
    ///
    /// # Errors
    ///
    /// - [`AllocationError::ReservationNotFound`] for a reservation that is not the caller's active one
    /// - [`AllocationError::SeatNotFound`] when `new_seat` is not offered on the same date
    /// - [`AllocationError::TooLate`] inside the lead-time window
    /// - any error of the book step
    #[tracing::instrument(skip(self))]
    pub async fn modify(
        &self,
        person: PersonId,
        reservation: ReservationId,
        new_seat: SeatId,
    ) -> Result<Reservation, AllocationError> {
        let started = Instant::now();
        let now = self.clock.now();
        let result = self.modify_at(person, reservation, new_seat, now).await;

        metrics::record_allocation("modify", &result, started.elapsed());
        log_outcome("modify", &result);
        result
    }

    async fn modify_at(
        &self,
        person: PersonId,
        reservation: ReservationId,
        new_seat: SeatId,
        now: DateTime<Utc>,
    ) -> Result<Reservation, AllocationError> {
        let current = self
            .stores
            .ledger
            .reservation(reservation)
            .await?
            .filter(|r| r.person_id == person && r.is_active())
            .ok_or(AllocationError::ReservationNotFound(reservation))?;

        let target = self.offered_seat(new_seat, current.date).await?;
        self.check_lead_time(current.date, now)?;

        if target.id == current.seat_id {
            return Ok(current);
        }

        self.stores
            .ledger
            .cancel_active(reservation, person, now)
            .await?;

        match self.insert(&target, person, now).await {
            Ok(moved) => Ok(moved),
            Err(err) => {
                self.restore(&current, now).await;
                Err(err)
            },
        }
    }

    /// Best-effort re-booking of the seat a failed modify gave up.
    async fn restore(&self, original: &Reservation, now: DateTime<Utc>) {
        let seat = match self.offered_seat(original.seat_id, original.date).await {
            Ok(seat) => seat,
            Err(err) => {
                tracing::warn!(error = %err, "Original seat no longer offered, not restored");
                return;
            },
        };

        match self.insert(&seat, original.person_id, now).await {
            Ok(restored) => {
                tracing::info!(
                    cancelled = %original.id,
                    restored = %restored.id,
                    "Original seat restored under a new reservation id after failed modify"
                );
            },
            Err(err) => {
                tracing::warn!(
                    cancelled = %original.id,
                    error = %err,
                    "Original seat could not be restored after failed modify"
                );
            },
        }
    }

    fn check_lead_time(&self, date: NaiveDate, now: DateTime<Utc>) -> Result<(), AllocationError> {
        if start_of_day(date) - now < self.config.lead_time {
            return Err(AllocationError::TooLate {
                date,
                lead_minutes: self.config.lead_time.num_minutes(),
            });
        }
        Ok(())
    }

    async fn offered_seat(&self, seat: SeatId, date: NaiveDate) -> Result<Seat, AllocationError> {
        self.stores
            .seats
            .seat(seat)
            .await?
            .filter(|s| s.is_offered_on(date))
            .ok_or(AllocationError::SeatNotFound(seat))
    }

    async fn insert(
        &self,
        seat: &Seat,
        person: PersonId,
        now: DateTime<Utc>,
    ) -> Result<Reservation, AllocationError> {
        retry_transient(
            &self.config.retry,
            || {
                self.stores
                    .ledger
                    .insert_active(Reservation::new_active(seat, person, now))
            },
            LedgerError::is_transient,
        )
        .await
        .map_err(AllocationError::from)
    }
}

fn log_outcome(operation: &'static str, result: &Result<Reservation, AllocationError>) {
    match result {
        Ok(reservation) => {
            tracing::info!(operation, reservation = %reservation.id, "Allocation succeeded");
        },
        Err(err) if err.is_expected() => {
            tracing::debug!(operation, error = %err, "Allocation refused");
        },
        Err(err) => {
            tracing::error!(operation, error = %err, "Allocation failed");
        },
    }
}

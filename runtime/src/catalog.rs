//! Administrator management of seat records.

use crate::metrics;
use chrono::NaiveDate;
use seatbook_core::{AdminCapability, AllocationError, NewSeat, Seat, SeatDirectory, SeatId, SeatUpdate};
use std::sync::Arc;

/// Seat catalog service.
#[derive(Clone)]
pub struct SeatCatalog {
    seats: Arc<dyn SeatDirectory>,
}

impl SeatCatalog {
    /// Creates a new `SeatCatalog`
    #[must_use]
    pub fn new(seats: Arc<dyn SeatDirectory>) -> Self {
        Self { seats }
    }

    /// Create a seat for one date.
    ///
    /// # Errors
    ///
    /// - [`AllocationError::Validation`] for seat number 0
    /// - [`AllocationError::DuplicateSeat`] when the number is taken on that date
    #[tracing::instrument(skip(self, admin), fields(admin = %admin.admin()))]
    pub async fn create_seat(
        &self,
        admin: &AdminCapability,
        seat: NewSeat,
    ) -> Result<Seat, AllocationError> {
        if seat.seat_number == 0 {
            return Err(AllocationError::Validation(
                "seat_number must be a positive integer".to_string(),
            ));
        }

        let created = self.seats.create_seat(seat).await?;
        metrics::record_catalog_change("created");
        tracing::info!(seat = %created.id, number = created.seat_number, "Seat created");
        Ok(created)
    }

    /// Edit a seat's location and amenities.
    ///
    /// # Errors
    ///
    /// - [`AllocationError::Validation`] for a blank location
    /// - [`AllocationError::SeatNotFound`] for an unknown id
    #[tracing::instrument(skip(self, admin), fields(admin = %admin.admin()))]
    pub async fn update_seat(
        &self,
        admin: &AdminCapability,
        id: SeatId,
        update: SeatUpdate,
    ) -> Result<Seat, AllocationError> {
        if update.location.as_deref().is_some_and(|l| l.trim().is_empty()) {
            return Err(AllocationError::Validation(
                "location must not be blank".to_string(),
            ));
        }

        let updated = self.seats.update_seat(id, update).await?;
        metrics::record_catalog_change("updated");
        tracing::info!(seat = %updated.id, "Seat updated");
        Ok(updated)
    }

    /// Delete a seat that no active reservation references.
    ///
    /// # Errors
    ///
    /// - [`AllocationError::SeatNotFound`] for an unknown id
    /// - [`AllocationError::SeatInUse`] while an active reservation holds it
    #[tracing::instrument(skip(self, admin), fields(admin = %admin.admin()))]
    pub async fn delete_seat(
        &self,
        admin: &AdminCapability,
        id: SeatId,
    ) -> Result<Seat, AllocationError> {
        let deleted = self.seats.delete_seat(id).await?;
        metrics::record_catalog_change("deleted");
        tracing::info!(seat = %deleted.id, number = deleted.seat_number, "Seat deleted");
        Ok(deleted)
    }

    /// All seats, or the seats of one date, ordered by (date, seat number).
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::Internal`] on storage failure.
    pub async fn list_seats(
        &self,
        _admin: &AdminCapability,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Seat>, AllocationError> {
        let seats = match date {
            Some(date) => self.seats.seats_on(date).await?,
            None => self.seats.all_seats().await?,
        };
        Ok(seats)
    }
}

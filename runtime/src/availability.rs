//! Day views of seats and their occupancy.
//!
//! Both queries are pure reads. Occupancy comes from one ledger snapshot of
//! the date's active reservations, so a seat is never reported both free and
//! taken within a single response.

use crate::stores::Stores;
use chrono::NaiveDate;
use seatbook_core::{
    AllocationError, Caller, Person, PersonId, Reservation, ReservationId, Seat, SeatId,
};
use serde::Serialize;
use std::collections::HashMap;

/// Who holds a seat, as shown to viewers allowed to see it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Occupant {
    /// Holding reservation
    pub reservation_id: ReservationId,
    /// Holder
    pub person_id: PersonId,
    /// Holder's name (administrators only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Holder's email (administrators only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A seat with its occupancy on its offered date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SeatView {
    /// The seat
    #[serde(flatten)]
    pub seat: Seat,
    /// Whether an active reservation holds the seat
    pub occupied: bool,
    /// Occupant, withheld unless the viewer may see it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupant: Option<Occupant>,
}

/// Availability query service.
#[derive(Clone)]
pub struct Availability {
    stores: Stores,
}

impl Availability {
    /// Creates a new `Availability`
    #[must_use]
    pub const fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Every seat offered on `date` with its occupancy.
    ///
    /// The occupant is shown when `viewer` is an administrator (with name and
    /// email) or is the occupant; otherwise it is withheld.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::Internal`] on storage failure.
    #[tracing::instrument(skip(self, viewer), fields(viewer = %viewer.person))]
    pub async fn list_seats_for_date(
        &self,
        date: NaiveDate,
        viewer: &Caller,
    ) -> Result<Vec<SeatView>, AllocationError> {
        let (seats, mut holders) = self.snapshot(date).await?;
        let people = if viewer.is_admin() {
            self.holders_by_id(&holders).await?
        } else {
            HashMap::new()
        };
        let mut views = Vec::with_capacity(seats.len());

        for seat in seats {
            let occupant = holders
                .remove(&seat.id)
                .map(|reservation| occupant_for(&reservation, viewer, &people));
            views.push(SeatView {
                occupied: occupant.is_some(),
                occupant: occupant.flatten(),
                seat,
            });
        }

        tracing::debug!(seats = views.len(), "Listed seats for date");
        Ok(views)
    }

    /// Seats offered on `date` with no active reservation.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::Internal`] on storage failure.
    #[tracing::instrument(skip(self))]
    pub async fn list_available_seats(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<SeatView>, AllocationError> {
        let (seats, holders) = self.snapshot(date).await?;

        Ok(seats
            .into_iter()
            .filter(|seat| !holders.contains_key(&seat.id))
            .map(|seat| SeatView {
                seat,
                occupied: false,
                occupant: None,
            })
            .collect())
    }

    async fn snapshot(
        &self,
        date: NaiveDate,
    ) -> Result<(Vec<Seat>, HashMap<SeatId, Reservation>), AllocationError> {
        let seats = self.stores.seats.seats_on(date).await?;
        let holders = self
            .stores
            .ledger
            .active_on(date)
            .await?
            .into_iter()
            .map(|reservation| (reservation.seat_id, reservation))
            .collect();
        Ok((seats, holders))
    }

    /// Every holder's directory record, in one lookup.
    async fn holders_by_id(
        &self,
        holders: &HashMap<SeatId, Reservation>,
    ) -> Result<HashMap<PersonId, Person>, AllocationError> {
        let ids: Vec<PersonId> = holders.values().map(|r| r.person_id).collect();
        Ok(self
            .stores
            .people
            .people(ids)
            .await?
            .into_iter()
            .map(|person| (person.id, person))
            .collect())
    }
}

/// `None` when the occupant is withheld from `viewer`.
fn occupant_for(
    reservation: &Reservation,
    viewer: &Caller,
    people: &HashMap<PersonId, Person>,
) -> Option<Occupant> {
    let mut occupant = Occupant {
        reservation_id: reservation.id,
        person_id: reservation.person_id,
        display_name: None,
        email: None,
    };

    if viewer.is_admin() {
        if let Some(person) = people.get(&reservation.person_id) {
            occupant.display_name = Some(person.display_name.clone());
            occupant.email = Some(person.email.clone());
        }
        Some(occupant)
    } else if viewer.person == reservation.person_id {
        Some(occupant)
    } else {
        None
    }
}

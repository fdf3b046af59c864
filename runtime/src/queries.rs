//! Reservation listings for members and administrators.

use crate::stores::Stores;
use chrono::NaiveDate;
use seatbook_core::{
    AdminCapability, AllocationError, Person, PersonId, Reservation, Seat, SeatId,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Seat fields shown next to a reservation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SeatSummary {
    /// Seat number
    pub seat_number: u32,
    /// Location
    pub location: String,
}

impl From<&Seat> for SeatSummary {
    fn from(seat: &Seat) -> Self {
        Self {
            seat_number: seat.seat_number,
            location: seat.location.clone(),
        }
    }
}

/// Person fields shown to administrators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PersonSummary {
    /// Display name
    pub display_name: String,
    /// Email
    pub email: String,
}

/// A reservation joined with its seat and, for administrators, its holder.
///
/// `seat` is `None` once the seat record has been deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReservationDetail {
    /// The reservation
    #[serde(flatten)]
    pub reservation: Reservation,
    /// Seat, if it still exists
    pub seat: Option<SeatSummary>,
    /// Holder (administrator views only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person: Option<PersonSummary>,
}

/// A person with their reservation history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PersonReservations {
    /// The person
    pub person: Person,
    /// Reservations, newest date first
    pub reservations: Vec<ReservationDetail>,
}

/// Read-only reservation listings.
#[derive(Clone)]
pub struct ReservationQueries {
    stores: Stores,
}

impl ReservationQueries {
    /// Creates a new `ReservationQueries`
    #[must_use]
    pub const fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// All of `person`'s reservations, newest date first.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::Internal`] on storage failure.
    #[tracing::instrument(skip(self))]
    pub async fn my_reservations(
        &self,
        person: PersonId,
    ) -> Result<Vec<ReservationDetail>, AllocationError> {
        let reservations = self.stores.ledger.for_person(person).await?;
        self.detail(reservations, false).await
    }

    /// Every reservation (any status) on `date`, with seat and holder.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::Internal`] on storage failure.
    #[tracing::instrument(skip(self, _admin))]
    pub async fn reservations_by_date(
        &self,
        _admin: &AdminCapability,
        date: NaiveDate,
    ) -> Result<Vec<ReservationDetail>, AllocationError> {
        let reservations = self.stores.ledger.all_on(date).await?;
        self.detail(reservations, true).await
    }

    /// `person` and their full reservation history.
    ///
    /// # Errors
    ///
    /// - [`AllocationError::PersonNotFound`] for an unknown person
    /// - [`AllocationError::Internal`] on storage failure
    #[tracing::instrument(skip(self, _admin))]
    pub async fn reservations_by_person(
        &self,
        _admin: &AdminCapability,
        person: PersonId,
    ) -> Result<PersonReservations, AllocationError> {
        let record = self
            .stores
            .people
            .person(person)
            .await?
            .ok_or(AllocationError::PersonNotFound(person))?;

        let reservations = self.stores.ledger.for_person(person).await?;
        let reservations = self.detail(reservations, false).await?;

        Ok(PersonReservations {
            person: record,
            reservations,
        })
    }

    async fn detail(
        &self,
        reservations: Vec<Reservation>,
        with_person: bool,
    ) -> Result<Vec<ReservationDetail>, AllocationError> {
        let people: HashMap<PersonId, PersonSummary> = if with_person {
            let ids: HashSet<PersonId> = reservations.iter().map(|r| r.person_id).collect();
            self.stores
                .people
                .people(ids.into_iter().collect())
                .await?
                .into_iter()
                .map(|p| {
                    let summary = PersonSummary {
                        display_name: p.display_name,
                        email: p.email,
                    };
                    (p.id, summary)
                })
                .collect()
        } else {
            HashMap::new()
        };
        let mut seats: HashMap<SeatId, Option<SeatSummary>> = HashMap::new();
        let mut details = Vec::with_capacity(reservations.len());

        for reservation in reservations {
            if !seats.contains_key(&reservation.seat_id) {
                let seat = self.stores.seats.seat(reservation.seat_id).await?;
                seats.insert(reservation.seat_id, seat.as_ref().map(SeatSummary::from));
            }

            details.push(ReservationDetail {
                seat: seats.get(&reservation.seat_id).cloned().flatten(),
                person: people.get(&reservation.person_id).cloned(),
                reservation,
            });
        }

        Ok(details)
    }
}

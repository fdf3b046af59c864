//! In-memory seat directory, person directory and reservation ledger.
//!
//! One `RwLock` guards every table. Each ledger primitive runs entirely under
//! a single write guard, which makes the conditional insert, the conditional
//! cancel and seat deletion indivisible with respect to each other.

use chrono::{DateTime, NaiveDate, Utc};
use seatbook_core::{
    BoxFuture, DirectoryError, LedgerError, NewSeat, Person, PersonDirectory, PersonId,
    Reservation, ReservationId, ReservationLedger, Role, Seat, SeatDirectory, SeatId, SeatUpdate,
};
use std::collections::HashMap;
use std::future::ready;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Tables {
    seats: HashMap<SeatId, Seat>,
    people: HashMap<PersonId, Person>,
    /// Insertion order
    reservations: Vec<Reservation>,
    positions: HashMap<ReservationId, usize>,
    seat_slots: HashMap<(SeatId, NaiveDate), ReservationId>,
    person_slots: HashMap<(PersonId, NaiveDate), ReservationId>,
}

/// In-memory store for fast, deterministic tests.
///
/// Cloning shares the underlying tables.
///
/// # Example
///
/// ```
/// use seatbook_testing::InMemoryStore;
/// use seatbook_core::{NewSeat, SeatDirectory};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryStore::new();
/// let seat = store
///     .create_seat(NewSeat::new(1, "2025-06-10".parse()?))
///     .await?;
/// assert_eq!(seat.location, "Main Floor");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    injected_conflicts: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_available<E>(&self, storage: impl FnOnce(String) -> E) -> Result<(), E> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(storage("store unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    /// Register a person with the identity collaborator's data.
    pub fn add_person(&self, person: Person) {
        self.write().people.insert(person.id, person);
    }

    /// Register a member named `name` and return their id.
    pub fn add_member(&self, name: &str) -> PersonId {
        self.add_named(name, Role::Member)
    }

    /// Register an administrator named `name` and return their id.
    pub fn add_admin(&self, name: &str) -> PersonId {
        self.add_named(name, Role::Administrator)
    }

    fn add_named(&self, name: &str, role: Role) -> PersonId {
        let id = PersonId::new();
        self.add_person(Person {
            id,
            role,
            display_name: name.to_string(),
            email: format!("{}@example.com", name.to_ascii_lowercase()),
        });
        id
    }

    /// Make the next `count` ledger writes fail with a transient conflict.
    pub fn inject_conflicts(&self, count: usize) {
        self.injected_conflicts.store(count, Ordering::SeqCst);
    }

    /// Make every operation fail with a storage error until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Every reservation ever written, in insertion order.
    #[must_use]
    pub fn reservations(&self) -> Vec<Reservation> {
        self.read().reservations.clone()
    }

    fn take_injected_conflict(&self) -> bool {
        self.injected_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn insert_now(&self, reservation: Reservation) -> Result<Reservation, LedgerError> {
        self.check_available(LedgerError::Storage)?;
        if self.take_injected_conflict() {
            return Err(LedgerError::Conflict("injected conflict".to_string()));
        }
        if !reservation.is_active() {
            return Err(LedgerError::Storage(
                "only active reservations can be inserted".to_string(),
            ));
        }

        let mut tables = self.write();
        let date = reservation.date;

        match tables.seats.get(&reservation.seat_id) {
            Some(seat) if seat.is_offered_on(date) => {},
            _ => {
                return Err(LedgerError::SeatUnavailable {
                    seat: reservation.seat_id,
                    date,
                });
            },
        }
        if tables
            .person_slots
            .contains_key(&(reservation.person_id, date))
        {
            return Err(LedgerError::PersonBooked {
                person: reservation.person_id,
                date,
            });
        }
        if tables.seat_slots.contains_key(&(reservation.seat_id, date)) {
            return Err(LedgerError::SeatTaken {
                seat: reservation.seat_id,
                date,
            });
        }
        if tables.positions.contains_key(&reservation.id) {
            return Err(LedgerError::Storage(format!(
                "duplicate reservation id {}",
                reservation.id
            )));
        }

        let position = tables.reservations.len();
        tables.positions.insert(reservation.id, position);
        tables
            .seat_slots
            .insert((reservation.seat_id, date), reservation.id);
        tables
            .person_slots
            .insert((reservation.person_id, date), reservation.id);
        tables.reservations.push(reservation.clone());

        Ok(reservation)
    }

    fn cancel_now(
        &self,
        id: ReservationId,
        owner: PersonId,
        at: DateTime<Utc>,
    ) -> Result<Reservation, LedgerError> {
        self.check_available(LedgerError::Storage)?;
        if self.take_injected_conflict() {
            return Err(LedgerError::Conflict("injected conflict".to_string()));
        }

        let mut tables = self.write();
        let position = *tables.positions.get(&id).ok_or(LedgerError::NotFound(id))?;
        let reservation = &mut tables.reservations[position];

        if reservation.person_id != owner || !reservation.cancel(at) {
            return Err(LedgerError::NotFound(id));
        }

        let cancelled = reservation.clone();
        tables.seat_slots.remove(&(cancelled.seat_id, cancelled.date));
        tables
            .person_slots
            .remove(&(cancelled.person_id, cancelled.date));
        Ok(cancelled)
    }

    fn select(
        &self,
        keep: impl Fn(&Reservation) -> bool,
    ) -> Result<Vec<Reservation>, LedgerError> {
        self.check_available(LedgerError::Storage)?;
        Ok(self
            .read()
            .reservations
            .iter()
            .filter(|r| keep(r))
            .cloned()
            .collect())
    }

    fn sorted_seats(
        &self,
        keep: impl Fn(&Seat) -> bool,
    ) -> Result<Vec<Seat>, DirectoryError> {
        self.check_available(DirectoryError::Storage)?;
        let mut seats: Vec<Seat> = self
            .read()
            .seats
            .values()
            .filter(|s| keep(s))
            .cloned()
            .collect();
        seats.sort_by_key(|s| (s.offered_date, s.seat_number));
        Ok(seats)
    }

    fn create_now(&self, seat: NewSeat) -> Result<Seat, DirectoryError> {
        self.check_available(DirectoryError::Storage)?;
        let mut tables = self.write();

        let duplicate = tables
            .seats
            .values()
            .any(|s| s.seat_number == seat.seat_number && s.offered_date == seat.offered_date);
        if duplicate {
            return Err(DirectoryError::DuplicateSeat {
                seat_number: seat.seat_number,
                date: seat.offered_date,
            });
        }

        let seat = seat.into_seat(SeatId::new());
        tables.seats.insert(seat.id, seat.clone());
        Ok(seat)
    }

    fn update_now(&self, id: SeatId, update: &SeatUpdate) -> Result<Seat, DirectoryError> {
        self.check_available(DirectoryError::Storage)?;
        let mut tables = self.write();
        let seat = tables
            .seats
            .get_mut(&id)
            .ok_or(DirectoryError::SeatNotFound(id))?;
        seat.apply(update);
        Ok(seat.clone())
    }

    fn delete_now(&self, id: SeatId) -> Result<Seat, DirectoryError> {
        self.check_available(DirectoryError::Storage)?;
        let mut tables = self.write();
        let date = tables
            .seats
            .get(&id)
            .map(|s| s.offered_date)
            .ok_or(DirectoryError::SeatNotFound(id))?;

        if tables.seat_slots.contains_key(&(id, date)) {
            return Err(DirectoryError::SeatInUse(id));
        }

        tables.seats.remove(&id).ok_or(DirectoryError::SeatNotFound(id))
    }
}

impl SeatDirectory for InMemoryStore {
    fn seat(&self, id: SeatId) -> BoxFuture<'_, Result<Option<Seat>, DirectoryError>> {
        let result = self
            .check_available(DirectoryError::Storage)
            .map(|()| self.read().seats.get(&id).cloned());
        Box::pin(ready(result))
    }

    fn seat_by_number(
        &self,
        seat_number: u32,
        date: NaiveDate,
    ) -> BoxFuture<'_, Result<Option<Seat>, DirectoryError>> {
        let result = self
            .sorted_seats(|s| s.seat_number == seat_number && s.offered_date == date)
            .map(|seats| seats.into_iter().next());
        Box::pin(ready(result))
    }

    fn seats_on(&self, date: NaiveDate) -> BoxFuture<'_, Result<Vec<Seat>, DirectoryError>> {
        Box::pin(ready(self.sorted_seats(|s| s.offered_date == date)))
    }

    fn all_seats(&self) -> BoxFuture<'_, Result<Vec<Seat>, DirectoryError>> {
        Box::pin(ready(self.sorted_seats(|_| true)))
    }

    fn create_seat(&self, seat: NewSeat) -> BoxFuture<'_, Result<Seat, DirectoryError>> {
        Box::pin(ready(self.create_now(seat)))
    }

    fn update_seat(
        &self,
        id: SeatId,
        update: SeatUpdate,
    ) -> BoxFuture<'_, Result<Seat, DirectoryError>> {
        Box::pin(ready(self.update_now(id, &update)))
    }

    fn delete_seat(&self, id: SeatId) -> BoxFuture<'_, Result<Seat, DirectoryError>> {
        Box::pin(ready(self.delete_now(id)))
    }
}

impl PersonDirectory for InMemoryStore {
    fn person(&self, id: PersonId) -> BoxFuture<'_, Result<Option<Person>, DirectoryError>> {
        let result = self
            .check_available(DirectoryError::Storage)
            .map(|()| self.read().people.get(&id).cloned());
        Box::pin(ready(result))
    }

    fn people(&self, ids: Vec<PersonId>) -> BoxFuture<'_, Result<Vec<Person>, DirectoryError>> {
        let result = self.check_available(DirectoryError::Storage).map(|()| {
            let tables = self.read();
            ids.iter()
                .filter_map(|id| tables.people.get(id).cloned())
                .collect()
        });
        Box::pin(ready(result))
    }

    fn upsert_person(&self, person: Person) -> BoxFuture<'_, Result<Person, DirectoryError>> {
        let result = self.check_available(DirectoryError::Storage).map(|()| {
            self.add_person(person.clone());
            person
        });
        Box::pin(ready(result))
    }
}

impl ReservationLedger for InMemoryStore {
    fn insert_active(
        &self,
        reservation: Reservation,
    ) -> BoxFuture<'_, Result<Reservation, LedgerError>> {
        Box::pin(ready(self.insert_now(reservation)))
    }

    fn cancel_active(
        &self,
        id: ReservationId,
        owner: PersonId,
        at: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Reservation, LedgerError>> {
        Box::pin(ready(self.cancel_now(id, owner, at)))
    }

    fn reservation(
        &self,
        id: ReservationId,
    ) -> BoxFuture<'_, Result<Option<Reservation>, LedgerError>> {
        let result = self.check_available(LedgerError::Storage).map(|()| {
            let tables = self.read();
            tables
                .positions
                .get(&id)
                .and_then(|&position| tables.reservations.get(position))
                .cloned()
        });
        Box::pin(ready(result))
    }

    fn active_on(&self, date: NaiveDate) -> BoxFuture<'_, Result<Vec<Reservation>, LedgerError>> {
        Box::pin(ready(self.select(|r| r.is_active() && r.date == date)))
    }

    fn all_on(&self, date: NaiveDate) -> BoxFuture<'_, Result<Vec<Reservation>, LedgerError>> {
        let result = self.select(|r| r.date == date).map(|mut found| {
            found.sort_by_key(|r| r.created_at);
            found
        });
        Box::pin(ready(result))
    }

    fn for_person(
        &self,
        person: PersonId,
    ) -> BoxFuture<'_, Result<Vec<Reservation>, LedgerError>> {
        let result = self.select(|r| r.person_id == person).map(|mut found| {
            found.reverse();
            found.sort_by(|a, b| b.date.cmp(&a.date));
            found
        });
        Box::pin(ready(result))
    }

    fn active_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BoxFuture<'_, Result<Vec<Reservation>, LedgerError>> {
        Box::pin(ready(
            self.select(|r| r.is_active() && start <= r.date && r.date <= end),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        "2025-06-10".parse().unwrap()
    }

    #[tokio::test]
    async fn insert_reports_person_before_seat() {
        let store = InMemoryStore::new();
        let ada = store.add_member("Ada");
        let bob = store.add_member("Bob");
        let one = store.create_seat(NewSeat::new(1, day())).await.unwrap();
        let two = store.create_seat(NewSeat::new(2, day())).await.unwrap();

        store
            .insert_active(Reservation::new_active(&one, ada, Utc::now()))
            .await
            .unwrap();
        store
            .insert_active(Reservation::new_active(&two, bob, Utc::now()))
            .await
            .unwrap();

        // Ada on seat two: both slots are taken, the person check wins.
        let err = store
            .insert_active(Reservation::new_active(&two, ada, Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::PersonBooked { .. }));
    }

    #[tokio::test]
    async fn insert_rejects_a_date_the_seat_is_not_offered_on() {
        let store = InMemoryStore::new();
        let seat = store.create_seat(NewSeat::new(1, day())).await.unwrap();
        let mut reservation = Reservation::new_active(&seat, PersonId::new(), Utc::now());
        reservation.date = day().succ_opt().unwrap();

        let err = store.insert_active(reservation).await.unwrap_err();
        assert!(matches!(err, LedgerError::SeatUnavailable { .. }));
        assert!(store.reservations().is_empty());
    }

    #[tokio::test]
    async fn cancel_frees_both_slots() {
        let store = InMemoryStore::new();
        let ada = store.add_member("Ada");
        let seat = store.create_seat(NewSeat::new(1, day())).await.unwrap();
        let first = store
            .insert_active(Reservation::new_active(&seat, ada, Utc::now()))
            .await
            .unwrap();

        store.cancel_active(first.id, ada, Utc::now()).await.unwrap();

        assert!(
            store
                .insert_active(Reservation::new_active(&seat, ada, Utc::now()))
                .await
                .is_ok()
        );
        assert_eq!(store.reservations().len(), 2);
    }

    #[tokio::test]
    async fn reservation_lookup_follows_the_index() {
        let store = InMemoryStore::new();
        let ada = store.add_member("Ada");
        let seat = store.create_seat(NewSeat::new(1, day())).await.unwrap();
        let first = store
            .insert_active(Reservation::new_active(&seat, ada, Utc::now()))
            .await
            .unwrap();
        store.cancel_active(first.id, ada, Utc::now()).await.unwrap();
        let second = store
            .insert_active(Reservation::new_active(&seat, ada, Utc::now()))
            .await
            .unwrap();

        let found = store.reservation(first.id).await.unwrap().unwrap();
        assert!(!found.is_active());
        let found = store.reservation(second.id).await.unwrap().unwrap();
        assert_eq!(found, second);
        assert!(store.reservation(ReservationId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn people_are_upserted_and_batch_loaded() {
        let store = InMemoryStore::new();
        let ada = store.add_member("Ada");
        let grace = PersonId::new();

        store
            .upsert_person(Person {
                id: grace,
                role: Role::Member,
                display_name: "Grace".to_string(),
                email: "grace@example.com".to_string(),
            })
            .await
            .unwrap();
        let promoted = store
            .upsert_person(Person {
                id: grace,
                role: Role::Administrator,
                display_name: "Grace Hopper".to_string(),
                email: "grace@example.com".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(store.person(grace).await.unwrap().unwrap(), promoted);

        let mut found: Vec<PersonId> = store
            .people(vec![ada, grace, PersonId::new()])
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        found.sort();
        let mut expected = vec![ada, grace];
        expected.sort();
        assert_eq!(found, expected);
    }

    #[tokio::test]
    async fn injected_conflicts_are_consumed() {
        let store = InMemoryStore::new();
        let seat = store.create_seat(NewSeat::new(1, day())).await.unwrap();
        store.inject_conflicts(1);

        let reservation = Reservation::new_active(&seat, PersonId::new(), Utc::now());
        let err = store.insert_active(reservation.clone()).await.unwrap_err();
        assert!(err.is_transient());
        assert!(store.insert_active(reservation).await.is_ok());
    }

    #[tokio::test]
    async fn unavailable_store_reports_storage_errors() {
        let store = InMemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(
            store.all_seats().await,
            Err(DirectoryError::Storage(_))
        ));
        store.set_unavailable(false);
        assert!(store.all_seats().await.unwrap().is_empty());
    }
}

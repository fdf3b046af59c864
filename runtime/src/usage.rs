//! Seat usage report over a date range.

use crate::stores::Stores;
use chrono::NaiveDate;
use seatbook_core::{AdminCapability, AllocationError, PersonId, SeatId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Report parameters.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct UsageQuery {
    /// First date, inclusive
    pub start: NaiveDate,
    /// Last date, inclusive
    pub end: NaiveDate,
    /// Only seats at this location; `"all"` or absent means every location
    #[serde(default)]
    pub location: Option<String>,
}

impl UsageQuery {
    fn location_filter(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.eq_ignore_ascii_case("all"))
    }
}

/// Usage of one physical seat (seat number and location) across the range.
///
/// Reservations whose seat record was deleted are grouped into a single row
/// with no number and no location.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SeatUsage {
    /// Seat number, `None` for deleted seats
    pub seat_number: Option<u32>,
    /// Location, `None` for deleted seats
    pub location: Option<String>,
    /// Active reservations in range
    pub total_reservations: u64,
    /// Distinct holders in range
    pub unique_people: u64,
}

/// Usage aggregator.
#[derive(Clone)]
pub struct UsageReports {
    stores: Stores,
}

impl UsageReports {
    /// Creates a new `UsageReports`
    #[must_use]
    pub const fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Per-seat totals of active reservations in `[start, end]`.
    ///
    /// Ordered by seat number then location; deleted seats sort last. A
    /// location filter never matches a deleted seat.
    ///
    /// # Errors
    ///
    /// - [`AllocationError::Validation`] when `start > end`
    /// - [`AllocationError::Internal`] on storage failure
    #[tracing::instrument(skip(self, _admin))]
    pub async fn seat_usage(
        &self,
        _admin: &AdminCapability,
        query: &UsageQuery,
    ) -> Result<Vec<SeatUsage>, AllocationError> {
        if query.start > query.end {
            return Err(AllocationError::Validation(format!(
                "start {} is after end {}",
                query.start, query.end
            )));
        }

        let active = self
            .stores
            .ledger
            .active_between(query.start, query.end)
            .await?;

        let filter = query.location_filter();
        let mut seats: HashMap<SeatId, Option<(u32, String)>> = HashMap::new();
        let mut groups: BTreeMap<(bool, Option<u32>, Option<String>), (u64, HashSet<PersonId>)> =
            BTreeMap::new();

        for reservation in active {
            let seat = match seats.get(&reservation.seat_id) {
                Some(seat) => seat.clone(),
                None => {
                    let seat = self
                        .stores
                        .seats
                        .seat(reservation.seat_id)
                        .await?
                        .map(|s| (s.seat_number, s.location));
                    seats.insert(reservation.seat_id, seat.clone());
                    seat
                },
            };

            if let Some(location) = filter {
                if seat.as_ref().is_none_or(|(_, l)| l != location) {
                    continue;
                }
            }

            let key = match seat {
                Some((number, location)) => (false, Some(number), Some(location)),
                None => (true, None, None),
            };
            let (total, people) = groups.entry(key).or_default();
            *total += 1;
            people.insert(reservation.person_id);
        }

        let report: Vec<SeatUsage> = groups
            .into_iter()
            .map(|((_, seat_number, location), (total, people))| SeatUsage {
                seat_number,
                location,
                total_reservations: total,
                unique_people: people.len() as u64,
            })
            .collect();

        tracing::debug!(rows = report.len(), "Seat usage report built");
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use seatbook_core::{Caller, NewSeat, Reservation, ReservationLedger, Seat, SeatDirectory};
    use seatbook_testing::InMemoryStore;
    use std::sync::Arc;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn query(start: &str, end: &str, location: Option<&str>) -> UsageQuery {
        UsageQuery {
            start: date(start),
            end: date(end),
            location: location.map(str::to_string),
        }
    }

    async fn book(store: &InMemoryStore, seat: &Seat, person: PersonId) -> Reservation {
        store
            .insert_active(Reservation::new_active(seat, person, chrono::Utc::now()))
            .await
            .unwrap()
    }

    async fn fixture() -> (Arc<InMemoryStore>, UsageReports, AdminCapability) {
        let store = Arc::new(InMemoryStore::new());
        let ada = store.add_member("Ada");
        let bob = store.add_member("Bob");

        // Seat 7 offered on three days, seat 3 in the annex on one.
        let seven_mon = store.create_seat(NewSeat::new(7, date("2025-06-09"))).await.unwrap();
        let seven_tue = store.create_seat(NewSeat::new(7, date("2025-06-10"))).await.unwrap();
        let seven_wed = store.create_seat(NewSeat::new(7, date("2025-06-11"))).await.unwrap();
        let annex = store
            .create_seat(NewSeat::new(3, date("2025-06-10")).at("Annex"))
            .await
            .unwrap();

        book(&store, &seven_mon, ada).await;
        book(&store, &seven_tue, bob).await;
        book(&store, &seven_wed, ada).await;
        let cancelled = book(&store, &annex, ada).await;
        store.cancel_active(cancelled.id, ada, chrono::Utc::now()).await.unwrap();
        book(&store, &annex, bob).await;

        let admin = Caller::administrator(store.add_admin("Grace"))
            .admin_capability()
            .unwrap();
        let reports = UsageReports::new(Stores::shared(Arc::clone(&store)));
        (store, reports, admin)
    }

    #[tokio::test]
    async fn counts_active_reservations_and_unique_people() {
        let (_store, reports, admin) = fixture().await;

        let rows = reports
            .seat_usage(&admin, &query("2025-06-09", "2025-06-11", None))
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].seat_number, Some(3));
        assert_eq!((rows[0].total_reservations, rows[0].unique_people), (1, 1));
        assert_eq!(rows[1].seat_number, Some(7));
        assert_eq!((rows[1].total_reservations, rows[1].unique_people), (3, 2));

        let rows = reports
            .seat_usage(&admin, &query("2025-06-10", "2025-06-10", None))
            .await
            .unwrap();
        assert!(rows.iter().all(|r| r.total_reservations == 1));
    }

    #[tokio::test]
    async fn location_filter_and_all() {
        let (_store, reports, admin) = fixture().await;

        let annex = reports
            .seat_usage(&admin, &query("2025-06-01", "2025-06-30", Some("Annex")))
            .await
            .unwrap();
        assert_eq!(annex.len(), 1);
        assert_eq!(annex[0].location.as_deref(), Some("Annex"));

        let all = reports
            .seat_usage(&admin, &query("2025-06-01", "2025-06-30", Some("all")))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn inverted_range_is_invalid() {
        let (_store, reports, admin) = fixture().await;

        let err = reports
            .seat_usage(&admin, &query("2025-06-10", "2025-06-09", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AllocationError::Validation(_)));
    }
}

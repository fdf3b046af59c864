//! Reservation ledger.

use crate::{PostgresStore, ledger_error, roll_back};
use chrono::{DateTime, NaiveDate, Utc};
use seatbook_core::{
    BoxFuture, LedgerError, PersonId, Reservation, ReservationId, ReservationLedger,
    ReservationStatus, SeatId,
};
use sqlx::Row;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;

const RESERVATION_COLUMNS: &str =
    "id, seat_id, person_id, reserved_date, status, created_at, cancelled_at";

fn row_to_reservation(row: &PgRow) -> Result<Reservation, sqlx::Error> {
    let status: String = row.try_get("status")?;
    Ok(Reservation {
        id: ReservationId::from_uuid(row.try_get("id")?),
        seat_id: SeatId::from_uuid(row.try_get("seat_id")?),
        person_id: PersonId::from_uuid(row.try_get("person_id")?),
        date: row.try_get("reserved_date")?,
        status: status
            .parse::<ReservationStatus>()
            .map_err(|e| sqlx::Error::Decode(e.into()))?,
        created_at: row.try_get("created_at")?,
        cancelled_at: row.try_get("cancelled_at")?,
    })
}

impl PostgresStore {
    async fn fetch_reservations(
        &self,
        query: Query<'_, sqlx::Postgres, PgArguments>,
    ) -> Result<Vec<Reservation>, LedgerError> {
        query
            .fetch_all(self.pool())
            .await
            .and_then(|rows| rows.iter().map(row_to_reservation).collect())
            .map_err(ledger_error)
    }

    #[tracing::instrument(skip(self, reservation), fields(seat_id = %reservation.seat_id, date = %reservation.date))]
    async fn insert_if_free(&self, reservation: Reservation) -> Result<Reservation, LedgerError> {
        let mut tx = self.pool().begin().await.map_err(ledger_error)?;

        // Held until commit so the seat cannot be deleted underneath the insert.
        let offered: Option<(NaiveDate,)> =
            sqlx::query_as("SELECT offered_date FROM seats WHERE id = $1 FOR SHARE")
                .bind(reservation.seat_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(ledger_error)?;

        if offered.map(|(date,)| date) != Some(reservation.date) {
            roll_back(tx).await;
            return Err(LedgerError::SeatUnavailable {
                seat: reservation.seat_id,
                date: reservation.date,
            });
        }

        let inserted = sqlx::query(
            r"
            INSERT INTO reservations
                (id, seat_id, person_id, reserved_date, status, created_at, cancelled_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(reservation.id.as_uuid())
        .bind(reservation.seat_id.as_uuid())
        .bind(reservation.person_id.as_uuid())
        .bind(reservation.date)
        .bind(reservation.status.as_str())
        .bind(reservation.created_at)
        .bind(reservation.cancelled_at)
        .execute(&mut *tx)
        .await
        .map_err(ledger_error)?
        .rows_affected();

        if inserted == 1 {
            tx.commit().await.map_err(ledger_error)?;
            return Ok(reservation);
        }

        let (person_booked, seat_taken): (bool, bool) = sqlx::query_as(
            r"
            SELECT
                EXISTS(SELECT 1 FROM reservations
                       WHERE person_id = $1 AND reserved_date = $3 AND status = 'active'),
                EXISTS(SELECT 1 FROM reservations
                       WHERE seat_id = $2 AND reserved_date = $3 AND status = 'active')
            ",
        )
        .bind(reservation.person_id.as_uuid())
        .bind(reservation.seat_id.as_uuid())
        .bind(reservation.date)
        .fetch_one(&mut *tx)
        .await
        .map_err(ledger_error)?;
        roll_back(tx).await;

        if person_booked {
            Err(LedgerError::PersonBooked {
                person: reservation.person_id,
                date: reservation.date,
            })
        } else if seat_taken {
            Err(LedgerError::SeatTaken {
                seat: reservation.seat_id,
                date: reservation.date,
            })
        } else {
            // The conflicting row was cancelled between the insert and the check.
            Err(LedgerError::Conflict(
                "conflicting reservation vanished before classification".to_string(),
            ))
        }
    }
}

impl ReservationLedger for PostgresStore {
    fn insert_active(
        &self,
        reservation: Reservation,
    ) -> BoxFuture<'_, Result<Reservation, LedgerError>> {
        Box::pin(self.insert_if_free(reservation))
    }

    fn cancel_active(
        &self,
        id: ReservationId,
        owner: PersonId,
        at: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Reservation, LedgerError>> {
        Box::pin(async move {
            let sql = format!(
                r"
                UPDATE reservations
                SET status = 'cancelled', cancelled_at = $3
                WHERE id = $1 AND person_id = $2 AND status = 'active'
                RETURNING {RESERVATION_COLUMNS}
                "
            );
            sqlx::query(&sql)
                .bind(*id.as_uuid())
                .bind(*owner.as_uuid())
                .bind(at)
                .fetch_optional(self.pool())
                .await
                .and_then(|row| row.as_ref().map(row_to_reservation).transpose())
                .map_err(ledger_error)?
                .ok_or(LedgerError::NotFound(id))
        })
    }

    fn reservation(
        &self,
        id: ReservationId,
    ) -> BoxFuture<'_, Result<Option<Reservation>, LedgerError>> {
        Box::pin(async move {
            let sql = format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1");
            sqlx::query(&sql)
                .bind(*id.as_uuid())
                .fetch_optional(self.pool())
                .await
                .and_then(|row| row.as_ref().map(row_to_reservation).transpose())
                .map_err(ledger_error)
        })
    }

    fn active_on(&self, date: NaiveDate) -> BoxFuture<'_, Result<Vec<Reservation>, LedgerError>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT {RESERVATION_COLUMNS} FROM reservations
                 WHERE reserved_date = $1 AND status = 'active'
                 ORDER BY created_at"
            );
            self.fetch_reservations(sqlx::query(&sql).bind(date)).await
        })
    }

    fn all_on(&self, date: NaiveDate) -> BoxFuture<'_, Result<Vec<Reservation>, LedgerError>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT {RESERVATION_COLUMNS} FROM reservations
                 WHERE reserved_date = $1
                 ORDER BY created_at"
            );
            self.fetch_reservations(sqlx::query(&sql).bind(date)).await
        })
    }

    fn for_person(
        &self,
        person: PersonId,
    ) -> BoxFuture<'_, Result<Vec<Reservation>, LedgerError>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT {RESERVATION_COLUMNS} FROM reservations
                 WHERE person_id = $1
                 ORDER BY reserved_date DESC, created_at DESC"
            );
            self.fetch_reservations(sqlx::query(&sql).bind(*person.as_uuid()))
                .await
        })
    }

    fn active_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BoxFuture<'_, Result<Vec<Reservation>, LedgerError>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT {RESERVATION_COLUMNS} FROM reservations
                 WHERE reserved_date BETWEEN $1 AND $2 AND status = 'active'
                 ORDER BY reserved_date, created_at"
            );
            self.fetch_reservations(sqlx::query(&sql).bind(start).bind(end))
                .await
        })
    }
}

//! Seat and person directories.

use crate::{PostgresStore, directory_error, parse_role, roll_back};
use chrono::NaiveDate;
use seatbook_core::{
    BoxFuture, DirectoryError, NewSeat, Person, PersonDirectory, PersonId, Seat, SeatDirectory,
    SeatId, SeatUpdate,
};
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

const SEAT_COLUMNS: &str = "id, seat_number, offered_date, location, amenities";

fn row_to_seat(row: &PgRow) -> Result<Seat, sqlx::Error> {
    let seat_number: i32 = row.try_get("seat_number")?;
    let amenities: Vec<String> = row.try_get("amenities")?;
    Ok(Seat {
        id: SeatId::from_uuid(row.try_get("id")?),
        seat_number: u32::try_from(seat_number).map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        offered_date: row.try_get("offered_date")?,
        location: row.try_get("location")?,
        amenities: amenities.into_iter().collect(),
    })
}

fn row_to_person(row: &PgRow) -> Result<Person, sqlx::Error> {
    let role: String = row.try_get("role")?;
    Ok(Person {
        id: PersonId::from_uuid(row.try_get("id")?),
        role: parse_role(&role)?,
        display_name: row.try_get("display_name")?,
        email: row.try_get("email")?,
    })
}

fn seat_number_param(seat_number: u32) -> Result<i32, DirectoryError> {
    i32::try_from(seat_number)
        .map_err(|_| DirectoryError::Storage(format!("seat number {seat_number} out of range")))
}

impl PostgresStore {
    async fn fetch_seats(
        &self,
        query: sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments>,
    ) -> Result<Vec<Seat>, DirectoryError> {
        query
            .fetch_all(self.pool())
            .await
            .and_then(|rows| rows.iter().map(row_to_seat).collect())
            .map_err(directory_error)
    }

    async fn fetch_seat(
        &self,
        query: sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments>,
    ) -> Result<Option<Seat>, DirectoryError> {
        query
            .fetch_optional(self.pool())
            .await
            .and_then(|row| row.as_ref().map(row_to_seat).transpose())
            .map_err(directory_error)
    }

    async fn delete_unused_seat(&self, id: SeatId) -> Result<Seat, DirectoryError> {
        let mut tx = self.pool().begin().await.map_err(directory_error)?;

        // Blocks concurrent inserts, which hold FOR SHARE on the same row.
        let seat = sqlx::query(&format!(
            "SELECT {SEAT_COLUMNS} FROM seats WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .and_then(|row| row.as_ref().map(row_to_seat).transpose())
        .map_err(directory_error)?
        .ok_or(DirectoryError::SeatNotFound(id))?;

        let (in_use,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM reservations WHERE seat_id = $1 AND status = 'active')",
        )
        .bind(id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(directory_error)?;

        if in_use {
            roll_back(tx).await;
            return Err(DirectoryError::SeatInUse(id));
        }

        sqlx::query("DELETE FROM seats WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(directory_error)?;
        tx.commit().await.map_err(directory_error)?;

        tracing::debug!(seat_id = %id, "Seat deleted");
        Ok(seat)
    }
}

impl SeatDirectory for PostgresStore {
    fn seat(&self, id: SeatId) -> BoxFuture<'_, Result<Option<Seat>, DirectoryError>> {
        Box::pin(async move {
            let sql = format!("SELECT {SEAT_COLUMNS} FROM seats WHERE id = $1");
            self.fetch_seat(sqlx::query(&sql).bind(*id.as_uuid())).await
        })
    }

    fn seat_by_number(
        &self,
        seat_number: u32,
        date: NaiveDate,
    ) -> BoxFuture<'_, Result<Option<Seat>, DirectoryError>> {
        Box::pin(async move {
            let number = seat_number_param(seat_number)?;
            let sql = format!(
                "SELECT {SEAT_COLUMNS} FROM seats WHERE seat_number = $1 AND offered_date = $2"
            );
            self.fetch_seat(sqlx::query(&sql).bind(number).bind(date)).await
        })
    }

    fn seats_on(&self, date: NaiveDate) -> BoxFuture<'_, Result<Vec<Seat>, DirectoryError>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT {SEAT_COLUMNS} FROM seats WHERE offered_date = $1 ORDER BY seat_number"
            );
            self.fetch_seats(sqlx::query(&sql).bind(date)).await
        })
    }

    fn all_seats(&self) -> BoxFuture<'_, Result<Vec<Seat>, DirectoryError>> {
        Box::pin(async move {
            let sql = format!("SELECT {SEAT_COLUMNS} FROM seats ORDER BY offered_date, seat_number");
            self.fetch_seats(sqlx::query(&sql)).await
        })
    }

    fn create_seat(&self, seat: NewSeat) -> BoxFuture<'_, Result<Seat, DirectoryError>> {
        Box::pin(async move {
            let number = seat_number_param(seat.seat_number)?;
            let seat = seat.into_seat(SeatId::new());
            let amenities: Vec<String> = seat.amenities.iter().cloned().collect();

            sqlx::query(
                r"
                INSERT INTO seats (id, seat_number, offered_date, location, amenities)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(seat.id.as_uuid())
            .bind(number)
            .bind(seat.offered_date)
            .bind(&seat.location)
            .bind(&amenities)
            .execute(self.pool())
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return DirectoryError::DuplicateSeat {
                            seat_number: seat.seat_number,
                            date: seat.offered_date,
                        };
                    }
                }
                directory_error(e)
            })?;

            Ok(seat)
        })
    }

    fn update_seat(
        &self,
        id: SeatId,
        update: SeatUpdate,
    ) -> BoxFuture<'_, Result<Seat, DirectoryError>> {
        Box::pin(async move {
            let amenities: Option<Vec<String>> = update
                .amenities
                .as_ref()
                .map(|set| set.iter().cloned().collect());
            let sql = format!(
                r"
                UPDATE seats
                SET location = COALESCE($2, location),
                    amenities = COALESCE($3, amenities)
                WHERE id = $1
                RETURNING {SEAT_COLUMNS}
                "
            );
            self.fetch_seat(
                sqlx::query(&sql)
                    .bind(*id.as_uuid())
                    .bind(update.location.clone())
                    .bind(amenities),
            )
            .await?
            .ok_or(DirectoryError::SeatNotFound(id))
        })
    }

    fn delete_seat(&self, id: SeatId) -> BoxFuture<'_, Result<Seat, DirectoryError>> {
        Box::pin(self.delete_unused_seat(id))
    }
}

impl PersonDirectory for PostgresStore {
    fn person(&self, id: PersonId) -> BoxFuture<'_, Result<Option<Person>, DirectoryError>> {
        Box::pin(async move {
            sqlx::query("SELECT id, role, display_name, email FROM people WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(self.pool())
                .await
                .and_then(|row| row.as_ref().map(row_to_person).transpose())
                .map_err(directory_error)
        })
    }

    fn people(&self, ids: Vec<PersonId>) -> BoxFuture<'_, Result<Vec<Person>, DirectoryError>> {
        Box::pin(async move {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
            sqlx::query("SELECT id, role, display_name, email FROM people WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(self.pool())
                .await
                .and_then(|rows| rows.iter().map(row_to_person).collect::<Result<Vec<_>, _>>())
                .map_err(directory_error)
        })
    }

    fn upsert_person(&self, person: Person) -> BoxFuture<'_, Result<Person, DirectoryError>> {
        Box::pin(async move {
            sqlx::query(
                r"
                INSERT INTO people (id, role, display_name, email)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (id) DO UPDATE
                SET role = EXCLUDED.role,
                    display_name = EXCLUDED.display_name,
                    email = EXCLUDED.email
                ",
            )
            .bind(person.id.as_uuid())
            .bind(person.role.as_str())
            .bind(&person.display_name)
            .bind(&person.email)
            .execute(self.pool())
            .await
            .map_err(directory_error)?;

            tracing::debug!(person_id = %person.id, role = person.role.as_str(), "Person upserted");
            Ok(person)
        })
    }
}


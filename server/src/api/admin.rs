//! Administrator endpoints.
//!
//! All of these require `X-Person-Role: administrator`; other callers get 403.

use super::DateQuery;
use crate::state::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use seatbook_core::{NewSeat, Person, PersonId, Reservation, Seat, SeatId, SeatUpdate};
use seatbook_runtime::{
    PersonRecord, PersonReservations, ReservationDetail, SeatUsage, UsageQuery,
};
use seatbook_web::{AppError, Identity};
use serde::Deserialize;

/// Request body for a manual assignment.
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    /// Person receiving the seat
    pub person_id: PersonId,
    /// Seat to assign
    pub seat_id: SeatId,
    /// Date of the assignment
    pub date: NaiveDate,
}

/// `?date=` filter for the seat listing; absent lists every seat.
#[derive(Debug, Deserialize)]
pub struct SeatListQuery {
    /// Only seats offered on this date
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Assign a seat to a person, bypassing the lead time.
pub async fn manual_assign(
    State(state): State<AppState>,
    Identity(caller): Identity,
    body: Result<Json<AssignRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Reservation>), AppError> {
    let admin = caller.require_admin()?;
    let Json(request) = body?;
    let reservation = state
        .engine
        .manual_assign(&admin, request.person_id, request.seat_id, request.date)
        .await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// Every reservation on a date, any status, with seat and holder.
pub async fn reservations_by_date(
    State(state): State<AppState>,
    Identity(caller): Identity,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<Vec<ReservationDetail>>, AppError> {
    let admin = caller.require_admin()?;
    let Query(DateQuery { date }) = query?;
    Ok(Json(state.queries.reservations_by_date(&admin, date).await?))
}

/// Record a person published by the identity side, or replace their record.
///
/// ```text
/// PUT /api/admin/people/7d3c…
/// {"role":"member","display_name":"Ada","email":"ada@example.com"}
/// ```
pub async fn register_person(
    State(state): State<AppState>,
    Identity(caller): Identity,
    id: Result<Path<PersonId>, PathRejection>,
    body: Result<Json<PersonRecord>, JsonRejection>,
) -> Result<Json<Person>, AppError> {
    let admin = caller.require_admin()?;
    let Path(id) = id?;
    let Json(record) = body?;
    Ok(Json(state.people.register(&admin, id, record).await?))
}

/// A person and their reservation history.
pub async fn reservations_by_person(
    State(state): State<AppState>,
    Identity(caller): Identity,
    person: Result<Path<PersonId>, PathRejection>,
) -> Result<Json<PersonReservations>, AppError> {
    let admin = caller.require_admin()?;
    let Path(person) = person?;
    Ok(Json(
        state.queries.reservations_by_person(&admin, person).await?,
    ))
}

/// List seats, optionally for one date.
pub async fn list_seats(
    State(state): State<AppState>,
    Identity(caller): Identity,
    query: Result<Query<SeatListQuery>, QueryRejection>,
) -> Result<Json<Vec<Seat>>, AppError> {
    let admin = caller.require_admin()?;
    let Query(SeatListQuery { date }) = query?;
    Ok(Json(state.catalog.list_seats(&admin, date).await?))
}

/// Create a seat for one date.
pub async fn create_seat(
    State(state): State<AppState>,
    Identity(caller): Identity,
    body: Result<Json<NewSeat>, JsonRejection>,
) -> Result<(StatusCode, Json<Seat>), AppError> {
    let admin = caller.require_admin()?;
    let Json(seat) = body?;
    let seat = state.catalog.create_seat(&admin, seat).await?;
    Ok((StatusCode::CREATED, Json(seat)))
}

/// Edit a seat's location or amenities.
pub async fn update_seat(
    State(state): State<AppState>,
    Identity(caller): Identity,
    id: Result<Path<SeatId>, PathRejection>,
    body: Result<Json<SeatUpdate>, JsonRejection>,
) -> Result<Json<Seat>, AppError> {
    let admin = caller.require_admin()?;
    let Path(id) = id?;
    let Json(update) = body?;
    Ok(Json(state.catalog.update_seat(&admin, id, update).await?))
}

/// Delete a seat with no active reservation.
pub async fn delete_seat(
    State(state): State<AppState>,
    Identity(caller): Identity,
    id: Result<Path<SeatId>, PathRejection>,
) -> Result<Json<Seat>, AppError> {
    let admin = caller.require_admin()?;
    let Path(id) = id?;
    Ok(Json(state.catalog.delete_seat(&admin, id).await?))
}

/// Per-seat usage over a date range.
///
/// ```text
/// GET /api/admin/reports/seat-usage?start=2025-06-01&end=2025-06-30&location=Annex
/// ```
pub async fn seat_usage(
    State(state): State<AppState>,
    Identity(caller): Identity,
    query: Result<Query<UsageQuery>, QueryRejection>,
) -> Result<Json<Vec<SeatUsage>>, AppError> {
    let admin = caller.require_admin()?;
    let Query(query) = query?;
    Ok(Json(state.usage.seat_usage(&admin, &query).await?))
}

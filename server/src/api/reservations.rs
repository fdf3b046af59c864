//! Self-service reservation endpoints.
//!
//! - POST /api/reservations - book a seat
//! - GET /api/reservations/mine - the caller's reservations
//! - POST /api/reservations/:id/cancel
//! - POST /api/reservations/:id/modify - move to another seat on the same date

use crate::state::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use seatbook_core::{Reservation, ReservationId, SeatId};
use seatbook_runtime::ReservationDetail;
use seatbook_web::{AppError, CorrelationId, Identity};
use serde::Deserialize;

/// Request body for booking.
#[derive(Debug, Deserialize)]
pub struct BookRequest {
    /// Seat to book
    pub seat_id: SeatId,
    /// Date to book it for
    pub date: NaiveDate,
}

/// Request body for modifying a reservation.
#[derive(Debug, Deserialize)]
pub struct ModifyRequest {
    /// Replacement seat, offered on the same date
    pub seat_id: SeatId,
}

/// Book a seat for the caller.
///
/// ```bash
/// curl -X POST http://localhost:8080/api/reservations \
///   -H 'X-Person-Id: 7d3c…' -H 'X-Person-Role: member' \
///   -d '{"seat_id":"5b1e…","date":"2025-06-10"}'
/// ```
pub async fn book(
    State(state): State<AppState>,
    Identity(caller): Identity,
    correlation_id: CorrelationId,
    body: Result<Json<BookRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Reservation>), AppError> {
    let Json(request) = body?;
    tracing::debug!(correlation_id = %correlation_id.0, person = %caller.person, "Booking");

    let reservation = state
        .engine
        .book(caller.person, request.seat_id, request.date)
        .await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// Cancel one of the caller's active reservations.
pub async fn cancel(
    State(state): State<AppState>,
    Identity(caller): Identity,
    id: Result<Path<ReservationId>, PathRejection>,
) -> Result<Json<Reservation>, AppError> {
    let Path(id) = id?;
    let reservation = state.engine.cancel(caller.person, id).await?;
    Ok(Json(reservation))
}

/// Move one of the caller's reservations to another seat on the same date.
pub async fn modify(
    State(state): State<AppState>,
    Identity(caller): Identity,
    id: Result<Path<ReservationId>, PathRejection>,
    body: Result<Json<ModifyRequest>, JsonRejection>,
) -> Result<Json<Reservation>, AppError> {
    let Path(id) = id?;
    let Json(request) = body?;
    let reservation = state
        .engine
        .modify(caller.person, id, request.seat_id)
        .await?;
    Ok(Json(reservation))
}

/// The caller's reservations, newest date first.
pub async fn my_reservations(
    State(state): State<AppState>,
    Identity(caller): Identity,
) -> Result<Json<Vec<ReservationDetail>>, AppError> {
    Ok(Json(state.queries.my_reservations(caller.person).await?))
}

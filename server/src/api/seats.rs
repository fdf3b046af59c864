//! Seat availability endpoints.
//!
//! - GET /api/seats/day?date= - every seat offered on the date, with occupancy
//! - GET /api/seats/available?date= - free seats only

use super::DateQuery;
use crate::state::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use seatbook_runtime::SeatView;
use seatbook_web::{AppError, Identity};

/// List every seat for a date.
///
/// Administrators see occupant names and emails; members see only whether a
/// seat is taken, plus their own reservation.
pub async fn list_seats_for_date(
    State(state): State<AppState>,
    Identity(caller): Identity,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<Vec<SeatView>>, AppError> {
    let Query(DateQuery { date }) = query?;
    let seats = state.availability.list_seats_for_date(date, &caller).await?;
    Ok(Json(seats))
}

/// List the free seats for a date.
pub async fn list_available_seats(
    State(state): State<AppState>,
    Identity(_caller): Identity,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<Vec<SeatView>>, AppError> {
    let Query(DateQuery { date }) = query?;
    let seats = state.availability.list_available_seats(date).await?;
    Ok(Json(seats))
}

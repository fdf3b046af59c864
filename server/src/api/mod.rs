//! HTTP API handlers.
//!
//! - [`seats`]: per-date seat listings
//! - [`reservations`]: self-service booking for the calling member
//! - [`admin`]: seat catalog, manual assignment, listings and reports
//!
//! Every handler takes the caller from the identity headers and maps
//! allocation errors through `AppError`.

pub mod admin;
pub mod reservations;
pub mod seats;

use chrono::NaiveDate;
use serde::Deserialize;

/// `?date=YYYY-MM-DD`
#[derive(Debug, Deserialize)]
pub struct DateQuery {
    /// Calendar date
    pub date: NaiveDate,
}

//! # Seatbook Runtime
//!
//! Services built on the storage contracts of `seatbook-core`:
//!
//! - [`AllocationEngine`]: book, cancel, manual assignment, modify
//! - [`Availability`]: day views of seats and occupancy
//! - [`SeatCatalog`]: administrator seat management
//! - [`PeopleRegistry`]: person records published by the identity side
//! - [`ReservationQueries`]: reservation listings
//! - [`UsageReports`]: seat usage over a date range
//!
//! Every service holds a [`Stores`] bundle of shared trait objects, so the
//! same code runs against the in-memory store in tests and PostgreSQL in
//! production.
//!
//! ## Example
//!
//! ```ignore
//! use seatbook_runtime::{AllocationEngine, EngineConfig, Stores};
//! use seatbook_core::SystemClock;
//! use std::sync::Arc;
//!
//! let stores = Stores::shared(store);
//! let engine = AllocationEngine::new(stores, Arc::new(SystemClock), EngineConfig::default());
//! let reservation = engine.book(person, seat, date).await?;
//! ```

pub mod availability;
pub mod catalog;
pub mod engine;
pub mod metrics;
pub mod people;
pub mod queries;
pub mod retry;
pub mod stores;
pub mod usage;

pub use availability::{Availability, Occupant, SeatView};
pub use catalog::SeatCatalog;
pub use engine::{AllocationEngine, EngineConfig};
pub use people::{PeopleRegistry, PersonRecord};
pub use queries::{PersonReservations, PersonSummary, ReservationDetail, ReservationQueries, SeatSummary};
pub use retry::RetryPolicy;
pub use stores::Stores;
pub use usage::{SeatUsage, UsageQuery, UsageReports};

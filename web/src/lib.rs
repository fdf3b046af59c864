//! Axum integration for Seatbook.
//!
//! The HTTP shell around the allocation core:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            HTTP shell (Axum)            │  ← JSON, identity headers
//! │  - Identity / correlation extractors    │  ← Logging, correlation IDs
//! │  - AppError → status + JSON body        │
//! ├─────────────────────────────────────────┤
//! │            Allocation core              │
//! │  - AllocationEngine, queries, catalog   │  ← Tested against InMemoryStore
//! │  - Ledger / directory traits            │  ← PostgreSQL or in-memory
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use seatbook_web::{AppError, Identity};
//!
//! async fn my_reservations(
//!     State(state): State<AppState>,
//!     Identity(caller): Identity,
//! ) -> Result<Json<Vec<ReservationDetail>>, AppError> {
//!     Ok(Json(state.queries.my_reservations(caller.person).await?))
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{CorrelationId, Identity, PERSON_ID_HEADER, PERSON_ROLE_HEADER};
pub use handlers::ReadinessProbe;
pub use middleware::{correlation_id_layer, CORRELATION_ID_HEADER};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;

//! Seatbook HTTP server.
//!
//! Wires the allocation services onto a store and exposes them over JSON.
//! The `seatbook` binary runs it against `PostgreSQL`; the router tests run it
//! against the in-memory store. `seed_admin` writes the first administrator.

#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod probe;
pub mod routes;
pub mod seed;
pub mod state;

pub use config::Config;
pub use probe::PostgresProbe;
pub use routes::build_router;
pub use seed::{SeedAdmin, seed_admin};
pub use state::AppState;

//! HTTP request handlers shared by every Seatbook service.

pub mod health;

pub use health::{health_check, readiness_check, HealthResponse, ReadinessProbe, ReadinessResponse};

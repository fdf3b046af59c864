//! Readiness probe for the `PostgreSQL` store.

use seatbook_core::BoxFuture;
use seatbook_postgres::PostgresStore;
use seatbook_web::ReadinessProbe;
use std::sync::Arc;

/// Pings the database behind `/ready`.
#[derive(Clone)]
pub struct PostgresProbe(pub Arc<PostgresStore>);

impl ReadinessProbe for PostgresProbe {
    fn component(&self) -> &'static str {
        "postgres"
    }

    fn check(&self) -> BoxFuture<'_, Result<(), String>> {
        Box::pin(async move { self.0.ping().await.map_err(|e| e.to_string()) })
    }
}

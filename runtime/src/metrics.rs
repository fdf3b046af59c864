//! Prometheus metrics for allocation outcomes.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `seatbook_allocations_total{operation, outcome}`: engine calls by result
//! - `seatbook_allocation_retries_total`: transient conflicts that were retried
//! - `seatbook_allocation_retries_exhausted_total`: conflicts surfaced to callers
//! - `seatbook_catalog_changes_total{change}`: seat create / update / delete
//!
//! ## Histograms
//! - `seatbook_allocation_duration_seconds{operation}`
//!
//! Recording is a no-op until a recorder is installed, so the engine can be
//! used in tests without [`PrometheusExporter::install`].

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use seatbook_core::{AllocationError, ErrorKind};
use std::time::Duration;
use thiserror::Error;

/// Errors from metrics setup.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build the exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install the global recorder
    #[error("Failed to install metrics recorder: {0}")]
    Install(String),
}

/// Installed Prometheus recorder.
///
/// Rendering is left to the caller, which serves the text on its own port.
#[derive(Clone)]
pub struct PrometheusExporter {
    handle: PrometheusHandle,
}

impl PrometheusExporter {
    /// Describe all metrics and install the global Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Install`] if a recorder is already installed.
    pub fn install() -> Result<Self, MetricsError> {
        let handle = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?
            .install_recorder()
            .map_err(|e| MetricsError::Install(e.to_string()))?;

        register_metrics();
        Ok(Self { handle })
    }

    /// Render current metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Register metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        "seatbook_allocations_total",
        "Allocation engine calls by operation and outcome"
    );
    describe_histogram!(
        "seatbook_allocation_duration_seconds",
        "Time taken by allocation engine calls"
    );
    describe_counter!(
        "seatbook_allocation_retries_total",
        "Transient write conflicts that were retried"
    );
    describe_counter!(
        "seatbook_allocation_retries_exhausted_total",
        "Transient write conflicts returned to the caller after retries"
    );
    describe_counter!(
        "seatbook_catalog_changes_total",
        "Seat catalog changes by kind"
    );
    describe_counter!(
        "seatbook_people_registered_total",
        "Person records written to the directory"
    );

    tracing::info!("Seatbook metrics registered");
}

/// Label value for the outcome of an engine call.
#[must_use]
pub fn outcome_label<T>(result: &Result<T, AllocationError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(err) => match err.kind() {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::TooLate => "too_late",
            ErrorKind::SeatTaken => "seat_taken",
            ErrorKind::PersonAlreadyBooked => "person_already_booked",
            ErrorKind::ConflictRetryable => "conflict",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::CatalogConflict => "catalog_conflict",
            ErrorKind::Internal => "internal",
        },
    }
}

/// Record one engine call.
pub fn record_allocation<T>(
    operation: &'static str,
    result: &Result<T, AllocationError>,
    elapsed: Duration,
) {
    let outcome = outcome_label(result);
    counter!("seatbook_allocations_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
    histogram!("seatbook_allocation_duration_seconds", "operation" => operation)
        .record(elapsed.as_secs_f64());
}

/// Record a retried conflict.
pub fn record_retry() {
    counter!("seatbook_allocation_retries_total").increment(1);
}

/// Record a conflict that outlived its retries.
pub fn record_retries_exhausted() {
    counter!("seatbook_allocation_retries_exhausted_total").increment(1);
}

/// Record a seat catalog change (`created`, `updated`, `deleted`).
pub fn record_catalog_change(change: &'static str) {
    counter!("seatbook_catalog_changes_total", "change" => change).increment(1);
}

/// Record a person record written to the directory.
pub fn record_person_registered(role: &'static str) {
    counter!("seatbook_people_registered_total", "role" => role).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatbook_core::SeatId;

    #[test]
    fn outcome_labels_follow_error_kinds() {
        let ok: Result<(), AllocationError> = Ok(());
        assert_eq!(outcome_label(&ok), "ok");

        let taken: Result<(), AllocationError> = Err(AllocationError::SeatTaken {
            seat: SeatId::new(),
            date: chrono::NaiveDate::MIN,
        });
        assert_eq!(outcome_label(&taken), "seat_taken");

        let internal: Result<(), AllocationError> = Err(AllocationError::Internal("x".into()));
        assert_eq!(outcome_label(&internal), "internal");
    }

    #[test]
    fn recording_without_a_recorder_is_harmless() {
        let result: Result<(), AllocationError> = Err(AllocationError::Forbidden);
        record_allocation("book", &result, Duration::from_millis(3));
        record_retry();
        record_catalog_change("created");
    }
}

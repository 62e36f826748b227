//! Metrics collection
//!
//! Thin wrapper over the `metrics` facade. Recording is a no-op unless the
//! embedding process installs a global recorder/exporter; the names below
//! are the stable contract.

use std::time::Duration;

use metrics::{counter, histogram};

/// Metric names used across the application.
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    /// Store operation counter (labels: operation, status)
    pub store_operations_total: &'static str,
    /// Store operation duration histogram (seconds)
    pub store_operation_duration: &'static str,
    /// Ingested email counter (labels: source, status)
    pub emails_ingested_total: &'static str,
    /// Reference-data fetch counter (labels: what, status)
    pub reference_fetches_total: &'static str,
    /// Exported row counter
    pub export_rows_total: &'static str,
    /// Error counter (labels: kind)
    pub errors_total: &'static str,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            store_operations_total: "mail_triage_store_operations_total",
            store_operation_duration: "mail_triage_store_operation_duration_seconds",
            emails_ingested_total: "mail_triage_emails_ingested_total",
            reference_fetches_total: "mail_triage_reference_fetches_total",
            export_rows_total: "mail_triage_export_rows_total",
            errors_total: "mail_triage_errors_total",
        }
    }
}

impl MetricsCollector {
    /// Record one store operation.
    pub fn record_store_operation(&self, operation: &str, duration: Duration, success: bool) {
        let status = if success { "success" } else { "error" };

        counter!(
            self.store_operations_total,
            "operation" => operation.to_string(),
            "status" => status
        )
        .increment(1);
        histogram!(self.store_operation_duration, "operation" => operation.to_string())
            .record(duration.as_secs_f64());

        if !success {
            self.record_error("store");
        }
    }

    /// Record one ingest attempt (webhook or manual).
    pub fn record_ingest(&self, source: &str, success: bool) {
        let status = if success { "success" } else { "rejected" };

        counter!(
            self.emails_ingested_total,
            "source" => source.to_string(),
            "status" => status
        )
        .increment(1);
    }

    /// Record one reference-data fetch.
    pub fn record_reference_fetch(&self, what: &str, success: bool) {
        let status = if success { "success" } else { "error" };

        counter!(
            self.reference_fetches_total,
            "what" => what.to_string(),
            "status" => status
        )
        .increment(1);

        if !success {
            self.record_error("reference");
        }
    }

    /// Record rows written by a CSV export.
    pub fn record_export(&self, rows: usize) {
        counter!(self.export_rows_total).increment(rows as u64);
    }

    /// Record one error by kind.
    pub fn record_error(&self, kind: &'static str) {
        counter!(self.errors_total, "kind" => kind).increment(1);
    }
}

/// Performance timing wrapper for store metrics
pub struct MetricsTimer {
    collector: MetricsCollector,
    operation: String,
    start: std::time::Instant,
}

impl MetricsTimer {
    /// Start timing a store operation.
    #[must_use]
    pub fn new(collector: MetricsCollector, operation: &str) -> Self {
        Self {
            collector,
            operation: operation.to_string(),
            start: std::time::Instant::now(),
        }
    }

    /// Stop the timer and record the operation outcome.
    pub fn finish(self, success: bool) {
        let duration = self.start.elapsed();
        self.collector
            .record_store_operation(&self.operation, duration, success);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_names() {
        let collector = MetricsCollector::default();
        assert_eq!(collector.store_operations_total, "mail_triage_store_operations_total");
        assert_eq!(collector.emails_ingested_total, "mail_triage_emails_ingested_total");
    }

    #[test]
    fn test_recording_without_a_recorder_is_a_noop() {
        // No global recorder installed; calls must not panic.
        let collector = MetricsCollector::default();
        collector.record_ingest("webhook", true);
        collector.record_reference_fetch("estados", false);
        collector.record_export(10);

        let timer = MetricsTimer::new(collector, "insert");
        timer.finish(true);
    }
}

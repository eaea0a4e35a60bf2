//! Prometheus-backed metrics registry.
//!
//! # Design
//! - Collector registration stays private; callers only see typed increments.
//! - Counters are labelled by route/status and by label operation/outcome.

use std::sync::Arc;

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use crate::error::{Result, TelemetryError};

const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
const LABEL_OPERATIONS_TOTAL: &str = "label_operations_total";

/// Prometheus-backed metrics registry shared across the service.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    label_operations_total: IntCounterVec,
}

impl Metrics {
    /// Construct a new registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any collector cannot be built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = counter_vec(
            HTTP_REQUESTS_TOTAL,
            "Total HTTP requests received",
            &["route", "code"],
        )?;
        let label_operations_total = counter_vec(
            LABEL_OPERATIONS_TOTAL,
            "Label operations by outcome",
            &["operation", "outcome"],
        )?;

        register(&registry, HTTP_REQUESTS_TOTAL, &http_requests_total)?;
        register(&registry, LABEL_OPERATIONS_TOTAL, &label_operations_total)?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                http_requests_total,
                label_operations_total,
            }),
        })
    }

    /// Increment the HTTP request counter for the given route and status code.
    pub fn inc_http_request(&self, route: &str, status: u16) {
        self.inner
            .http_requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    /// Increment the label operation counter.
    pub fn inc_label_operation(&self, operation: &str, outcome: &str) {
        self.inner
            .label_operations_total
            .with_label_values(&[operation, outcome])
            .inc();
    }

    /// Current value of the label operation counter.
    #[must_use]
    pub fn label_operations(&self, operation: &str, outcome: &str) -> u64 {
        self.inner
            .label_operations_total
            .with_label_values(&[operation, outcome])
            .get()
    }

    /// Render the registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }
}

fn counter_vec(name: &'static str, help: &str, labels: &[&str]) -> Result<IntCounterVec> {
    IntCounterVec::new(Opts::new(name, help), labels)
        .map_err(|source| TelemetryError::MetricsCollector { name, source })
}

fn register(registry: &Registry, name: &'static str, collector: &IntCounterVec) -> Result<()> {
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_render_in_text_format() -> Result<()> {
        let metrics = Metrics::new()?;
        metrics.inc_http_request("/api/labels", 201);
        metrics.inc_label_operation("create", "success");
        metrics.inc_label_operation("create", "success");
        metrics.inc_label_operation("delete", "forbidden");

        assert_eq!(metrics.label_operations("create", "success"), 2);
        assert_eq!(metrics.label_operations("delete", "forbidden"), 1);

        let rendered = metrics.render()?;
        assert!(rendered.contains("http_requests_total"));
        assert!(rendered.contains(
            "label_operations_total{operation=\"create\",outcome=\"success\"} 2"
        ));
        Ok(())
    }

    #[test]
    fn registries_are_independent() -> Result<()> {
        let first = Metrics::new()?;
        let second = Metrics::new()?;
        first.inc_label_operation("read", "success");
        assert_eq!(second.label_operations("read", "success"), 0);
        Ok(())
    }
}

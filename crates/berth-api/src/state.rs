//! Shared state handed to every handler.

use berth_labels::{LabelResult, LabelService, Operation};
use berth_telemetry::Metrics;

/// Dependencies shared across handlers.
#[derive(Clone)]
pub struct ApiState {
    pub(crate) labels: LabelService,
    pub(crate) telemetry: Metrics,
}

impl ApiState {
    /// Bundle the label service and metrics registry.
    #[must_use]
    pub const fn new(labels: LabelService, telemetry: Metrics) -> Self {
        Self { labels, telemetry }
    }

    /// Count one label operation under its outcome.
    pub(crate) fn record<T>(&self, operation: Operation, result: &LabelResult<T>) {
        let outcome = match result {
            Ok(_) => "success",
            Err(err) => err.kind().as_str(),
        };
        self.telemetry
            .inc_label_operation(operation.as_str(), outcome);
    }
}

//! Monitoring sinks for forwarded errors and anomalies.

use ai_core::{MonitoringEvent, MonitoringSink, Severity};

/// Forwards events into the process log at the matching level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MonitoringSink for TracingSink {
    fn capture(&self, event: &MonitoringEvent) {
        let tags = serde_json::to_string(&event.tags).unwrap_or_default();
        match event.severity {
            Severity::Debug => {
                tracing::debug!(target: "ai_monitoring", tags = %tags, extra = %event.extra, "{}", event.message);
            }
            Severity::Info => {
                tracing::info!(target: "ai_monitoring", tags = %tags, extra = %event.extra, "{}", event.message);
            }
            Severity::Warn => {
                tracing::warn!(target: "ai_monitoring", tags = %tags, extra = %event.extra, "{}", event.message);
            }
            Severity::Error | Severity::Fatal => {
                tracing::error!(target: "ai_monitoring", tags = %tags, extra = %event.extra, "{}", event.message);
            }
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl MonitoringSink for NoopSink {
    fn capture(&self, _event: &MonitoringEvent) {}
}

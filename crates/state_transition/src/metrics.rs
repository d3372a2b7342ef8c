use std::{sync::Arc, time::Duration};

/// Fire-and-forget counters and timings. Sinks never influence control flow
/// and never fail; the default sink drops everything.
pub trait TelemetrySink: Send + Sync {
    fn increment_counter(&self, name: &'static str, value: u64);
    fn record_duration(&self, name: &'static str, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn increment_counter(&self, _name: &'static str, _value: u64) {}

    fn record_duration(&self, _name: &'static str, _duration: Duration) {}
}

pub(crate) struct StateProcessorMetrics {
    sink: Arc<dyn TelemetrySink>,
}

impl StateProcessorMetrics {
    pub(crate) fn new(sink: Arc<dyn TelemetrySink>) -> Self {
        Self { sink }
    }

    pub(crate) fn transition_applied(&self, elapsed: Duration) {
        self.sink
            .increment_counter("beacon_state_transition_total", 1);
        self.sink
            .record_duration("beacon_state_transition_seconds", elapsed);
    }

    pub(crate) fn transition_rejected(&self) {
        self.sink
            .increment_counter("beacon_state_transition_rejected_total", 1);
    }

    pub(crate) fn epoch_processed(&self) {
        self.sink
            .increment_counter("beacon_state_epoch_processed_total", 1);
    }
}

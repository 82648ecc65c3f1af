/*
    Metrics - relay throughput and failure counters

    Recorded through the `metrics` facade; without an installed recorder every
    call is a no-op, so the relay never depends on an exporter being present.
*/

use metrics::{counter, describe_counter, describe_gauge, gauge};

/// Initialize metric descriptions (call once at startup)
pub fn init_metrics() {
    describe_counter!(
        "keyrelay_events_total",
        "Total number of vault status events processed, labeled by result (sent, no_message, ignored, malformed, codec, send_failed)"
    );

    describe_counter!(
        "keyrelay_messages_sent_total",
        "Total number of protocol messages handed to the transport, labeled by type tag"
    );

    describe_counter!(
        "keyrelay_send_failures_total",
        "Total number of transport send attempts that failed, panicked or timed out"
    );

    describe_gauge!(
        "keyrelay_inflight_tasks",
        "Current number of dispatched relay tasks that have not finished"
    );
}

/// Record the final result of one event
pub fn event_processed(result: &'static str) {
    counter!("keyrelay_events_total", "result" => result).increment(1);
}

/// Record a message accepted by the transport
pub fn message_sent(type_tag: &'static str) {
    counter!("keyrelay_messages_sent_total", "type" => type_tag).increment(1);
}

/// Record a failed send
pub fn send_failed() {
    counter!("keyrelay_send_failures_total").increment(1);
}

/// Counts one dispatched task in `keyrelay_inflight_tasks` until dropped.
///
/// Lives inside the spawned task, so the gauge comes back down even when the
/// task is dropped unfinished at runtime shutdown.
pub struct InflightTask(());

impl InflightTask {
    pub fn start() -> Self {
        gauge!("keyrelay_inflight_tasks").increment(1.0);
        InflightTask(())
    }
}

impl Drop for InflightTask {
    fn drop(&mut self) {
        gauge!("keyrelay_inflight_tasks").decrement(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::GaugeRecorder;

    #[test]
    fn test_inflight_gauge_follows_guards() {
        let recorder = GaugeRecorder::new("keyrelay_inflight_tasks");
        let _local = metrics::set_default_local_recorder(&recorder);

        let first = InflightTask::start();
        let second = InflightTask::start();
        assert_eq!(recorder.value(), 2.0);

        drop(first);
        assert_eq!(recorder.value(), 1.0);
        drop(second);
        assert_eq!(recorder.value(), 0.0);
    }
}

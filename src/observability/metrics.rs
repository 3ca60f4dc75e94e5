//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): `service`, `method`, `path`, `status`
//! - `http_request_duration_seconds` (histogram): `service`, `method`, `path`
//! - `http_requests_in_flight` (gauge): `service`
//!
//! # Design Decisions
//! - The sink is injected, not global: each `Guard` owns its registry, so
//!   tests get a fresh one and nothing depends on a process-wide recorder
//! - `NoopMetrics` stands in whenever no backend is configured or compiled
//! - Updates are atomic inside the recorder; no locks in the request path

use std::sync::Arc;
use std::time::Duration;

/// Request counter name.
pub const REQUESTS_TOTAL: &str = "http_requests_total";
/// Latency histogram name.
pub const REQUEST_DURATION: &str = "http_request_duration_seconds";
/// In-flight gauge name.
pub const IN_FLIGHT: &str = "http_requests_in_flight";

/// Fixed latency buckets, in seconds.
pub const DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
];

/// Destination for request metrics.
pub trait MetricsSink: Send + Sync + 'static {
    fn increment_in_flight(&self, service: &str);

    fn decrement_in_flight(&self, service: &str);

    /// Count one finished request and record its latency.
    fn record_request(&self, service: &str, method: &str, path: &str, status: u16, elapsed: Duration);

    /// Current values in text exposition format, or `None` when there is no
    /// backend to render from.
    fn render(&self) -> Option<String> {
        None
    }
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn increment_in_flight(&self, _service: &str) {}

    fn decrement_in_flight(&self, _service: &str) {}

    fn record_request(&self, _service: &str, _method: &str, _path: &str, _status: u16, _elapsed: Duration) {}
}

/// Decrements the in-flight gauge on drop, including on unwind.
pub struct InFlightGuard<'a> {
    sink: &'a dyn MetricsSink,
    service: &'a str,
}

impl<'a> InFlightGuard<'a> {
    pub fn new(sink: &'a dyn MetricsSink, service: &'a str) -> Self {
        sink.increment_in_flight(service);
        Self { sink, service }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.sink.decrement_in_flight(self.service);
    }
}

/// Best available sink for this build.
pub fn default_sink() -> Arc<dyn MetricsSink> {
    #[cfg(feature = "prometheus")]
    {
        match prometheus::PrometheusMetrics::new() {
            Ok(sink) => return Arc::new(sink),
            Err(e) => tracing::warn!(error = %e, "Prometheus metrics unavailable, metrics disabled"),
        }
    }
    #[cfg(not(feature = "prometheus"))]
    tracing::warn!("Built without a metrics backend, metrics disabled");

    Arc::new(NoopMetrics)
}

#[cfg(feature = "prometheus")]
pub use prometheus::PrometheusMetrics;

#[cfg(feature = "prometheus")]
mod prometheus {
    use std::time::Duration;

    use metrics::{Key, KeyName, Label, Level, Metadata, Recorder, SharedString};
    use metrics_exporter_prometheus::{
        BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder,
    };

    use super::{MetricsSink, DURATION_BUCKETS, IN_FLIGHT, REQUESTS_TOTAL, REQUEST_DURATION};

    static METADATA: Metadata<'static> = Metadata::new(module_path!(), Level::INFO, Some(module_path!()));

    /// Prometheus registry owned by one middleware instance.
    ///
    /// The recorder is never installed globally; updates go straight through
    /// the `Recorder` trait on this instance.
    pub struct PrometheusMetrics {
        recorder: PrometheusRecorder,
        handle: PrometheusHandle,
    }

    impl PrometheusMetrics {
        pub fn new() -> Result<Self, BuildError> {
            let recorder = PrometheusBuilder::new()
                .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_string()), DURATION_BUCKETS)?
                .build_recorder();
            let handle = recorder.handle();

            recorder.describe_counter(
                KeyName::from_const_str(REQUESTS_TOTAL),
                None,
                SharedString::const_str("Total number of HTTP requests by final status"),
            );
            recorder.describe_histogram(
                KeyName::from_const_str(REQUEST_DURATION),
                None,
                SharedString::const_str("HTTP request duration in seconds"),
            );
            recorder.describe_gauge(
                KeyName::from_const_str(IN_FLIGHT),
                None,
                SharedString::const_str("HTTP requests currently being processed"),
            );

            Ok(Self { recorder, handle })
        }

        fn in_flight_key(service: &str) -> Key {
            Key::from_parts(IN_FLIGHT, vec![Label::new("service", service.to_string())])
        }
    }

    impl MetricsSink for PrometheusMetrics {
        fn increment_in_flight(&self, service: &str) {
            self.recorder
                .register_gauge(&Self::in_flight_key(service), &METADATA)
                .increment(1.0);
        }

        fn decrement_in_flight(&self, service: &str) {
            self.recorder
                .register_gauge(&Self::in_flight_key(service), &METADATA)
                .decrement(1.0);
        }

        fn record_request(&self, service: &str, method: &str, path: &str, status: u16, elapsed: Duration) {
            let counter_key = Key::from_parts(
                REQUESTS_TOTAL,
                vec![
                    Label::new("service", service.to_string()),
                    Label::new("method", method.to_string()),
                    Label::new("path", path.to_string()),
                    Label::new("status", status.to_string()),
                ],
            );
            self.recorder.register_counter(&counter_key, &METADATA).increment(1);

            let histogram_key = Key::from_parts(
                REQUEST_DURATION,
                vec![
                    Label::new("service", service.to_string()),
                    Label::new("method", method.to_string()),
                    Label::new("path", path.to_string()),
                ],
            );
            self.recorder
                .register_histogram(&histogram_key, &METADATA)
                .record(elapsed.as_secs_f64());
        }

        fn render(&self) -> Option<String> {
            Some(self.handle.render())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_sink_does_not_render() {
        let sink = NoopMetrics;
        sink.increment_in_flight("svc");
        sink.record_request("svc", "GET", "/", 200, Duration::from_millis(1));
        sink.decrement_in_flight("svc");
        assert!(sink.render().is_none());
    }

    #[test]
    fn test_in_flight_guard_decrements_on_unwind() {
        use std::sync::atomic::{AtomicI64, Ordering};

        #[derive(Default)]
        struct Counting(AtomicI64);

        impl MetricsSink for Counting {
            fn increment_in_flight(&self, _: &str) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
            fn decrement_in_flight(&self, _: &str) {
                self.0.fetch_sub(1, Ordering::SeqCst);
            }
            fn record_request(&self, _: &str, _: &str, _: &str, _: u16, _: Duration) {}
        }

        let sink = Counting::default();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = InFlightGuard::new(&sink, "svc");
            assert_eq!(sink.0.load(Ordering::SeqCst), 1);
            panic!("handler blew up");
        }));
        assert!(result.is_err());
        assert_eq!(sink.0.load(Ordering::SeqCst), 0);
    }

    #[cfg(feature = "prometheus")]
    #[test]
    fn test_prometheus_exposition() {
        let sink = PrometheusMetrics::new().unwrap();
        sink.increment_in_flight("finbert");
        sink.record_request("finbert", "POST", "/v1/sentiment", 200, Duration::from_millis(30));
        sink.record_request("finbert", "POST", "/v1/sentiment", 200, Duration::from_millis(70));
        sink.decrement_in_flight("finbert");

        let text = sink.render().unwrap();
        assert!(text.contains("# TYPE http_requests_total counter"));
        assert!(text.contains("# TYPE http_request_duration_seconds histogram"));
        assert!(text.contains("http_request_duration_seconds_bucket"));
        assert!(text.contains("le=\"0.05\""));

        let counter = text
            .lines()
            .find(|l| l.starts_with(REQUESTS_TOTAL) && l.contains("status=\"200\""))
            .unwrap();
        assert!(counter.ends_with(" 2"));
    }

    #[cfg(feature = "prometheus")]
    #[test]
    fn test_render_is_stable_without_new_requests() {
        let sink = PrometheusMetrics::new().unwrap();
        sink.record_request("svc", "GET", "/ok", 200, Duration::from_millis(3));
        sink.increment_in_flight("svc");
        sink.decrement_in_flight("svc");

        let first = sink.render().unwrap();
        let second = sink.render().unwrap();
        assert_eq!(first, second);
    }

    #[cfg(feature = "prometheus")]
    #[test]
    fn test_separate_sinks_do_not_share_state() {
        let a = PrometheusMetrics::new().unwrap();
        let b = PrometheusMetrics::new().unwrap();
        a.record_request("svc", "GET", "/only-a", 200, Duration::from_millis(1));

        assert!(a.render().unwrap().contains("/only-a"));
        assert!(!b.render().unwrap().contains("/only-a"));
    }
}

//! Prometheus metrics shared by the API server and the worker

use prometheus::{
    Counter, Encoder, Gauge, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder,
};

pub struct Metrics {
    registry: Registry,
    pub http_requests_total: Counter,
    pub http_request_duration_seconds: Histogram,
    pub http_requests_in_flight: Gauge,
    pub feedback_submissions_total: Counter,
    pub learning_runs_total: IntCounterVec,
    pub learning_run_duration_seconds: Histogram,
    pub learning_runs_active: Gauge,
    pub store_connected: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = Counter::with_opts(Opts::new(
            "http_requests_total",
            "Total number of HTTP requests handled",
        ))?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        ))?;
        let http_requests_in_flight = Gauge::with_opts(Opts::new(
            "http_requests_in_flight",
            "HTTP requests currently being served",
        ))?;
        let feedback_submissions_total = Counter::with_opts(Opts::new(
            "feedback_submissions_total",
            "Plan feedback records accepted",
        ))?;
        let learning_runs_total = IntCounterVec::new(
            Opts::new("learning_runs_total", "Learning runs by outcome"),
            &["outcome"],
        )?;
        let learning_run_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "learning_run_duration_seconds",
                "Duration of a full read-analyze-merge-write learning run",
            )
            .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        )?;
        let learning_runs_active = Gauge::with_opts(Opts::new(
            "learning_runs_active",
            "Learning runs currently executing",
        ))?;
        let store_connected = Gauge::with_opts(Opts::new(
            "store_connected",
            "1 when the feedback/weights store is reachable",
        ))?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(feedback_submissions_total.clone()))?;
        registry.register(Box::new(learning_runs_total.clone()))?;
        registry.register(Box::new(learning_run_duration_seconds.clone()))?;
        registry.register(Box::new(learning_runs_active.clone()))?;
        registry.register(Box::new(store_connected.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            feedback_submissions_total,
            learning_runs_total,
            learning_run_duration_seconds,
            learning_runs_active,
            store_connected,
        })
    }

    /// Record the outcome label of a finished learning run
    pub fn record_learning_outcome(&self, outcome: &str) {
        self.learning_runs_total.with_label_values(&[outcome]).inc();
    }

    /// Render all registered metrics in the Prometheus text format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

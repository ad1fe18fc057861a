use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
        })
        .await
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Refresh metrics
    pub token_refresh_requests: IntCounterVec,
    pub token_refresh_failures: IntCounterVec,
    pub token_refresh_duration: HistogramVec,
    pub token_refresh_skipped: IntCounterVec,

    // Cache metrics
    pub cached_credentials: IntGauge,
    pub token_expiry_unix: IntGaugeVec,
    pub shared_credentials: IntGauge,

    // Send metrics
    pub message_sends: IntCounterVec,
    pub message_send_failures: IntCounterVec,

    // Config
    pub config_parse_failures: IntCounter,
    pub config_validation_errors: IntCounter,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("pushtoken".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Refresh
            token_refresh_requests: IntCounterVec::new(Opts::new("token_refresh_requests_total", "Token exchange attempts by provider"), &["provider"]).unwrap(),
            token_refresh_failures: IntCounterVec::new(Opts::new("token_refresh_failures_total", "Token exchange failures by reason"), &["provider", "reason"]).unwrap(),
            token_refresh_duration: HistogramVec::new(HistogramOpts::new("token_refresh_duration_seconds", "Token exchange duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]), &["provider"]).unwrap(),
            token_refresh_skipped: IntCounterVec::new(Opts::new("token_refresh_skipped_total", "Stale lookups served without refresh"), &["reason"]).unwrap(),

            // Cache
            cached_credentials: IntGauge::new("cached_credentials", "Credentials known to the token store").unwrap(),
            token_expiry_unix: IntGaugeVec::new(Opts::new("token_expiry_unix_seconds", "Token expiry timestamp"), &["provider"]).unwrap(),
            shared_credentials: IntGauge::new("shared_credentials", "Credentials referenced by more than one channel").unwrap(),

            // Send
            message_sends: IntCounterVec::new(Opts::new("message_sends_total", "Message send attempts"), &["channel_type"]).unwrap(),
            message_send_failures: IntCounterVec::new(Opts::new("message_send_failures_total", "Message send failures"), &["channel_type", "reason"]).unwrap(),

            // Config
            config_parse_failures: IntCounter::new("config_parse_failures_total", "Config files that could not be parsed").unwrap(),
            config_validation_errors: IntCounter::new("config_validation_errors_total", "Validation errors during startup").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.token_refresh_requests.clone())).unwrap();
        reg.register(Box::new(metrics.token_refresh_failures.clone())).unwrap();
        reg.register(Box::new(metrics.token_refresh_duration.clone())).unwrap();
        reg.register(Box::new(metrics.token_refresh_skipped.clone())).unwrap();
        reg.register(Box::new(metrics.cached_credentials.clone())).unwrap();
        reg.register(Box::new(metrics.token_expiry_unix.clone())).unwrap();
        reg.register(Box::new(metrics.shared_credentials.clone())).unwrap();
        reg.register(Box::new(metrics.message_sends.clone())).unwrap();
        reg.register(Box::new(metrics.message_send_failures.clone())).unwrap();
        reg.register(Box::new(metrics.config_parse_failures.clone())).unwrap();
        reg.register(Box::new(metrics.config_validation_errors.clone())).unwrap();

        metrics
    }

    /// Prometheus text exposition of every registered metric
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

//! Metrics collection for observability

use prometheus::{
    register_counter_vec_with_registry, register_counter_with_registry,
    register_histogram_vec_with_registry, Counter, CounterVec, Encoder, HistogramVec, Opts,
    Registry, TextEncoder,
};
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> = Lazy::new(|| {
    Arc::new(Metrics::new().expect("Failed to initialize metrics"))
});

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Evaluator metrics
    pub evaluation_requests: CounterVec,
    pub evaluation_retries: CounterVec,
    pub evaluation_duration: HistogramVec,

    // Assessment cache
    pub cache_hits: Counter,
    pub cache_misses: Counter,

    // Scoring and reports
    pub platforms_scored: Counter,
    pub reports_generated: CounterVec,

    // Live vendor documentation
    pub vendor_pages: CounterVec,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let evaluation_requests = register_counter_vec_with_registry!(
            Opts::new("evaluation_requests_total", "Total LLM evaluation requests"),
            &["provider", "status"],
            registry
        )?;

        let evaluation_retries = register_counter_vec_with_registry!(
            Opts::new("evaluation_retries_total", "Total LLM evaluation retries"),
            &["provider"],
            registry
        )?;

        let evaluation_duration = register_histogram_vec_with_registry!(
            "evaluation_duration_seconds",
            "LLM evaluation round trip in seconds",
            &["provider"],
            registry
        )?;

        let cache_hits = register_counter_with_registry!(
            Opts::new("assessment_cache_hits_total", "Assessments served from cache"),
            registry
        )?;

        let cache_misses = register_counter_with_registry!(
            Opts::new("assessment_cache_misses_total", "Assessments not found in cache"),
            registry
        )?;

        let platforms_scored = register_counter_with_registry!(
            Opts::new("platforms_scored_total", "Platforms scored locally"),
            registry
        )?;

        let reports_generated = register_counter_vec_with_registry!(
            Opts::new("reports_generated_total", "Reports rendered"),
            &["format"],
            registry
        )?;

        let vendor_pages = register_counter_vec_with_registry!(
            Opts::new("vendor_pages_fetched_total", "Vendor documentation page fetches"),
            &["status"],
            registry
        )?;

        Ok(Self {
            registry,
            evaluation_requests,
            evaluation_retries,
            evaluation_duration,
            cache_hits,
            cache_misses,
            platforms_scored,
            reports_generated,
            vendor_pages,
        })
    }

    /// Get the registry for exporting metrics
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record an evaluation outcome
    pub fn record_evaluation(&self, provider: &str, status: &str, duration_secs: f64) {
        self.evaluation_requests
            .with_label_values(&[provider, status])
            .inc();
        self.evaluation_duration
            .with_label_values(&[provider])
            .observe(duration_secs);
    }

    pub fn record_retry(&self, provider: &str) {
        self.evaluation_retries.with_label_values(&[provider]).inc();
    }

    pub fn record_cache(&self, hit: bool) {
        if hit {
            self.cache_hits.inc();
        } else {
            self.cache_misses.inc();
        }
    }

    pub fn record_platform_scored(&self) {
        self.platforms_scored.inc();
    }

    pub fn record_report(&self, format: &str) {
        self.reports_generated.with_label_values(&[format]).inc();
    }

    pub fn record_vendor_page(&self, ok: bool) {
        let status = if ok { "success" } else { "error" };
        self.vendor_pages.with_label_values(&[status]).inc();
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::warn!("Failed to encode metrics: {}", e);
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

use opentelemetry::global;
use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter, UpDownCounter};
use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::{Encoder, Registry, TextEncoder};
use std::sync::Arc;

use crate::error::{GuardError, Result};

pub mod labels {
    pub const TIER: &str = "tier";
    pub const RESULT: &str = "result";
    pub const VERSION: &str = "version";
    pub const RUST_VERSION: &str = "rust_version";
}

pub mod values {
    pub const RESULT_HIT: &str = "hit";
    pub const RESULT_MISS: &str = "miss";
    pub const RESULT_OK: &str = "ok";
    pub const RESULT_ERROR: &str = "error";
}

#[derive(Clone)]
pub struct Metrics {
    // Cache metrics
    pub cache_lookups_total: Counter<u64>,

    // Rate guard metrics
    pub rate_limit_requests_total: Counter<u64>,
    pub rate_limit_allowed_total: Counter<u64>,
    pub rate_limit_rejected_total: Counter<u64>,

    // Concurrency limiter metrics
    pub limiter_slots_active: UpDownCounter<i64>,
    pub limiter_queued_total: Counter<u64>,

    // External API calls
    pub external_calls_total: Counter<u64>,
    pub external_call_duration_seconds: Histogram<f64>,

    pub build_info: Gauge<u64>,
}

impl Metrics {
    pub fn new(meter: Meter) -> Self {
        Self {
            cache_lookups_total: meter
                .u64_counter("quota_guard_cache_lookups_total")
                .with_description("Cache lookups by tier. result=hit|miss")
                .build(),
            rate_limit_requests_total: meter
                .u64_counter("quota_guard_rate_limit_requests_total")
                .with_description("Total number of calls evaluated by the rate guard")
                .build(),
            rate_limit_allowed_total: meter
                .u64_counter("quota_guard_rate_limit_allowed_total")
                .with_description("Total number of calls allowed by the rate guard")
                .build(),
            rate_limit_rejected_total: meter
                .u64_counter("quota_guard_rate_limit_rejected_total")
                .with_description("Total number of calls rejected by the rate guard (429)")
                .build(),
            limiter_slots_active: meter
                .i64_up_down_counter("quota_guard_limiter_slots_active")
                .with_description("Concurrency slots currently held across all resources")
                .build(),
            limiter_queued_total: meter
                .u64_counter("quota_guard_limiter_queued_total")
                .with_description("Total number of callers that had to wait for a slot")
                .build(),
            external_calls_total: meter
                .u64_counter("quota_guard_external_calls_total")
                .with_description("External API calls by tier. result=ok|error")
                .build(),
            external_call_duration_seconds: meter
                .f64_histogram("quota_guard_external_call_duration_seconds")
                .with_description("External API call duration in seconds")
                .build(),
            build_info: meter
                .u64_gauge("quota_guard_build_info")
                .with_description("Build information (version, rust version)")
                .build(),
        }
    }

    /// Set build info metric with version labels
    pub fn set_build_info(&self) {
        let version = env!("CARGO_PKG_VERSION");
        let rust_version = option_env!("CARGO_PKG_RUST_VERSION").unwrap_or("unknown");

        self.build_info.record(
            1,
            &[
                KeyValue::new(labels::VERSION, version),
                KeyValue::new(labels::RUST_VERSION, rust_version),
            ],
        );
    }

    pub fn record_cache_lookup(&self, tier: &str, hit: bool) {
        let result = if hit { values::RESULT_HIT } else { values::RESULT_MISS };
        self.cache_lookups_total.add(
            1,
            &[
                KeyValue::new(labels::TIER, tier.to_string()),
                KeyValue::new(labels::RESULT, result),
            ],
        );
    }

    pub fn record_rate_limit(&self, allowed: bool) {
        self.rate_limit_requests_total.add(1, &[]);
        if allowed {
            self.rate_limit_allowed_total.add(1, &[]);
        } else {
            self.rate_limit_rejected_total.add(1, &[]);
        }
    }

    pub fn record_external_call(&self, tier: &str, duration: f64, ok: bool) {
        let result = if ok { values::RESULT_OK } else { values::RESULT_ERROR };
        let attrs = [
            KeyValue::new(labels::TIER, tier.to_string()),
            KeyValue::new(labels::RESULT, result),
        ];
        self.external_calls_total.add(1, &attrs);
        self.external_call_duration_seconds.record(duration, &attrs);
    }
}

pub fn init_metrics() -> std::result::Result<(Arc<Metrics>, Registry), Box<dyn std::error::Error + Send + Sync>>
{
    let registry = Registry::default();

    let exporter = opentelemetry_prometheus::exporter()
        .with_registry(registry.clone())
        .build()?;

    let meter_provider = SdkMeterProvider::builder().with_reader(exporter).build();

    global::set_meter_provider(meter_provider);

    let meter = global::meter("quota-guard");
    let metrics = Arc::new(Metrics::new(meter));

    metrics.set_build_info();

    Ok((metrics, registry))
}

/// Encode everything in `registry` in the Prometheus text format.
pub fn render_metrics(registry: &Registry) -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = Vec::new();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| GuardError::Telemetry(format!("Failed to encode metrics: {e}")))?;

    String::from_utf8(buffer)
        .map_err(|e| GuardError::Telemetry(format!("Metrics output is not UTF-8: {e}")))
}

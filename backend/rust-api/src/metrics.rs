use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .unwrap();

    // Retry wrapper: one increment per failed attempt, plus "recovered" on late success
    pub static ref RETRY_ATTEMPTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "retry_attempts_total",
        "Failed attempts seen by the retry wrapper",
        &["operation", "outcome"]
    )
    .unwrap();

    // Business Metrics
    pub static ref QUIZ_OUTCOMES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "quiz_outcomes_total",
        "Quiz rounds and submissions by outcome",
        &["outcome"]
    )
    .unwrap();

    pub static ref GENERATOR_FALLBACKS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "generator_fallbacks_total",
        "Quiz rounds served from the fixed fallback question set",
        &["reason"]
    )
    .unwrap();
}

pub fn record_quiz_outcome(outcome: &str) {
    QUIZ_OUTCOMES_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_generator_fallback(reason: &str) {
    GENERATOR_FALLBACKS_TOTAL.with_label_values(&[reason]).inc();
}

/// Render all registered metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts};

lazy_static::lazy_static! {
    pub static ref READINESS_CHECKS_TOTAL: IntCounterVec = prometheus::register_int_counter_vec!(
        Opts::new(
            "vecready_readiness_checks_total",
            "Total number of readiness checks by outcome"
        ),
        &["result"]
    )
    .unwrap();

    pub static ref READINESS_CHECK_DURATION: Histogram = prometheus::register_histogram!(
        HistogramOpts::new(
            "vecready_readiness_check_duration_seconds",
            "Duration of readiness checks in seconds"
        )
    )
    .unwrap();

    pub static ref LIVENESS_CHECKS_TOTAL: IntCounter = prometheus::register_int_counter!(
        Opts::new(
            "vecready_liveness_checks_total",
            "Total number of liveness checks"
        )
    )
    .unwrap();
}

pub fn observe_readiness(result: &str, duration_secs: f64) {
    READINESS_CHECKS_TOTAL.with_label_values(&[result]).inc();
    READINESS_CHECK_DURATION.observe(duration_secs);
}

pub fn increment_liveness() {
    LIVENESS_CHECKS_TOTAL.inc();
}

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, HistogramOpts,
    IntCounter, IntCounterVec, Opts,
};
use std::time::Duration;

const NAMESPACE: &str = "openwrap";
const SUBSYSTEM: &str = "arbiter";

const OUTCOME_LABEL: &str = "outcome";

// Arbitration resolves well within a second; buckets concentrate around the signal window.
const WINDOW_BUCKETS: &[f64] = &[0.0, 0.01, 0.05, 0.1, 0.2, 0.3, 0.4, 0.5, 1.0];

lazy_static! {
    pub static ref OUTCOMES_COUNTER: IntCounterVec = register_int_counter_vec!(
        Opts::new("outcomes_total", "total number of resolved win arbitrations")
            .namespace(NAMESPACE)
            .subsystem(SUBSYSTEM),
        &[OUTCOME_LABEL]
    )
    .unwrap();
    pub static ref SIGNALING_MISMATCH_COUNTER: IntCounter = register_int_counter!(Opts::new(
        "signaling_mismatches_total",
        "total number of partner win signals received after the ad server won"
    )
    .namespace(NAMESPACE)
    .subsystem(SUBSYSTEM))
    .unwrap();
    pub static ref RESOLUTION_DURATION_SECONDS: Histogram = register_histogram!(HistogramOpts {
        common_opts: Opts::new(
            "resolution_duration_seconds",
            "duration (in seconds) from creative ready to a resolved outcome"
        )
        .namespace(NAMESPACE)
        .subsystem(SUBSYSTEM),
        buckets: WINDOW_BUCKETS.to_vec(),
    })
    .unwrap();
}

pub fn inc_outcome(outcome: &str) {
    OUTCOMES_COUNTER.with_label_values(&[outcome]).inc();
}

pub fn inc_signaling_mismatch() {
    SIGNALING_MISMATCH_COUNTER.inc();
}

pub fn observe_resolution(duration: Duration) {
    RESOLUTION_DURATION_SECONDS.observe(duration.as_secs_f64());
}

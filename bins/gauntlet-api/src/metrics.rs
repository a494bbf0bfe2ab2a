// Prometheus metrics for the HTTP surface

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, Encoder, HistogramVec,
    IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    pub static ref SUBMISSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "gauntlet_submissions_total",
        "Submissions handled, by endpoint and verdict",
        &["endpoint", "verdict"]
    )
    .expect("metric can be registered");

    pub static ref SUBMISSION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "gauntlet_submission_duration_seconds",
        "Wall time from request to verdict, compilation included",
        &["endpoint"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]
    )
    .expect("metric can be registered");

    pub static ref PROCESSES_SPAWNED: IntGauge = register_int_gauge!(
        "gauntlet_processes_spawned",
        "Submission processes started since boot"
    )
    .expect("metric can be registered");

    pub static ref PROCESSES_KILLED: IntGauge = register_int_gauge!(
        "gauntlet_processes_killed",
        "Submission processes killed on deadline since boot"
    )
    .expect("metric can be registered");

    pub static ref SUBMISSIONS_IN_FLIGHT: IntGauge = register_int_gauge!(
        "gauntlet_submissions_in_flight",
        "Submissions currently holding an execution slot"
    )
    .expect("metric can be registered");
}

pub fn record_submission(endpoint: &str, verdict: &str, elapsed: std::time::Duration) {
    SUBMISSIONS_TOTAL.with_label_values(&[endpoint, verdict]).inc();
    SUBMISSION_DURATION_SECONDS
        .with_label_values(&[endpoint])
        .observe(elapsed.as_secs_f64());
}

/// Render the default registry in text exposition format
pub fn render() -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_render_contains_recorded_submission() {
        record_submission("execute", "success", Duration::from_millis(120));
        let text = render().unwrap();
        assert!(text.contains("gauntlet_submissions_total"));
        assert!(text.contains("endpoint=\"execute\""));
    }
}

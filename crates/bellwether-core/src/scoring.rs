use crate::model::{Complexity, PerformanceSnapshot};

/// Response-time fallback when a snapshot carries a zero (or negative,
/// which the harness never produces) average. Mirrors the conservative
/// default used when the field is missing upstream.
const DEFAULT_RESPONSE_TIME_MS: f64 = 1000.0;

const RESPONSE_TIME_WEIGHT: f64 = 0.3;
const THROUGHPUT_WEIGHT: f64 = 0.3;
const SUCCESS_WEIGHT: f64 = 0.2;
const ERROR_PENALTY_WEIGHT: f64 = 0.2;

/// Composite score used to rank backends for routing. Pure: no I/O, no
/// side effects.
///
/// Holding everything else fixed, a higher success or generation rate, or
/// a lower (positive) response time or error rate, never lowers the score.
pub fn score(snapshot: &PerformanceSnapshot, complexity: Complexity) -> f64 {
    let rt = if snapshot.avg_response_time_ms > 0.0 {
        snapshot.avg_response_time_ms
    } else {
        DEFAULT_RESPONSE_TIME_MS
    };

    let response_time_score = 1.0 / rt;
    let throughput_score = snapshot.avg_generation_rate / 100.0;
    let success_score = snapshot.task_success_rate_pct / 100.0;
    let error_penalty = 1.0 - snapshot.error_rate_pct / 100.0;

    (RESPONSE_TIME_WEIGHT * response_time_score
        + THROUGHPUT_WEIGHT * throughput_score
        + SUCCESS_WEIGHT * success_score
        + ERROR_PENALTY_WEIGHT * error_penalty)
        * complexity.weight()
}

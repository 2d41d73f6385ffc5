use serde::{Deserialize, Serialize};

use crate::errors::BackendErrorKind;

/// One aggregated performance record for a backend over one benchmark run.
///
/// Rows are immutable once written; the metrics store only ever appends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    /// Run time, RFC 3339.
    pub timestamp: String,
    pub model_name: String,
    /// Scenario executions attempted (success + error).
    pub total_queries: u64,
    pub avg_response_time_ms: f64,
    pub median_response_time_ms: f64,
    /// Completed executions per second of run wall-clock (request rate,
    /// not token rate). The scoring engine uses the same definition.
    pub avg_generation_rate: f64,
    pub task_success_rate_pct: f64,
    pub error_rate_pct: f64,
    pub total_execution_time_s: f64,
}

/// Task complexity class used for scoring weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    Medium,
    High,
    Extreme,
}

impl Complexity {
    pub fn weight(&self) -> f64 {
        match self {
            Complexity::Low => 0.2,
            Complexity::Medium => 0.5,
            Complexity::High => 0.8,
            Complexity::Extreme => 1.0,
        }
    }

    /// Unknown labels map to `Medium`.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "low" => Complexity::Low,
            "high" => Complexity::High,
            "extreme" => Complexity::Extreme,
            _ => Complexity::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Low => "low",
            Complexity::Medium => "medium",
            Complexity::High => "high",
            Complexity::Extreme => "extreme",
        }
    }
}

/// A fixed prompt plus a validation rule used to probe a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub prompt: String,
    pub complexity: Complexity,
    pub validation: Validation,
}

/// Predicate over response text that classifies an execution as success.
///
/// An empty response never passes, regardless of the rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Validation {
    MustContain { must_contain: Vec<String> },
    MustNotContain { must_not_contain: Vec<String> },
    RegexMatch { pattern: String },
    NonEmpty,
}

impl Validation {
    /// Case-insensitive containment, matching the behavior callers expect
    /// from "all expected sections present" checks.
    pub fn passes(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        match self {
            Validation::MustContain { must_contain } => {
                let haystack = text.to_lowercase();
                must_contain
                    .iter()
                    .all(|needle| haystack.contains(&needle.to_lowercase()))
            }
            Validation::MustNotContain { must_not_contain } => {
                let haystack = text.to_lowercase();
                !must_not_contain
                    .iter()
                    .any(|needle| haystack.contains(&needle.to_lowercase()))
            }
            // Plan validation rejects malformed patterns up front; a bad
            // pattern reaching this point still fails loudly in the logs
            // instead of masquerading as a validation miss.
            Validation::RegexMatch { pattern } => match regex::Regex::new(pattern) {
                Ok(re) => re.is_match(text),
                Err(e) => {
                    tracing::warn!(pattern = %pattern, error = %e, "invalid validation regex");
                    false
                }
            },
            Validation::NonEmpty => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Openai,
    Anthropic,
    Google,
}

/// One configured LLM service endpoint. Connection parameters are opaque to
/// the benchmarking and routing logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Routing identifier, unique per backend configuration.
    pub model_name: String,
    pub kind: BackendKind,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

fn default_max_tokens() -> u32 {
    500
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    1.0
}

/// One routing decision, appended to the audit log per selector invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionRecord {
    pub timestamp: String,
    pub selected_model: String,
    pub task_description: String,
    pub task_complexity: Complexity,
}

/// Why a scenario execution was classified as an error.
///
/// A validation miss and a transport fault are identical in accounting but
/// must stay distinguishable in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The backend call itself failed.
    Backend(BackendErrorKind),
    /// A response arrived but failed the scenario's validation rule.
    Validation,
    /// The per-call timeout elapsed before the response completed.
    Timeout,
    /// The backend run was cancelled while this execution was in flight.
    Cancelled,
    /// The spawned task itself failed.
    Task,
}

impl FailureCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCause::Backend(kind) => kind.as_str(),
            FailureCause::Validation => "validation",
            FailureCause::Timeout => "timeout",
            FailureCause::Cancelled => "cancelled",
            FailureCause::Task => "task",
        }
    }
}

/// Explicit per-scenario result value consumed uniformly by the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioOutcome {
    Success {
        latency_ms: f64,
    },
    Error {
        /// Present when the execution produced a measurable (or synthetic
        /// timeout) latency; absent for pre-response failures.
        latency_ms: Option<f64>,
        cause: FailureCause,
    },
}

impl ScenarioOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ScenarioOutcome::Success { .. })
    }

    pub fn latency_ms(&self) -> Option<f64> {
        match self {
            ScenarioOutcome::Success { latency_ms } => Some(*latency_ms),
            ScenarioOutcome::Error { latency_ms, .. } => *latency_ms,
        }
    }
}

/// Record of one scenario execution within a backend run.
#[derive(Debug, Clone)]
pub struct ExecutionRecord {
    pub scenario: String,
    pub outcome: ScenarioOutcome,
}

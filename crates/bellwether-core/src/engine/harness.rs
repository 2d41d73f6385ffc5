use crate::model::{
    BackendConfig, ExecutionRecord, FailureCause, PerformanceSnapshot, Scenario, ScenarioOutcome,
};
use crate::providers::llm::{GenerationRequest, LlmClient};
use crate::storage::store::MetricsStore;
use futures::StreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::time::timeout;

#[derive(Debug, Clone)]
pub struct HarnessSettings {
    /// Maximum in-flight scenario executions per backend.
    pub parallel: usize,
    /// Per-call upper bound; an elapsed timeout classifies the execution as
    /// an error with a synthetic latency equal to this value.
    pub timeout: Duration,
    /// Optional wall-clock budget for a whole backend run. In-flight
    /// executions are abandoned when it elapses; the partial aggregate is
    /// still persisted.
    pub deadline: Option<Duration>,
    /// Drive the streaming generation variant and trace first-fragment
    /// latency instead of a single blocking call.
    pub streaming: bool,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            parallel: 10,
            timeout: Duration::from_secs(30),
            deadline: None,
            streaming: false,
        }
    }
}

/// A backend paired with the client that talks to it.
pub struct BenchTarget {
    pub config: BackendConfig,
    pub client: Arc<dyn LlmClient>,
}

impl BenchTarget {
    pub fn new(config: BackendConfig) -> anyhow::Result<Self> {
        let client = crate::providers::llm::build_client(&config)?;
        Ok(Self { config, client })
    }

    pub fn with_client(config: BackendConfig, client: Arc<dyn LlmClient>) -> Self {
        Self { config, client }
    }
}

#[derive(Debug)]
pub struct BackendFailure {
    pub model_name: String,
    pub error: String,
}

/// Outcome of one harness invocation: every attempted backend appears in
/// exactly one of the two lists.
#[derive(Debug, Default)]
pub struct BenchReport {
    pub snapshots: Vec<PerformanceSnapshot>,
    pub failures: Vec<BackendFailure>,
}

pub struct BenchmarkHarness {
    pub store: MetricsStore,
    pub settings: HarnessSettings,
}

impl BenchmarkHarness {
    pub fn new(store: MetricsStore, settings: HarnessSettings) -> Self {
        Self { store, settings }
    }

    /// Run every scenario against every target, producing one snapshot per
    /// backend. Each snapshot is persisted before the next backend starts,
    /// so a crash mid-run leaves the earlier snapshots durable. A store
    /// write failure is fatal only to its own backend's run.
    pub async fn run(&self, targets: &[BenchTarget], scenarios: &[Scenario]) -> BenchReport {
        let mut report = BenchReport::default();
        for target in targets {
            let snapshot = self
                .run_backend(&target.config, target.client.clone(), scenarios)
                .await;
            match self.store.append(&snapshot) {
                Ok(_) => report.snapshots.push(snapshot),
                Err(e) => {
                    tracing::error!(
                        model = %target.config.model_name,
                        error = %e,
                        "failed to persist snapshot"
                    );
                    report.failures.push(BackendFailure {
                        model_name: target.config.model_name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        report
    }

    /// Execute the scenario set against one backend and aggregate the
    /// outcomes. Infallible: every execution resolves to an explicit
    /// success or error outcome, and a cancelled run still yields a
    /// (partial) snapshot.
    pub async fn run_backend(
        &self,
        config: &BackendConfig,
        client: Arc<dyn LlmClient>,
        scenarios: &[Scenario],
    ) -> PerformanceSnapshot {
        let timestamp = chrono::Utc::now().to_rfc3339();
        let started = Instant::now();
        let sem = Arc::new(Semaphore::new(self.settings.parallel.max(1)));

        let mut handles = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            let sem = sem.clone();
            let client = client.clone();
            let config = config.clone();
            let scenario = scenario.clone();
            let per_call = self.settings.timeout;
            let streaming = self.settings.streaming;
            let name = scenario.name.clone();
            let h = tokio::spawn(async move {
                let _permit = match sem.acquire_owned().await {
                    Ok(p) => p,
                    Err(_) => {
                        return ExecutionRecord {
                            scenario: scenario.name.clone(),
                            outcome: ScenarioOutcome::Error {
                                latency_ms: None,
                                cause: FailureCause::Task,
                            },
                        }
                    }
                };
                execute_scenario(&*client, &config, &scenario, per_call, streaming).await
            });
            handles.push((name, h));
        }

        let mut records = Vec::with_capacity(handles.len());
        match self.settings.deadline {
            None => {
                for (name, h) in handles {
                    records.push(join_record(name, h.await));
                }
            }
            Some(budget) => {
                let deadline = tokio::time::Instant::now() + budget;
                for (name, h) in handles {
                    let abort = h.abort_handle();
                    match tokio::time::timeout_at(deadline, h).await {
                        Ok(joined) => records.push(join_record(name, joined)),
                        Err(_) => {
                            abort.abort();
                            tracing::warn!(scenario = %name, "backend run deadline exceeded");
                            records.push(ExecutionRecord {
                                scenario: name,
                                outcome: ScenarioOutcome::Error {
                                    latency_ms: None,
                                    cause: FailureCause::Cancelled,
                                },
                            });
                        }
                    }
                }
            }
        }

        aggregate(
            &config.model_name,
            timestamp,
            &records,
            started.elapsed().as_secs_f64(),
        )
    }
}

fn join_record(
    scenario: String,
    joined: Result<ExecutionRecord, tokio::task::JoinError>,
) -> ExecutionRecord {
    match joined {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(scenario = %scenario, error = %e, "scenario task failed");
            ExecutionRecord {
                scenario,
                outcome: ScenarioOutcome::Error {
                    latency_ms: None,
                    cause: FailureCause::Task,
                },
            }
        }
    }
}

/// One isolated scenario execution. Failures are classified here and never
/// propagate past the returned record.
async fn execute_scenario(
    client: &dyn LlmClient,
    config: &BackendConfig,
    scenario: &Scenario,
    per_call: Duration,
    streaming: bool,
) -> ExecutionRecord {
    let req = GenerationRequest::from_config(config, scenario.prompt.clone());
    let start = Instant::now();

    let call = async {
        if streaming {
            collect_stream(client, &req, scenario, start).await
        } else {
            client.generate(&req).await
        }
    };

    let outcome = match timeout(per_call, call).await {
        Err(_) => {
            tracing::debug!(
                scenario = %scenario.name,
                timeout_ms = per_call.as_millis() as u64,
                "call timed out"
            );
            ScenarioOutcome::Error {
                latency_ms: Some(per_call.as_secs_f64() * 1000.0),
                cause: FailureCause::Timeout,
            }
        }
        Ok(Err(e)) => {
            tracing::debug!(
                scenario = %scenario.name,
                cause = e.kind.as_str(),
                "backend call failed: {}", e
            );
            ScenarioOutcome::Error {
                latency_ms: None,
                cause: FailureCause::Backend(e.kind),
            }
        }
        Ok(Ok(text)) => {
            let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
            if scenario.validation.passes(&text) {
                ScenarioOutcome::Success { latency_ms }
            } else {
                // A validation miss is not a transport fault; keep the two
                // distinguishable in diagnostics.
                tracing::debug!(
                    scenario = %scenario.name,
                    response_len = text.len(),
                    "response failed validation"
                );
                ScenarioOutcome::Error {
                    latency_ms: Some(latency_ms),
                    cause: FailureCause::Validation,
                }
            }
        }
    };

    ExecutionRecord {
        scenario: scenario.name.clone(),
        outcome,
    }
}

async fn collect_stream(
    client: &dyn LlmClient,
    req: &GenerationRequest,
    scenario: &Scenario,
    start: Instant,
) -> Result<String, crate::errors::BackendError> {
    let mut stream = client.generate_stream(req).await?;
    let mut text = String::new();
    let mut first_fragment = true;
    while let Some(fragment) = stream.next().await {
        let fragment = fragment?;
        if first_fragment {
            first_fragment = false;
            tracing::debug!(
                scenario = %scenario.name,
                first_byte_ms = start.elapsed().as_secs_f64() * 1000.0,
                "first fragment received"
            );
        }
        text.push_str(&fragment);
    }
    Ok(text)
}

/// Order-independent aggregation over the per-scenario outcomes.
///
/// The latency set covers executions with a measured (or synthetic timeout)
/// latency; pre-response failures stay out of it but still count toward the
/// totals. The error rate is derived from the success rate so the two sum
/// to exactly 100.
fn aggregate(
    model_name: &str,
    timestamp: String,
    records: &[ExecutionRecord],
    elapsed_s: f64,
) -> PerformanceSnapshot {
    let total = records.len() as u64;
    let success_count = records.iter().filter(|r| r.outcome.is_success()).count() as u64;

    let mut latencies: Vec<f64> = records.iter().filter_map(|r| r.outcome.latency_ms()).collect();
    latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let avg = if latencies.is_empty() {
        0.0
    } else {
        latencies.iter().sum::<f64>() / latencies.len() as f64
    };
    let median = match latencies.len() {
        0 => 0.0,
        n if n % 2 == 1 => latencies[n / 2],
        n => (latencies[n / 2 - 1] + latencies[n / 2]) / 2.0,
    };

    // Executions that yielded a full response: successes plus validation
    // misses. Timed-out and pre-response failures produced nothing.
    let completed = records
        .iter()
        .filter(|r| {
            matches!(
                r.outcome,
                ScenarioOutcome::Success { .. }
                    | ScenarioOutcome::Error {
                        cause: FailureCause::Validation,
                        ..
                    }
            )
        })
        .count();
    let avg_generation_rate = if elapsed_s > 0.0 {
        completed as f64 / elapsed_s
    } else {
        0.0
    };

    let (task_success_rate_pct, error_rate_pct) = if total == 0 {
        (0.0, 0.0)
    } else {
        let success = success_count as f64 * 100.0 / total as f64;
        (success, 100.0 - success)
    };

    PerformanceSnapshot {
        timestamp,
        model_name: model_name.to_string(),
        total_queries: total,
        avg_response_time_ms: avg,
        median_response_time_ms: median,
        avg_generation_rate,
        task_success_rate_pct,
        error_rate_pct,
        total_execution_time_s: elapsed_s,
    }
}

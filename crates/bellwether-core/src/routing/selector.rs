use crate::model::{BackendConfig, Complexity, SelectionRecord};
use crate::routing::audit::SelectionLogger;
use crate::scoring;
use crate::storage::store::MetricsStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Routes a task to the backend expected to perform best for its
/// complexity class, based on the latest stored snapshot per backend.
///
/// Read-only over the metrics store; the audit log is its only write.
pub struct ModelSelector {
    store: MetricsStore,
    /// Configured order doubles as the deterministic tie-break: on equal
    /// scores the earlier backend wins.
    backends: Vec<BackendConfig>,
    logger: SelectionLogger,
    rng: Mutex<StdRng>,
}

impl ModelSelector {
    pub fn new(store: MetricsStore, backends: Vec<BackendConfig>, logger: SelectionLogger) -> Self {
        Self {
            store,
            backends,
            logger,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Seeded variant so the no-history fallback is reproducible.
    pub fn with_seed(
        store: MetricsStore,
        backends: Vec<BackendConfig>,
        logger: SelectionLogger,
        seed: u64,
    ) -> Self {
        Self {
            store,
            backends,
            logger,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Pick the backend for one task invocation. Exactly one audit record
    /// is appended per call, on both the scored and the fallback branch;
    /// an audit write failure never blocks the decision.
    pub fn select(&self, task_description: &str, complexity: Complexity) -> anyhow::Result<String> {
        anyhow::ensure!(!self.backends.is_empty(), "no backends configured");

        let mut scored: Vec<(&BackendConfig, f64)> = Vec::new();
        for backend in &self.backends {
            if let Some(snapshot) = self.store.latest(&backend.model_name)? {
                scored.push((backend, scoring::score(&snapshot, complexity)));
            }
        }

        let selected = if scored.is_empty() {
            // No historical data anywhere: uniform random fallback.
            let idx = {
                let mut rng = self.rng.lock().unwrap();
                rng.gen_range(0..self.backends.len())
            };
            let model = self.backends[idx].model_name.clone();
            tracing::debug!(model = %model, "no snapshots available, random fallback");
            model
        } else {
            let mut best = &scored[0];
            for candidate in &scored[1..] {
                if candidate.1 > best.1 {
                    best = candidate;
                }
            }
            tracing::debug!(
                model = %best.0.model_name,
                score = best.1,
                complexity = complexity.as_str(),
                "selected highest-scoring backend"
            );
            best.0.model_name.clone()
        };

        let record = SelectionRecord {
            timestamp: chrono::Utc::now().to_rfc3339(),
            selected_model: selected.clone(),
            task_description: task_description.to_string(),
            task_complexity: complexity,
        };
        // Best-effort: the decision stands even if the audit target is
        // unwritable.
        if let Err(e) = self.logger.record(&record) {
            tracing::warn!(error = %e, "failed to append selection record");
        }

        Ok(selected)
    }
}

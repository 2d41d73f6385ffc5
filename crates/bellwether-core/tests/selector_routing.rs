use bellwether_core::model::{
    BackendConfig, BackendKind, Complexity, PerformanceSnapshot, SelectionRecord,
};
use bellwether_core::routing::audit::SelectionLogger;
use bellwether_core::routing::selector::ModelSelector;
use bellwether_core::storage::store::MetricsStore;
use std::collections::HashSet;
use tempfile::tempdir;

fn backend(model: &str) -> BackendConfig {
    BackendConfig {
        model_name: model.into(),
        kind: BackendKind::Openai,
        base_url: None,
        api_key: None,
        max_tokens: 500,
        temperature: 0.7,
        top_p: 1.0,
    }
}

fn snap(model: &str, rt: f64, gen: f64, succ: f64, err: f64) -> PerformanceSnapshot {
    PerformanceSnapshot {
        timestamp: "2025-06-01T00:00:00+00:00".into(),
        model_name: model.into(),
        total_queries: 4,
        avg_response_time_ms: rt,
        median_response_time_ms: rt,
        avg_generation_rate: gen,
        task_success_rate_pct: succ,
        error_rate_pct: err,
        total_execution_time_s: 1.0,
    }
}

fn store() -> MetricsStore {
    let store = MetricsStore::memory().unwrap();
    store.init_schema().unwrap();
    store
}

#[test]
fn empty_history_falls_back_within_configured_set() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let logger = SelectionLogger::new(dir.path().join("audit.jsonl"));
    let backends = vec![backend("a"), backend("b"), backend("c")];
    let selector = ModelSelector::with_seed(store(), backends, logger, 42);

    let allowed: HashSet<&str> = ["a", "b", "c"].into();
    let mut picks = Vec::new();
    for _ in 0..50 {
        let model = selector.select("summarize", Complexity::Low)?;
        assert!(allowed.contains(model.as_str()));
        picks.push(model);
    }

    // Same seed, fresh selector: the fallback sequence reproduces exactly.
    let dir2 = tempdir()?;
    let logger2 = SelectionLogger::new(dir2.path().join("audit.jsonl"));
    let backends = vec![backend("a"), backend("b"), backend("c")];
    let selector2 = ModelSelector::with_seed(store(), backends, logger2, 42);
    let replay: Vec<String> = (0..50)
        .map(|_| selector2.select("summarize", Complexity::Low).unwrap())
        .collect();
    assert_eq!(picks, replay);
    Ok(())
}

#[test]
fn highest_composite_score_wins() -> anyhow::Result<()> {
    let store = store();
    // The blend decides: C is not the most reliable pick on success rate
    // alone, but its latency and throughput carry it.
    store.append(&snap("model-a", 100.0, 80.0, 90.0, 5.0))?;
    store.append(&snap("model-b", 200.0, 60.0, 95.0, 2.0))?;
    store.append(&snap("model-c", 50.0, 90.0, 99.0, 1.0))?;

    let dir = tempdir()?;
    let logger = SelectionLogger::new(dir.path().join("audit.jsonl"));
    let backends = vec![backend("model-a"), backend("model-b"), backend("model-c")];
    let selector = ModelSelector::with_seed(store, backends, logger, 1);

    let model = selector.select("hard task", Complexity::High)?;
    assert_eq!(model, "model-c");
    Ok(())
}

#[test]
fn ties_break_by_configured_order() -> anyhow::Result<()> {
    let store = store();
    store.append(&snap("second", 100.0, 50.0, 80.0, 20.0))?;
    store.append(&snap("first", 100.0, 50.0, 80.0, 20.0))?;

    let dir = tempdir()?;
    let logger = SelectionLogger::new(dir.path().join("audit.jsonl"));
    let backends = vec![backend("first"), backend("second")];
    let selector = ModelSelector::with_seed(store, backends, logger, 1);

    assert_eq!(selector.select("task", Complexity::Medium)?, "first");
    Ok(())
}

#[test]
fn partial_history_scores_the_backends_that_have_it() -> anyhow::Result<()> {
    let store = store();
    store.append(&snap("covered", 100.0, 50.0, 80.0, 20.0))?;

    let dir = tempdir()?;
    let logger = SelectionLogger::new(dir.path().join("audit.jsonl"));
    let backends = vec![backend("uncovered"), backend("covered")];
    let selector = ModelSelector::with_seed(store, backends, logger, 1);

    assert_eq!(selector.select("task", Complexity::Medium)?, "covered");
    Ok(())
}

#[test]
fn every_invocation_appends_one_parsable_record() -> anyhow::Result<()> {
    let store = store();
    store.append(&snap("only", 100.0, 50.0, 80.0, 20.0))?;

    let dir = tempdir()?;
    let logger = SelectionLogger::new(dir.path().join("logs/audit.jsonl"));
    let backends = vec![backend("only")];
    let selector = ModelSelector::with_seed(store, backends, logger.clone(), 1);

    let calls = [
        ("write docs", Complexity::Low),
        ("generate code", Complexity::High),
        ("translate", Complexity::Extreme),
    ];
    for (desc, complexity) in calls {
        selector.select(desc, complexity)?;
    }

    let raw = std::fs::read_to_string(logger.path())?;
    let records: Vec<SelectionRecord> = raw
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(records.len(), calls.len());
    for (record, (desc, complexity)) in records.iter().zip(calls) {
        assert_eq!(record.selected_model, "only");
        assert_eq!(record.task_description, desc);
        assert_eq!(record.task_complexity, complexity);
    }
    Ok(())
}

#[test]
fn audit_failure_does_not_block_selection() -> anyhow::Result<()> {
    let store = store();
    store.append(&snap("only", 100.0, 50.0, 80.0, 20.0))?;

    let dir = tempdir()?;
    // The log path's parent is a plain file, so every append fails.
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "x")?;
    let logger = SelectionLogger::new(blocker.join("audit.jsonl"));

    let selector = ModelSelector::with_seed(store, vec![backend("only")], logger, 1);
    assert_eq!(selector.select("task", Complexity::Medium)?, "only");
    Ok(())
}

#[test]
fn no_backends_is_an_error() {
    let dir = tempdir().unwrap();
    let logger = SelectionLogger::new(dir.path().join("audit.jsonl"));
    let selector = ModelSelector::with_seed(store(), Vec::new(), logger, 1);
    assert!(selector.select("task", Complexity::Low).is_err());
}

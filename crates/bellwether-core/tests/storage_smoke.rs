use bellwether_core::model::PerformanceSnapshot;
use bellwether_core::storage::store::MetricsStore;
use tempfile::tempdir;

fn snap(model: &str, timestamp: &str, rt: f64) -> PerformanceSnapshot {
    PerformanceSnapshot {
        timestamp: timestamp.into(),
        model_name: model.into(),
        total_queries: 4,
        avg_response_time_ms: rt,
        median_response_time_ms: rt,
        avg_generation_rate: 2.0,
        task_success_rate_pct: 75.0,
        error_rate_pct: 25.0,
        total_execution_time_s: 2.0,
    }
}

#[test]
fn append_then_latest_round_trips() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let store = MetricsStore::open(&dir.path().join("metrics.db"))?;
    store.init_schema()?;

    let s = snap("gpt-3.5-turbo", "2025-03-01T12:00:00+00:00", 140.0);
    store.append(&s)?;

    let got = store.latest("gpt-3.5-turbo")?.expect("snapshot stored");
    assert_eq!(got, s);
    assert!(store.latest("unknown-model")?.is_none());
    Ok(())
}

#[test]
fn latest_picks_greatest_timestamp() -> anyhow::Result<()> {
    let store = MetricsStore::memory()?;
    store.init_schema()?;

    store.append(&snap("m", "2025-01-01T00:00:00+00:00", 100.0))?;
    store.append(&snap("m", "2025-02-01T00:00:00+00:00", 200.0))?;
    store.append(&snap("m", "2025-01-15T00:00:00+00:00", 300.0))?;

    let latest = store.latest("m")?.unwrap();
    assert_eq!(latest.avg_response_time_ms, 200.0);
    Ok(())
}

#[test]
fn history_is_ascending_and_filterable() -> anyhow::Result<()> {
    let store = MetricsStore::memory()?;
    store.init_schema()?;

    store.append(&snap("a", "2025-01-02T00:00:00+00:00", 2.0))?;
    store.append(&snap("b", "2025-01-01T00:00:00+00:00", 1.0))?;
    store.append(&snap("a", "2025-01-03T00:00:00+00:00", 3.0))?;

    let all = store.history(None)?;
    let stamps: Vec<&str> = all.iter().map(|s| s.timestamp.as_str()).collect();
    assert_eq!(
        stamps,
        vec![
            "2025-01-01T00:00:00+00:00",
            "2025-01-02T00:00:00+00:00",
            "2025-01-03T00:00:00+00:00"
        ]
    );

    let only_a = store.history(Some("a"))?;
    assert_eq!(only_a.len(), 2);
    assert!(only_a.iter().all(|s| s.model_name == "a"));
    assert!(only_a[0].timestamp < only_a[1].timestamp);
    Ok(())
}

#[test]
fn init_schema_is_idempotent() -> anyhow::Result<()> {
    let store = MetricsStore::memory()?;
    store.init_schema()?;
    store.init_schema()?;
    store.append(&snap("m", "2025-01-01T00:00:00+00:00", 1.0))?;
    assert_eq!(store.count()?, 1);
    Ok(())
}

#[test]
fn concurrent_appends_lose_nothing() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let store = MetricsStore::open(&dir.path().join("metrics.db"))?;
    store.init_schema()?;

    let mut handles = Vec::new();
    for t in 0..8 {
        let store = store.clone();
        handles.push(std::thread::spawn(move || -> anyhow::Result<()> {
            for i in 0..25 {
                let ts = format!("2025-01-01T00:{:02}:{:02}+00:00", t, i);
                store.append(&snap(&format!("model-{}", t), &ts, i as f64))?;
            }
            Ok(())
        }));
    }
    for h in handles {
        h.join().unwrap()?;
    }

    assert_eq!(store.count()?, 8 * 25);
    for t in 0..8 {
        let history = store.history(Some(&format!("model-{}", t)))?;
        assert_eq!(history.len(), 25);
    }
    Ok(())
}

use crate::model::PerformanceSnapshot;
use anyhow::Context;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Append-only store for benchmark snapshots.
///
/// The connection mutex serializes writes, so concurrent appends from
/// multiple backend runs land as whole rows in some order. Nothing ever
/// updates or deletes a metrics row.
#[derive(Clone)]
pub struct MetricsStore {
    conn: Arc<Mutex<Connection>>,
}

impl MetricsStore {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path).context("failed to open sqlite db")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory sqlite db")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn init_schema(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(crate::storage::schema::DDL)?;
        Ok(())
    }

    /// Durable single-row write. Returns the rowid of the new snapshot.
    pub fn append(&self, snapshot: &PerformanceSnapshot) -> anyhow::Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO performance_metrics(
                timestamp, model_name, total_queries,
                avg_response_time_ms, median_response_time_ms,
                avg_generation_rate, task_success_rate_pct,
                error_rate_pct, total_execution_time_s)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                snapshot.timestamp,
                snapshot.model_name,
                snapshot.total_queries as i64,
                snapshot.avg_response_time_ms,
                snapshot.median_response_time_ms,
                snapshot.avg_generation_rate,
                snapshot.task_success_rate_pct,
                snapshot.error_rate_pct,
                snapshot.total_execution_time_s,
            ],
        )
        .context("failed to append snapshot")?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recent snapshot for a model, by timestamp with rowid as the
    /// tie-break for same-timestamp appends.
    pub fn latest(&self, model_name: &str) -> anyhow::Result<Option<PerformanceSnapshot>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT timestamp, model_name, total_queries,
                    avg_response_time_ms, median_response_time_ms,
                    avg_generation_rate, task_success_rate_pct,
                    error_rate_pct, total_execution_time_s
             FROM performance_metrics
             WHERE model_name = ?1
             ORDER BY timestamp DESC, id DESC
             LIMIT 1",
        )?;
        let mut rows = stmt.query(params![model_name])?;
        if let Some(row) = rows.next()? {
            Ok(Some(snapshot_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// All snapshots in ascending timestamp order, optionally filtered by
    /// model. Used by history reporting consumers.
    pub fn history(&self, model_name: Option<&str>) -> anyhow::Result<Vec<PerformanceSnapshot>> {
        let conn = self.conn.lock().unwrap();
        let base = "SELECT timestamp, model_name, total_queries,
                    avg_response_time_ms, median_response_time_ms,
                    avg_generation_rate, task_success_rate_pct,
                    error_rate_pct, total_execution_time_s
             FROM performance_metrics";

        let mut out = Vec::new();
        match model_name {
            Some(model) => {
                let mut stmt = conn.prepare(&format!(
                    "{} WHERE model_name = ?1 ORDER BY timestamp ASC, id ASC",
                    base
                ))?;
                let rows = stmt.query_map(params![model], snapshot_from_row)?;
                for r in rows {
                    out.push(r?);
                }
            }
            None => {
                let mut stmt =
                    conn.prepare(&format!("{} ORDER BY timestamp ASC, id ASC", base))?;
                let rows = stmt.query_map([], snapshot_from_row)?;
                for r in rows {
                    out.push(r?);
                }
            }
        }
        Ok(out)
    }

    pub fn count(&self) -> anyhow::Result<i64> {
        let conn = self.conn.lock().unwrap();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM performance_metrics", [], |r| r.get(0))?;
        Ok(n)
    }
}

fn snapshot_from_row(row: &Row<'_>) -> rusqlite::Result<PerformanceSnapshot> {
    Ok(PerformanceSnapshot {
        timestamp: row.get(0)?,
        model_name: row.get(1)?,
        total_queries: row.get::<_, i64>(2)? as u64,
        avg_response_time_ms: row.get(3)?,
        median_response_time_ms: row.get(4)?,
        avg_generation_rate: row.get(5)?,
        task_success_rate_pct: row.get(6)?,
        error_rate_pct: row.get(7)?,
        total_execution_time_s: row.get(8)?,
    })
}

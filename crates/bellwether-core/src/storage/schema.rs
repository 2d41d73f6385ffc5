pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS performance_metrics (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  timestamp TEXT NOT NULL,
  model_name TEXT NOT NULL,
  total_queries INTEGER NOT NULL,
  avg_response_time_ms REAL NOT NULL,
  median_response_time_ms REAL NOT NULL,
  avg_generation_rate REAL NOT NULL,
  task_success_rate_pct REAL NOT NULL,
  error_rate_pct REAL NOT NULL,
  total_execution_time_s REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_metrics_model_ts
  ON performance_metrics(model_name, timestamp);
"#;

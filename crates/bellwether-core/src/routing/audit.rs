use crate::model::SelectionRecord;
use anyhow::Context;
use std::io::Write;
use std::path::PathBuf;

/// Append-only JSONL audit log of routing decisions.
#[derive(Debug, Clone)]
pub struct SelectionLogger {
    path: PathBuf,
}

impl SelectionLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Append one newline-delimited record. Parent directory creation is
    /// idempotent. Errors are returned to the caller; the selector treats
    /// them as non-fatal.
    pub fn record(&self, entry: &SelectionRecord) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        let line = serde_json::to_string(entry)?;
        writeln!(file, "{}", line)
            .with_context(|| format!("failed to append to {}", self.path.display()))?;
        Ok(())
    }
}

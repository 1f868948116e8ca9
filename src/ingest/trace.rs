use std::time::Duration;

use super::error::{RowRejection, StrategyError};
use super::Strategy;

/// A source row that did not become a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    /// Zero-based row (table) or line (flat export, header = 0) index.
    pub row: usize,
    pub reason: RowRejection,
}

/// One strategy attempt within an ingestion cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyAttempt {
    pub strategy: Strategy,
    /// Number of records produced, or why the attempt failed.
    pub result: Result<usize, StrategyError>,
    pub rejected: Vec<RejectedRow>,
    pub elapsed: Duration,
}

impl StrategyAttempt {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Developer-facing record of an ingestion cycle. Never part of the rendered
/// calendar itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticTrace {
    pub attempts: Vec<StrategyAttempt>,
    pub warnings: Vec<String>,
}

impl DiagnosticTrace {
    pub fn attempt(&self, strategy: Strategy) -> Option<&StrategyAttempt> {
        self.attempts.iter().find(|a| a.strategy == strategy)
    }

    pub fn failures(&self) -> impl Iterator<Item = (Strategy, &StrategyError)> {
        self.attempts
            .iter()
            .filter_map(|a| a.result.as_ref().err().map(|e| (a.strategy, e)))
    }

    /// Multi-line summary for a debug panel.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for a in &self.attempts {
            let line = match &a.result {
                Ok(n) => format!("{}: {n} records", a.strategy),
                Err(e) => format!("{}: failed ({e})", a.strategy),
            };
            out.push_str(&line);
            if !a.rejected.is_empty() {
                out.push_str(&format!(", {} rows skipped", a.rejected.len()));
            }
            out.push('\n');
        }
        for w in &self.warnings {
            out.push_str("warning: ");
            out.push_str(w);
            out.push('\n');
        }
        out
    }
}

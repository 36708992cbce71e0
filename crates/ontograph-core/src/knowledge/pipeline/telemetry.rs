//! Per-file failure events and the run report.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pipeline stage a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Discover,
    Read,
    Parse,
    Extract,
    Resolve,
    Emit,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Discover => "discover",
            Stage::Read => "read",
            Stage::Parse => "parse",
            Stage::Extract => "extract",
            Stage::Resolve => "resolve",
            Stage::Emit => "emit",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A per-file failure. The run records it and carries on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEvent {
    pub path: String,
    pub stage: Stage,
    pub reason: String,
}

impl FailureEvent {
    pub fn new(path: impl Into<String>, stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            stage,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FailureEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.stage, self.path, self.reason)
    }
}

/// Summary of one completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub repository_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Classified files, ignored ones excluded.
    pub files: usize,
    pub ignored: usize,
    pub parsed: usize,
    pub parse_failed: usize,
    pub entities: usize,
    pub edges: usize,
    pub ambiguities: usize,
    /// Records written to the sink.
    pub emitted: usize,
    pub failures: Vec<FailureEvent>,
    pub failures_by_stage: BTreeMap<Stage, usize>,
}

impl RunReport {
    pub fn new(repository_id: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            repository_id: repository_id.into(),
            started_at: Utc::now(),
            finished_at: None,
            files: 0,
            ignored: 0,
            parsed: 0,
            parse_failed: 0,
            entities: 0,
            edges: 0,
            ambiguities: 0,
            emitted: 0,
            failures: Vec::new(),
            failures_by_stage: BTreeMap::new(),
        }
    }

    /// Record a failure, logging it.
    pub fn record(&mut self, event: FailureEvent) {
        tracing::warn!(path = %event.path, stage = %event.stage, "{}", event.reason);
        *self.failures_by_stage.entry(event.stage).or_default() += 1;
        self.failures.push(event);
    }

    pub fn record_all(&mut self, events: impl IntoIterator<Item = FailureEvent>) {
        for event in events {
            self.record(event);
        }
    }

    pub fn failures_in(&self, stage: Stage) -> usize {
        self.failures_by_stage.get(&stage).copied().unwrap_or(0)
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration, once finished.
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }
}

//! Structured stage records for external observability panels.
//!
//! Every meaningful dispatch / derive / navigate decision produces one
//! [`StageRecord`]. Records are logged through `tracing`, kept in a bounded
//! ring for later inspection and forwarded to registered sinks.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;

/// Ring size when none is configured.
pub const DEFAULT_DIAGNOSTICS_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Pass,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageRecord {
    pub stage: String,
    pub status: StageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl StageRecord {
    pub fn pass(stage: impl Into<String>, details: Option<Value>) -> Self {
        Self {
            stage: stage.into(),
            status: StageStatus::Pass,
            details,
        }
    }

    pub fn fail(stage: impl Into<String>, details: Option<Value>) -> Self {
        Self {
            stage: stage.into(),
            status: StageStatus::Fail,
            details,
        }
    }

    pub fn is_fail(&self) -> bool {
        self.status == StageStatus::Fail
    }
}

/// Receiver of stage records (dev panels, test probes).
pub trait DiagnosticsSink: Send + Sync {
    fn record(&self, record: &StageRecord);
}

#[derive(Clone)]
pub struct Diagnostics {
    inner: Arc<DiagnosticsInner>,
}

struct DiagnosticsInner {
    ring: StageRingBuffer,
    sinks: RwLock<Vec<Arc<dyn DiagnosticsSink>>>,
}

impl Diagnostics {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(DiagnosticsInner {
                ring: StageRingBuffer::new(capacity),
                sinks: RwLock::new(Vec::new()),
            }),
        }
    }

    pub fn add_sink(&self, sink: Arc<dyn DiagnosticsSink>) {
        self.inner.sinks.write().push(sink);
    }

    pub fn emit(&self, record: StageRecord) {
        match record.status {
            StageStatus::Pass => tracing::debug!(
                stage = %record.stage,
                details = ?record.details,
                "stage pass"
            ),
            StageStatus::Fail => tracing::warn!(
                stage = %record.stage,
                details = ?record.details,
                "stage fail"
            ),
        }

        let sinks = self.inner.sinks.read().clone();
        for sink in &sinks {
            sink.record(&record);
        }
        self.inner.ring.push(record);
    }

    pub fn pass(&self, stage: &str, details: Option<Value>) {
        self.emit(StageRecord::pass(stage, details));
    }

    pub fn fail(&self, stage: &str, details: Option<Value>) {
        self.emit(StageRecord::fail(stage, details));
    }

    /// Retained records, oldest first.
    pub fn records(&self) -> Vec<StageRecord> {
        self.inner.ring.snapshot()
    }

    /// Retained records for one stage.
    pub fn records_for(&self, stage: &str) -> Vec<StageRecord> {
        self.records()
            .into_iter()
            .filter(|record| record.stage == stage)
            .collect()
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(DEFAULT_DIAGNOSTICS_CAPACITY)
    }
}

struct StageRingBuffer {
    capacity: usize,
    records: RwLock<VecDeque<StageRecord>>,
}

impl StageRingBuffer {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }

    fn push(&self, record: StageRecord) {
        let mut records = self.records.write();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    fn snapshot(&self) -> Vec<StageRecord> {
        self.records.read().iter().cloned().collect()
    }
}

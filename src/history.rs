//! Per-device exchange history for diagnostics.

use std::collections::VecDeque;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::protocol::PilotMethod;

/// How one exchange ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Reply,
    Absent,
    Failed,
}

/// A recorded exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub method: PilotMethod,
    pub outcome: Outcome,
    /// Params sent for `setPilot`, or the result received for `getPilot`.
    pub message: Option<Value>,
    /// Seconds since history creation
    pub timestamp: f64,
}

/// Bounded log of the exchanges made for one device.
#[derive(Debug, Clone)]
pub struct MessageHistory {
    entries: VecDeque<HistoryEntry>,
    replies: usize,
    absences: usize,
    failures: usize,
    last_error: Option<String>,
    start_time: Instant,
    max_entries: usize,
}

impl Default for MessageHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageHistory {
    pub const DEFAULT_MAX_ENTRIES: usize = 100;

    pub fn new() -> Self {
        Self::with_max_entries(Self::DEFAULT_MAX_ENTRIES)
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            replies: 0,
            absences: 0,
            failures: 0,
            last_error: None,
            start_time: Instant::now(),
            max_entries,
        }
    }

    pub fn record(&mut self, method: PilotMethod, outcome: Outcome, message: Option<Value>) {
        match outcome {
            Outcome::Reply => self.replies += 1,
            Outcome::Absent => self.absences += 1,
            Outcome::Failed => self.failures += 1,
        }

        self.entries.push_back(HistoryEntry {
            method,
            outcome,
            message,
            timestamp: self.start_time.elapsed().as_secs_f64(),
        });
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }

    pub fn record_error(&mut self, method: PilotMethod, error: &str) {
        self.record(method, Outcome::Failed, None);
        self.last_error = Some(error.to_string());
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.replies = 0;
        self.absences = 0;
        self.failures = 0;
        self.last_error = None;
    }

    pub fn summary(&self) -> HistorySummary {
        HistorySummary {
            reply_count: self.replies,
            absent_count: self.absences,
            failure_count: self.failures,
            total_entries: self.entries.len(),
            last_error: self.last_error.clone(),
        }
    }
}

/// Counters survive eviction of old entries; `total_entries` does not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub reply_count: usize,
    pub absent_count: usize,
    pub failure_count: usize,
    pub total_entries: usize,
    pub last_error: Option<String>,
}

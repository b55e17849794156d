use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::decision::{Action, Provenance};

/// How many evaluations are kept for inspection
pub const RECENT_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub asset: String,
    pub action: Action,
    pub confidence: u8,
    pub provenance: Provenance,
    pub permitted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStats {
    pub evaluations: u64,
    pub strict: u64,
    pub repaired: u64,
    pub partial: u64,
    pub fallback: u64,
    pub permitted: u64,
    pub denied: u64,
    pub executions_recorded: u64,
}

impl AuditStats {
    pub fn count_for(&self, provenance: Provenance) -> u64 {
        match provenance {
            Provenance::Strict => self.strict,
            Provenance::Repaired => self.repaired,
            Provenance::Partial => self.partial,
            Provenance::Fallback => self.fallback,
        }
    }

    /// Share of evaluations that needed anything beyond a strict parse
    pub fn degraded_ratio(&self) -> f64 {
        if self.evaluations == 0 {
            return 0.0;
        }
        (self.evaluations - self.strict) as f64 / self.evaluations as f64
    }
}

/// Running tally of pipeline outcomes
#[derive(Debug, Default)]
pub struct AuditTracker {
    stats: AuditStats,
    recent: VecDeque<AuditEntry>,
}

impl AuditTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_evaluation(&mut self, entry: AuditEntry) {
        self.stats.evaluations += 1;
        match entry.provenance {
            Provenance::Strict => self.stats.strict += 1,
            Provenance::Repaired => self.stats.repaired += 1,
            Provenance::Partial => self.stats.partial += 1,
            Provenance::Fallback => self.stats.fallback += 1,
        }
        if entry.permitted {
            self.stats.permitted += 1;
        } else {
            self.stats.denied += 1;
        }

        if self.recent.len() == RECENT_CAPACITY {
            self.recent.pop_front();
        }
        self.recent.push_back(entry);
    }

    pub fn record_execution(&mut self) {
        self.stats.executions_recorded += 1;
    }

    pub fn stats(&self) -> AuditStats {
        self.stats.clone()
    }

    /// Most recent evaluations, oldest first
    pub fn recent(&self) -> Vec<AuditEntry> {
        self.recent.iter().cloned().collect()
    }
}

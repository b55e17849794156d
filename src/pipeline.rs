use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use crate::analytics::{AuditEntry, AuditStats, AuditTracker};
use crate::decision::{parse_response, Decision};
use crate::gating::{Admission, CooldownGate};

/// Final verdict for one advisor response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub decision: Decision,
    pub permitted: bool,
    pub deny_reason: Option<String>,
}

/// Parses advisor responses and checks BUY/SELL decisions against the cooldown gate.
///
/// Evaluating never arms the cooldown. The host calls
/// [`DecisionPipeline::record_execution`] once an order has actually filled.
pub struct DecisionPipeline {
    gate: Arc<CooldownGate>,
    audit: Mutex<AuditTracker>,
}

impl DecisionPipeline {
    pub fn new(gate: Arc<CooldownGate>) -> Self {
        Self {
            gate,
            audit: Mutex::new(AuditTracker::new()),
        }
    }

    pub fn gate(&self) -> &CooldownGate {
        &self.gate
    }

    pub fn evaluate(&self, raw_text: &str, asset: &str, now: DateTime<Utc>) -> Evaluation {
        // 1. Parse (never fails, provenance records the tier)
        let decision = parse_response(raw_text);

        // 2. HOLD is always permitted, trades go through the gate
        let admission = if decision.action.is_trade() {
            self.gate.can_trade(asset, now)
        } else {
            Admission::Allowed
        };

        let permitted = admission.is_allowed();
        let deny_reason = admission.into_reason();

        match &deny_reason {
            Some(reason) => info!(
                "🚫 {} on {} not permitted: {}",
                decision.action, asset, reason
            ),
            None => debug!(
                "✅ {} on {} permitted ({}, confidence {})",
                decision.action, asset, decision.provenance, decision.confidence
            ),
        }

        self.audit().record_evaluation(AuditEntry {
            timestamp: now,
            asset: asset.to_string(),
            action: decision.action,
            confidence: decision.confidence,
            provenance: decision.provenance,
            permitted,
        });

        // A denied decision is returned as parsed, not downgraded to HOLD
        Evaluation {
            decision,
            permitted,
            deny_reason,
        }
    }

    /// Arm the cooldown after an order for `asset` executed
    pub fn record_execution(&self, asset: &str, now: DateTime<Utc>) {
        self.gate.record_trade(asset, now);
        self.audit().record_execution();
    }

    pub fn audit_stats(&self) -> AuditStats {
        self.audit().stats()
    }

    pub fn recent_evaluations(&self) -> Vec<AuditEntry> {
        self.audit().recent()
    }

    fn audit(&self) -> MutexGuard<'_, AuditTracker> {
        // Counters stay usable even if a holder panicked
        self.audit.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

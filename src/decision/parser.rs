use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::decision::extract;
use crate::decision::types::{
    clamp_confidence, Action, Decision, DecisionDraft, Provenance, RiskLevel,
};

const FENCE: &str = "```";

/// Confidence reported when nothing usable could be recovered
pub const FALLBACK_CONFIDENCE: u8 = 50;
pub const PARSE_FAILED_NOTE: &str = "Failed to parse advisor response, defaulting to HOLD";
pub const NO_REASONING_NOTE: &str = "No reasoning provided by advisor";

/// Why a parsing tier did not produce a draft
#[derive(Debug, thiserror::Error)]
pub enum TierFailure {
    #[error("no JSON object delimiters found")]
    NoJsonObject,
    #[error("malformed JSON: {0}")]
    Syntax(#[from] serde_json::Error),
    #[error("no missing separator to repair")]
    NothingToRepair,
    #[error("top-level JSON value is not an object")]
    NotAnObject,
    #[error("missing action/decision field")]
    MissingAction,
    #[error("unrecognised action {0:?}")]
    UnknownAction(String),
    #[error("missing or non-numeric confidence")]
    MissingConfidence,
    #[error("action and confidence not found in free text")]
    MissingFields,
}

/// Result of running the tier chain, tagged by the tier that won
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Strict(DecisionDraft),
    Repaired(DecisionDraft),
    Partial(DecisionDraft),
    Fallback,
}

impl ParseOutcome {
    pub fn provenance(&self) -> Provenance {
        match self {
            ParseOutcome::Strict(_) => Provenance::Strict,
            ParseOutcome::Repaired(_) => Provenance::Repaired,
            ParseOutcome::Partial(_) => Provenance::Partial,
            ParseOutcome::Fallback => Provenance::Fallback,
        }
    }

    pub fn into_decision(self) -> Decision {
        let provenance = self.provenance();
        let draft = match self {
            ParseOutcome::Strict(d) | ParseOutcome::Repaired(d) | ParseOutcome::Partial(d) => d,
            ParseOutcome::Fallback => fallback_draft(),
        };
        draft.into_decision(provenance)
    }
}

/// Turn an untrusted advisor response into a decision. Never fails; the
/// returned provenance says how much of the response could be trusted.
pub fn parse_response(raw: &str) -> Decision {
    let outcome = classify(raw);
    let decision = outcome.into_decision();

    match decision.provenance {
        Provenance::Strict => debug!(
            "🧾 Advisor response parsed (STRICT): {} @ {}",
            decision.action, decision.confidence
        ),
        Provenance::Repaired => info!(
            "🩹 Advisor response repaired (REPAIRED): {} @ {}",
            decision.action, decision.confidence
        ),
        Provenance::Partial => warn!(
            "⚠️ Advisor response only partially parsed (PARTIAL): {} @ {}",
            decision.action, decision.confidence
        ),
        Provenance::Fallback => warn!("⚠️ Advisor response unparseable (FALLBACK), defaulting to HOLD"),
    }

    decision
}

/// Run the tiers in order and report which one succeeded
pub fn classify(raw: &str) -> ParseOutcome {
    let normalized = normalize(raw);

    // 1. Strict parse, then a single repair attempt if the JSON was malformed
    match strict_tier(normalized) {
        Ok(draft) => return ParseOutcome::Strict(draft),
        Err(TierFailure::Syntax(e)) => {
            debug!("Strict parse failed ({}), attempting repair", e);
            match repaired_tier(normalized) {
                Ok(draft) => return ParseOutcome::Repaired(draft),
                Err(e) => debug!("Repair tier failed: {}", e),
            }
        }
        Err(e) => debug!("Strict tier rejected response: {}", e),
    }

    // 2. Field-by-field extraction from the untouched input
    match extract::partial_tier(raw) {
        Ok(draft) => ParseOutcome::Partial(draft),
        Err(e) => {
            debug!("Partial tier failed: {}", e);
            ParseOutcome::Fallback
        }
    }
}

/// Strip leading/trailing code fences (with optional language tag) and
/// surrounding whitespace. Idempotent.
pub fn normalize(raw: &str) -> &str {
    let mut text = raw.trim();
    loop {
        let before = text.len();
        if let Some(rest) = text.strip_prefix(FENCE) {
            text = strip_language_tag(rest).trim_start();
        }
        if let Some(rest) = text.strip_suffix(FENCE) {
            text = rest.trim_end();
        }
        if text.len() == before {
            return text;
        }
    }
}

/// A tag only counts when it runs up to a line break or the end of the text,
/// so "```{" or "```BUY now" keep their content.
fn strip_language_tag(text: &str) -> &str {
    let tag_len = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+' | '.')))
        .unwrap_or(text.len());
    if tag_len == 0 {
        return text;
    }
    let rest = &text[tag_len..];
    match rest.chars().next() {
        None => rest,
        Some(c) if c == '\n' || c == '\r' => rest,
        _ => text,
    }
}

/// Slice from the first `{` to the last `}`, if they are in that order
pub fn delimit(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Insert a comma after every `]` or `}` that is followed, past any
/// whitespace, by a `"`. Only acts outside string literals. Returns `None`
/// when nothing needed inserting.
pub fn repair_missing_commas(json: &str) -> Option<String> {
    let mut out = String::with_capacity(json.len() + 8);
    let mut in_string = false;
    let mut escaped = false;
    let mut inserted = 0usize;

    for (i, ch) in json.char_indices() {
        out.push(ch);

        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            ']' | '}' => {
                if json[i + 1..].trim_start().starts_with('"') {
                    out.push(',');
                    inserted += 1;
                }
            }
            _ => {}
        }
    }

    (inserted > 0).then_some(out)
}

fn strict_tier(normalized: &str) -> Result<DecisionDraft, TierFailure> {
    let body = delimit(normalized).ok_or(TierFailure::NoJsonObject)?;
    let value: Value = serde_json::from_str(body)?;
    validate(&value)
}

fn repaired_tier(normalized: &str) -> Result<DecisionDraft, TierFailure> {
    let body = delimit(normalized).ok_or(TierFailure::NoJsonObject)?;
    let repaired = repair_missing_commas(body).ok_or(TierFailure::NothingToRepair)?;
    let value: Value = serde_json::from_str(&repaired)?;
    validate(&value)
}

/// Check the fields the decision cannot do without and default the rest
fn validate(value: &Value) -> Result<DecisionDraft, TierFailure> {
    let fields = value.as_object().ok_or(TierFailure::NotAnObject)?;

    let raw_action = ["action", "decision"]
        .iter()
        .find_map(|key| fields.get(*key).and_then(Value::as_str))
        .ok_or(TierFailure::MissingAction)?;
    let action: Action = raw_action
        .parse()
        .map_err(|_| TierFailure::UnknownAction(raw_action.to_string()))?;

    let confidence = fields
        .get("confidence")
        .and_then(Value::as_f64)
        .map(clamp_confidence)
        .ok_or(TierFailure::MissingConfidence)?;

    let risk_assessment = fields
        .get("risk_assessment")
        .and_then(Value::as_str)
        .map(RiskLevel::parse_or_default)
        .unwrap_or_default();

    Ok(DecisionDraft {
        action,
        confidence,
        reasoning: reasoning_from(fields),
        risk_assessment,
    })
}

fn reasoning_from(fields: &Map<String, Value>) -> Vec<String> {
    let mut reasoning: Vec<String> = match fields.get("reasoning") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    };

    if reasoning.is_empty() {
        reasoning.push(NO_REASONING_NOTE.to_string());
    }
    reasoning
}

fn fallback_draft() -> DecisionDraft {
    DecisionDraft {
        action: Action::Hold,
        confidence: FALLBACK_CONFIDENCE,
        reasoning: vec![PARSE_FAILED_NOTE.to_string()],
        risk_assessment: RiskLevel::Medium,
    }
}

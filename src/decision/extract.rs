//! Field-by-field recovery for responses that never parse as JSON.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::decision::parser::TierFailure;
use crate::decision::types::{clamp_confidence, Action, DecisionDraft, RiskLevel};

pub const PARTIAL_NOTE: &str = "Partial extraction: advisor response was not valid JSON";

/// `"action": "buy"`, `decision = SELL`, `'action':'hold'`
static KEYED_ACTION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(?:action|decision)\b["']?\s*[:=]\s*["']?(buy|sell|hold)\b"#)
        .expect("Invalid keyed action regex")
});

/// Any standalone action word in free text
static BARE_ACTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(buy|sell|hold)\b").expect("Invalid bare action regex"));

static CONFIDENCE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bconfidence\b["']?\s*[:=]?\s*["']?(-?\d+(?:\.\d+)?(?:[eE][+-]?\d+)?)"#)
        .expect("Invalid confidence regex")
});

static RISK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\brisk_assessment\b["']?\s*[:=]\s*["']?([A-Za-z]+)"#)
        .expect("Invalid risk regex")
});

/// A bracketed list of quoted strings; brackets inside the quotes belong to the strings
static REASONING_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\breasoning\b["']?\s*[:=]\s*\[\s*((?:"(?:[^"\\]|\\.)*"\s*,?\s*)*)\]"#)
        .expect("Invalid reasoning regex")
});

static QUOTED_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""((?:[^"\\]|\\.)*)""#).expect("Invalid quoted string regex"));

/// Scan raw text for each field independently. Needs at least an action and
/// a confidence; everything else is defaulted.
pub fn partial_tier(raw: &str) -> Result<DecisionDraft, TierFailure> {
    let action = extract_action(raw).ok_or(TierFailure::MissingFields)?;
    let confidence = extract_confidence(raw).ok_or(TierFailure::MissingFields)?;

    let risk_assessment = RISK_PATTERN
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| RiskLevel::parse_or_default(m.as_str()))
        .unwrap_or_default();

    let mut reasoning = extract_reasoning(raw);
    if reasoning.is_empty() {
        reasoning.push(PARTIAL_NOTE.to_string());
    }

    Ok(DecisionDraft {
        action,
        confidence,
        reasoning,
        risk_assessment,
    })
}

pub fn extract_action(raw: &str) -> Option<Action> {
    KEYED_ACTION_PATTERN
        .captures(raw)
        .or_else(|| BARE_ACTION_PATTERN.captures(raw))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn extract_confidence(raw: &str) -> Option<u8> {
    CONFIDENCE_PATTERN
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(clamp_confidence)
}

pub fn extract_reasoning(raw: &str) -> Vec<String> {
    let Some(list) = REASONING_PATTERN.captures(raw).and_then(|caps| caps.get(1)) else {
        return Vec::new();
    };

    QUOTED_PATTERN
        .captures_iter(list.as_str())
        .filter_map(|caps| caps.get(1))
        .map(|m| unescape(m.as_str()))
        .filter(|s| !s.trim().is_empty())
        .collect()
}

/// Decode JSON escapes, keeping the raw text if they are malformed
fn unescape(inner: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{}\"", inner)).unwrap_or_else(|_| inner.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_text_extraction() {
        let raw = "After review I'd say BUY. Confidence: 78%. Nothing else to add.";
        let draft = partial_tier(raw).unwrap();
        assert_eq!(draft.action, Action::Buy);
        assert_eq!(draft.confidence, 78);
        assert_eq!(draft.risk_assessment, RiskLevel::Medium);
        assert_eq!(draft.reasoning, vec![PARTIAL_NOTE.to_string()]);
    }

    #[test]
    fn test_keyed_action_preferred_over_prose() {
        let raw = r#"I would not sell here. "decision": "hold", "confidence": 55"#;
        assert_eq!(extract_action(raw), Some(Action::Hold));
    }

    #[test]
    fn test_confidence_clamped() {
        assert_eq!(extract_confidence("confidence = 250"), Some(100));
        assert_eq!(extract_confidence("\"confidence\": -3"), Some(0));
        assert_eq!(extract_confidence("no number here"), None);
    }

    #[test]
    fn test_reasoning_and_risk_recovered() {
        let raw = r#"{"decision": "SELL" "confidence": 61, "reasoning": ["rsi \"hot\"", "volume drop"], "risk_assessment": "high""#;
        let draft = partial_tier(raw).unwrap();
        assert_eq!(draft.action, Action::Sell);
        assert_eq!(draft.confidence, 61);
        assert_eq!(
            draft.reasoning,
            vec!["rsi \"hot\"".to_string(), "volume drop".to_string()]
        );
        assert_eq!(draft.risk_assessment, RiskLevel::High);
    }

    #[test]
    fn test_exponent_confidence_is_clamped() {
        // Too large for serde_json, so this only ever reaches the extraction tier
        let draft = partial_tier(r#"{"action":"BUY","confidence":1e400}"#).unwrap();
        assert_eq!(draft.action, Action::Buy);
        assert_eq!(draft.confidence, 100);

        assert_eq!(extract_confidence("confidence: 8.5e1"), Some(85));
        assert_eq!(extract_confidence("confidence: 80e"), Some(80));
    }

    #[test]
    fn test_reasoning_with_brackets_inside_strings() {
        let raw = r#"decision: SELL confidence: 70 reasoning: ["RSI [14] overbought", "volume drop"]"#;
        let draft = partial_tier(raw).unwrap();
        assert_eq!(draft.action, Action::Sell);
        assert_eq!(draft.confidence, 70);
        assert_eq!(
            draft.reasoning,
            vec!["RSI [14] overbought".to_string(), "volume drop".to_string()]
        );
    }

    #[test]
    fn test_requires_action_and_confidence() {
        assert!(partial_tier("confidence: 80").is_err());
        assert!(partial_tier("SELL everything").is_err());
    }
}

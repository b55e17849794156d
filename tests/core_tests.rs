use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;

use trade_decision_gate::decision::{normalize, parse_response, Action, Provenance, RiskLevel};
use trade_decision_gate::{CooldownGate, DecisionPipeline};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap()
}

#[test]
fn test_fenced_response_is_strict_and_clamped() {
    let raw = "```json\n{\"decision\":\"BUY\",\"confidence\":120,\"reasoning\":[\"x\"]}\n```";
    let decision = parse_response(raw);

    assert_eq!(decision.provenance, Provenance::Strict);
    assert_eq!(decision.action, Action::Buy);
    assert_eq!(decision.confidence, 100);
    assert_eq!(decision.reasoning, vec!["x".to_string()]);
    assert_eq!(decision.risk_assessment, RiskLevel::Medium);
}

#[test]
fn test_missing_comma_is_repaired() {
    let raw = "{\"decision\":\"HOLD\",\"confidence\":75,\"reasoning\":[\"a\",\"b\"]\n\"risk_assessment\":\"low\"}";
    let decision = parse_response(raw);

    assert_eq!(decision.provenance, Provenance::Repaired);
    assert_eq!(decision.action, Action::Hold);
    assert_eq!(decision.confidence, 75);
    assert_eq!(decision.reasoning, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(decision.risk_assessment, RiskLevel::Low);
}

#[test]
fn test_repaired_matches_unbroken_equivalent() {
    let intact = "{\"decision\":\"sell\",\"confidence\":42,\"reasoning\":[\"fading\"],\n\"risk_assessment\":\"HIGH\"}";
    let broken = intact.replacen("],\n", "]\n", 1);

    let strict = parse_response(intact);
    let repaired = parse_response(&broken);

    assert_eq!(strict.provenance, Provenance::Strict);
    assert_eq!(repaired.provenance, Provenance::Repaired);
    assert_eq!(strict.action, repaired.action);
    assert_eq!(strict.confidence, repaired.confidence);
    assert_eq!(strict.reasoning, repaired.reasoning);
    assert_eq!(strict.risk_assessment, repaired.risk_assessment);
}

#[test]
fn test_free_text_is_partial() {
    let decision = parse_response("Recommendation: SELL, confidence 64 given the weak tape.");

    assert_eq!(decision.provenance, Provenance::Partial);
    assert_eq!(decision.action, Action::Sell);
    assert_eq!(decision.confidence, 64);
    assert_eq!(decision.risk_assessment, RiskLevel::Medium);
    assert_eq!(decision.reasoning.len(), 1);
}

#[test]
fn test_unusable_text_falls_back_to_hold() {
    let decision = parse_response("```\nI am unable to help with that.\n```");

    assert_eq!(decision.provenance, Provenance::Fallback);
    assert_eq!(decision.action, Action::Hold);
    assert_eq!(decision.confidence, 50);
    assert_eq!(decision.risk_assessment, RiskLevel::Medium);
    assert_eq!(decision.reasoning.len(), 1);
}

#[test]
fn test_normalize_is_idempotent() {
    for raw in [
        "```json\n{\"decision\":\"BUY\"}\n```",
        "\n\n```\n```\n",
        "plain",
        "```rust\nfn main() {}\n```",
    ] {
        let once = normalize(raw);
        assert_eq!(normalize(once), once);
    }
}

#[test]
fn test_cooldown_boundary() {
    let gate = CooldownGate::new(1.0);
    gate.record_trade("BTCUSDT", t0());

    assert!(!gate
        .can_trade("BTCUSDT", t0() + Duration::minutes(59) + Duration::seconds(59))
        .is_allowed());
    assert!(gate.can_trade("BTCUSDT", t0() + Duration::hours(1)).is_allowed());
}

#[test]
fn test_never_traded_asset_is_allowed() {
    for hours in [0.0, 1.0, 48.0] {
        let gate = CooldownGate::new(hours);
        assert!(gate.can_trade("DOGEUSDT", t0()).is_allowed());
    }
}

#[test]
fn test_zero_interval_never_blocks() {
    let gate = CooldownGate::new(0.0);
    gate.record_trade("BTCUSDT", t0());
    assert!(gate.can_trade("BTCUSDT", t0()).is_allowed());
}

#[test]
fn test_pipeline_end_to_end() {
    let gate = Arc::new(CooldownGate::new(2.0));
    let pipeline = DecisionPipeline::new(Arc::clone(&gate));
    let raw = "```json\n{\"decision\":\"BUY\",\"confidence\":120,\"reasoning\":[\"x\"]}\n```";

    // Permitted but not executed: no cooldown yet
    let first = pipeline.evaluate(raw, "BTCUSDT", t0());
    assert!(first.permitted);
    assert!(gate.status("BTCUSDT", t0()).is_none());

    pipeline.record_execution("BTCUSDT", t0());

    let second = pipeline.evaluate(raw, "BTCUSDT", t0() + Duration::minutes(30));
    assert!(!second.permitted);
    assert_eq!(second.decision.action, Action::Buy);
    assert_eq!(second.decision.confidence, 100);
    assert!(second.deny_reason.unwrap().contains("1.5h remaining"));

    // Other assets are unaffected
    assert!(pipeline.evaluate(raw, "ETHUSDT", t0()).permitted);

    let third = pipeline.evaluate(raw, "BTCUSDT", t0() + Duration::hours(2));
    assert!(third.permitted);
    assert_eq!(
        gate.status("BTCUSDT", t0() + Duration::hours(2)).as_deref(),
        Some("ready")
    );
}

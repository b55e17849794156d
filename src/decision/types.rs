use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trade direction recommended by the advisor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl Action {
    /// BUY and SELL move capital, HOLD does not
    pub fn is_trade(&self) -> bool {
        !matches!(self, Action::Hold)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Hold => "HOLD",
        }
    }
}

impl FromStr for Action {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Action::Buy),
            "SELL" => Ok(Action::Sell),
            "HOLD" => Ok(Action::Hold),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskLevel {
    /// Lenient parse: anything unrecognised is MEDIUM
    pub fn parse_or_default(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl FromStr for RiskLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(RiskLevel::Low),
            "MEDIUM" => Ok(RiskLevel::Medium),
            "HIGH" => Ok(RiskLevel::High),
            _ => Err(()),
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which parsing tier produced a [`Decision`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Provenance {
    Strict,
    Repaired,
    Partial,
    Fallback,
}

impl Provenance {
    pub const ALL: [Provenance; 4] = [
        Provenance::Strict,
        Provenance::Repaired,
        Provenance::Partial,
        Provenance::Fallback,
    ];

    /// True for anything below a clean structured parse
    pub fn is_degraded(&self) -> bool {
        !matches!(self, Provenance::Strict)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Strict => "STRICT",
            Provenance::Repaired => "REPAIRED",
            Provenance::Partial => "PARTIAL",
            Provenance::Fallback => "FALLBACK",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated trading decision. Always fully populated, whatever the input looked like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    pub confidence: u8, // 0..=100
    pub reasoning: Vec<String>,
    pub risk_assessment: RiskLevel,
    pub provenance: Provenance,
}

/// Decision fields as recovered by a parsing tier, before provenance is attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionDraft {
    pub action: Action,
    pub confidence: u8,
    pub reasoning: Vec<String>,
    pub risk_assessment: RiskLevel,
}

impl DecisionDraft {
    pub fn into_decision(self, provenance: Provenance) -> Decision {
        Decision {
            action: self.action,
            confidence: self.confidence,
            reasoning: self.reasoning,
            risk_assessment: self.risk_assessment,
            provenance,
        }
    }
}

/// Clamp a raw confidence value into 0..=100 and round to the nearest integer
pub fn clamp_confidence(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.clamp(0.0, 100.0).round() as u8
}

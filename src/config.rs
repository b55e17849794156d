use serde::{Deserialize, Serialize};
use std::env;

use crate::gating::CooldownGate;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub cooldown: CooldownConfig,
    pub agent: AgentConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CooldownConfig {
    /// Raw setting, coerced when the gate is built
    pub min_hours_between_trades: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentConfig {
    pub asset: String,
    pub min_confidence: u8,
}

impl CooldownConfig {
    pub fn build_gate(&self) -> CooldownGate {
        CooldownGate::from_setting(&self.min_hours_between_trades)
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let cooldown = CooldownConfig {
            min_hours_between_trades: env::var("TRADE_COOLDOWN_HOURS")
                .unwrap_or_else(|_| "0".to_string()),
        };

        let agent = AgentConfig {
            asset: env::var("DECISION_ASSET").unwrap_or_else(|_| "BTCUSDT".to_string()),
            min_confidence: env::var("DECISION_MIN_CONFIDENCE")
                .unwrap_or_else(|_| "0".to_string())
                .parse::<u8>()
                .unwrap_or(0)
                .min(100),
        };

        Ok(Config { cooldown, agent })
    }
}

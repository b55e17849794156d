use anyhow::{Context, Result};
use std::io::Read;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trade_decision_gate::config::Config;
use trade_decision_gate::DecisionPipeline;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trade_decision_gate=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    print_banner(&config);

    let gate = Arc::new(config.cooldown.build_gate());
    let pipeline = DecisionPipeline::new(gate);

    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .context("failed to read advisor response from stdin")?;

    let now = chrono::Utc::now();
    let evaluation = pipeline.evaluate(&raw, &config.agent.asset, now);

    if evaluation.decision.confidence < config.agent.min_confidence {
        warn!(
            "⚠️ Confidence {} below configured minimum {}",
            evaluation.decision.confidence, config.agent.min_confidence
        );
    }
    if evaluation.decision.provenance.is_degraded() {
        warn!(
            "⚠️ Decision came from the {} tier, review before acting",
            evaluation.decision.provenance
        );
    }
    info!(
        "📋 Verdict: {} {} (permitted: {})",
        evaluation.decision.action, config.agent.asset, evaluation.permitted
    );

    let json = serde_json::to_string_pretty(&evaluation).context("failed to encode verdict")?;
    println!("{}", json);

    Ok(())
}

fn print_banner(config: &Config) {
    eprintln!("\n╔═══════════════════════════════════════════════════════════╗");
    eprintln!("║              Trade Decision Gate                          ║");
    eprintln!("╚═══════════════════════════════════════════════════════════╝");
    eprintln!("📈 Asset: {}", config.agent.asset);
    eprintln!(
        "⏳ Cooldown: {} hours between trades",
        config.cooldown.min_hours_between_trades
    );
    eprintln!("🎯 Min Confidence: {}", config.agent.min_confidence);
    eprintln!("═══════════════════════════════════════════════════════════");
    eprintln!();
}

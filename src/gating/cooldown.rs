use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Outcome of a cooldown check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied { reason: String },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Admission::Allowed => None,
            Admission::Denied { reason } => Some(reason.as_str()),
        }
    }

    pub fn into_reason(self) -> Option<String> {
        match self {
            Admission::Allowed => None,
            Admission::Denied { reason } => Some(reason),
        }
    }
}

/// Per-asset minimum interval between executed trades.
///
/// `check` style calls never touch the map; only [`CooldownGate::record_trade`]
/// (and [`CooldownGate::clear`]) write to it. Timestamps always come from the
/// caller, the gate never reads a clock.
pub struct CooldownGate {
    min_interval: Duration,
    last_trade_at: DashMap<String, DateTime<Utc>>, // asset -> last executed trade
}

impl CooldownGate {
    /// Build a gate from a minimum number of hours between trades.
    /// Zero, negative, NaN or out-of-range values disable gating.
    pub fn new(min_hours: f64) -> Self {
        let min_interval = interval_from_hours(min_hours);
        if min_interval.is_zero() && min_hours != 0.0 {
            warn!(
                "⚠️ Invalid cooldown of {} hours, trade cooldown disabled",
                min_hours
            );
        }
        Self {
            min_interval,
            last_trade_at: DashMap::new(),
        }
    }

    /// Build a gate from an unparsed configuration value
    pub fn from_setting(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(hours) => Self::new(hours),
            Err(_) => {
                warn!("⚠️ Cooldown setting {:?} is not a number, trade cooldown disabled", raw);
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self::new(0.0)
    }

    pub fn is_enabled(&self) -> bool {
        !self.min_interval.is_zero()
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Whether `asset` may trade at `now`. Never mutates state.
    pub fn can_trade(&self, asset: &str, now: DateTime<Utc>) -> Admission {
        if !self.is_enabled() {
            return Admission::Allowed;
        }

        let Some(last) = self.last_trade_at(asset) else {
            return Admission::Allowed;
        };

        match self.cooldown_remaining(last, now) {
            Some(remaining) => {
                let reason = format!(
                    "Cooldown active for {}: {:.1}h remaining (last trade at {})",
                    asset,
                    as_hours(remaining),
                    last.format("%Y-%m-%d %H:%M:%S UTC")
                );
                debug!("⏳ {}", reason);
                Admission::Denied { reason }
            }
            None => Admission::Allowed,
        }
    }

    /// Time left before `asset` may trade again, `None` when it already can
    pub fn remaining(&self, asset: &str, now: DateTime<Utc>) -> Option<Duration> {
        if !self.is_enabled() {
            return None;
        }
        let last = self.last_trade_at(asset)?;
        self.cooldown_remaining(last, now)
    }

    /// Arm the cooldown for `asset`. Overwrites any earlier timestamp.
    pub fn record_trade(&self, asset: &str, now: DateTime<Utc>) {
        self.last_trade_at.insert(asset.to_string(), now);
        debug!(
            "📝 Trade recorded for {} at {}",
            asset,
            now.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }

    /// Human readable cooldown summary, `None` if gating is off or the asset never traded
    pub fn status(&self, asset: &str, now: DateTime<Utc>) -> Option<String> {
        if !self.is_enabled() {
            return None;
        }
        let last = self.last_trade_at(asset)?;
        Some(match self.cooldown_remaining(last, now) {
            Some(remaining) => format!("cooldown active, {:.1}h remaining", as_hours(remaining)),
            None => "ready".to_string(),
        })
    }

    pub fn last_trade_at(&self, asset: &str) -> Option<DateTime<Utc>> {
        self.last_trade_at.get(asset).map(|entry| *entry.value())
    }

    pub fn tracked_assets(&self) -> Vec<String> {
        let mut assets: Vec<String> = self
            .last_trade_at
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        assets.sort();
        assets
    }

    /// Forget the last trade of `asset`. Returns whether one was recorded.
    pub fn clear(&self, asset: &str) -> bool {
        self.last_trade_at.remove(asset).is_some()
    }

    // Strict less-than: elapsed == min_interval is already expired
    fn cooldown_remaining(&self, last: DateTime<Utc>, now: DateTime<Utc>) -> Option<Duration> {
        // A clock behind the recorded trade counts as no time elapsed
        let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
        (elapsed < self.min_interval).then(|| self.min_interval - elapsed)
    }
}

impl Default for CooldownGate {
    fn default() -> Self {
        Self::disabled()
    }
}

fn interval_from_hours(hours: f64) -> Duration {
    if !hours.is_finite() || hours <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(hours * 3600.0).unwrap_or(Duration::ZERO)
}

fn as_hours(duration: Duration) -> f64 {
    duration.as_secs_f64() / 3600.0
}

pub mod analytics;
pub mod config;
pub mod decision;
pub mod gating;
pub mod pipeline;

pub use decision::{parse_response, Action, Decision, Provenance, RiskLevel};
pub use gating::{Admission, CooldownGate};
pub use pipeline::{DecisionPipeline, Evaluation};

pub mod extract;
pub mod parser;
pub mod types;

pub use parser::{classify, normalize, parse_response, ParseOutcome, TierFailure};
pub use types::{Action, Decision, DecisionDraft, Provenance, RiskLevel};

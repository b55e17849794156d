pub mod audit;

pub use audit::{AuditEntry, AuditStats, AuditTracker};

pub mod cooldown;

pub use cooldown::{Admission, CooldownGate};

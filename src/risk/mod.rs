// Risk management module
pub mod calculator;

pub use calculator::{RiskCalculator, RiskResult};

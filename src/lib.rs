//! Quantitative market signals
//!
//! Turns price, volume and macro series into decision-support signals:
//! volatility regime, composite risk tier, position size, statistical
//! arbitrage pairs and a skill-versus-luck verdict on a track record.
//! Calculators are pure functions; only the alert policies hold state.

pub mod beta;
pub mod config;
pub mod crowding;
pub mod data;
pub mod error;
pub mod kelly;
pub mod pairs;
pub mod policy;
pub mod regime;
pub mod report;
pub mod risk;
pub mod skill;
pub mod stats;
pub mod types;
pub mod validation;
pub mod vpin;

pub use config::Config;
pub use error::{SignalError, SignalResult};
pub use types::*;

//! fxlab strategies — the signal-evaluator collection.
//!
//! Each module is one independent strategy implementing
//! [`fxlab_core::strategy::StrategyCore`]: an entry rule over
//! host-delivered indicator values (or raw bars), paired with the shared
//! protective-order configuration. The [`registry`] builds strategies by
//! name from a parameter map.

pub mod adx_trend;
pub mod bollinger_fade;
pub mod carry_hold;
pub mod htf_confirm;
pub mod ma_cross;
pub mod macd_cross;
pub mod momentum_burst;
pub mod range_breakout;
pub mod registry;
pub mod rsi_reversal;
pub mod stochastic_cross;

pub use registry::{RegistryError, StrategyFactory, STRATEGY_NAMES};

//! The strategy lifecycle trait.
//!
//! Strategies are plain structs composing the pieces they need — a
//! protective controller, series windows, a sizer — behind one trait.
//! The host drives the lifecycle: `on_start` once (construction-time
//! validation happens here and a failure halts the strategy), then one
//! `on_bar` per finished bar, with `on_position_changed` notifications
//! in between. Evaluator decides, controller adjusts, adapter executes.

use thiserror::Error;

use crate::context::BarContext;
use crate::domain::{ExitReason, Instrument, Position};
use crate::params::{ParamError, ParamSpec};
use crate::protect::ProtectionConfig;

/// What the evaluator wants done. The host (or replay harness) translates
/// actions into gateway calls; strategies never touch the gateway.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    EnterLong { volume: f64 },
    EnterShort { volume: f64 },
    Close { reason: ExitReason },
}

/// Configuration faults surfaced by `on_start`. Fatal: the host drops
/// the strategy instead of running it.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid parameter {name}: {reason}")]
    InvalidParam { name: String, reason: String },

    #[error(transparent)]
    Param(#[from] ParamError),
}

impl ConfigError {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParam {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Lifecycle interface every strategy implements.
pub trait StrategyCore: Send {
    /// Stable registry name (e.g., "ma_cross").
    fn name(&self) -> &str;

    /// Declarative parameter surface for optimizer UIs.
    fn params(&self) -> Vec<ParamSpec>;

    /// Indicator series the host must compute and deliver each bar,
    /// by snapshot key (e.g., "sma_12").
    fn required_indicators(&self) -> Vec<String> {
        Vec::new()
    }

    /// Bars to observe before the evaluator may act.
    fn warmup_bars(&self) -> usize;

    /// Protective distances the controller should enforce for this
    /// strategy's positions.
    fn protection(&self) -> ProtectionConfig;

    /// Validate configuration against the instrument. Called once before
    /// the first bar; an error halts the strategy.
    fn on_start(&mut self, instrument: &Instrument) -> Result<(), ConfigError>;

    /// Evaluate one finished bar.
    fn on_bar(&mut self, ctx: &BarContext<'_>) -> Vec<Action>;

    /// Fill/flat notification. `None` means the position closed.
    fn on_position_changed(&mut self, _position: Option<&Position>) {}

    /// Drop all transient state (windows, flags); parameters survive.
    fn on_reset(&mut self) {}
}

impl std::fmt::Debug for dyn StrategyCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyCore")
            .field("name", &self.name())
            .finish()
    }
}

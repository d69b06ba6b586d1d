//! Name-to-builder registry for the strategy collection.

use thiserror::Error;

use fxlab_core::config::CarryTable;
use fxlab_core::params::ParamValues;
use fxlab_core::strategy::{ConfigError, StrategyCore};

use crate::adx_trend::AdxTrend;
use crate::bollinger_fade::BollingerFade;
use crate::carry_hold::CarryHold;
use crate::htf_confirm::HtfConfirm;
use crate::ma_cross::MaCross;
use crate::macd_cross::MacdCross;
use crate::momentum_burst::MomentumBurst;
use crate::range_breakout::RangeBreakout;
use crate::rsi_reversal::RsiReversal;
use crate::stochastic_cross::StochasticCross;

/// Every strategy name `StrategyFactory::build` accepts.
pub const STRATEGY_NAMES: &[&str] = &[
    "ma_cross",
    "macd_cross",
    "rsi_reversal",
    "stochastic_cross",
    "bollinger_fade",
    "range_breakout",
    "momentum_burst",
    "adx_trend",
    "htf_confirm",
    "carry_hold",
];

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown strategy {0:?}")]
    Unknown(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Builds strategies by name from parameter maps. Carries the injected
/// carry table so `carry_hold` can be built like everything else.
#[derive(Debug, Clone, Default)]
pub struct StrategyFactory {
    carry: CarryTable,
}

impl StrategyFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_carry(carry: CarryTable) -> Self {
        Self { carry }
    }

    pub fn build(
        &self,
        name: &str,
        params: &ParamValues,
    ) -> Result<Box<dyn StrategyCore>, RegistryError> {
        let strategy: Box<dyn StrategyCore> = match name {
            "ma_cross" => Box::new(MaCross::from_params(params)?),
            "macd_cross" => Box::new(MacdCross::from_params(params)?),
            "rsi_reversal" => Box::new(RsiReversal::from_params(params)?),
            "stochastic_cross" => Box::new(StochasticCross::from_params(params)?),
            "bollinger_fade" => Box::new(BollingerFade::from_params(params)?),
            "range_breakout" => Box::new(RangeBreakout::from_params(params)?),
            "momentum_burst" => Box::new(MomentumBurst::from_params(params)?),
            "adx_trend" => Box::new(AdxTrend::from_params(params)?),
            "htf_confirm" => Box::new(HtfConfirm::from_params(params)?),
            "carry_hold" => Box::new(CarryHold::from_params(params, self.carry.clone())?),
            other => return Err(RegistryError::Unknown(other.to_string())),
        };
        tracing::debug!(name, warmup = strategy.warmup_bars(), "built strategy");
        Ok(strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_name_builds_with_defaults() {
        let factory = StrategyFactory::new();
        let params = ParamValues::new();
        for name in STRATEGY_NAMES {
            let strategy = factory.build(name, &params).unwrap();
            assert_eq!(strategy.name(), *name);
            assert!(strategy.warmup_bars() > 0, "{name} has no warmup");
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let factory = StrategyFactory::new();
        let err = factory.build("grid_martingale", &ParamValues::new()).unwrap_err();
        assert!(matches!(err, RegistryError::Unknown(_)));
    }

    #[test]
    fn bad_param_surfaces_as_config_error() {
        let factory = StrategyFactory::new();
        let mut params = ParamValues::new();
        params.set("fast_period", 10.5);
        let err = factory.build("ma_cross", &params).unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));
    }
}

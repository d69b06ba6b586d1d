//! Breakout of the trailing N-bar range.
//!
//! The range is computed over bars strictly before the current one, so
//! a close beyond it is a genuine breakout rather than a self-match.
//! Needs no host indicators.

use std::collections::VecDeque;

use fxlab_core::context::BarContext;
use fxlab_core::domain::Instrument;
use fxlab_core::params::{ParamSpec, ParamValues};
use fxlab_core::protect::ProtectionConfig;
use fxlab_core::strategy::{Action, ConfigError, StrategyCore};

pub struct RangeBreakout {
    lookback: usize,
    volume_lots: f64,
    protection: ProtectionConfig,
    highs: VecDeque<f64>,
    lows: VecDeque<f64>,
}

impl RangeBreakout {
    pub fn new(lookback: usize, volume_lots: f64, protection: ProtectionConfig) -> Self {
        Self {
            lookback,
            volume_lots,
            protection,
            highs: VecDeque::with_capacity(lookback),
            lows: VecDeque::with_capacity(lookback),
        }
    }

    pub fn from_params(params: &ParamValues) -> Result<Self, ConfigError> {
        Ok(Self::new(
            params.get_usize_or("lookback", 20)?,
            params.get_or("volume_lots", 0.1),
            ProtectionConfig::from_params(params),
        ))
    }

    fn range(&self) -> Option<(f64, f64)> {
        if self.highs.len() < self.lookback {
            return None;
        }
        let hi = self.highs.iter().copied().fold(f64::MIN, f64::max);
        let lo = self.lows.iter().copied().fold(f64::MAX, f64::min);
        Some((hi, lo))
    }

    fn push(&mut self, high: f64, low: f64) {
        if self.highs.len() == self.lookback {
            self.highs.pop_front();
            self.lows.pop_front();
        }
        self.highs.push_back(high);
        self.lows.push_back(low);
    }
}

impl StrategyCore for RangeBreakout {
    fn name(&self) -> &str {
        "range_breakout"
    }

    fn params(&self) -> Vec<ParamSpec> {
        let mut specs = vec![
            ParamSpec::new("lookback", self.lookback as f64, 5.0, 100.0, 5.0),
            ParamSpec::fixed("volume_lots", self.volume_lots),
        ];
        specs.extend(ProtectionConfig::param_specs());
        specs
    }

    fn warmup_bars(&self) -> usize {
        self.lookback + 1
    }

    fn protection(&self) -> ProtectionConfig {
        self.protection
    }

    fn on_start(&mut self, _instrument: &Instrument) -> Result<(), ConfigError> {
        if self.lookback < 2 {
            return Err(ConfigError::invalid("lookback", "must be at least 2"));
        }
        if self.volume_lots <= 0.0 {
            return Err(ConfigError::invalid("volume_lots", "must be positive"));
        }
        Ok(())
    }

    fn on_bar(&mut self, ctx: &BarContext<'_>) -> Vec<Action> {
        let prior = self.range();
        self.push(ctx.bar.high, ctx.bar.low);

        let Some((hi, lo)) = prior else {
            return Vec::new();
        };
        if !ctx.is_flat() {
            return Vec::new();
        }
        if ctx.bar.close > hi {
            return vec![Action::EnterLong {
                volume: self.volume_lots,
            }];
        }
        if ctx.bar.close < lo {
            return vec![Action::EnterShort {
                volume: self.volume_lots,
            }];
        }
        Vec::new()
    }

    fn on_reset(&mut self) {
        self.highs.clear();
        self.lows.clear();
    }
}

//! RSI reversal — fade the extremes.
//!
//! Long when RSI crosses back up through the oversold level, short when
//! it crosses back down through the overbought level. A position is
//! handed back by signal once RSI reaches the opposite extreme.

use fxlab_core::context::BarContext;
use fxlab_core::domain::{ExitReason, Instrument, Side};
use fxlab_core::history::SeriesWindow;
use fxlab_core::params::{ParamSpec, ParamValues};
use fxlab_core::protect::ProtectionConfig;
use fxlab_core::strategy::{Action, ConfigError, StrategyCore};

pub struct RsiReversal {
    period: usize,
    oversold: f64,
    overbought: f64,
    volume_lots: f64,
    protection: ProtectionConfig,
    key: String,
    rsi: SeriesWindow,
}

impl RsiReversal {
    pub fn new(
        period: usize,
        oversold: f64,
        overbought: f64,
        volume_lots: f64,
        protection: ProtectionConfig,
    ) -> Self {
        Self {
            period,
            oversold,
            overbought,
            volume_lots,
            protection,
            key: format!("rsi_{period}"),
            rsi: SeriesWindow::new(2),
        }
    }

    pub fn from_params(params: &ParamValues) -> Result<Self, ConfigError> {
        Ok(Self::new(
            params.get_usize_or("period", 14)?,
            params.get_or("oversold", 30.0),
            params.get_or("overbought", 70.0),
            params.get_or("volume_lots", 0.1),
            ProtectionConfig::from_params(params),
        ))
    }
}

impl StrategyCore for RsiReversal {
    fn name(&self) -> &str {
        "rsi_reversal"
    }

    fn params(&self) -> Vec<ParamSpec> {
        let mut specs = vec![
            ParamSpec::new("period", self.period as f64, 2.0, 50.0, 1.0),
            ParamSpec::new("oversold", self.oversold, 5.0, 45.0, 5.0),
            ParamSpec::new("overbought", self.overbought, 55.0, 95.0, 5.0),
            ParamSpec::fixed("volume_lots", self.volume_lots),
        ];
        specs.extend(ProtectionConfig::param_specs());
        specs
    }

    fn required_indicators(&self) -> Vec<String> {
        vec![self.key.clone()]
    }

    fn warmup_bars(&self) -> usize {
        self.period + 1
    }

    fn protection(&self) -> ProtectionConfig {
        self.protection
    }

    fn on_start(&mut self, _instrument: &Instrument) -> Result<(), ConfigError> {
        if !(0.0..100.0).contains(&self.oversold) || !(0.0..=100.0).contains(&self.overbought) {
            return Err(ConfigError::invalid(
                "oversold",
                "levels must lie within 0..100",
            ));
        }
        if self.oversold >= self.overbought {
            return Err(ConfigError::invalid(
                "oversold",
                "must be below overbought",
            ));
        }
        if self.volume_lots <= 0.0 {
            return Err(ConfigError::invalid("volume_lots", "must be positive"));
        }
        Ok(())
    }

    fn on_bar(&mut self, ctx: &BarContext<'_>) -> Vec<Action> {
        let Some(rsi) = ctx.indicators.get(&self.key) else {
            return Vec::new();
        };
        self.rsi.push(rsi);

        // Holding: hand back at the opposite extreme.
        if let Some(pos) = ctx.position {
            match pos.side {
                Side::Long if self.rsi.crossed_above_level(self.overbought) => {
                    return vec![Action::Close {
                        reason: ExitReason::Signal,
                    }];
                }
                Side::Short if self.rsi.crossed_below_level(self.oversold) => {
                    return vec![Action::Close {
                        reason: ExitReason::Signal,
                    }];
                }
                _ => return Vec::new(),
            }
        }

        if self.rsi.crossed_above_level(self.oversold) {
            return vec![Action::EnterLong {
                volume: self.volume_lots,
            }];
        }
        if self.rsi.crossed_below_level(self.overbought) {
            return vec![Action::EnterShort {
                volume: self.volume_lots,
            }];
        }
        Vec::new()
    }

    fn on_reset(&mut self) {
        self.rsi.clear();
    }
}

//! Stochastic %K / %D crossover inside the extreme zones.
//!
//! Only crosses that happen in the oversold (long) or overbought
//! (short) zone count; mid-range wiggle is ignored.

use fxlab_core::context::BarContext;
use fxlab_core::domain::Instrument;
use fxlab_core::history::SeriesWindow;
use fxlab_core::params::{ParamSpec, ParamValues};
use fxlab_core::protect::ProtectionConfig;
use fxlab_core::strategy::{Action, ConfigError, StrategyCore};

pub const STOCH_K: &str = "stoch_k";
pub const STOCH_D: &str = "stoch_d";

pub struct StochasticCross {
    k_period: usize,
    d_period: usize,
    oversold: f64,
    overbought: f64,
    volume_lots: f64,
    protection: ProtectionConfig,
    k: SeriesWindow,
    d: SeriesWindow,
}

impl StochasticCross {
    pub fn new(
        k_period: usize,
        d_period: usize,
        oversold: f64,
        overbought: f64,
        volume_lots: f64,
        protection: ProtectionConfig,
    ) -> Self {
        Self {
            k_period,
            d_period,
            oversold,
            overbought,
            volume_lots,
            protection,
            k: SeriesWindow::new(2),
            d: SeriesWindow::new(2),
        }
    }

    pub fn from_params(params: &ParamValues) -> Result<Self, ConfigError> {
        Ok(Self::new(
            params.get_usize_or("k_period", 14)?,
            params.get_usize_or("d_period", 3)?,
            params.get_or("oversold", 20.0),
            params.get_or("overbought", 80.0),
            params.get_or("volume_lots", 0.1),
            ProtectionConfig::from_params(params),
        ))
    }
}

impl StrategyCore for StochasticCross {
    fn name(&self) -> &str {
        "stochastic_cross"
    }

    fn params(&self) -> Vec<ParamSpec> {
        let mut specs = vec![
            ParamSpec::new("k_period", self.k_period as f64, 3.0, 50.0, 1.0),
            ParamSpec::new("d_period", self.d_period as f64, 1.0, 20.0, 1.0),
            ParamSpec::new("oversold", self.oversold, 5.0, 40.0, 5.0),
            ParamSpec::new("overbought", self.overbought, 60.0, 95.0, 5.0),
            ParamSpec::fixed("volume_lots", self.volume_lots),
        ];
        specs.extend(ProtectionConfig::param_specs());
        specs
    }

    fn required_indicators(&self) -> Vec<String> {
        vec![STOCH_K.to_string(), STOCH_D.to_string()]
    }

    fn warmup_bars(&self) -> usize {
        self.k_period + self.d_period + 1
    }

    fn protection(&self) -> ProtectionConfig {
        self.protection
    }

    fn on_start(&mut self, _instrument: &Instrument) -> Result<(), ConfigError> {
        if self.oversold >= self.overbought {
            return Err(ConfigError::invalid("oversold", "must be below overbought"));
        }
        if self.volume_lots <= 0.0 {
            return Err(ConfigError::invalid("volume_lots", "must be positive"));
        }
        Ok(())
    }

    fn on_bar(&mut self, ctx: &BarContext<'_>) -> Vec<Action> {
        let (Some(k), Some(d)) = (ctx.indicators.get(STOCH_K), ctx.indicators.get(STOCH_D))
        else {
            return Vec::new();
        };
        self.k.push(k);
        self.d.push(d);

        if self.k.crossed_above(&self.d) && d <= self.oversold {
            return vec![Action::EnterLong {
                volume: self.volume_lots,
            }];
        }
        if self.k.crossed_below(&self.d) && d >= self.overbought {
            return vec![Action::EnterShort {
                volume: self.volume_lots,
            }];
        }
        Vec::new()
    }

    fn on_reset(&mut self) {
        self.k.clear();
        self.d.clear();
    }
}

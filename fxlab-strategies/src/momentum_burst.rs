//! Rate-of-change threshold burst with a slope filter.

use fxlab_core::context::BarContext;
use fxlab_core::domain::Instrument;
use fxlab_core::history::SeriesWindow;
use fxlab_core::params::{ParamSpec, ParamValues};
use fxlab_core::protect::ProtectionConfig;
use fxlab_core::strategy::{Action, ConfigError, StrategyCore};

pub struct MomentumBurst {
    roc_period: usize,
    threshold: f64,
    volume_lots: f64,
    protection: ProtectionConfig,
    key: String,
    roc: SeriesWindow,
}

impl MomentumBurst {
    pub fn new(
        roc_period: usize,
        threshold: f64,
        volume_lots: f64,
        protection: ProtectionConfig,
    ) -> Self {
        Self {
            key: format!("roc_{roc_period}"),
            roc_period,
            threshold,
            volume_lots,
            protection,
            roc: SeriesWindow::new(3),
        }
    }

    pub fn from_params(params: &ParamValues) -> Result<Self, ConfigError> {
        Ok(Self::new(
            params.get_usize_or("roc_period", 12)?,
            params.get_or("threshold", 0.3),
            params.get_or("volume_lots", 0.1),
            ProtectionConfig::from_params(params),
        ))
    }
}

impl StrategyCore for MomentumBurst {
    fn name(&self) -> &str {
        "momentum_burst"
    }

    fn params(&self) -> Vec<ParamSpec> {
        let mut specs = vec![
            ParamSpec::new("roc_period", self.roc_period as f64, 2.0, 50.0, 1.0),
            ParamSpec::new("threshold", self.threshold, 0.05, 2.0, 0.05),
            ParamSpec::fixed("volume_lots", self.volume_lots),
        ];
        specs.extend(ProtectionConfig::param_specs());
        specs
    }

    fn required_indicators(&self) -> Vec<String> {
        vec![self.key.clone()]
    }

    fn warmup_bars(&self) -> usize {
        self.roc_period + 3
    }

    fn protection(&self) -> ProtectionConfig {
        self.protection
    }

    fn on_start(&mut self, _instrument: &Instrument) -> Result<(), ConfigError> {
        if self.threshold <= 0.0 {
            return Err(ConfigError::invalid("threshold", "must be positive"));
        }
        if self.volume_lots <= 0.0 {
            return Err(ConfigError::invalid("volume_lots", "must be positive"));
        }
        Ok(())
    }

    fn on_bar(&mut self, ctx: &BarContext<'_>) -> Vec<Action> {
        let Some(roc) = ctx.indicators.get(&self.key) else {
            return Vec::new();
        };
        self.roc.push(roc);

        // Threshold break alone is not enough, momentum must still be
        // accelerating in the break direction.
        if self.roc.crossed_above_level(self.threshold) && self.roc.rising(2) {
            return vec![Action::EnterLong {
                volume: self.volume_lots,
            }];
        }
        if self.roc.crossed_below_level(-self.threshold) && self.roc.falling(2) {
            return vec![Action::EnterShort {
                volume: self.volume_lots,
            }];
        }
        Vec::new()
    }

    fn on_reset(&mut self) {
        self.roc.clear();
    }
}

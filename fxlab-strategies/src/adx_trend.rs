//! Directional-movement trend entries gated by ADX strength.
//!
//! A DI+ / DI- cross only counts while ADX says there is a trend to
//! ride; an open trade is cut once ADX sinks back below the gate.

use fxlab_core::context::BarContext;
use fxlab_core::domain::{ExitReason, Instrument};
use fxlab_core::history::SeriesWindow;
use fxlab_core::params::{ParamSpec, ParamValues};
use fxlab_core::protect::ProtectionConfig;
use fxlab_core::strategy::{Action, ConfigError, StrategyCore};

pub const ADX: &str = "adx";
pub const DI_PLUS: &str = "di_plus";
pub const DI_MINUS: &str = "di_minus";

pub struct AdxTrend {
    period: usize,
    strength: f64,
    volume_lots: f64,
    protection: ProtectionConfig,
    di_plus: SeriesWindow,
    di_minus: SeriesWindow,
    adx: SeriesWindow,
}

impl AdxTrend {
    pub fn new(period: usize, strength: f64, volume_lots: f64, protection: ProtectionConfig) -> Self {
        Self {
            period,
            strength,
            volume_lots,
            protection,
            di_plus: SeriesWindow::new(2),
            di_minus: SeriesWindow::new(2),
            adx: SeriesWindow::new(2),
        }
    }

    pub fn from_params(params: &ParamValues) -> Result<Self, ConfigError> {
        Ok(Self::new(
            params.get_usize_or("period", 14)?,
            params.get_or("strength", 25.0),
            params.get_or("volume_lots", 0.1),
            ProtectionConfig::from_params(params),
        ))
    }
}

impl StrategyCore for AdxTrend {
    fn name(&self) -> &str {
        "adx_trend"
    }

    fn params(&self) -> Vec<ParamSpec> {
        let mut specs = vec![
            ParamSpec::new("period", self.period as f64, 7.0, 40.0, 1.0),
            ParamSpec::new("strength", self.strength, 15.0, 40.0, 5.0),
            ParamSpec::fixed("volume_lots", self.volume_lots),
        ];
        specs.extend(ProtectionConfig::param_specs());
        specs
    }

    fn required_indicators(&self) -> Vec<String> {
        vec![ADX.to_string(), DI_PLUS.to_string(), DI_MINUS.to_string()]
    }

    fn warmup_bars(&self) -> usize {
        2 * self.period + 1
    }

    fn protection(&self) -> ProtectionConfig {
        self.protection
    }

    fn on_start(&mut self, _instrument: &Instrument) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.strength) {
            return Err(ConfigError::invalid("strength", "must be between 0 and 100"));
        }
        if self.volume_lots <= 0.0 {
            return Err(ConfigError::invalid("volume_lots", "must be positive"));
        }
        Ok(())
    }

    fn on_bar(&mut self, ctx: &BarContext<'_>) -> Vec<Action> {
        let (Some(adx), Some(plus), Some(minus)) = (
            ctx.indicators.get(ADX),
            ctx.indicators.get(DI_PLUS),
            ctx.indicators.get(DI_MINUS),
        ) else {
            return Vec::new();
        };
        self.adx.push(adx);
        self.di_plus.push(plus);
        self.di_minus.push(minus);

        if ctx.position.is_some() {
            if self.adx.crossed_below_level(self.strength) {
                return vec![Action::Close {
                    reason: ExitReason::Signal,
                }];
            }
            return Vec::new();
        }

        if adx < self.strength {
            return Vec::new();
        }
        if self.di_plus.crossed_above(&self.di_minus) {
            return vec![Action::EnterLong {
                volume: self.volume_lots,
            }];
        }
        if self.di_plus.crossed_below(&self.di_minus) {
            return vec![Action::EnterShort {
                volume: self.volume_lots,
            }];
        }
        Vec::new()
    }

    fn on_reset(&mut self) {
        self.di_plus.clear();
        self.di_minus.clear();
        self.adx.clear();
    }
}

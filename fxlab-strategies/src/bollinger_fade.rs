//! Mean-reversion fade of Bollinger band excursions.
//!
//! A close that pokes back inside the lower band is bought, one that
//! drops back under the upper band is sold, and open trades come off
//! when the close tags the middle band.

use fxlab_core::context::BarContext;
use fxlab_core::domain::{ExitReason, Instrument, Side};
use fxlab_core::history::SeriesWindow;
use fxlab_core::params::{ParamSpec, ParamValues};
use fxlab_core::protect::ProtectionConfig;
use fxlab_core::strategy::{Action, ConfigError, StrategyCore};

pub const BB_UPPER: &str = "bb_upper";
pub const BB_MIDDLE: &str = "bb_middle";
pub const BB_LOWER: &str = "bb_lower";

pub struct BollingerFade {
    period: usize,
    volume_lots: f64,
    protection: ProtectionConfig,
    close: SeriesWindow,
    upper: SeriesWindow,
    lower: SeriesWindow,
}

impl BollingerFade {
    pub fn new(period: usize, volume_lots: f64, protection: ProtectionConfig) -> Self {
        Self {
            period,
            volume_lots,
            protection,
            close: SeriesWindow::new(2),
            upper: SeriesWindow::new(2),
            lower: SeriesWindow::new(2),
        }
    }

    pub fn from_params(params: &ParamValues) -> Result<Self, ConfigError> {
        Ok(Self::new(
            params.get_usize_or("period", 20)?,
            params.get_or("volume_lots", 0.1),
            ProtectionConfig::from_params(params),
        ))
    }
}

impl StrategyCore for BollingerFade {
    fn name(&self) -> &str {
        "bollinger_fade"
    }

    fn params(&self) -> Vec<ParamSpec> {
        let mut specs = vec![
            ParamSpec::new("period", self.period as f64, 10.0, 60.0, 5.0),
            ParamSpec::fixed("volume_lots", self.volume_lots),
        ];
        specs.extend(ProtectionConfig::param_specs());
        specs
    }

    fn required_indicators(&self) -> Vec<String> {
        vec![
            BB_UPPER.to_string(),
            BB_MIDDLE.to_string(),
            BB_LOWER.to_string(),
        ]
    }

    fn warmup_bars(&self) -> usize {
        self.period + 1
    }

    fn protection(&self) -> ProtectionConfig {
        self.protection
    }

    fn on_start(&mut self, _instrument: &Instrument) -> Result<(), ConfigError> {
        if self.volume_lots <= 0.0 {
            return Err(ConfigError::invalid("volume_lots", "must be positive"));
        }
        Ok(())
    }

    fn on_bar(&mut self, ctx: &BarContext<'_>) -> Vec<Action> {
        let (Some(upper), Some(middle), Some(lower)) = (
            ctx.indicators.get(BB_UPPER),
            ctx.indicators.get(BB_MIDDLE),
            ctx.indicators.get(BB_LOWER),
        ) else {
            return Vec::new();
        };
        self.close.push(ctx.bar.close);
        self.upper.push(upper);
        self.lower.push(lower);

        if let Some(position) = ctx.position {
            // Mean reached, the fade has played out.
            let done = match position.side {
                Side::Long => ctx.bar.close >= middle,
                Side::Short => ctx.bar.close <= middle,
            };
            if done {
                return vec![Action::Close {
                    reason: ExitReason::Signal,
                }];
            }
            return Vec::new();
        }

        if self.close.crossed_above(&self.lower) {
            return vec![Action::EnterLong {
                volume: self.volume_lots,
            }];
        }
        if self.close.crossed_below(&self.upper) {
            return vec![Action::EnterShort {
                volume: self.volume_lots,
            }];
        }
        Vec::new()
    }

    fn on_reset(&mut self) {
        self.close.clear();
        self.upper.clear();
        self.lower.clear();
    }
}

//! Swap-carry holder: enters in the configured carry direction when
//! price crosses its EMA that way, then leaves the protective ladder
//! to manage the trade. Never trades against the carry table.

use fxlab_core::config::{CarryDirection, CarryTable};
use fxlab_core::context::BarContext;
use fxlab_core::domain::{Instrument, Side};
use fxlab_core::history::SeriesWindow;
use fxlab_core::params::{ParamSpec, ParamValues};
use fxlab_core::protect::ProtectionConfig;
use fxlab_core::strategy::{Action, ConfigError, StrategyCore};

pub struct CarryHold {
    ema_period: usize,
    volume_lots: f64,
    protection: ProtectionConfig,
    carry: CarryTable,
    direction: Option<CarryDirection>,
    key: String,
    close: SeriesWindow,
    ema: SeriesWindow,
}

impl CarryHold {
    pub fn new(
        ema_period: usize,
        volume_lots: f64,
        protection: ProtectionConfig,
        carry: CarryTable,
    ) -> Self {
        Self {
            key: format!("ema_{ema_period}"),
            ema_period,
            volume_lots,
            protection,
            carry,
            direction: None,
            close: SeriesWindow::new(2),
            ema: SeriesWindow::new(2),
        }
    }

    pub fn from_params(params: &ParamValues, carry: CarryTable) -> Result<Self, ConfigError> {
        Ok(Self::new(
            params.get_usize_or("ema_period", 100)?,
            params.get_or("volume_lots", 0.1),
            ProtectionConfig::from_params(params),
            carry,
        ))
    }
}

impl StrategyCore for CarryHold {
    fn name(&self) -> &str {
        "carry_hold"
    }

    fn params(&self) -> Vec<ParamSpec> {
        let mut specs = vec![
            ParamSpec::new("ema_period", self.ema_period as f64, 20.0, 300.0, 10.0),
            ParamSpec::fixed("volume_lots", self.volume_lots),
        ];
        specs.extend(ProtectionConfig::param_specs());
        specs
    }

    fn required_indicators(&self) -> Vec<String> {
        vec![self.key.clone()]
    }

    fn warmup_bars(&self) -> usize {
        self.ema_period + 1
    }

    fn protection(&self) -> ProtectionConfig {
        self.protection
    }

    fn on_start(&mut self, instrument: &Instrument) -> Result<(), ConfigError> {
        let Some(direction) = self.carry.direction(&instrument.symbol) else {
            return Err(ConfigError::invalid(
                "symbol",
                "no carry direction configured for this symbol",
            ));
        };
        if self.volume_lots <= 0.0 {
            return Err(ConfigError::invalid("volume_lots", "must be positive"));
        }
        self.direction = Some(direction);
        Ok(())
    }

    fn on_bar(&mut self, ctx: &BarContext<'_>) -> Vec<Action> {
        let Some(ema) = ctx.indicators.get(&self.key) else {
            return Vec::new();
        };
        self.close.push(ctx.bar.close);
        self.ema.push(ema);

        if !ctx.is_flat() {
            return Vec::new();
        }
        let Some(direction) = self.direction else {
            return Vec::new();
        };
        match direction.side() {
            Side::Long if self.close.crossed_above(&self.ema) => vec![Action::EnterLong {
                volume: self.volume_lots,
            }],
            Side::Short if self.close.crossed_below(&self.ema) => vec![Action::EnterShort {
                volume: self.volume_lots,
            }],
            _ => Vec::new(),
        }
    }

    fn on_reset(&mut self) {
        self.close.clear();
        self.ema.clear();
    }
}

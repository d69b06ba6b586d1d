//! EMA cross on the trading timeframe, confirmed against the trend of
//! the higher timeframe.
//!
//! The higher-timeframe trend is read from finished higher-TF bars
//! delivered in the context; a new bucket is detected by a change of
//! `open_time`, so each higher-TF close is sampled exactly once.

use chrono::{DateTime, Utc};

use fxlab_core::context::BarContext;
use fxlab_core::domain::Instrument;
use fxlab_core::history::SeriesWindow;
use fxlab_core::params::{ParamSpec, ParamValues};
use fxlab_core::protect::ProtectionConfig;
use fxlab_core::strategy::{Action, ConfigError, StrategyCore};

pub struct HtfConfirm {
    fast_period: usize,
    slow_period: usize,
    volume_lots: f64,
    protection: ProtectionConfig,
    fast_key: String,
    slow_key: String,
    fast: SeriesWindow,
    slow: SeriesWindow,
    htf_closes: SeriesWindow,
    last_htf_open: Option<DateTime<Utc>>,
}

impl HtfConfirm {
    pub fn new(
        fast_period: usize,
        slow_period: usize,
        volume_lots: f64,
        protection: ProtectionConfig,
    ) -> Self {
        Self {
            fast_key: format!("ema_{fast_period}"),
            slow_key: format!("ema_{slow_period}"),
            fast_period,
            slow_period,
            volume_lots,
            protection,
            fast: SeriesWindow::new(2),
            slow: SeriesWindow::new(2),
            htf_closes: SeriesWindow::new(2),
            last_htf_open: None,
        }
    }

    pub fn from_params(params: &ParamValues) -> Result<Self, ConfigError> {
        Ok(Self::new(
            params.get_usize_or("fast_period", 12)?,
            params.get_usize_or("slow_period", 48)?,
            params.get_or("volume_lots", 0.1),
            ProtectionConfig::from_params(params),
        ))
    }

    /// +1 while the higher timeframe is making higher closes, -1 while
    /// lower, 0 until two finished higher-TF bars have been seen.
    fn htf_trend(&self) -> i8 {
        match (self.htf_closes.prev(0), self.htf_closes.prev(1)) {
            (Some(cur), Some(prev)) if cur > prev => 1,
            (Some(cur), Some(prev)) if cur < prev => -1,
            _ => 0,
        }
    }
}

impl StrategyCore for HtfConfirm {
    fn name(&self) -> &str {
        "htf_confirm"
    }

    fn params(&self) -> Vec<ParamSpec> {
        let mut specs = vec![
            ParamSpec::new("fast_period", self.fast_period as f64, 3.0, 50.0, 1.0),
            ParamSpec::new("slow_period", self.slow_period as f64, 10.0, 200.0, 2.0),
            ParamSpec::fixed("volume_lots", self.volume_lots),
        ];
        specs.extend(ProtectionConfig::param_specs());
        specs
    }

    fn required_indicators(&self) -> Vec<String> {
        vec![self.fast_key.clone(), self.slow_key.clone()]
    }

    fn warmup_bars(&self) -> usize {
        self.slow_period + 1
    }

    fn protection(&self) -> ProtectionConfig {
        self.protection
    }

    fn on_start(&mut self, _instrument: &Instrument) -> Result<(), ConfigError> {
        if self.fast_period == 0 {
            return Err(ConfigError::invalid("fast_period", "must be at least 1"));
        }
        if self.fast_period >= self.slow_period {
            return Err(ConfigError::invalid(
                "fast_period",
                "must be shorter than slow_period",
            ));
        }
        if self.volume_lots <= 0.0 {
            return Err(ConfigError::invalid("volume_lots", "must be positive"));
        }
        Ok(())
    }

    fn on_bar(&mut self, ctx: &BarContext<'_>) -> Vec<Action> {
        if let Some(htf) = ctx.higher_tf_bar {
            if self.last_htf_open != Some(htf.open_time) {
                self.last_htf_open = Some(htf.open_time);
                self.htf_closes.push(htf.close);
            }
        }

        let (Some(fast), Some(slow)) = (
            ctx.indicators.get(&self.fast_key),
            ctx.indicators.get(&self.slow_key),
        ) else {
            return Vec::new();
        };
        self.fast.push(fast);
        self.slow.push(slow);

        let trend = self.htf_trend();
        if self.fast.crossed_above(&self.slow) && trend > 0 {
            return vec![Action::EnterLong {
                volume: self.volume_lots,
            }];
        }
        if self.fast.crossed_below(&self.slow) && trend < 0 {
            return vec![Action::EnterShort {
                volume: self.volume_lots,
            }];
        }
        Vec::new()
    }

    fn on_reset(&mut self) {
        self.fast.clear();
        self.slow.clear();
        self.htf_closes.clear();
        self.last_htf_open = None;
    }
}

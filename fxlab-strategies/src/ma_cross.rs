//! Moving-average crossover — golden cross and death cross.
//!
//! Goes long when the fast SMA crosses above the slow SMA, short on the
//! opposite cross. Exits are left to the protective controller (and to
//! flips on the opposite signal).

use fxlab_core::context::BarContext;
use fxlab_core::domain::Instrument;
use fxlab_core::history::SeriesWindow;
use fxlab_core::params::{ParamSpec, ParamValues};
use fxlab_core::protect::ProtectionConfig;
use fxlab_core::strategy::{Action, ConfigError, StrategyCore};

pub struct MaCross {
    fast_period: usize,
    slow_period: usize,
    volume_lots: f64,
    protection: ProtectionConfig,
    fast_key: String,
    slow_key: String,
    fast: SeriesWindow,
    slow: SeriesWindow,
}

impl MaCross {
    pub fn new(
        fast_period: usize,
        slow_period: usize,
        volume_lots: f64,
        protection: ProtectionConfig,
    ) -> Self {
        Self {
            fast_period,
            slow_period,
            volume_lots,
            protection,
            fast_key: format!("sma_{fast_period}"),
            slow_key: format!("sma_{slow_period}"),
            fast: SeriesWindow::new(2),
            slow: SeriesWindow::new(2),
        }
    }

    pub fn from_params(params: &ParamValues) -> Result<Self, ConfigError> {
        let fast = params.get_usize_or("fast_period", 10)?;
        let slow = params.get_usize_or("slow_period", 50)?;
        let volume = params.get_or("volume_lots", 0.1);
        Ok(Self::new(fast, slow, volume, ProtectionConfig::from_params(params)))
    }
}

impl StrategyCore for MaCross {
    fn name(&self) -> &str {
        "ma_cross"
    }

    fn params(&self) -> Vec<ParamSpec> {
        let mut specs = vec![
            ParamSpec::new("fast_period", self.fast_period as f64, 2.0, 100.0, 1.0),
            ParamSpec::new("slow_period", self.slow_period as f64, 5.0, 300.0, 5.0),
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
        if self.fast_period < 1 {
            return Err(ConfigError::invalid("fast_period", "must be >= 1"));
        }
        if self.fast_period >= self.slow_period {
            return Err(ConfigError::invalid(
                "fast_period",
                "must be smaller than slow_period",
            ));
        }
        if self.volume_lots <= 0.0 {
            return Err(ConfigError::invalid("volume_lots", "must be positive"));
        }
        Ok(())
    }

    fn on_bar(&mut self, ctx: &BarContext<'_>) -> Vec<Action> {
        let (Some(fast), Some(slow)) = (
            ctx.indicators.get(&self.fast_key),
            ctx.indicators.get(&self.slow_key),
        ) else {
            return Vec::new();
        };

        self.fast.push(fast);
        self.slow.push(slow);

        if self.fast.crossed_above(&self.slow) {
            tracing::debug!(fast, slow, "golden cross");
            return vec![Action::EnterLong {
                volume: self.volume_lots,
            }];
        }
        if self.fast.crossed_below(&self.slow) {
            tracing::debug!(fast, slow, "death cross");
            return vec![Action::EnterShort {
                volume: self.volume_lots,
            }];
        }
        Vec::new()
    }

    fn on_reset(&mut self) {
        self.fast.clear();
        self.slow.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use fxlab_core::context::IndicatorSnapshot;
    use fxlab_core::domain::Bar;

    fn instrument() -> Instrument {
        Instrument::new("EURUSD", 0.0001, 4, 0.01, 0.01).unwrap()
    }

    fn bar(close: f64) -> Bar {
        Bar {
            symbol: "EURUSD".into(),
            open_time: Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap(),
            open: close,
            high: close + 0.0005,
            low: close - 0.0005,
            close,
            volume: 100,
        }
    }

    fn feed(strategy: &mut MaCross, fast: f64, slow: f64) -> Vec<Action> {
        let inst = instrument();
        let bar = bar(1.2000);
        let mut snap = IndicatorSnapshot::new();
        snap.insert("sma_10", fast);
        snap.insert("sma_50", slow);
        let ctx = BarContext {
            instrument: &inst,
            bar: &bar,
            higher_tf_bar: None,
            position: None,
            indicators: &snap,
            equity: 10_000.0,
        };
        strategy.on_bar(&ctx)
    }

    #[test]
    fn golden_cross_goes_long() {
        let mut s = MaCross::new(10, 50, 0.1, ProtectionConfig::disabled());
        s.on_start(&instrument()).unwrap();
        assert!(feed(&mut s, 1.1990, 1.2000).is_empty()); // below
        let actions = feed(&mut s, 1.2010, 1.2000); // crosses above
        assert_eq!(actions, vec![Action::EnterLong { volume: 0.1 }]);
    }

    #[test]
    fn death_cross_goes_short() {
        let mut s = MaCross::new(10, 50, 0.1, ProtectionConfig::disabled());
        s.on_start(&instrument()).unwrap();
        assert!(feed(&mut s, 1.2010, 1.2000).is_empty());
        let actions = feed(&mut s, 1.1990, 1.2000);
        assert_eq!(actions, vec![Action::EnterShort { volume: 0.1 }]);
    }

    #[test]
    fn no_signal_without_cross() {
        let mut s = MaCross::new(10, 50, 0.1, ProtectionConfig::disabled());
        s.on_start(&instrument()).unwrap();
        assert!(feed(&mut s, 1.2010, 1.2000).is_empty());
        assert!(feed(&mut s, 1.2015, 1.2000).is_empty()); // still above
    }

    #[test]
    fn missing_indicator_is_quiet() {
        let mut s = MaCross::new(10, 50, 0.1, ProtectionConfig::disabled());
        s.on_start(&instrument()).unwrap();
        let inst = instrument();
        let bar = bar(1.2000);
        let snap = IndicatorSnapshot::new();
        let ctx = BarContext {
            instrument: &inst,
            bar: &bar,
            higher_tf_bar: None,
            position: None,
            indicators: &snap,
            equity: 10_000.0,
        };
        assert!(s.on_bar(&ctx).is_empty());
    }

    #[test]
    fn fast_must_be_smaller_than_slow() {
        let mut s = MaCross::new(50, 10, 0.1, ProtectionConfig::disabled());
        assert!(s.on_start(&instrument()).is_err());
    }

    #[test]
    fn reset_forgets_history() {
        let mut s = MaCross::new(10, 50, 0.1, ProtectionConfig::disabled());
        s.on_start(&instrument()).unwrap();
        assert!(feed(&mut s, 1.1990, 1.2000).is_empty());
        s.on_reset();
        // After a reset the next value cannot complete a cross.
        assert!(feed(&mut s, 1.2010, 1.2000).is_empty());
    }

    #[test]
    fn from_params_reads_periods_and_protection() {
        let mut params = ParamValues::new();
        params.set("fast_period", 5.0);
        params.set("slow_period", 20.0);
        params.set("stop_points", 30.0);
        let s = MaCross::from_params(&params).unwrap();
        assert_eq!(s.required_indicators(), vec!["sma_5", "sma_20"]);
        assert_eq!(s.protection().stop_points, 30.0);
    }
}

//! MACD line / signal line crossover.
//!
//! Optional zero-line confirmation: when enabled, longs are only taken
//! while the MACD line is still below zero (catching the turn), shorts
//! only above it.

use fxlab_core::context::BarContext;
use fxlab_core::domain::Instrument;
use fxlab_core::history::SeriesWindow;
use fxlab_core::params::{ParamSpec, ParamValues};
use fxlab_core::protect::ProtectionConfig;
use fxlab_core::strategy::{Action, ConfigError, StrategyCore};

pub const MACD_LINE: &str = "macd_line";
pub const MACD_SIGNAL: &str = "macd_signal";

pub struct MacdCross {
    fast_ema: usize,
    slow_ema: usize,
    signal_period: usize,
    confirm_zero_line: bool,
    volume_lots: f64,
    protection: ProtectionConfig,
    line: SeriesWindow,
    signal: SeriesWindow,
}

impl MacdCross {
    pub fn new(
        fast_ema: usize,
        slow_ema: usize,
        signal_period: usize,
        confirm_zero_line: bool,
        volume_lots: f64,
        protection: ProtectionConfig,
    ) -> Self {
        Self {
            fast_ema,
            slow_ema,
            signal_period,
            confirm_zero_line,
            volume_lots,
            protection,
            line: SeriesWindow::new(2),
            signal: SeriesWindow::new(2),
        }
    }

    pub fn from_params(params: &ParamValues) -> Result<Self, ConfigError> {
        Ok(Self::new(
            params.get_usize_or("fast_ema", 12)?,
            params.get_usize_or("slow_ema", 26)?,
            params.get_usize_or("signal_period", 9)?,
            params.get_or("confirm_zero_line", 0.0) != 0.0,
            params.get_or("volume_lots", 0.1),
            ProtectionConfig::from_params(params),
        ))
    }
}

impl StrategyCore for MacdCross {
    fn name(&self) -> &str {
        "macd_cross"
    }

    fn params(&self) -> Vec<ParamSpec> {
        let mut specs = vec![
            ParamSpec::new("fast_ema", self.fast_ema as f64, 2.0, 50.0, 1.0),
            ParamSpec::new("slow_ema", self.slow_ema as f64, 5.0, 100.0, 1.0),
            ParamSpec::new("signal_period", self.signal_period as f64, 2.0, 50.0, 1.0),
            ParamSpec::fixed(
                "confirm_zero_line",
                if self.confirm_zero_line { 1.0 } else { 0.0 },
            ),
            ParamSpec::fixed("volume_lots", self.volume_lots),
        ];
        specs.extend(ProtectionConfig::param_specs());
        specs
    }

    fn required_indicators(&self) -> Vec<String> {
        vec![MACD_LINE.to_string(), MACD_SIGNAL.to_string()]
    }

    fn warmup_bars(&self) -> usize {
        self.slow_ema + self.signal_period + 1
    }

    fn protection(&self) -> ProtectionConfig {
        self.protection
    }

    fn on_start(&mut self, _instrument: &Instrument) -> Result<(), ConfigError> {
        if self.fast_ema >= self.slow_ema {
            return Err(ConfigError::invalid(
                "fast_ema",
                "must be smaller than slow_ema",
            ));
        }
        if self.signal_period < 1 {
            return Err(ConfigError::invalid("signal_period", "must be >= 1"));
        }
        if self.volume_lots <= 0.0 {
            return Err(ConfigError::invalid("volume_lots", "must be positive"));
        }
        Ok(())
    }

    fn on_bar(&mut self, ctx: &BarContext<'_>) -> Vec<Action> {
        let (Some(line), Some(signal)) = (
            ctx.indicators.get(MACD_LINE),
            ctx.indicators.get(MACD_SIGNAL),
        ) else {
            return Vec::new();
        };

        self.line.push(line);
        self.signal.push(signal);

        if self.line.crossed_above(&self.signal) && (!self.confirm_zero_line || line < 0.0) {
            return vec![Action::EnterLong {
                volume: self.volume_lots,
            }];
        }
        if self.line.crossed_below(&self.signal) && (!self.confirm_zero_line || line > 0.0) {
            return vec![Action::EnterShort {
                volume: self.volume_lots,
            }];
        }
        Vec::new()
    }

    fn on_reset(&mut self) {
        self.line.clear();
        self.signal.clear();
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

    fn feed(strategy: &mut MacdCross, line: f64, signal: f64) -> Vec<Action> {
        let inst = instrument();
        let bar = Bar {
            symbol: "EURUSD".into(),
            open_time: Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap(),
            open: 1.2,
            high: 1.2005,
            low: 1.1995,
            close: 1.2,
            volume: 100,
        };
        let mut snap = IndicatorSnapshot::new();
        snap.insert(MACD_LINE, line);
        snap.insert(MACD_SIGNAL, signal);
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
    fn line_cross_up_enters_long() {
        let mut s = MacdCross::new(12, 26, 9, false, 0.1, ProtectionConfig::disabled());
        s.on_start(&instrument()).unwrap();
        assert!(feed(&mut s, -0.0012, -0.0010).is_empty());
        assert_eq!(
            feed(&mut s, -0.0008, -0.0010),
            vec![Action::EnterLong { volume: 0.1 }]
        );
    }

    #[test]
    fn zero_line_filter_blocks_late_longs() {
        let mut s = MacdCross::new(12, 26, 9, true, 0.1, ProtectionConfig::disabled());
        s.on_start(&instrument()).unwrap();
        // Cross happens above zero: filtered.
        assert!(feed(&mut s, 0.0008, 0.0010).is_empty());
        assert!(feed(&mut s, 0.0012, 0.0010).is_empty());
    }

    #[test]
    fn cross_down_enters_short() {
        let mut s = MacdCross::new(12, 26, 9, false, 0.1, ProtectionConfig::disabled());
        s.on_start(&instrument()).unwrap();
        assert!(feed(&mut s, 0.0012, 0.0010).is_empty());
        assert_eq!(
            feed(&mut s, 0.0008, 0.0010),
            vec![Action::EnterShort { volume: 0.1 }]
        );
    }

    #[test]
    fn rejects_inverted_ema_periods() {
        let mut s = MacdCross::new(26, 12, 9, false, 0.1, ProtectionConfig::disabled());
        assert!(s.on_start(&instrument()).is_err());
    }
}

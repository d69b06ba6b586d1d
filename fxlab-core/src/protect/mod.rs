//! Protective-order controller — stop-loss, take-profit, break-even, and
//! trailing-stop management for the single open net position.
//!
//! Distances are configured in points and converted through the
//! instrument's pip size. A distance of zero or less disables that
//! feature. All stop movement passes through the [`StopRatchet`], so the
//! stored stop is monotonically non-worsening while the position
//! direction is unchanged.
//!
//! Per-bar evaluation order (fixed policy): stop-loss check first, then
//! take-profit, then break-even, then trailing. A bar whose range
//! straddles both stop and target therefore resolves to the stop.

pub mod ratchet;

pub use ratchet::StopRatchet;

use crate::domain::{Bar, ExitReason, Instrument, Position, Side};
use crate::params::{ParamSpec, ParamValues};
use serde::{Deserialize, Serialize};

const PRICE_EPS: f64 = 1e-10;

/// Pip-denominated protective distances. Zero or negative disables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProtectionConfig {
    pub stop_points: f64,
    pub take_profit_points: f64,
    pub trailing_points: f64,
    pub breakeven_trigger_points: f64,
    /// Distance past entry locked in when break-even triggers. Zero locks
    /// exactly at entry.
    pub breakeven_lock_points: f64,
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

impl ProtectionConfig {
    /// All features off.
    pub fn disabled() -> Self {
        Self {
            stop_points: 0.0,
            take_profit_points: 0.0,
            trailing_points: 0.0,
            breakeven_trigger_points: 0.0,
            breakeven_lock_points: 0.0,
        }
    }

    fn enabled(points: f64) -> bool {
        points > 0.0
    }

    /// The shared optimizer-facing parameter surface for protection.
    pub fn param_specs() -> Vec<ParamSpec> {
        vec![
            ParamSpec::new("stop_points", 20.0, 0.0, 500.0, 1.0),
            ParamSpec::new("take_profit_points", 40.0, 0.0, 1000.0, 1.0),
            ParamSpec::new("trailing_points", 0.0, 0.0, 500.0, 1.0),
            ParamSpec::new("breakeven_trigger_points", 0.0, 0.0, 500.0, 1.0),
            ParamSpec::new("breakeven_lock_points", 1.0, 0.0, 100.0, 1.0),
        ]
    }

    /// Read protection distances from a parameter map, falling back to
    /// the `param_specs` defaults.
    pub fn from_params(params: &ParamValues) -> Self {
        Self {
            stop_points: params.get_or("stop_points", 20.0),
            take_profit_points: params.get_or("take_profit_points", 40.0),
            trailing_points: params.get_or("trailing_points", 0.0),
            breakeven_trigger_points: params.get_or("breakeven_trigger_points", 0.0),
            breakeven_lock_points: params.get_or("breakeven_lock_points", 1.0),
        }
    }
}

/// Outcome of one protective evaluation. At most one exit per bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProtectIntent {
    Hold,
    /// Move the protective stop (tighten only).
    AdjustStop { stop: f64 },
    /// Close the position at `price`.
    Exit { reason: ExitReason, price: f64 },
}

/// Cached levels for the currently protected position.
#[derive(Debug, Clone)]
struct Armed {
    side: Side,
    entry: f64,
    ratchet: StopRatchet,
    target: Option<f64>,
    breakeven_done: bool,
}

/// Per-strategy protective-order controller.
///
/// Owns the cached stop/target levels for the single open net position.
/// `arm` derives fresh levels from the entry price; `disarm` clears them
/// when the position goes flat. A direction flip observed in `on_bar`
/// resets all levels atomically before reapplying them for the new
/// direction.
#[derive(Debug, Clone)]
pub struct ProtectionController {
    config: ProtectionConfig,
    armed: Option<Armed>,
}

impl ProtectionController {
    pub fn new(config: ProtectionConfig) -> Self {
        Self {
            config,
            armed: None,
        }
    }

    pub fn config(&self) -> &ProtectionConfig {
        &self.config
    }

    /// Stop a fresh entry at `entry` would be armed with, `None` when
    /// the stop feature is disabled. Lets sizers work backwards from the
    /// stop distance before the order is placed.
    pub fn initial_stop(&self, side: Side, entry: f64, instrument: &Instrument) -> Option<f64> {
        ProtectionConfig::enabled(self.config.stop_points).then(|| {
            let distance = instrument.points_to_price(self.config.stop_points);
            instrument.round_price(entry - side.sign() * distance)
        })
    }

    /// Derive initial stop/target for a freshly opened (or flipped)
    /// position, discarding any previously cached levels.
    pub fn arm(&mut self, position: &Position, instrument: &Instrument) {
        let sign = position.side.sign();
        let mut ratchet = StopRatchet::new(position.side);

        if let Some(stop) = self.initial_stop(position.side, position.entry_price, instrument) {
            ratchet.propose(stop);
        }

        let target = ProtectionConfig::enabled(self.config.take_profit_points).then(|| {
            let distance = instrument.points_to_price(self.config.take_profit_points);
            instrument.round_price(position.entry_price + sign * distance)
        });

        tracing::debug!(
            symbol = %position.symbol,
            side = ?position.side,
            entry = position.entry_price,
            stop = ?ratchet.level(),
            target = ?target,
            "protection armed"
        );

        self.armed = Some(Armed {
            side: position.side,
            entry: position.entry_price,
            ratchet,
            target,
            breakeven_done: false,
        });
    }

    /// Clear every cached protective level. Must be called when the
    /// position goes flat; no stale stop survives.
    pub fn disarm(&mut self) {
        self.armed = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn stop_price(&self) -> Option<f64> {
        self.armed.as_ref().and_then(|a| a.ratchet.level())
    }

    pub fn target_price(&self) -> Option<f64> {
        self.armed.as_ref().and_then(|a| a.target)
    }

    /// Evaluate the protective ladder against a freshly closed bar.
    pub fn on_bar(
        &mut self,
        position: &Position,
        bar: &Bar,
        instrument: &Instrument,
    ) -> ProtectIntent {
        let needs_rearm = match &self.armed {
            None => true,
            Some(armed) => {
                armed.side != position.side
                    || (armed.entry - position.entry_price).abs() > PRICE_EPS
            }
        };
        if needs_rearm {
            self.arm(position, instrument);
        }

        let armed = self.armed.as_mut().expect("armed after arm()");
        let side = armed.side;
        let sign = side.sign();

        // 1. Stop-loss first. A bar straddling both stop and target books
        //    the stop.
        if let Some(stop) = armed.ratchet.level() {
            let touched = match side {
                Side::Long => bar.low <= stop + PRICE_EPS,
                Side::Short => bar.high >= stop - PRICE_EPS,
            };
            if touched {
                return ProtectIntent::Exit {
                    reason: ExitReason::StopLoss,
                    price: stop,
                };
            }
        }

        // 2. Take-profit.
        if let Some(target) = armed.target {
            let touched = match side {
                Side::Long => bar.high >= target - PRICE_EPS,
                Side::Short => bar.low <= target + PRICE_EPS,
            };
            if touched {
                return ProtectIntent::Exit {
                    reason: ExitReason::TakeProfit,
                    price: target,
                };
            }
        }

        // 3. Break-even, then 4. trailing. Both produce stop proposals;
        //    the tighter one wins, then the ratchet has the final word.
        let mut proposal: Option<f64> = None;

        if ProtectionConfig::enabled(self.config.breakeven_trigger_points) && !armed.breakeven_done
        {
            let trigger = instrument.points_to_price(self.config.breakeven_trigger_points);
            if position.favorable_move(bar.close) >= trigger - PRICE_EPS {
                let lock =
                    instrument.points_to_price(self.config.breakeven_lock_points.max(0.0));
                proposal = Some(armed.entry + sign * lock);
                armed.breakeven_done = true;
            }
        }

        if ProtectionConfig::enabled(self.config.trailing_points) {
            let trail = instrument.points_to_price(self.config.trailing_points);
            let candidate = bar.close - sign * trail;
            proposal = Some(match proposal {
                None => candidate,
                // Long keeps the higher stop, short the lower.
                Some(current) => match side {
                    Side::Long => current.max(candidate),
                    Side::Short => current.min(candidate),
                },
            });
        }

        if let Some(proposed) = proposal {
            let proposed = instrument.round_price(proposed);
            let before = armed.ratchet.level();
            let after = armed.ratchet.propose(proposed);
            if before != Some(after) {
                tracing::debug!(
                    symbol = %position.symbol,
                    side = ?side,
                    from = ?before,
                    to = after,
                    "stop advanced"
                );
                return ProtectIntent::AdjustStop { stop: after };
            }
        }

        ProtectIntent::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn eurusd() -> Instrument {
        Instrument::new("EURUSD", 0.0001, 4, 0.01, 0.01).unwrap()
    }

    fn long(entry: f64) -> Position {
        Position::new(
            "EURUSD",
            Side::Long,
            1.0,
            entry,
            Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap(),
        )
    }

    fn short(entry: f64) -> Position {
        Position::new(
            "EURUSD",
            Side::Short,
            1.0,
            entry,
            Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap(),
        )
    }

    fn bar(low: f64, high: f64, close: f64) -> Bar {
        Bar {
            symbol: "EURUSD".into(),
            open_time: Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap(),
            open: close,
            high,
            low,
            close,
            volume: 100,
        }
    }

    fn config(stop: f64, tp: f64) -> ProtectionConfig {
        ProtectionConfig {
            stop_points: stop,
            take_profit_points: tp,
            ..ProtectionConfig::disabled()
        }
    }

    #[test]
    fn arm_derives_stop_and_target_from_entry() {
        let mut ctl = ProtectionController::new(config(20.0, 40.0));
        ctl.arm(&long(1.2000), &eurusd());
        assert!((ctl.stop_price().unwrap() - 1.1980).abs() < 1e-9);
        assert!((ctl.target_price().unwrap() - 1.2040).abs() < 1e-9);
    }

    #[test]
    fn stop_touch_exits_at_stop_price() {
        let mut ctl = ProtectionController::new(config(20.0, 0.0));
        let pos = long(1.2000);
        let intent = ctl.on_bar(&pos, &bar(1.1975, 1.2005, 1.1990), &eurusd());
        assert_eq!(
            intent,
            ProtectIntent::Exit {
                reason: ExitReason::StopLoss,
                price: 1.1980,
            }
        );
    }

    #[test]
    fn target_touch_exits_at_target_price() {
        let mut ctl = ProtectionController::new(config(20.0, 40.0));
        let pos = long(1.2000);
        let intent = ctl.on_bar(&pos, &bar(1.1995, 1.2045, 1.2030), &eurusd());
        assert_eq!(
            intent,
            ProtectIntent::Exit {
                reason: ExitReason::TakeProfit,
                price: 1.2040,
            }
        );
    }

    #[test]
    fn straddling_bar_resolves_to_stop() {
        // One bar spans both the stop and the target: the stop wins.
        let mut ctl = ProtectionController::new(config(20.0, 40.0));
        let pos = long(1.2000);
        let intent = ctl.on_bar(&pos, &bar(1.1970, 1.2050, 1.2010), &eurusd());
        assert_eq!(
            intent,
            ProtectIntent::Exit {
                reason: ExitReason::StopLoss,
                price: 1.1980,
            }
        );
    }

    #[test]
    fn breakeven_locks_one_point_past_entry() {
        let cfg = ProtectionConfig {
            stop_points: 20.0,
            breakeven_trigger_points: 10.0,
            breakeven_lock_points: 1.0,
            ..ProtectionConfig::disabled()
        };
        let mut ctl = ProtectionController::new(cfg);
        let pos = long(1.2000);

        // First bar: quiet, stop stays at 1.1980.
        let intent = ctl.on_bar(&pos, &bar(1.1995, 1.2005, 1.2003), &eurusd());
        assert_eq!(intent, ProtectIntent::Hold);

        // Close reaches 1.2050: break-even locks at 1.2001.
        let intent = ctl.on_bar(&pos, &bar(1.2000, 1.2055, 1.2050), &eurusd());
        assert_eq!(intent, ProtectIntent::AdjustStop { stop: 1.2001 });

        // Later bars never move the stop back below the lock.
        let intent = ctl.on_bar(&pos, &bar(1.2005, 1.2020, 1.2010), &eurusd());
        assert_eq!(intent, ProtectIntent::Hold);
        assert!(ctl.stop_price().unwrap() >= 1.2001 - 1e-9);
    }

    #[test]
    fn breakeven_triggers_once() {
        let cfg = ProtectionConfig {
            breakeven_trigger_points: 10.0,
            breakeven_lock_points: 1.0,
            ..ProtectionConfig::disabled()
        };
        let mut ctl = ProtectionController::new(cfg);
        let pos = long(1.2000);

        let intent = ctl.on_bar(&pos, &bar(1.2000, 1.2055, 1.2050), &eurusd());
        assert_eq!(intent, ProtectIntent::AdjustStop { stop: 1.2001 });

        // Profitable again, but the lock does not re-fire.
        let intent = ctl.on_bar(&pos, &bar(1.2010, 1.2070, 1.2060), &eurusd());
        assert_eq!(intent, ProtectIntent::Hold);
    }

    #[test]
    fn trailing_advances_with_close_and_never_retreats() {
        let cfg = ProtectionConfig {
            trailing_points: 15.0,
            ..ProtectionConfig::disabled()
        };
        let mut ctl = ProtectionController::new(cfg);
        let pos = long(1.2000);

        let intent = ctl.on_bar(&pos, &bar(1.2000, 1.2035, 1.2030), &eurusd());
        assert_eq!(intent, ProtectIntent::AdjustStop { stop: 1.2015 });

        // Close falls back: proposed 1.1995 is looser, stop holds.
        let intent = ctl.on_bar(&pos, &bar(1.2005, 1.2030, 1.2010), &eurusd());
        assert_eq!(intent, ProtectIntent::Hold);
        assert!((ctl.stop_price().unwrap() - 1.2015).abs() < 1e-9);
    }

    #[test]
    fn short_trailing_moves_down_only() {
        let cfg = ProtectionConfig {
            trailing_points: 15.0,
            ..ProtectionConfig::disabled()
        };
        let mut ctl = ProtectionController::new(cfg);
        let pos = short(1.2000);

        let intent = ctl.on_bar(&pos, &bar(1.1965, 1.2000, 1.1970), &eurusd());
        assert_eq!(intent, ProtectIntent::AdjustStop { stop: 1.1985 });

        let intent = ctl.on_bar(&pos, &bar(1.1970, 1.1995, 1.1990), &eurusd());
        assert_eq!(intent, ProtectIntent::Hold);
        assert!((ctl.stop_price().unwrap() - 1.1985).abs() < 1e-9);
    }

    #[test]
    fn zero_distance_disables_feature() {
        let mut ctl = ProtectionController::new(ProtectionConfig::disabled());
        let pos = long(1.2000);
        let intent = ctl.on_bar(&pos, &bar(1.1000, 1.3000, 1.2000), &eurusd());
        assert_eq!(intent, ProtectIntent::Hold);
        assert_eq!(ctl.stop_price(), None);
        assert_eq!(ctl.target_price(), None);
    }

    #[test]
    fn flip_resets_levels_for_new_direction() {
        let mut ctl = ProtectionController::new(config(20.0, 0.0));
        let pos = long(1.2000);
        ctl.on_bar(&pos, &bar(1.1995, 1.2010, 1.2005), &eurusd());
        assert!((ctl.stop_price().unwrap() - 1.1980).abs() < 1e-9);

        // Same controller sees a short at a new entry: old long stop is
        // gone, the short stop sits above the new entry.
        let flipped = short(1.2005);
        ctl.on_bar(&flipped, &bar(1.2000, 1.2010, 1.2003), &eurusd());
        assert!((ctl.stop_price().unwrap() - 1.2025).abs() < 1e-9);
    }

    #[test]
    fn disarm_clears_all_levels() {
        let mut ctl = ProtectionController::new(config(20.0, 40.0));
        ctl.arm(&long(1.2000), &eurusd());
        assert!(ctl.is_armed());
        ctl.disarm();
        assert!(!ctl.is_armed());
        assert_eq!(ctl.stop_price(), None);
        assert_eq!(ctl.target_price(), None);
    }

    #[test]
    fn five_digit_instrument_uses_fractional_pip_rule() {
        let inst = Instrument::new("EURUSD", 0.00001, 5, 0.01, 0.01).unwrap();
        let mut ctl = ProtectionController::new(config(20.0, 0.0));
        ctl.arm(&long(1.20000), &inst);
        // 20 points * 0.00001 * 10 = 0.0020
        assert!((ctl.stop_price().unwrap() - 1.19800).abs() < 1e-9);
    }

    #[test]
    fn protection_params_roundtrip() {
        let mut params = ParamValues::new();
        params.set("stop_points", 35.0);
        params.set("trailing_points", 12.0);
        let cfg = ProtectionConfig::from_params(&params);
        assert_eq!(cfg.stop_points, 35.0);
        assert_eq!(cfg.trailing_points, 12.0);
        // Unset keys fall back to the `param_specs` defaults.
        assert_eq!(cfg.take_profit_points, 40.0);
    }
}

//! Position sizing.
//!
//! Two sizers cover the collection: a fixed lot count, and equity-risk
//! sizing that works backwards from the stop distance. Both snap to the
//! instrument's lot grid.

use crate::domain::Instrument;

/// Decides the entry volume in lots.
pub trait PositionSizer: Send + Sync {
    fn name(&self) -> &str;

    /// Volume for an entry at `entry_price`, given the initial stop (if
    /// any) and the current account equity.
    fn volume(
        &self,
        equity: f64,
        entry_price: f64,
        stop_price: Option<f64>,
        instrument: &Instrument,
    ) -> f64;
}

/// Always trade the same number of lots.
#[derive(Debug, Clone)]
pub struct FixedVolume {
    pub lots: f64,
}

impl FixedVolume {
    pub fn new(lots: f64) -> Self {
        assert!(lots > 0.0, "lots must be positive");
        Self { lots }
    }
}

impl PositionSizer for FixedVolume {
    fn name(&self) -> &str {
        "fixed_volume"
    }

    fn volume(
        &self,
        _equity: f64,
        _entry_price: f64,
        _stop_price: Option<f64>,
        instrument: &Instrument,
    ) -> f64 {
        instrument.snap_volume(self.lots)
    }
}

/// Risk a fixed fraction of equity per trade.
///
/// Volume = equity × risk_fraction / stop distance. Without a stop there
/// is nothing to size against, so the minimum volume is used.
#[derive(Debug, Clone)]
pub struct RiskPercent {
    pub risk_fraction: f64,
}

impl RiskPercent {
    pub fn new(risk_fraction: f64) -> Self {
        assert!(
            risk_fraction > 0.0 && risk_fraction < 1.0,
            "risk_fraction must be in (0, 1)"
        );
        Self { risk_fraction }
    }
}

impl PositionSizer for RiskPercent {
    fn name(&self) -> &str {
        "risk_percent"
    }

    fn volume(
        &self,
        equity: f64,
        entry_price: f64,
        stop_price: Option<f64>,
        instrument: &Instrument,
    ) -> f64 {
        let distance = match stop_price {
            Some(stop) => (entry_price - stop).abs(),
            None => return instrument.min_volume,
        };
        if distance <= 0.0 {
            return instrument.min_volume;
        }
        let risk_amount = equity * self.risk_fraction;
        instrument.snap_volume(risk_amount / distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eurusd() -> Instrument {
        Instrument::new("EURUSD", 0.0001, 4, 0.01, 0.01).unwrap()
    }

    #[test]
    fn fixed_volume_snaps_to_lot_grid() {
        let sizer = FixedVolume::new(0.25);
        let inst = Instrument::new("EURUSD", 0.0001, 4, 0.1, 0.1).unwrap();
        assert!((sizer.volume(10_000.0, 1.2, None, &inst) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn risk_percent_scales_with_stop_distance() {
        let sizer = RiskPercent::new(0.01);
        let inst = eurusd();
        // Risk 100 on a 0.0020 stop distance: 50_000 units of exposure.
        let wide = sizer.volume(10_000.0, 1.2000, Some(1.1980), &inst);
        let tight = sizer.volume(10_000.0, 1.2000, Some(1.1990), &inst);
        assert!(tight > wide);
    }

    #[test]
    fn risk_percent_without_stop_uses_minimum() {
        let sizer = RiskPercent::new(0.01);
        let inst = eurusd();
        assert_eq!(sizer.volume(10_000.0, 1.2000, None, &inst), inst.min_volume);
    }
}

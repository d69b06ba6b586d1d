//! Instrument metadata and the pip/point distance model.
//!
//! Protective distances are configured as a count of "points" and
//! converted to price distances through the instrument's pip size. The
//! retail-FX convention applies: on 3- and 5-digit instruments one pip is
//! ten ticks, everywhere else one pip is one tick.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tradable instrument metadata: tick grid and volume constraints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Instrument {
    pub symbol: String,
    /// Minimal price increment (e.g., 0.00001 on a 5-digit FX pair).
    pub tick_size: f64,
    /// Number of decimal places quoted.
    pub digits: u32,
    /// Volume granularity in lots.
    pub lot_step: f64,
    /// Smallest tradable volume in lots.
    pub min_volume: f64,
}

impl Instrument {
    pub fn new(
        symbol: impl Into<String>,
        tick_size: f64,
        digits: u32,
        lot_step: f64,
        min_volume: f64,
    ) -> Result<Self, InstrumentError> {
        let instrument = Self {
            symbol: symbol.into(),
            tick_size,
            digits,
            lot_step,
            min_volume,
        };
        instrument.validate()?;
        Ok(instrument)
    }

    /// Re-check the construction invariants. Instruments built by
    /// deserialization bypass `new`, so catalogs must call this before
    /// handing an instrument out.
    pub fn validate(&self) -> Result<(), InstrumentError> {
        if self.tick_size <= 0.0 || !self.tick_size.is_finite() {
            return Err(InstrumentError::InvalidTickSize {
                tick_size: self.tick_size,
            });
        }
        if self.lot_step <= 0.0 || self.min_volume <= 0.0 {
            return Err(InstrumentError::InvalidVolumeStep {
                lot_step: self.lot_step,
                min_volume: self.min_volume,
            });
        }
        Ok(())
    }

    /// Effective pip size.
    ///
    /// On 3- and 5-digit instruments brokers quote fractional pips, so a
    /// pip is ten ticks. On everything else a pip is one tick.
    pub fn pip_size(&self) -> f64 {
        if self.digits == 3 || self.digits == 5 {
            self.tick_size * 10.0
        } else {
            self.tick_size
        }
    }

    /// Convert a point count into a price distance.
    pub fn points_to_price(&self, points: f64) -> f64 {
        points * self.pip_size()
    }

    /// Snap a price to the nearest tick.
    pub fn round_price(&self, price: f64) -> f64 {
        (price / self.tick_size).round() * self.tick_size
    }

    /// Snap a volume down to the lot grid, flooring at `min_volume`.
    pub fn snap_volume(&self, volume: f64) -> f64 {
        let lots = (volume / self.lot_step).floor() * self.lot_step;
        lots.max(self.min_volume)
    }
}

#[derive(Debug, Error)]
pub enum InstrumentError {
    #[error("tick_size {tick_size} must be positive and finite")]
    InvalidTickSize { tick_size: f64 },

    #[error("lot_step {lot_step} and min_volume {min_volume} must be positive")]
    InvalidVolumeStep { lot_step: f64, min_volume: f64 },
}

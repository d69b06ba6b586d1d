//! Net position for a single instrument.
//!
//! The host owns position tracking; strategies receive a snapshot per
//! bar. A flat instrument is represented as `Option<Position>::None` at
//! the call sites, so a `Position` value always has nonzero volume.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }

    /// +1 for long, -1 for short.
    pub fn sign(&self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }
}

/// Snapshot of the open net position in one instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: Side,
    /// Volume in lots, always positive; direction lives in `side`.
    pub volume: f64,
    pub entry_price: f64,
    pub opened_at: DateTime<Utc>,
}

impl Position {
    pub fn new(
        symbol: impl Into<String>,
        side: Side,
        volume: f64,
        entry_price: f64,
        opened_at: DateTime<Utc>,
    ) -> Self {
        debug_assert!(volume > 0.0, "position volume must be positive");
        Self {
            symbol: symbol.into(),
            side,
            volume,
            entry_price,
            opened_at,
        }
    }

    /// Unrealized profit in price units per lot, signed by direction.
    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        self.side.sign() * (current_price - self.entry_price) * self.volume
    }

    /// Favorable price excursion from entry (positive when in profit).
    pub fn favorable_move(&self, price: f64) -> f64 {
        self.side.sign() * (price - self.entry_price)
    }
}

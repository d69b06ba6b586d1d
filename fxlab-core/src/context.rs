//! Per-bar context handed to strategies.
//!
//! Indicator values are computed by the host and delivered by name; the
//! snapshot holds the values for the bar being evaluated. Strategies that
//! need history push these into their own `SeriesWindow`s.

use std::collections::HashMap;

use crate::domain::{Bar, Instrument, Position};

/// Host-computed indicator values for one bar, keyed by the names the
/// strategy declared in `required_indicators`.
#[derive(Debug, Clone, Default)]
pub struct IndicatorSnapshot {
    values: HashMap<String, f64>,
}

impl IndicatorSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> &mut Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Value for `name`, `None` while the host indicator is warming up.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied().filter(|v| !v.is_nan())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, f64)> for IndicatorSnapshot {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Everything a strategy may read during one `on_bar` callback.
#[derive(Debug)]
pub struct BarContext<'a> {
    pub instrument: &'a Instrument,
    /// The bar that just finished on the trading timeframe.
    pub bar: &'a Bar,
    /// Latest finished bar on the confirmation timeframe, if subscribed.
    pub higher_tf_bar: Option<&'a Bar>,
    /// Open net position, `None` when flat.
    pub position: Option<&'a Position>,
    pub indicators: &'a IndicatorSnapshot,
    /// Account equity snapshot, used by sizers.
    pub equity: f64,
}

impl BarContext<'_> {
    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }
}

//! Fixed-depth value history for crossover and slope detection.
//!
//! Strategies keep one window per indicator series they watch. Depth is
//! small (the previous one to five values); the window is overwritten as
//! bars arrive and cleared on reset.

use std::collections::VecDeque;

/// Rolling window over the last `depth` observed values.
#[derive(Debug, Clone)]
pub struct SeriesWindow {
    depth: usize,
    values: VecDeque<f64>,
}

impl SeriesWindow {
    /// Depth must be at least 2 — one value cannot detect a cross.
    pub fn new(depth: usize) -> Self {
        assert!(depth >= 2, "SeriesWindow depth must be >= 2");
        Self {
            depth,
            values: VecDeque::with_capacity(depth),
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.depth {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// Most recent value.
    pub fn last(&self) -> Option<f64> {
        self.values.back().copied()
    }

    /// Value `n` bars back; `prev(0)` is `last()`.
    pub fn prev(&self, n: usize) -> Option<f64> {
        let len = self.values.len();
        if n >= len {
            return None;
        }
        self.values.get(len - 1 - n).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.depth
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// True when this series crossed above `other` on the latest bar:
    /// now above, previously at or below.
    pub fn crossed_above(&self, other: &SeriesWindow) -> bool {
        match (self.prev(0), other.prev(0), self.prev(1), other.prev(1)) {
            (Some(a), Some(b), Some(pa), Some(pb)) => a > b && pa <= pb,
            _ => false,
        }
    }

    /// True when this series crossed below `other` on the latest bar.
    pub fn crossed_below(&self, other: &SeriesWindow) -> bool {
        match (self.prev(0), other.prev(0), self.prev(1), other.prev(1)) {
            (Some(a), Some(b), Some(pa), Some(pb)) => a < b && pa >= pb,
            _ => false,
        }
    }

    /// True when the series crossed up through a fixed level.
    pub fn crossed_above_level(&self, level: f64) -> bool {
        match (self.prev(0), self.prev(1)) {
            (Some(cur), Some(prev)) => cur > level && prev <= level,
            _ => false,
        }
    }

    /// True when the series crossed down through a fixed level.
    pub fn crossed_below_level(&self, level: f64) -> bool {
        match (self.prev(0), self.prev(1)) {
            (Some(cur), Some(prev)) => cur < level && prev >= level,
            _ => false,
        }
    }

    /// Strictly increasing over the last `bars` steps.
    pub fn rising(&self, bars: usize) -> bool {
        if bars == 0 || self.len() <= bars {
            return false;
        }
        (0..bars).all(|i| match (self.prev(i), self.prev(i + 1)) {
            (Some(newer), Some(older)) => newer > older,
            _ => false,
        })
    }

    /// Strictly decreasing over the last `bars` steps.
    pub fn falling(&self, bars: usize) -> bool {
        if bars == 0 || self.len() <= bars {
            return false;
        }
        (0..bars).all(|i| match (self.prev(i), self.prev(i + 1)) {
            (Some(newer), Some(older)) => newer < older,
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(values: &[f64]) -> SeriesWindow {
        let mut w = SeriesWindow::new(values.len().max(2));
        for &v in values {
            w.push(v);
        }
        w
    }

    #[test]
    fn push_evicts_oldest_at_depth() {
        let mut w = SeriesWindow::new(3);
        for v in [1.0, 2.0, 3.0, 4.0] {
            w.push(v);
        }
        assert_eq!(w.len(), 3);
        assert_eq!(w.prev(2), Some(2.0));
        assert_eq!(w.last(), Some(4.0));
    }

    #[test]
    fn prev_indexes_backwards() {
        let w = window(&[1.0, 2.0, 3.0]);
        assert_eq!(w.prev(0), Some(3.0));
        assert_eq!(w.prev(1), Some(2.0));
        assert_eq!(w.prev(2), Some(1.0));
        assert_eq!(w.prev(3), None);
    }

    #[test]
    fn cross_above_detected() {
        let fast = window(&[1.0, 3.0]);
        let slow = window(&[2.0, 2.0]);
        assert!(fast.crossed_above(&slow));
        assert!(!fast.crossed_below(&slow));
    }

    #[test]
    fn no_cross_when_already_above() {
        let fast = window(&[3.0, 4.0]);
        let slow = window(&[2.0, 2.0]);
        assert!(!fast.crossed_above(&slow));
    }

    #[test]
    fn touch_then_separate_counts_as_cross() {
        // Equality on the previous bar still qualifies.
        let fast = window(&[2.0, 3.0]);
        let slow = window(&[2.0, 2.0]);
        assert!(fast.crossed_above(&slow));
    }

    #[test]
    fn level_crosses() {
        let rsi = window(&[28.0, 33.0]);
        assert!(rsi.crossed_above_level(30.0));
        assert!(!rsi.crossed_below_level(30.0));

        let rsi = window(&[72.0, 69.0]);
        assert!(rsi.crossed_below_level(70.0));
    }

    #[test]
    fn slope_checks() {
        let w = window(&[1.0, 2.0, 3.0]);
        assert!(w.rising(2));
        assert!(!w.falling(1));
        assert!(!w.rising(3)); // not enough history
    }

    #[test]
    fn cross_needs_two_values() {
        let fast = window(&[3.0]);
        let slow = window(&[2.0]);
        assert!(!fast.crossed_above(&slow));
    }

    #[test]
    fn clear_empties_window() {
        let mut w = window(&[1.0, 2.0]);
        w.clear();
        assert!(w.is_empty());
        assert_eq!(w.last(), None);
    }
}

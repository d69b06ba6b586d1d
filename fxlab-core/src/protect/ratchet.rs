/// Stop ratchet — stops may tighten, never loosen.
///
/// Long positions: the stop only rises. Short positions: the stop only
/// falls. This holds across break-even and trailing adjustments alike;
/// a looser proposal is silently clamped to the current level.
use crate::domain::Side;

/// Tighten-only stop level for one open position.
#[derive(Debug, Clone, PartialEq)]
pub struct StopRatchet {
    level: Option<f64>,
    side: Side,
}

impl StopRatchet {
    pub fn new(side: Side) -> Self {
        Self { level: None, side }
    }

    pub fn with_initial_level(side: Side, level: f64) -> Self {
        Self {
            level: Some(level),
            side,
        }
    }

    /// Apply a proposed stop level, returning the resulting level.
    ///
    /// - Long: result is `max(current, proposed)`.
    /// - Short: result is `min(current, proposed)`.
    /// - First proposal initializes the level as-is.
    pub fn propose(&mut self, proposed: f64) -> f64 {
        let result = match self.level {
            None => proposed,
            Some(current) => match self.side {
                Side::Long => current.max(proposed),
                Side::Short => current.min(proposed),
            },
        };
        self.level = Some(result);
        result
    }

    pub fn level(&self) -> Option<f64> {
        self.level
    }

    pub fn side(&self) -> Side {
        self.side
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_tightening_allowed() {
        let mut ratchet = StopRatchet::with_initial_level(Side::Long, 1.1980);
        assert_eq!(ratchet.propose(1.2001), 1.2001);
        assert_eq!(ratchet.level(), Some(1.2001));
    }

    #[test]
    fn long_loosening_clamped() {
        let mut ratchet = StopRatchet::with_initial_level(Side::Long, 1.2001);
        assert_eq!(ratchet.propose(1.1980), 1.2001);
        assert_eq!(ratchet.level(), Some(1.2001));
    }

    #[test]
    fn short_tightening_allowed() {
        let mut ratchet = StopRatchet::with_initial_level(Side::Short, 1.2050);
        assert_eq!(ratchet.propose(1.2010), 1.2010);
    }

    #[test]
    fn short_loosening_clamped() {
        let mut ratchet = StopRatchet::with_initial_level(Side::Short, 1.2010);
        assert_eq!(ratchet.propose(1.2050), 1.2010);
        assert_eq!(ratchet.level(), Some(1.2010));
    }

    #[test]
    fn first_proposal_initializes() {
        let mut ratchet = StopRatchet::new(Side::Long);
        assert_eq!(ratchet.level(), None);
        assert_eq!(ratchet.propose(1.1950), 1.1950);
        assert_eq!(ratchet.level(), Some(1.1950));
    }

    #[test]
    fn volatility_expansion_cannot_widen_stop() {
        // Price ran up, then a volatile bar proposes a much looser trail.
        let mut ratchet = StopRatchet::with_initial_level(Side::Long, 1.2020);
        assert_eq!(ratchet.propose(1.1990), 1.2020);
    }
}

//! Momentum window applied before any PID test.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Minimum momentum (GeV/c) by preset code.
pub const P_MIN_PRESETS: [f64; 10] = [0.0, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];

/// Maximum momentum (GeV/c) by preset code. Code 0 means no maximum.
pub const P_MAX_PRESETS: [f64; 9] = [P_NO_MAXIMUM, 0.3, 0.4, 0.5, 0.6, 0.7, 2.0, 3.0, 4.0];

/// Upper momentum stored for "no maximum".
pub const P_NO_MAXIMUM: f64 = 1.0e6;

/// Maxima at or above this are printed as "no maximum".
const P_MAX_PRINT_LIMIT: f64 = 9990.0;

fn lookup(table: &[f64], name: &'static str, code: i32) -> Result<f64> {
    usize::try_from(code)
        .ok()
        .and_then(|idx| table.get(idx).copied())
        .ok_or(Error::InvalidPreset { table: name, code })
}

/// Inclusive `[min_p, max_p]` acceptance window on total momentum.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MomentumGate {
    min_p: f64,
    max_p: f64,
}

impl Default for MomentumGate {
    fn default() -> Self {
        Self {
            min_p: 0.0,
            max_p: P_NO_MAXIMUM,
        }
    }
}

impl MomentumGate {
    /// Creates the code-0 window `[0, P_NO_MAXIMUM]`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the lower edge from its preset code.
    pub fn set_min(&mut self, code: i32) -> Result<()> {
        self.min_p = lookup(&P_MIN_PRESETS, "P minimum", code)
            .inspect_err(|err| log::error!("{err}"))?;
        Ok(())
    }

    /// Sets the upper edge from its preset code.
    pub fn set_max(&mut self, code: i32) -> Result<()> {
        self.max_p = lookup(&P_MAX_PRESETS, "P maximum", code)
            .inspect_err(|err| log::error!("{err}"))?;
        Ok(())
    }

    /// Lower edge in GeV/c.
    #[must_use]
    pub fn min_p(&self) -> f64 {
        self.min_p
    }

    /// Upper edge in GeV/c.
    #[must_use]
    pub fn max_p(&self) -> f64 {
        self.max_p
    }

    /// Returns true if the upper edge is effectively unbounded.
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.max_p >= P_MAX_PRINT_LIMIT
    }

    /// Inclusive on both edges.
    #[inline]
    #[must_use]
    pub fn accepts(&self, p: f64) -> bool {
        self.min_p <= p && p <= self.max_p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_window() {
        let gate = MomentumGate::new();
        assert!(gate.accepts(0.0));
        assert!(gate.accepts(P_NO_MAXIMUM));
        assert!(!gate.accepts(2.0e6));
        assert!(!gate.accepts(-0.1));
        assert!(gate.is_unbounded());
    }

    #[test]
    fn test_min_presets() {
        let mut gate = MomentumGate::new();
        gate.set_min(1).unwrap();
        assert_relative_eq!(gate.min_p(), 0.2);
        gate.set_min(9).unwrap();
        assert_relative_eq!(gate.min_p(), 1.0);
        gate.set_min(0).unwrap();
        assert_relative_eq!(gate.min_p(), 0.0);
    }

    #[test]
    fn test_max_presets() {
        let mut gate = MomentumGate::new();
        gate.set_max(5).unwrap();
        assert_relative_eq!(gate.max_p(), 0.7);
        gate.set_max(6).unwrap();
        assert_relative_eq!(gate.max_p(), 2.0);
        gate.set_max(0).unwrap();
        assert_relative_eq!(gate.max_p(), P_NO_MAXIMUM);
        assert!(gate.is_unbounded());
    }

    #[test]
    fn test_edges_are_inclusive() {
        let mut gate = MomentumGate::new();
        gate.set_min(2).unwrap();
        gate.set_max(7).unwrap();

        assert!(gate.accepts(0.3));
        assert!(gate.accepts(3.0));
        assert!(!gate.accepts(0.3 - 1e-9));
        assert!(!gate.accepts(3.0 + 1e-9));
    }

    #[test]
    fn test_invalid_codes_keep_window() {
        let mut gate = MomentumGate::new();
        gate.set_min(3).unwrap();
        gate.set_max(8).unwrap();
        let before = gate;

        assert!(gate.set_min(10).is_err());
        assert!(gate.set_max(9).is_err());
        assert!(gate.set_max(-1).is_err());
        assert_eq!(gate, before);
    }
}

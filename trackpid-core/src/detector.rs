//! Detectors and the cut categories built on them.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// PID detector providing an n-sigma response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Detector {
    /// Inner tracking system, dE/dx.
    Its,
    /// Time projection chamber, dE/dx.
    Tpc,
    /// Time-of-flight.
    Tof,
}

impl Detector {
    /// All detectors, in band-table order.
    pub const ALL: [Detector; 3] = [Detector::Its, Detector::Tpc, Detector::Tof];

    /// Detector label as printed in cut descriptions.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Detector::Its => "ITS",
            Detector::Tpc => "TPC",
            Detector::Tof => "TOF",
        }
    }
}

impl fmt::Display for Detector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Cut category evaluated for every track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CutKind {
    ItsDedx,
    TpcDedx,
    Tof,
    TpcTof2D,
}

impl CutKind {
    /// Number of cut categories.
    pub const COUNT: usize = 4;

    /// All categories in bookkeeping order.
    pub const ALL: [CutKind; Self::COUNT] = [
        CutKind::ItsDedx,
        CutKind::TpcDedx,
        CutKind::Tof,
        CutKind::TpcTof2D,
    ];

    /// Bookkeeping index of the category.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            CutKind::ItsDedx => 0,
            CutKind::TpcDedx => 1,
            CutKind::Tof => 2,
            CutKind::TpcTof2D => 3,
        }
    }

    /// Statistics label of the category.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            CutKind::ItsDedx => "ITS dE/dx n#sigma",
            CutKind::TpcDedx => "TPC dE/dx n#sigma",
            CutKind::Tof => "TOF n#sigma",
            CutKind::TpcTof2D => "TPC+TOF 2D",
        }
    }
}

/// Set of cut categories, one bit per [`CutKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CutSet(u8);

impl CutSet {
    /// Empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Adds a category.
    pub fn insert(&mut self, kind: CutKind) {
        self.0 |= 1 << kind.index();
    }

    /// Sets or clears a category.
    pub fn set(&mut self, kind: CutKind, on: bool) {
        if on {
            self.insert(kind);
        } else {
            self.0 &= !(1 << kind.index());
        }
    }

    /// Returns true if the category is in the set.
    #[inline]
    #[must_use]
    pub fn contains(self, kind: CutKind) -> bool {
        self.0 & (1 << kind.index()) != 0
    }

    /// Returns true if no category is set.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of categories in the set.
    #[must_use]
    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Iterates over the categories in bookkeeping order.
    pub fn iter(self) -> impl Iterator<Item = CutKind> {
        CutKind::ALL
            .into_iter()
            .filter(move |&kind| self.contains(kind))
    }
}

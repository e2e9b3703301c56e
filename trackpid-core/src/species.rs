//! Particle species, per-detector species masks and truth classification.

use std::fmt;
use std::ops::BitAnd;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Particle species hypothesis.
///
/// The five identified species index the band tables; `Unknown` is only
/// produced by truth classification and never carries a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Species {
    Electron,
    Muon,
    Pion,
    Kaon,
    Proton,
    Unknown,
}

impl Species {
    /// Number of identified species.
    pub const COUNT: usize = 5;

    /// Identified species in table order.
    pub const IDENTIFIED: [Species; Self::COUNT] = [
        Species::Electron,
        Species::Muon,
        Species::Pion,
        Species::Kaon,
        Species::Proton,
    ];

    /// Table index of the species, `None` for `Unknown`.
    #[inline]
    #[must_use]
    pub fn index(self) -> Option<usize> {
        match self {
            Species::Electron => Some(0),
            Species::Muon => Some(1),
            Species::Pion => Some(2),
            Species::Kaon => Some(3),
            Species::Proton => Some(4),
            Species::Unknown => None,
        }
    }

    /// Full particle name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Species::Electron => "electron",
            Species::Muon => "muon",
            Species::Pion => "pion",
            Species::Kaon => "kaon",
            Species::Proton => "proton",
            Species::Unknown => "unknown",
        }
    }

    /// Short particle name, used in QA storage names.
    #[must_use]
    pub fn short_name(self) -> &'static str {
        match self {
            Species::Electron => "e",
            Species::Muon => "mu",
            Species::Pion => "pi",
            Species::Kaon => "K",
            Species::Proton => "p",
            Species::Unknown => "unknown",
        }
    }

    /// Maps a PDG particle code onto a species.
    ///
    /// Particles and antiparticles share a species; anything outside the
    /// five identified species classifies as `Unknown`.
    #[must_use]
    pub fn from_pdg(pdg_code: i32) -> Species {
        match pdg_code.unsigned_abs() {
            11 => Species::Electron,
            13 => Species::Muon,
            211 => Species::Pion,
            321 => Species::Kaon,
            2212 => Species::Proton,
            _ => Species::Unknown,
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Species {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "electron" | "e" => Ok(Species::Electron),
            "muon" | "mu" => Ok(Species::Muon),
            "pion" | "pi" => Ok(Species::Pion),
            "kaon" | "k" => Ok(Species::Kaon),
            "proton" | "p" => Ok(Species::Proton),
            "unknown" => Ok(Species::Unknown),
            other => Err(format!("unknown particle species '{other}'")),
        }
    }
}

/// Set of identified species, one bit per species index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpeciesMask(u8);

impl SpeciesMask {
    /// Mask with no species set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Sets the bit of `species`. `Unknown` is ignored.
    pub fn insert(&mut self, species: Species) {
        if let Some(idx) = species.index() {
            self.0 |= 1 << idx;
        }
    }

    /// Clears the bit of `species`.
    pub fn remove(&mut self, species: Species) {
        if let Some(idx) = species.index() {
            self.0 &= !(1 << idx);
        }
    }

    /// Returns true if `species` is in the mask.
    #[inline]
    #[must_use]
    pub fn contains(self, species: Species) -> bool {
        species.index().is_some_and(|idx| self.0 & (1 << idx) != 0)
    }

    /// Number of species in the mask.
    #[must_use]
    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Returns true if no species is set.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates over the species in the mask, in table order.
    pub fn iter(self) -> impl Iterator<Item = Species> {
        Species::IDENTIFIED
            .into_iter()
            .filter(move |&species| self.contains(species))
    }
}

impl BitAnd for SpeciesMask {
    type Output = SpeciesMask;

    fn bitand(self, rhs: Self) -> Self::Output {
        SpeciesMask(self.0 & rhs.0)
    }
}

impl FromIterator<Species> for SpeciesMask {
    fn from_iter<I: IntoIterator<Item = Species>>(iter: I) -> Self {
        let mut mask = SpeciesMask::empty();
        for species in iter {
            mask.insert(species);
        }
        mask
    }
}

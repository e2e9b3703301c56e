//! n-sigma bands and their frozen per-detector preset tables.

use crate::detector::Detector;
use crate::error::{Error, Result};
use crate::species::{Species, SpeciesMask};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Accepted n-sigma interval around a species line.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SigmaBand {
    /// n-sigma below the line.
    pub below: f64,
    /// n-sigma above the line.
    pub above: f64,
}

impl SigmaBand {
    /// Bounds stored for a disabled band.
    pub const PASSIVE: SigmaBand = SigmaBand::new(-100.0, 100.0);

    /// Creates a band.
    #[must_use]
    pub const fn new(below: f64, above: f64) -> Self {
        Self { below, above }
    }

    /// Inclusion test for the target species: `below < n_sigma < above`.
    #[inline]
    #[must_use]
    pub fn includes(&self, n_sigma: f64) -> bool {
        self.below < n_sigma && n_sigma < self.above
    }

    /// Separation test for a contaminating species: the signal lies
    /// strictly outside `[below, above]`.
    #[inline]
    #[must_use]
    pub fn separates(&self, n_sigma: f64) -> bool {
        n_sigma < self.below || self.above < n_sigma
    }
}

impl Default for SigmaBand {
    fn default() -> Self {
        Self::PASSIVE
    }
}

// Index is the preset code; code 0 is the passive (disabled) band.
const ITS_PRESETS: [Option<SigmaBand>; 9] = [
    None,
    Some(SigmaBand::new(-10.0, 10.0)),
    Some(SigmaBand::new(-6.0, 7.0)),
    Some(SigmaBand::new(-5.0, 5.0)),
    Some(SigmaBand::new(-4.0, 5.0)),
    Some(SigmaBand::new(-3.0, 5.0)),
    Some(SigmaBand::new(-4.0, 4.0)),
    Some(SigmaBand::new(-2.5, 4.0)),
    Some(SigmaBand::new(-2.0, 3.5)),
];

const TPC_PRESETS: [Option<SigmaBand>; 10] = [
    None,
    Some(SigmaBand::new(-10.0, 10.0)),
    Some(SigmaBand::new(-6.0, 7.0)),
    Some(SigmaBand::new(-5.0, 5.0)),
    Some(SigmaBand::new(-4.0, 5.0)),
    Some(SigmaBand::new(-4.0, 4.0)),
    Some(SigmaBand::new(-3.0, 4.0)),
    Some(SigmaBand::new(-3.0, 3.0)),
    Some(SigmaBand::new(-3.0, 5.0)),
    Some(SigmaBand::new(-2.0, 3.0)),
];

const TOF_PRESETS: [Option<SigmaBand>; 6] = [
    None,
    Some(SigmaBand::new(-7.0, 7.0)),
    Some(SigmaBand::new(-5.0, 5.0)),
    Some(SigmaBand::new(-3.0, 5.0)),
    Some(SigmaBand::new(-2.0, 3.0)),
    Some(SigmaBand::new(-3.0, 3.0)),
];

/// Preset table of a detector, indexed by preset code.
#[must_use]
pub fn presets(detector: Detector) -> &'static [Option<SigmaBand>] {
    match detector {
        Detector::Its => &ITS_PRESETS,
        Detector::Tpc => &TPC_PRESETS,
        Detector::Tof => &TOF_PRESETS,
    }
}

fn preset_table_name(detector: Detector) -> &'static str {
    match detector {
        Detector::Its => "ITS dEdx n sigmas cut",
        Detector::Tpc => "TPC dEdx n sigmas cut",
        Detector::Tof => "TOF n sigmas cut",
    }
}

/// Looks up a preset code. `Ok(None)` is the passive band of code 0.
pub fn preset_band(detector: Detector, code: i32) -> Result<Option<SigmaBand>> {
    usize::try_from(code)
        .ok()
        .and_then(|idx| presets(detector).get(idx).copied())
        .ok_or(Error::InvalidPreset {
            table: preset_table_name(detector),
            code,
        })
}

/// Per-species bands of one detector plus the mask of enabled species.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SigmaBandTable {
    detector: Detector,
    bands: [SigmaBand; Species::COUNT],
    enabled: SpeciesMask,
}

impl SigmaBandTable {
    /// Creates a table with every species passive.
    #[must_use]
    pub fn new(detector: Detector) -> Self {
        Self {
            detector,
            bands: [SigmaBand::PASSIVE; Species::COUNT],
            enabled: SpeciesMask::empty(),
        }
    }

    /// Detector this table belongs to.
    #[must_use]
    pub fn detector(&self) -> Detector {
        self.detector
    }

    /// Applies a preset code to one species.
    ///
    /// Code 0 disables the species. An unsupported code leaves the table
    /// untouched.
    pub fn apply_preset(&mut self, species: Species, code: i32) -> Result<()> {
        let idx = species.index().ok_or(Error::NoBand(species))?;
        let preset = preset_band(self.detector, code).inspect_err(|err| log::error!("{err}"))?;

        match preset {
            Some(band) => {
                self.bands[idx] = band;
                self.enabled.insert(species);
            }
            None => {
                self.bands[idx] = SigmaBand::PASSIVE;
                self.enabled.remove(species);
            }
        }
        Ok(())
    }

    /// Band of a species. Meaningless unless the species is enabled.
    #[must_use]
    pub fn band(&self, species: Species) -> SigmaBand {
        species
            .index()
            .map_or(SigmaBand::PASSIVE, |idx| self.bands[idx])
    }

    /// Returns true if the species has an active band.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self, species: Species) -> bool {
        self.enabled.contains(species)
    }

    /// Mask of species with an active band.
    #[must_use]
    pub fn enabled(&self) -> SpeciesMask {
        self.enabled
    }

    /// The detector cut is active when at least one species is enabled.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.enabled.is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_band_inclusion_is_strict() {
        let band = SigmaBand::new(-3.0, 5.0);
        assert!(band.includes(0.0));
        assert!(band.includes(-2.999));
        assert!(!band.includes(-3.0));
        assert!(!band.includes(5.0));
        assert!(!band.includes(7.0));
    }

    #[test]
    fn test_band_separation_excludes_boundaries() {
        let band = SigmaBand::new(-3.0, 5.0);
        assert!(band.separates(-3.001));
        assert!(band.separates(5.001));
        assert!(!band.separates(-3.0));
        assert!(!band.separates(5.0));
        assert!(!band.separates(1.0));
    }

    #[test]
    fn test_preset_tables() {
        assert_eq!(preset_band(Detector::Its, 0), Ok(None));
        assert_eq!(
            preset_band(Detector::Its, 7),
            Ok(Some(SigmaBand::new(-2.5, 4.0)))
        );
        assert_eq!(
            preset_band(Detector::Its, 8),
            Ok(Some(SigmaBand::new(-2.0, 3.5)))
        );
        assert_eq!(
            preset_band(Detector::Tpc, 9),
            Ok(Some(SigmaBand::new(-2.0, 3.0)))
        );
        assert_eq!(
            preset_band(Detector::Tof, 5),
            Ok(Some(SigmaBand::new(-3.0, 3.0)))
        );

        assert!(preset_band(Detector::Its, 9).is_err());
        assert!(preset_band(Detector::Tpc, 10).is_err());
        assert!(preset_band(Detector::Tof, 6).is_err());
        assert!(preset_band(Detector::Tof, -1).is_err());
    }

    #[test]
    fn test_preset_bands_are_ordered() {
        for detector in Detector::ALL {
            for band in presets(detector).iter().flatten() {
                assert!(band.below <= band.above);
            }
        }
    }

    #[test]
    fn test_apply_and_disable() {
        let mut table = SigmaBandTable::new(Detector::Tpc);
        assert!(!table.is_active());

        table.apply_preset(Species::Pion, 6).unwrap();
        assert!(table.is_active());
        assert!(table.is_enabled(Species::Pion));
        assert_eq!(table.band(Species::Pion), SigmaBand::new(-3.0, 4.0));

        table.apply_preset(Species::Pion, 0).unwrap();
        assert!(!table.is_active());
        assert_eq!(table.band(Species::Pion), SigmaBand::PASSIVE);
    }

    #[test]
    fn test_invalid_preset_leaves_table_untouched() {
        let mut table = SigmaBandTable::new(Detector::Tof);
        table.apply_preset(Species::Kaon, 2).unwrap();
        let before = table.clone();

        let err = table.apply_preset(Species::Kaon, 42).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidPreset {
                table: "TOF n sigmas cut",
                code: 42
            }
        );
        assert_eq!(table, before);
    }

    #[test]
    fn test_unknown_species_has_no_band() {
        let mut table = SigmaBandTable::new(Detector::Its);
        assert_eq!(
            table.apply_preset(Species::Unknown, 1),
            Err(Error::NoBand(Species::Unknown))
        );
        assert!(!table.is_active());
    }
}

//! Flat parameter ID space of the PID cut and the combined TPC+TOF modes.

use crate::detector::Detector;
use crate::error::{Error, Result};
use crate::species::Species;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One configurable parameter of the PID cut.
///
/// The numeric IDs are a frozen contract: cut descriptors and job
/// configurations refer to parameters by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CutParameter {
    /// Minimum momentum code.
    PMin,
    /// Maximum momentum code.
    PMax,
    /// Per-species band code of a detector.
    Band(Detector, Species),
    /// Combined TPC+TOF mode code.
    TpcTofMode,
}

impl CutParameter {
    /// Number of parameters.
    pub const COUNT: usize = 18;

    const BAND_BASE: usize = 2;

    /// All parameters in ID order.
    #[must_use]
    pub fn all() -> [CutParameter; Self::COUNT] {
        let mut all = [CutParameter::PMin; Self::COUNT];
        for (id, slot) in all.iter_mut().enumerate() {
            *slot = Self::from_index(id).unwrap_or(CutParameter::PMin);
        }
        all
    }

    fn from_index(id: usize) -> Option<Self> {
        match id {
            0 => Some(CutParameter::PMin),
            1 => Some(CutParameter::PMax),
            17 => Some(CutParameter::TpcTofMode),
            2..=16 => {
                let offset = id - Self::BAND_BASE;
                let detector = Detector::ALL[offset / Species::COUNT];
                let species = Species::IDENTIFIED[offset % Species::COUNT];
                Some(CutParameter::Band(detector, species))
            }
            _ => None,
        }
    }

    /// Resolves a numeric parameter ID.
    pub fn from_id(id: i32) -> Result<Self> {
        usize::try_from(id)
            .ok()
            .and_then(Self::from_index)
            .ok_or(Error::UnknownParameter(id))
    }

    /// Numeric ID of the parameter. `Band` with `Species::Unknown` has none.
    #[must_use]
    pub fn id(self) -> Option<usize> {
        match self {
            CutParameter::PMin => Some(0),
            CutParameter::PMax => Some(1),
            CutParameter::TpcTofMode => Some(17),
            CutParameter::Band(detector, species) => {
                let det = Detector::ALL.iter().position(|&d| d == detector)?;
                Some(Self::BAND_BASE + det * Species::COUNT + species.index()?)
            }
        }
    }
}

/// Combined TPC+TOF configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CombinedMode {
    /// A valid TOF hit is mandatory for acceptance.
    pub tof_required: bool,
    /// TPC and TOF act as one joint elliptical cut.
    pub joint_2d: bool,
}

/// Combined modes by preset code.
pub const COMBINED_MODE_PRESETS: [CombinedMode; 4] = [
    CombinedMode {
        tof_required: false,
        joint_2d: false,
    },
    CombinedMode {
        tof_required: true,
        joint_2d: false,
    },
    CombinedMode {
        tof_required: false,
        joint_2d: true,
    },
    CombinedMode {
        tof_required: true,
        joint_2d: true,
    },
];

impl CombinedMode {
    /// Looks up a combined mode preset code.
    pub fn from_code(code: i32) -> Result<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| COMBINED_MODE_PRESETS.get(idx).copied())
            .ok_or(Error::InvalidPreset {
                table: "TOF configuration cut",
                code,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_ids_round_trip() {
        for (id, param) in CutParameter::all().into_iter().enumerate() {
            assert_eq!(param.id(), Some(id));
            assert_eq!(CutParameter::from_id(i32::try_from(id).unwrap()), Ok(param));
        }
    }

    #[test]
    fn test_parameter_layout() {
        assert_eq!(
            CutParameter::from_id(2),
            Ok(CutParameter::Band(Detector::Its, Species::Electron))
        );
        assert_eq!(
            CutParameter::from_id(9),
            Ok(CutParameter::Band(Detector::Tpc, Species::Pion))
        );
        assert_eq!(
            CutParameter::from_id(16),
            Ok(CutParameter::Band(Detector::Tof, Species::Proton))
        );
        assert_eq!(CutParameter::from_id(17), Ok(CutParameter::TpcTofMode));
        assert_eq!(CutParameter::from_id(18), Err(Error::UnknownParameter(18)));
        assert_eq!(CutParameter::from_id(-1), Err(Error::UnknownParameter(-1)));
        assert_eq!(
            CutParameter::Band(Detector::Tpc, Species::Unknown).id(),
            None
        );
    }

    #[test]
    fn test_combined_modes() {
        assert_eq!(CombinedMode::from_code(0), Ok(CombinedMode::default()));
        let both = CombinedMode::from_code(3).unwrap();
        assert!(both.tof_required && both.joint_2d);
        let joint = CombinedMode::from_code(2).unwrap();
        assert!(!joint.tof_required && joint.joint_2d);
        assert!(CombinedMode::from_code(4).is_err());
    }
}

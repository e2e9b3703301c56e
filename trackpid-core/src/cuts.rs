//! PID cut configuration: parameter facade, descriptor string and printing.
//!
//! All thresholds are set through small integer codes selecting rows of
//! frozen tables. Every accepted parameter is stored and the descriptor
//! string (the parameter values concatenated in ID order) is regenerated;
//! a rejected parameter leaves the configuration untouched.

use crate::band::SigmaBandTable;
use crate::detector::{CutKind, CutSet, Detector};
use crate::error::{Error, Result};
use crate::momentum::MomentumGate;
use crate::params::{CombinedMode, CutParameter};
use crate::species::{Species, SpeciesMask};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Complete configuration of one PID cut instance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PidCuts {
    target: Species,
    cut_number: u32,
    momentum: MomentumGate,
    its: SigmaBandTable,
    tpc: SigmaBandTable,
    tof: SigmaBandTable,
    combined: CombinedMode,
    combined_mask: SpeciesMask,
    parameters: [i32; CutParameter::COUNT],
    descriptor: String,
}

impl PidCuts {
    /// Creates a cut for `target` with every parameter at code 0.
    pub fn new(target: Species, cut_number: u32) -> Result<Self> {
        if target.index().is_none() {
            return Err(Error::UnsupportedTarget(target));
        }
        let mut cuts = Self {
            target,
            cut_number,
            momentum: MomentumGate::new(),
            its: SigmaBandTable::new(Detector::Its),
            tpc: SigmaBandTable::new(Detector::Tpc),
            tof: SigmaBandTable::new(Detector::Tof),
            combined: CombinedMode::default(),
            combined_mask: SpeciesMask::empty(),
            parameters: [0; CutParameter::COUNT],
            descriptor: String::new(),
        };
        cuts.update_descriptor();
        Ok(cuts)
    }

    /// Rebuilds a cut from a descriptor string.
    pub fn from_descriptor(target: Species, cut_number: u32, descriptor: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidDescriptor {
            descriptor: descriptor.to_string(),
            reason,
        };

        let digits: Vec<i32> = descriptor
            .chars()
            .map(|c| c.to_digit(10).and_then(|d| i32::try_from(d).ok()))
            .collect::<Option<_>>()
            .ok_or_else(|| invalid("non-digit character".to_string()))?;
        if digits.len() != CutParameter::COUNT {
            return Err(invalid(format!(
                "expected {} parameters, found {}",
                CutParameter::COUNT,
                digits.len()
            )));
        }

        let mut cuts = Self::new(target, cut_number)?;
        for (param, value) in CutParameter::all().into_iter().zip(digits) {
            cuts.set(param, value).map_err(|err| invalid(err.to_string()))?;
        }
        Ok(cuts)
    }

    /// Sets a parameter by numeric ID.
    pub fn set_parameter(&mut self, id: i32, value: i32) -> Result<()> {
        let param = CutParameter::from_id(id).inspect_err(|err| log::error!("{err}"))?;
        self.set(param, value)
    }

    /// Builder form of [`PidCuts::set_parameter`].
    pub fn with_parameter(mut self, id: i32, value: i32) -> Result<Self> {
        self.set_parameter(id, value)?;
        Ok(self)
    }

    /// Sets a parameter.
    pub fn set(&mut self, param: CutParameter, value: i32) -> Result<()> {
        let slot = param.id().ok_or(match param {
            CutParameter::Band(_, species) => Error::NoBand(species),
            _ => Error::UnknownParameter(-1),
        })?;

        match param {
            CutParameter::PMin => self.momentum.set_min(value)?,
            CutParameter::PMax => self.momentum.set_max(value)?,
            CutParameter::Band(detector, species) => {
                if detector == Detector::Tpc {
                    log::info!("Configuring TPC dEdx cut for {species}, with {value} code");
                }
                self.table_mut(detector).apply_preset(species, value)?;
                self.update_combined_mask();
            }
            CutParameter::TpcTofMode => {
                self.combined =
                    CombinedMode::from_code(value).inspect_err(|err| log::error!("{err}"))?;
                self.update_combined_mask();
            }
        }

        self.parameters[slot] = value;
        self.update_descriptor();
        Ok(())
    }

    fn table_mut(&mut self, detector: Detector) -> &mut SigmaBandTable {
        match detector {
            Detector::Its => &mut self.its,
            Detector::Tpc => &mut self.tpc,
            Detector::Tof => &mut self.tof,
        }
    }

    // The joint cut covers the species banded in both TPC and TOF; it is
    // kept in step with later band changes.
    fn update_combined_mask(&mut self) {
        self.combined_mask = if self.combined.joint_2d {
            self.tpc.enabled() & self.tof.enabled()
        } else {
            SpeciesMask::empty()
        };
    }

    fn update_descriptor(&mut self) {
        self.descriptor = self.parameters.iter().map(ToString::to_string).collect();
    }

    /// Target species.
    #[must_use]
    pub fn target(&self) -> Species {
        self.target
    }

    /// Cut number label.
    #[must_use]
    pub fn cut_number(&self) -> u32 {
        self.cut_number
    }

    /// Momentum window.
    #[must_use]
    pub fn momentum(&self) -> &MomentumGate {
        &self.momentum
    }

    /// Band table of a detector.
    #[must_use]
    pub fn table(&self, detector: Detector) -> &SigmaBandTable {
        match detector {
            Detector::Its => &self.its,
            Detector::Tpc => &self.tpc,
            Detector::Tof => &self.tof,
        }
    }

    /// Combined TPC+TOF mode.
    #[must_use]
    pub fn combined_mode(&self) -> CombinedMode {
        self.combined
    }

    /// Species covered by the joint TPC+TOF cut.
    #[must_use]
    pub fn combined_mask(&self) -> SpeciesMask {
        self.combined_mask
    }

    /// Cut categories with a non-empty enable mask.
    #[must_use]
    pub fn enabled_cuts(&self) -> CutSet {
        let mut set = CutSet::empty();
        set.set(CutKind::ItsDedx, self.its.is_active());
        set.set(CutKind::TpcDedx, self.tpc.is_active());
        set.set(CutKind::Tof, self.tof.is_active());
        set.set(CutKind::TpcTof2D, !self.combined_mask.is_empty());
        set
    }

    /// Returns true if any detector-level category is active.
    #[must_use]
    pub fn any_detector_cut(&self) -> bool {
        !self.enabled_cuts().is_empty()
    }

    /// Stored value of a parameter.
    #[must_use]
    pub fn parameter(&self, param: CutParameter) -> Option<i32> {
        param.id().map(|id| self.parameters[id])
    }

    /// Stored values of every parameter, in ID order.
    #[must_use]
    pub fn parameters(&self) -> &[i32; CutParameter::COUNT] {
        &self.parameters
    }

    /// Canonical descriptor string.
    #[must_use]
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    /// Human readable description of one parameter.
    pub fn describe_parameter(&self, id: i32) -> Result<String> {
        let line = match CutParameter::from_id(id)? {
            CutParameter::PMin => format!(
                "  Cut applicable from P min: {:3.1} GeV/c",
                self.momentum.min_p()
            ),
            CutParameter::PMax => {
                if self.momentum.is_unbounded() {
                    "  Cut applicable up to P max: ".to_string()
                } else {
                    format!(
                        "  Cut applicable up to P max: {:3.1} GeV/c",
                        self.momentum.max_p()
                    )
                }
            }
            CutParameter::Band(detector, species) => self.describe_band(detector, species),
            CutParameter::TpcTofMode => format!(
                "  TPC+TOF PID CUT {}: TOF {}, {}",
                self.target,
                if self.combined.tof_required {
                    "REQUIRED"
                } else {
                    "NOT required"
                },
                if self.combined.joint_2d {
                    "2D nsigma"
                } else {
                    "independent nsigma"
                }
            ),
        };
        Ok(line)
    }

    /// Description of every parameter, one line each.
    #[must_use]
    pub fn describe(&self) -> String {
        (0..)
            .take(CutParameter::COUNT)
            .filter_map(|id| self.describe_parameter(id).ok())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn describe_band(&self, detector: Detector, species: Species) -> String {
        let table = self.table(detector);
        let joint = self.combined.joint_2d && detector != Detector::Its;
        let active = table.is_active()
            || (detector != Detector::Its && !self.combined_mask.is_empty());

        if !active {
            return format!("  {detector} PID CUT {}: none", self.target);
        }

        let marker = if joint { " [2D] " } else { " " };
        let header = match detector {
            Detector::Tof => format!(
                "  TOF ({}){marker}PID CUT {}: ",
                if self.combined.tof_required {
                    "REQUIRED"
                } else {
                    "NOT required"
                },
                self.target
            ),
            _ => format!("  {detector}{marker}PID CUT {}: ", self.target),
        };

        if !table.is_enabled(species) {
            return format!("{header}none to {species} line");
        }

        // Species outside the TPC and TOF intersection keep their 1-D band
        let band = table.band(species);
        let in_joint = joint && self.combined_mask.contains(species);
        let body = match (species == self.target, in_joint) {
            (true, false) => format!("{:3.1} < nsigma < {:3.1}", band.below, band.above),
            (false, false) => format!(
                "nsigma {species} < {:3.1} OR {:3.1} < nsigma {species}",
                band.below, band.above
            ),
            (true, true) => format!("2D nsigma < {:3.1}", band.above),
            (false, true) => format!("{:3.1} < 2D nsigma {species}", band.above),
        };
        format!("{header}{body}")
    }
}

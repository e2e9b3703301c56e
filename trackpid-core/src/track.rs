//! Track-side inputs of the PID cut: track traits, the detector response
//! seam, and truth particles.

use crate::detector::Detector;
use crate::species::Species;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Speed of light in cm/ps.
pub const C_CM_PER_PS: f64 = 2.997_924_58e-2;

/// Computes the velocity β from the TOF measurement.
///
/// # Arguments
/// * `length_cm` - Integrated track length
/// * `tof_ps` - Raw TOF signal
/// * `start_time_ps` - Event start-time estimate
#[inline]
#[must_use]
pub fn tof_beta(length_cm: f64, tof_ps: f64, start_time_ps: f64) -> f64 {
    length_cm / (tof_ps - start_time_ps) / C_CM_PER_PS
}

/// TOF matching flags of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TofStatus {
    /// The track reached the TOF detector.
    pub tof_in: bool,
    /// The TOF hit is flagged as mismatched with the other detectors.
    pub mismatch: bool,
}

impl TofStatus {
    /// A usable TOF hit: present and not mismatched.
    #[inline]
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.tof_in && !self.mismatch
    }
}

/// Trait for reconstructed tracks seen by the PID cut.
pub trait PidTrack: Send + Sync {
    /// Total momentum in GeV/c.
    fn momentum(&self) -> f64;

    /// Truth label; negative for ghost or unassociated tracks.
    fn label(&self) -> i64;

    /// TOF matching flags.
    fn tof_status(&self) -> TofStatus;

    /// Integrated track length in cm.
    fn integrated_length(&self) -> f64;

    /// Track carrying the PID information.
    ///
    /// Constrained tracks refer back to the original track; every other
    /// track is its own PID source.
    fn pid_source(&self) -> &Self {
        self
    }
}

/// Detector response service: n-sigma values and raw signals per track.
///
/// This is the seam to the external calibration service; the cut only ever
/// asks it questions.
pub trait PidResponse<T>: Send + Sync {
    /// Number of sigmas between the measured signal and the expectation
    /// for `species`.
    fn n_sigma(&self, detector: Detector, track: &T, species: Species) -> f64;

    /// Raw detector signal: dE/dx for ITS and TPC, time in ps for TOF.
    fn raw_signal(&self, detector: Detector, track: &T) -> f64;

    /// Event start-time estimate in ps for a track of momentum `p`.
    fn tof_start_time(&self, p: f64) -> f64;
}

/// Track record with its PID response already evaluated.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TrackData {
    /// Total momentum (GeV/c).
    pub p: f64,
    /// Truth label.
    pub label: i64,
    /// ITS dE/dx signal.
    pub its_signal: f64,
    /// TPC dE/dx signal.
    pub tpc_signal: f64,
    /// TOF signal (ps).
    pub tof_signal: f64,
    /// Integrated length (cm).
    pub length: f64,
    /// TOF matching flags.
    pub tof: TofStatus,
    /// n-sigma per detector (ITS, TPC, TOF) and species.
    pub n_sigma: [[f64; Species::COUNT]; 3],
    /// Original track holding the PID information, for constrained tracks.
    pub original: Option<Box<TrackData>>,
}

impl TrackData {
    /// Creates a track with momentum `p` and all signals zero.
    #[must_use]
    pub fn new(p: f64) -> Self {
        Self {
            p,
            ..Self::default()
        }
    }

    /// Sets the truth label.
    #[must_use]
    pub fn with_label(mut self, label: i64) -> Self {
        self.label = label;
        self
    }

    /// Sets one n-sigma value.
    #[must_use]
    pub fn with_n_sigma(mut self, detector: Detector, species: Species, value: f64) -> Self {
        if let Some(idx) = species.index() {
            self.n_sigma[detector_slot(detector)][idx] = value;
        }
        self
    }

    /// Sets the TOF matching flags and measurement.
    #[must_use]
    pub fn with_tof(mut self, status: TofStatus, tof_signal: f64, length: f64) -> Self {
        self.tof = status;
        self.tof_signal = tof_signal;
        self.length = length;
        self
    }

    /// Sets the dE/dx signals.
    #[must_use]
    pub fn with_dedx(mut self, its_signal: f64, tpc_signal: f64) -> Self {
        self.its_signal = its_signal;
        self.tpc_signal = tpc_signal;
        self
    }

    /// Marks this track as constrained, with PID read from `original`.
    #[must_use]
    pub fn constrained_from(mut self, original: TrackData) -> Self {
        self.original = Some(Box::new(original));
        self
    }

    /// Stored n-sigma value.
    #[must_use]
    pub fn stored_n_sigma(&self, detector: Detector, species: Species) -> f64 {
        species
            .index()
            .map_or(f64::NAN, |idx| self.n_sigma[detector_slot(detector)][idx])
    }
}

fn detector_slot(detector: Detector) -> usize {
    match detector {
        Detector::Its => 0,
        Detector::Tpc => 1,
        Detector::Tof => 2,
    }
}

impl PidTrack for TrackData {
    #[inline]
    fn momentum(&self) -> f64 {
        self.p
    }

    #[inline]
    fn label(&self) -> i64 {
        self.label
    }

    #[inline]
    fn tof_status(&self) -> TofStatus {
        self.tof
    }

    #[inline]
    fn integrated_length(&self) -> f64 {
        self.length
    }

    fn pid_source(&self) -> &Self {
        self.original.as_deref().unwrap_or(self)
    }
}

/// Response that reads the values stored on each [`TrackData`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StoredResponse {
    /// Start-time estimate (ps), independent of momentum.
    pub start_time_ps: f64,
}

impl StoredResponse {
    /// Creates a stored response with a fixed start time.
    #[must_use]
    pub fn new(start_time_ps: f64) -> Self {
        Self { start_time_ps }
    }
}

impl PidResponse<TrackData> for StoredResponse {
    fn n_sigma(&self, detector: Detector, track: &TrackData, species: Species) -> f64 {
        track.stored_n_sigma(detector, species)
    }

    fn raw_signal(&self, detector: Detector, track: &TrackData) -> f64 {
        match detector {
            Detector::Its => track.its_signal,
            Detector::Tpc => track.tpc_signal,
            Detector::Tof => track.tof_signal,
        }
    }

    fn tof_start_time(&self, _p: f64) -> f64 {
        self.start_time_ps
    }
}

/// Generator-level particle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TruthParticle {
    /// PDG particle code.
    pub pdg_code: i32,
    /// Total momentum (GeV/c).
    pub p: f64,
}

impl TruthParticle {
    /// Creates a truth particle.
    #[must_use]
    pub fn new(pdg_code: i32, p: f64) -> Self {
        Self { pdg_code, p }
    }

    /// Species of the particle.
    #[must_use]
    pub fn species(&self) -> Species {
        Species::from_pdg(self.pdg_code)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_tof_validity() {
        assert!(TofStatus {
            tof_in: true,
            mismatch: false
        }
        .is_valid());
        assert!(!TofStatus {
            tof_in: true,
            mismatch: true
        }
        .is_valid());
        assert!(!TofStatus::default().is_valid());
    }

    #[test]
    fn test_beta() {
        // 370 cm in 12.34 ns is just over c
        let beta = tof_beta(370.0, 12_400.0, 60.0);
        assert_relative_eq!(beta, 370.0 / 12_340.0 / C_CM_PER_PS);
        assert!(beta > 1.0 - 1e-3 && beta < 1.0 + 1e-3);
    }

    #[test]
    fn test_stored_response() {
        let track = TrackData::new(0.8)
            .with_n_sigma(Detector::Tpc, Species::Kaon, -1.5)
            .with_dedx(80.0, -55.0);
        let response = StoredResponse::new(25.0);

        assert_eq!(response.n_sigma(Detector::Tpc, &track, Species::Kaon), -1.5);
        assert_eq!(response.n_sigma(Detector::Tof, &track, Species::Kaon), 0.0);
        assert_eq!(response.raw_signal(Detector::Tpc, &track), -55.0);
        assert_eq!(response.tof_start_time(3.0), 25.0);
        assert!(track.stored_n_sigma(Detector::Its, Species::Unknown).is_nan());
    }

    #[test]
    fn test_constrained_track_pid_source() {
        let original = TrackData::new(1.0).with_n_sigma(Detector::Its, Species::Pion, 0.5);
        let constrained = TrackData::new(1.02).constrained_from(original.clone());

        assert_eq!(constrained.pid_source(), &original);
        assert_eq!(original.pid_source(), &original);
        assert_eq!(constrained.momentum(), 1.02);
    }

    #[test]
    fn test_truth_particle_species() {
        assert_eq!(TruthParticle::new(-2212, 1.0).species(), Species::Proton);
        assert_eq!(TruthParticle::new(22, 1.0).species(), Species::Unknown);
    }
}

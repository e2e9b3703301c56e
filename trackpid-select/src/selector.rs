//! Per-track PID cut evaluation.
//!
//! Every cut category is evaluated for bookkeeping even when an earlier one
//! already rejected the track. A category with an empty species mask is
//! inert and never rejects.
//!
//! Within a band category the target species must fall strictly inside its
//! band, while every other enabled species must fall strictly outside its
//! own band (a separation band).
//!
//! In joint TPC+TOF mode, species tested in the 2-D category leave the 1-D
//! TPC and TOF categories. Without a valid TOF hit the 2-D category is
//! skipped and the 1-D TPC bands apply to every enabled species.

use trackpid_core::{
    tof_beta, CutKind, CutSet, Detector, Error, PidCuts, PidResponse, PidTrack, Result,
    SigmaBandTable, Species, SpeciesMask, TruthParticle,
};

use crate::qa::CutRecorder;
use crate::truth;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Result of evaluating one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CutOutcome {
    /// Overall decision.
    pub accepted: bool,
    /// The momentum window accepted the track.
    pub momentum_accepted: bool,
    /// A valid TOF hit was mandatory and missing.
    pub tof_missing: bool,
    /// Categories that were applicable to the track.
    pub activated: CutSet,
    /// Applicable categories that rejected the track.
    pub rejected: CutSet,
}

/// Detector quantities of one track, as recorded by the QA.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackSample {
    /// Momentum (GeV/c).
    pub p: f64,
    /// ITS n-sigma for the target.
    pub its_n_sigma: f64,
    /// ITS dE/dx.
    pub its_signal: f64,
    /// TPC n-sigma for the target.
    pub tpc_n_sigma: f64,
    /// Absolute TPC dE/dx.
    pub tpc_signal: f64,
    /// TOF n-sigma for the target and β, when the TOF hit is valid.
    pub tof: Option<TofSample>,
}

/// TOF part of a [`TrackSample`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TofSample {
    /// TOF n-sigma for the target.
    pub n_sigma: f64,
    /// Velocity from the TOF measurement.
    pub beta: f64,
}

/// Applies a [`PidCuts`] configuration to tracks.
#[derive(Debug, Clone)]
pub struct PidSelector<R> {
    cuts: PidCuts,
    response: Option<R>,
}

impl<R> PidSelector<R> {
    /// Creates a selector.
    ///
    /// Fails with [`Error::MissingResponse`] when a detector cut is active
    /// and no response service is available: the cut could never be
    /// evaluated, so the run must not start.
    pub fn new(cuts: PidCuts, response: Option<R>) -> Result<Self> {
        if response.is_none() && cuts.any_detector_cut() {
            log::error!("No PID response instance. ABORTING!!!");
            return Err(Error::MissingResponse);
        }
        Ok(Self { cuts, response })
    }

    /// Creates a selector with a response service.
    pub fn with_response(cuts: PidCuts, response: R) -> Self {
        Self {
            cuts,
            response: Some(response),
        }
    }

    /// Cut configuration.
    pub fn cuts(&self) -> &PidCuts {
        &self.cuts
    }

    /// Response service, if any.
    pub fn response(&self) -> Option<&R> {
        self.response.as_ref()
    }

    /// Evaluates a track.
    pub fn evaluate<T>(&self, track: &T) -> CutOutcome
    where
        T: PidTrack,
        R: PidResponse<T>,
    {
        let cuts = &self.cuts;
        let target = cuts.target();
        let source = track.pid_source();
        let tof_valid = source.tof_status().is_valid();

        let mut outcome = CutOutcome {
            momentum_accepted: cuts.momentum().accepts(track.momentum()),
            tof_missing: cuts.combined_mode().tof_required && !tof_valid,
            ..CutOutcome::default()
        };

        if let Some(response) = &self.response {
            let enabled = cuts.enabled_cuts();
            let joint_active = enabled.contains(CutKind::TpcTof2D) && tof_valid;
            let joint = if joint_active {
                cuts.combined_mask()
            } else {
                SpeciesMask::empty()
            };
            let n_sigma = |detector: Detector, species: Species| {
                response.n_sigma(detector, source, species)
            };

            for (kind, detector) in [
                (CutKind::ItsDedx, Detector::Its),
                (CutKind::TpcDedx, Detector::Tpc),
                (CutKind::Tof, Detector::Tof),
            ] {
                if !enabled.contains(kind) || (detector == Detector::Tof && !tof_valid) {
                    continue;
                }
                let table = cuts.table(detector);
                let species = if detector == Detector::Its {
                    table.enabled()
                } else {
                    table.enabled().iter().filter(|&s| !joint.contains(s)).collect()
                };
                if species.is_empty() {
                    continue;
                }
                outcome.activated.insert(kind);
                let passed = band_test(table, species, target, |s| n_sigma(detector, s));
                outcome.rejected.set(kind, !passed);
            }

            if joint_active {
                outcome.activated.insert(CutKind::TpcTof2D);
                let tpc = cuts.table(Detector::Tpc);
                let passed = joint_test(
                    joint,
                    target,
                    |species| tpc.band(species).above,
                    |species| {
                        (
                            n_sigma(Detector::Tpc, species),
                            n_sigma(Detector::Tof, species),
                        )
                    },
                );
                outcome.rejected.set(CutKind::TpcTof2D, !passed);
            }
        }

        outcome.accepted =
            outcome.momentum_accepted && !outcome.tof_missing && outcome.rejected.is_empty();
        outcome
    }

    /// Convenience wrapper returning only the decision.
    pub fn is_accepted<T>(&self, track: &T) -> bool
    where
        T: PidTrack,
        R: PidResponse<T>,
    {
        self.evaluate(track).accepted
    }

    /// Collects the QA quantities of a track. `None` without a response.
    pub fn sample<T>(&self, track: &T) -> Option<TrackSample>
    where
        T: PidTrack,
        R: PidResponse<T>,
    {
        let response = self.response.as_ref()?;
        let target = self.cuts.target();
        let source = track.pid_source();
        let p = track.momentum();

        let tof = source.tof_status().is_valid().then(|| TofSample {
            n_sigma: response.n_sigma(Detector::Tof, source, target),
            beta: tof_beta(
                source.integrated_length(),
                response.raw_signal(Detector::Tof, source),
                response.tof_start_time(p),
            ),
        });

        Some(TrackSample {
            p,
            its_n_sigma: response.n_sigma(Detector::Its, source, target),
            its_signal: response.raw_signal(Detector::Its, source),
            tpc_n_sigma: response.n_sigma(Detector::Tpc, source, target),
            tpc_signal: response.raw_signal(Detector::Tpc, source).abs(),
            tof,
        })
    }

    /// Evaluates a track and hands the result to a recorder.
    pub fn select<T, Q>(&self, track: &T, recorder: &mut Q) -> bool
    where
        T: PidTrack,
        R: PidResponse<T>,
        Q: CutRecorder + ?Sized,
    {
        let outcome = self.evaluate(track);
        let sample = self.sample(track);
        recorder.record(&outcome, sample.as_ref());
        outcome.accepted
    }

    /// Accepts a generator-level particle, see [`crate::truth::truth_accepted`].
    pub fn truth_accepted(&self, particle: Option<&TruthParticle>) -> bool {
        truth::truth_accepted(&self.cuts, particle)
    }

    /// Accepts a reconstructed track by its truth particle.
    pub fn true_track_accepted<T: PidTrack>(&self, track: &T, particles: &[TruthParticle]) -> bool {
        truth::true_track_accepted(&self.cuts, track, particles)
    }
}

/// Inclusion band for the target, separation bands for the rest of `mask`.
fn band_test<F>(table: &SigmaBandTable, mask: SpeciesMask, target: Species, n_sigma: F) -> bool
where
    F: Fn(Species) -> f64,
{
    mask.iter().all(|species| {
        let band = table.band(species);
        let value = n_sigma(species);
        if species == target {
            band.includes(value)
        } else {
            band.separates(value)
        }
    })
}

/// Circular TPC+TOF test against a per-species radius bound.
fn joint_test<B, F>(mask: SpeciesMask, target: Species, bound: B, n_sigmas: F) -> bool
where
    B: Fn(Species) -> f64,
    F: Fn(Species) -> (f64, f64),
{
    mask.iter().all(|species| {
        let (tpc_n_sigma, tof_n_sigma) = n_sigmas(species);
        let radius = tpc_n_sigma.hypot(tof_n_sigma);
        let bound = bound(species);
        if species == target {
            radius < bound
        } else {
            radius > bound
        }
    })
}

//! trackpid-select: PID cut evaluation for reconstructed tracks.
//!
//! This crate applies a [`trackpid_core::PidCuts`] configuration:
//! - **Selector** - per-track evaluation of every cut category
//! - **Truth** - acceptance of generator-level particles
//! - **QA** - per-run counters and before/after histograms
//! - **Batch** - parallel evaluation with ordered recording
//!
#![warn(missing_docs)]

pub mod histogram;
mod processing;
pub mod qa;
mod selector;
pub mod truth;

pub use histogram::Histogram2D;
pub use processing::{accepted_mask, select_batch, SelectionSummary};
pub use qa::{
    BeforeSampling, CutCounters, CutQa, CutRecorder, NullRecorder, QaHistograms, QaLevel,
    RunPeriod, SamplePair,
};
pub use selector::{CutOutcome, PidSelector, TofSample, TrackSample};
pub use truth::{true_species, true_track_accepted, truth_accepted};

// Re-export the configuration types most callers need
pub use trackpid_core::{PidCuts, Species};

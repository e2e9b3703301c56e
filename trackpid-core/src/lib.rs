//! trackpid-core: Core types and configuration for PID track cuts.
//!
//! This crate provides the particle species and detector vocabulary, the
//! frozen n-sigma and momentum preset tables, and the parameter facade that
//! turns discrete cut codes into a [`PidCuts`] configuration.
//!

pub mod band;
pub mod cuts;
pub mod detector;
pub mod error;
pub mod momentum;
pub mod params;
pub mod species;
pub mod track;

pub use band::{SigmaBand, SigmaBandTable};
pub use cuts::PidCuts;
pub use detector::{CutKind, CutSet, Detector};
pub use error::{Error, Result};
pub use momentum::MomentumGate;
pub use params::{CombinedMode, CutParameter};
pub use species::{Species, SpeciesMask};
pub use track::{
    tof_beta, PidResponse, PidTrack, StoredResponse, TofStatus, TrackData, TruthParticle,
};

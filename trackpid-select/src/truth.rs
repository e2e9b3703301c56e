//! Acceptance of generator-level particles.
//!
//! Used to build efficiency denominators: a truth particle is accepted when
//! it lies in the momentum window and, if any detector cut is active, is of
//! the target species.

use trackpid_core::{PidCuts, PidTrack, Species, TruthParticle};

/// Accepts a truth particle. A missing particle is always rejected.
#[must_use]
pub fn truth_accepted(cuts: &PidCuts, particle: Option<&TruthParticle>) -> bool {
    let Some(particle) = particle else {
        return false;
    };
    if !cuts.momentum().accepts(particle.p) {
        return false;
    }
    !cuts.any_detector_cut() || particle.species() == cuts.target()
}

/// Truth particle of a reconstructed track, looked up at index `|label|`.
#[must_use]
pub fn truth_of<'a, T: PidTrack>(
    track: &T,
    particles: &'a [TruthParticle],
) -> Option<&'a TruthParticle> {
    let index = usize::try_from(track.label().unsigned_abs()).ok()?;
    particles.get(index)
}

/// True species of a reconstructed track, `Unknown` without a truth link.
#[must_use]
pub fn true_species<T: PidTrack>(track: &T, particles: &[TruthParticle]) -> Species {
    truth_of(track, particles).map_or(Species::Unknown, TruthParticle::species)
}

/// Accepts a reconstructed track by its truth particle.
///
/// Ghost and unassociated tracks (negative label) are rejected.
#[must_use]
pub fn true_track_accepted<T: PidTrack>(
    cuts: &PidCuts,
    track: &T,
    particles: &[TruthParticle],
) -> bool {
    if track.label() < 0 {
        return false;
    }
    let particle = truth_of(track, particles);
    if particle.is_none() {
        log::debug!("no truth particle for label {}", track.label());
    }
    truth_accepted(cuts, particle)
}

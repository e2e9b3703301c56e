//! Batch selection over many tracks.

use rayon::prelude::*;
use trackpid_core::{CutKind, PidResponse, PidTrack};

use crate::qa::CutRecorder;
use crate::selector::{CutOutcome, PidSelector};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Totals of a batch selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SelectionSummary {
    /// Tracks evaluated.
    pub total: usize,
    /// Tracks accepted.
    pub accepted: usize,
    /// Tracks outside the momentum window.
    pub momentum_rejected: usize,
    /// Tracks rejected for a missing mandatory TOF hit.
    pub tof_missing: usize,
    /// Rejections per category.
    pub rejected_by: [usize; CutKind::COUNT],
}

impl SelectionSummary {
    /// Adds one outcome.
    pub fn add(&mut self, outcome: &CutOutcome) {
        self.total += 1;
        if outcome.accepted {
            self.accepted += 1;
        }
        if !outcome.momentum_accepted {
            self.momentum_rejected += 1;
        }
        if outcome.tof_missing {
            self.tof_missing += 1;
        }
        for kind in outcome.rejected.iter() {
            self.rejected_by[kind.index()] += 1;
        }
    }

    /// Accepted fraction, 0 for an empty batch.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn efficiency(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.accepted as f64 / self.total as f64
        }
    }
}

/// Evaluates `tracks` in parallel and records the outcomes in input order.
///
/// The recorder is only fed from the calling thread.
pub fn select_batch<T, R, Q>(
    selector: &PidSelector<R>,
    tracks: &[T],
    recorder: &mut Q,
) -> (Vec<CutOutcome>, SelectionSummary)
where
    T: PidTrack,
    R: PidResponse<T>,
    Q: CutRecorder + ?Sized,
{
    let evaluated: Vec<_> = tracks
        .par_iter()
        .map(|track| (selector.evaluate(track), selector.sample(track)))
        .collect();

    let mut summary = SelectionSummary::default();
    let outcomes = evaluated
        .into_iter()
        .map(|(outcome, sample)| {
            recorder.record(&outcome, sample.as_ref());
            summary.add(&outcome);
            outcome
        })
        .collect();

    log::debug!(
        "selected {} of {} tracks",
        summary.accepted,
        summary.total
    );
    (outcomes, summary)
}

/// Evaluates `tracks` in parallel without recording.
pub fn accepted_mask<T, R>(selector: &PidSelector<R>, tracks: &[T]) -> Vec<bool>
where
    T: PidTrack,
    R: PidResponse<T>,
{
    tracks
        .par_iter()
        .map(|track| selector.is_accepted(track))
        .collect()
}

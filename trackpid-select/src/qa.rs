//! Quality-assurance recording for the PID cut.
//!
//! [`CutQa`] keeps one set of statistics per run period. Counters and
//! "after cut" samples are recorded at [`QaLevel::Light`]; the co-activation
//! matrix and, by default, "before cut" samples need [`QaLevel::Heavy`].

use std::collections::BTreeMap;
use std::fmt;

use trackpid_core::{CutKind, PidCuts};

use crate::histogram::{log_edges, uniform_edges, Histogram2D};
use crate::selector::{CutOutcome, TrackSample};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const P_BINS: usize = 150;
const P_LOW: f64 = 0.05;
const P_HIGH: f64 = 20.0;
const SIGMA_BINS: usize = 400;
const SIGMA_RANGE: f64 = 10.0;
const SIGNAL_BINS: usize = 800;
const SIGNAL_HIGH: f64 = 200.0;
const BETA_BINS: usize = 400;
const BETA_HIGH: f64 = 1.1;

/// Receives the outcome of every evaluated track.
///
/// Implementations are fed sequentially; they need not be thread-safe.
pub trait CutRecorder {
    /// Records one evaluation. `sample` is `None` when no detector quantities
    /// could be read.
    fn record(&mut self, outcome: &CutOutcome, sample: Option<&TrackSample>);
}

/// Recorder that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRecorder;

impl CutRecorder for NullRecorder {
    fn record(&mut self, _outcome: &CutOutcome, _sample: Option<&TrackSample>) {}
}

/// Amount of QA information recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum QaLevel {
    /// Nothing.
    #[default]
    None,
    /// Counters and accepted-track samples.
    Light,
    /// Everything, including the co-activation matrix.
    Heavy,
}

impl std::str::FromStr for QaLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "light" => Ok(Self::Light),
            "heavy" => Ok(Self::Heavy),
            other => Err(format!("unknown QA level '{other}'")),
        }
    }
}

/// When "before cut" samples are recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BeforeSampling {
    /// Only at [`QaLevel::Heavy`].
    #[default]
    HeavyOnly,
    /// At every level that records anything.
    EveryTrack,
}

/// Data-taking period the statistics belong to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunPeriod(pub String);

impl RunPeriod {
    /// Creates a period label.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }
}

impl fmt::Display for RunPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Track and per-category counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CutCounters {
    /// Tracks seen.
    pub tracks: u64,
    /// Tracks rejected.
    pub rejected: u64,
    /// Tracks for which each category was applicable.
    pub activated: [u64; CutKind::COUNT],
}

impl CutCounters {
    /// Applicable count of one category.
    #[must_use]
    pub fn activated(&self, kind: CutKind) -> u64 {
        self.activated[kind.index()]
    }

    /// Labelled counter values, in storage order.
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, u64)> {
        let mut entries = vec![("n tracks", self.tracks), ("n cut tracks", self.rejected)];
        entries.extend(CutKind::ALL.iter().map(|&kind| (kind.name(), self.activated(kind))));
        entries
    }
}

/// "Before cut" and "after cut" histograms of one quantity.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SamplePair {
    /// All tracks.
    pub before: Histogram2D,
    /// Accepted tracks.
    pub after: Histogram2D,
}

impl SamplePair {
    fn new(name: &str, title: &str, x_edges: &[f64], y_edges: &[f64]) -> Self {
        let make = |suffix: &str, when: &str| {
            Histogram2D::new(
                format!("{name}{suffix}"),
                format!("{title} ({when} cut)"),
                x_edges.to_vec(),
                y_edges.to_vec(),
            )
        };
        Self {
            before: make("B", "before"),
            after: make("A", "after"),
        }
    }

    fn bucket(&mut self, after: bool) -> &mut Histogram2D {
        if after {
            &mut self.after
        } else {
            &mut self.before
        }
    }
}

/// Statistics of one cut instance for one run period.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QaHistograms {
    /// Storage name: `<name>_<target><cut number>_<descriptor>`.
    pub name: String,
    /// Track and category counters.
    pub counters: CutCounters,
    /// Pairwise co-activation counts, upper triangle only. Heavy level.
    pub co_activation: Option<[[u64; CutKind::COUNT]; CutKind::COUNT]>,
    /// ITS n-sigma vs p.
    pub its_sigma: SamplePair,
    /// ITS dE/dx vs p.
    pub its_signal: SamplePair,
    /// TPC n-sigma vs p.
    pub tpc_sigma: SamplePair,
    /// TPC |dE/dx| vs p.
    pub tpc_signal: SamplePair,
    /// TOF n-sigma vs p.
    pub tof_sigma: SamplePair,
    /// β vs p.
    pub tof_beta: SamplePair,
    /// TOF n-sigma vs TPC n-sigma.
    pub tpc_tof_sigma: SamplePair,
}

impl QaHistograms {
    /// Allocates empty histograms.
    #[must_use]
    pub fn new(name: impl Into<String>, target: &str, level: QaLevel) -> Self {
        let p = log_edges(P_BINS, P_LOW, P_HIGH);
        let sigma = uniform_edges(SIGMA_BINS, -SIGMA_RANGE, SIGMA_RANGE);
        let signal = uniform_edges(SIGNAL_BINS, 0.0, SIGNAL_HIGH);
        let beta = uniform_edges(BETA_BINS, 0.0, BETA_HIGH);
        let sigma_title = |det: &str| format!("{det} n#sigma {target};p (GeV/c);n#sigma");

        Self {
            name: name.into(),
            counters: CutCounters::default(),
            co_activation: (level >= QaLevel::Heavy)
                .then_some([[0; CutKind::COUNT]; CutKind::COUNT]),
            its_sigma: SamplePair::new("ITSdEdxSigma", &sigma_title("ITS"), &p, &sigma),
            its_signal: SamplePair::new("ITSdEdxSignal", "ITS dE/dx;p (GeV/c);dE/dx", &p, &signal),
            tpc_sigma: SamplePair::new("TPCdEdxSigma", &sigma_title("TPC"), &p, &sigma),
            tpc_signal: SamplePair::new("TPCdEdxSignal", "TPC dE/dx;p (GeV/c);dE/dx", &p, &signal),
            tof_sigma: SamplePair::new("TOFSigma", &sigma_title("TOF"), &p, &sigma),
            tof_beta: SamplePair::new("TOFSignal", "TOF #beta;p (GeV/c);#beta", &p, &beta),
            tpc_tof_sigma: SamplePair::new(
                "TPCTOFSigma",
                &format!("TPC-TOF n#sigma {target};n#sigma TPC;n#sigma TOF"),
                &sigma,
                &sigma,
            ),
        }
    }

    fn fill(&mut self, after: bool, sample: &TrackSample) {
        let p = sample.p;
        self.its_sigma.bucket(after).fill(p, sample.its_n_sigma);
        self.its_signal.bucket(after).fill(p, sample.its_signal);
        self.tpc_sigma.bucket(after).fill(p, sample.tpc_n_sigma);
        self.tpc_signal.bucket(after).fill(p, sample.tpc_signal);
        if let Some(tof) = sample.tof {
            self.tof_sigma.bucket(after).fill(p, tof.n_sigma);
            self.tof_beta.bucket(after).fill(p, tof.beta);
            self.tpc_tof_sigma
                .bucket(after)
                .fill(sample.tpc_n_sigma, tof.n_sigma);
        }
    }

    fn count(&mut self, outcome: &CutOutcome) {
        self.counters.tracks += 1;
        if !outcome.accepted {
            self.counters.rejected += 1;
        }
        for kind in outcome.activated.iter() {
            self.counters.activated[kind.index()] += 1;
        }
        if let Some(matrix) = &mut self.co_activation {
            for first in outcome.activated.iter() {
                for second in outcome.activated.iter() {
                    if first.index() <= second.index() {
                        matrix[first.index()][second.index()] += 1;
                    }
                }
            }
        }
    }

    /// Co-activation count of two categories, in either order.
    #[must_use]
    pub fn co_activated(&self, a: CutKind, b: CutKind) -> Option<u64> {
        let (lo, hi) = if a.index() <= b.index() {
            (a.index(), b.index())
        } else {
            (b.index(), a.index())
        };
        self.co_activation.map(|matrix| matrix[lo][hi])
    }
}

/// Per-run QA recorder of one cut instance.
#[derive(Debug, Clone)]
pub struct CutQa {
    name: String,
    target: &'static str,
    level: QaLevel,
    before: BeforeSampling,
    current: Option<RunPeriod>,
    runs: BTreeMap<RunPeriod, QaHistograms>,
    unassigned: u64,
}

impl CutQa {
    /// Creates a recorder for `cuts`. Nothing is stored until the first
    /// [`CutQa::on_run_changed`].
    #[must_use]
    pub fn new(name: &str, cuts: &PidCuts, level: QaLevel) -> Self {
        let target = cuts.target().short_name();
        Self {
            name: format!(
                "{name}_{target}{}_{}",
                cuts.cut_number(),
                cuts.descriptor()
            ),
            target,
            level,
            before: BeforeSampling::default(),
            current: None,
            runs: BTreeMap::new(),
            unassigned: 0,
        }
    }

    /// Overrides the "before cut" sampling policy.
    #[must_use]
    pub fn with_before_sampling(mut self, policy: BeforeSampling) -> Self {
        self.before = policy;
        self
    }

    /// Switches to `period`, allocating its storage on first use.
    ///
    /// Returns `true` if the period actually changed.
    pub fn on_run_changed(&mut self, period: RunPeriod) -> bool {
        if self.current.as_ref() == Some(&period) {
            return false;
        }
        if self.level == QaLevel::None {
            log::debug!("{}: run period {period}, QA disabled", self.name);
            self.current = Some(period);
            return true;
        }
        if !self.runs.contains_key(&period) {
            log::debug!("{}: allocating QA for run period {period}", self.name);
            let histograms = QaHistograms::new(self.name.clone(), self.target, self.level);
            self.runs.insert(period.clone(), histograms);
        } else {
            log::debug!("{}: back to run period {period}", self.name);
        }
        self.current = Some(period);
        true
    }

    /// Storage name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Recording level.
    #[must_use]
    pub fn level(&self) -> QaLevel {
        self.level
    }

    /// Current run period.
    #[must_use]
    pub fn current_period(&self) -> Option<&RunPeriod> {
        self.current.as_ref()
    }

    /// Statistics of the current run period.
    #[must_use]
    pub fn current(&self) -> Option<&QaHistograms> {
        self.current.as_ref().and_then(|period| self.runs.get(period))
    }

    /// Statistics of a given run period.
    #[must_use]
    pub fn run(&self, period: &RunPeriod) -> Option<&QaHistograms> {
        self.runs.get(period)
    }

    /// All run periods, in order.
    pub fn runs(&self) -> impl Iterator<Item = (&RunPeriod, &QaHistograms)> {
        self.runs.iter()
    }

    /// Records dropped because no run period was set.
    #[must_use]
    pub fn unassigned(&self) -> u64 {
        self.unassigned
    }

    fn records_before(&self) -> bool {
        match self.before {
            BeforeSampling::EveryTrack => true,
            BeforeSampling::HeavyOnly => self.level == QaLevel::Heavy,
        }
    }
}

impl CutRecorder for CutQa {
    fn record(&mut self, outcome: &CutOutcome, sample: Option<&TrackSample>) {
        if self.level == QaLevel::None {
            return;
        }
        let before = self.records_before();
        let Some(histograms) = self.current.as_ref().and_then(|p| self.runs.get_mut(p)) else {
            self.unassigned += 1;
            return;
        };

        histograms.count(outcome);
        if let Some(sample) = sample {
            if before {
                histograms.fill(false, sample);
            }
            if outcome.accepted {
                histograms.fill(true, sample);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::TofSample;
    use trackpid_core::{CutSet, Species};

    fn cuts() -> PidCuts {
        PidCuts::new(Species::Pion, 3)
            .and_then(|c| c.with_parameter(9, 3))
            .unwrap()
    }

    fn sample(p: f64) -> TrackSample {
        TrackSample {
            p,
            its_n_sigma: 0.5,
            its_signal: 80.0,
            tpc_n_sigma: 1.0,
            tpc_signal: 50.0,
            tof: None,
        }
    }

    fn outcome(accepted: bool, kinds: &[CutKind]) -> CutOutcome {
        let mut activated = CutSet::default();
        for &kind in kinds {
            activated.insert(kind);
        }
        CutOutcome {
            accepted,
            momentum_accepted: true,
            tof_missing: false,
            activated,
            rejected: CutSet::default(),
        }
    }

    #[test]
    fn test_storage_name() {
        let qa = CutQa::new("PIDCut", &cuts(), QaLevel::Light);
        assert_eq!(qa.name(), "PIDCut_pi3_000000000300000000");
    }

    #[test]
    fn test_level_parse() {
        assert_eq!("Heavy".parse::<QaLevel>().unwrap(), QaLevel::Heavy);
        assert!("verbose".parse::<QaLevel>().is_err());
    }

    #[test]
    fn test_records_need_run_period() {
        let mut qa = CutQa::new("PIDCut", &cuts(), QaLevel::Light);
        qa.record(&outcome(true, &[]), None);
        assert_eq!(qa.unassigned(), 1);
        assert!(qa.current().is_none());

        assert!(qa.on_run_changed(RunPeriod::new("LHC10b")));
        assert!(!qa.on_run_changed(RunPeriod::new("LHC10b")));
        qa.record(&outcome(true, &[]), None);
        assert_eq!(qa.current().unwrap().counters.tracks, 1);
    }

    #[test]
    fn test_none_level_records_nothing() {
        let mut qa = CutQa::new("PIDCut", &cuts(), QaLevel::None);
        qa.on_run_changed(RunPeriod::new("LHC10b"));
        qa.record(&outcome(false, &[CutKind::TpcDedx]), Some(&sample(1.0)));
        assert!(qa.current().is_none());
        assert_eq!(qa.runs().count(), 0);
    }

    #[test]
    fn test_light_counts_and_after_samples() {
        let mut qa = CutQa::new("PIDCut", &cuts(), QaLevel::Light);
        qa.on_run_changed(RunPeriod::new("LHC10b"));
        qa.record(&outcome(true, &[CutKind::TpcDedx]), Some(&sample(1.0)));
        qa.record(&outcome(false, &[CutKind::TpcDedx]), Some(&sample(1.0)));

        let h = qa.current().unwrap();
        assert_eq!(h.counters.tracks, 2);
        assert_eq!(h.counters.rejected, 1);
        assert_eq!(h.counters.activated(CutKind::TpcDedx), 2);
        assert_eq!(h.counters.activated(CutKind::Tof), 0);
        assert!(h.co_activation.is_none());
        assert_eq!(h.tpc_sigma.after.entries(), 1);
        assert_eq!(h.tpc_sigma.before.entries(), 0);
        assert_eq!(h.tof_sigma.after.entries(), 0);
    }

    #[test]
    fn test_heavy_records_before_and_co_activation() {
        let mut qa = CutQa::new("PIDCut", &cuts(), QaLevel::Heavy);
        qa.on_run_changed(RunPeriod::new("LHC11h"));
        let mut with_tof = sample(0.8);
        with_tof.tof = Some(TofSample {
            n_sigma: -1.0,
            beta: 0.95,
        });
        qa.record(
            &outcome(false, &[CutKind::TpcDedx, CutKind::Tof]),
            Some(&with_tof),
        );

        let h = qa.current().unwrap();
        assert_eq!(h.tpc_sigma.before.entries(), 1);
        assert_eq!(h.tpc_tof_sigma.before.integral(), 1);
        assert_eq!(h.tpc_sigma.after.entries(), 0);
        assert_eq!(h.co_activated(CutKind::Tof, CutKind::TpcDedx), Some(1));
        assert_eq!(h.co_activated(CutKind::TpcDedx, CutKind::TpcDedx), Some(1));
        assert_eq!(h.co_activated(CutKind::ItsDedx, CutKind::Tof), Some(0));
    }

    #[test]
    fn test_before_policy_override() {
        let mut qa = CutQa::new("PIDCut", &cuts(), QaLevel::Light)
            .with_before_sampling(BeforeSampling::EveryTrack);
        qa.on_run_changed(RunPeriod::new("LHC10b"));
        qa.record(&outcome(false, &[]), Some(&sample(2.0)));
        assert_eq!(qa.current().unwrap().its_signal.before.entries(), 1);
    }

    #[test]
    fn test_periods_are_kept_apart() {
        let mut qa = CutQa::new("PIDCut", &cuts(), QaLevel::Light);
        let first = RunPeriod::new("LHC10b");
        let second = RunPeriod::new("LHC10c");

        qa.on_run_changed(first.clone());
        qa.record(&outcome(true, &[]), None);
        qa.on_run_changed(second.clone());
        qa.record(&outcome(true, &[]), None);
        qa.record(&outcome(true, &[]), None);
        qa.on_run_changed(first.clone());
        qa.record(&outcome(true, &[]), None);

        assert_eq!(qa.run(&first).unwrap().counters.tracks, 2);
        assert_eq!(qa.run(&second).unwrap().counters.tracks, 2);
        assert_eq!(qa.current_period(), Some(&first));
    }

    #[test]
    fn test_counter_entries_labels() {
        let counters = CutCounters {
            tracks: 4,
            rejected: 1,
            activated: [1, 2, 3, 0],
        };
        let entries = counters.entries();
        assert_eq!(entries[0], ("n tracks", 4));
        assert_eq!(entries[1], ("n cut tracks", 1));
        assert_eq!(entries[3], ("TPC dE/dx n#sigma", 2));
        assert_eq!(entries.len(), 6);
    }
}

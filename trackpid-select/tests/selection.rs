#![allow(clippy::float_cmp, clippy::unreadable_literal)]
use trackpid_core::{Detector, Error, PidCuts, Species, StoredResponse, TofStatus, TrackData};
use trackpid_select::{select_batch, CutQa, PidSelector, QaLevel, RunPeriod};

const TOF_OK: TofStatus = TofStatus {
    tof_in: true,
    mismatch: false,
};

/// Kaon selection as typically configured for a resonance analysis:
/// 0.2 < p < 2 GeV/c, TPC kaon 3 sigma, pion rejection in TPC, TOF required.
fn kaon_cuts() -> PidCuts {
    PidCuts::new(Species::Kaon, 2)
        .and_then(|c| c.with_parameter(0, 1))
        .and_then(|c| c.with_parameter(1, 6))
        .and_then(|c| c.with_parameter(10, 7))
        .and_then(|c| c.with_parameter(9, 7))
        .and_then(|c| c.with_parameter(15, 2))
        .and_then(|c| c.with_parameter(17, 1))
        .unwrap()
}

fn kaon_track(p: f64, tpc_k: f64, tpc_pi: f64, tof_k: f64) -> TrackData {
    TrackData::new(p)
        .with_label(1)
        .with_dedx(120.0, -95.0)
        .with_tof(TOF_OK, 12_500.0, 370.0)
        .with_n_sigma(Detector::Tpc, Species::Kaon, tpc_k)
        .with_n_sigma(Detector::Tpc, Species::Pion, tpc_pi)
        .with_n_sigma(Detector::Tof, Species::Kaon, tof_k)
}

#[test]
fn test_descriptor_round_trip_gives_same_decisions() {
    let cuts = kaon_cuts();
    assert_eq!(cuts.descriptor(), "160000000770000201");

    let parsed = PidCuts::from_descriptor(Species::Kaon, 2, cuts.descriptor()).unwrap();
    let a = PidSelector::with_response(cuts, StoredResponse::default());
    let b = PidSelector::with_response(parsed, StoredResponse::default());

    for track in [
        kaon_track(1.0, 0.5, 4.0, 1.0),
        kaon_track(1.0, 0.5, 2.0, 1.0),
        kaon_track(2.5, 0.5, 4.0, 1.0),
        kaon_track(1.0, 0.5, 4.0, 6.0),
    ] {
        assert_eq!(a.evaluate(&track), b.evaluate(&track));
    }
}

#[test]
fn test_full_pipeline_with_qa() {
    let cuts = kaon_cuts();
    let selector = PidSelector::new(cuts, Some(StoredResponse::new(100.0))).unwrap();
    let mut qa = CutQa::new("PIDCut", selector.cuts(), QaLevel::Heavy);
    assert_eq!(qa.name(), "PIDCut_K2_160000000770000201");
    qa.on_run_changed(RunPeriod::new("LHC10h"));

    let no_tof = TrackData::new(1.0).with_n_sigma(Detector::Tpc, Species::Pion, 5.0);
    let tracks = vec![
        kaon_track(1.0, 0.5, 4.0, 1.0),  // accepted
        kaon_track(1.0, 0.5, 2.0, 1.0),  // pion-like in TPC
        kaon_track(2.5, 0.5, 4.0, 1.0),  // above the momentum window
        kaon_track(0.8, -4.0, 4.0, 0.0), // outside the kaon TPC band
        no_tof,                          // TOF required
    ];

    let (outcomes, summary) = select_batch(&selector, &tracks, &mut qa);
    let decisions: Vec<bool> = outcomes.iter().map(|o| o.accepted).collect();
    assert_eq!(decisions, vec![true, false, false, false, false]);
    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.tof_missing, 1);
    assert_eq!(summary.momentum_rejected, 1);

    let h = qa.current().unwrap();
    assert_eq!(h.counters.tracks, 5);
    assert_eq!(h.counters.rejected, 4);
    // Before-cut samples for every track, TOF ones only with a valid hit
    assert_eq!(h.tpc_sigma.before.entries(), 5);
    assert_eq!(h.tof_beta.before.entries(), 4);
    assert_eq!(h.tpc_sigma.after.entries(), 1);
}

#[test]
fn test_missing_response_aborts_setup() {
    let err = PidSelector::<StoredResponse>::new(kaon_cuts(), None).unwrap_err();
    assert_eq!(err, Error::MissingResponse);
}

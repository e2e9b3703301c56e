//! File writers for selection results and QA statistics.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use trackpid_core::{CutSet, PidTrack};
use trackpid_select::{CutOutcome, CutQa, SelectionSummary};

use crate::{Error, Result};

/// `;`-separated category names, or `-` for none.
fn cut_list(set: CutSet) -> String {
    if set.is_empty() {
        return "-".to_string();
    }
    set.iter().map(|kind| kind.name()).collect::<Vec<_>>().join(";")
}

/// Writer for selection output files.
pub struct SelectionWriter {
    writer: BufWriter<File>,
}

impl SelectionWriter {
    /// Creates a new file writer.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        Ok(Self { writer })
    }

    /// Writes one CSV row per track.
    pub fn write_outcomes_csv<T: PidTrack>(
        &mut self,
        tracks: &[T],
        outcomes: &[CutOutcome],
    ) -> Result<()> {
        if tracks.len() != outcomes.len() {
            return Err(Error::InvalidFormat(format!(
                "{} tracks but {} outcomes",
                tracks.len(),
                outcomes.len()
            )));
        }
        writeln!(
            self.writer,
            "index,p,label,accepted,momentum_accepted,tof_missing,activated,rejected"
        )?;

        for (i, (track, outcome)) in tracks.iter().zip(outcomes).enumerate() {
            writeln!(
                self.writer,
                "{},{},{},{},{},{},{},{}",
                i,
                track.momentum(),
                track.label(),
                u8::from(outcome.accepted),
                u8::from(outcome.momentum_accepted),
                u8::from(outcome.tof_missing),
                cut_list(outcome.activated),
                cut_list(outcome.rejected)
            )?;
        }

        self.writer.flush()?;
        Ok(())
    }

    /// Writes the QA counters of every run period as CSV.
    pub fn write_counters_csv(&mut self, qa: &CutQa) -> Result<()> {
        writeln!(self.writer, "name,period,counter,value")?;

        for (period, histograms) in qa.runs() {
            for (label, value) in histograms.counters.entries() {
                writeln!(self.writer, "{},{},{},{}", qa.name(), period, label, value)?;
            }
        }

        self.writer.flush()?;
        Ok(())
    }

    /// Writes the QA histograms of every run period as JSON, keyed by period.
    pub fn write_qa_json(&mut self, qa: &CutQa) -> Result<()> {
        let runs: BTreeMap<&str, _> = qa
            .runs()
            .map(|(period, histograms)| (period.0.as_str(), histograms))
            .collect();
        serde_json::to_writer(&mut self.writer, &runs)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Writes a batch summary as pretty-printed JSON.
    pub fn write_summary_json(&mut self, summary: &SelectionSummary) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, summary)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;
    use trackpid_core::{CutKind, PidCuts, Species, TrackData};
    use trackpid_select::{QaLevel, RunPeriod};

    fn outcome(accepted: bool, rejected: &[CutKind]) -> CutOutcome {
        let mut set = CutSet::default();
        for &kind in rejected {
            set.insert(kind);
        }
        CutOutcome {
            accepted,
            momentum_accepted: true,
            tof_missing: false,
            activated: set,
            rejected: set,
        }
    }

    #[test]
    fn test_write_outcomes_csv() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = SelectionWriter::create(file.path()).unwrap();

        let tracks = vec![
            TrackData::new(1.5).with_label(3),
            TrackData::new(0.25).with_label(-1),
        ];
        let outcomes = vec![
            outcome(true, &[]),
            outcome(false, &[CutKind::ItsDedx, CutKind::Tof]),
        ];
        writer.write_outcomes_csv(&tracks, &outcomes).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert!(content.starts_with("index,p,label,accepted"));
        assert!(content.contains("0,1.5,3,1,1,0,-,-"));
        assert!(content.contains("1,0.25,-1,0,1,0,ITS dE/dx n#sigma;TOF n#sigma,"));
    }

    #[test]
    fn test_write_outcomes_length_mismatch() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = SelectionWriter::create(file.path()).unwrap();
        let result = writer.write_outcomes_csv(&[TrackData::new(1.0)], &[]);
        assert!(matches!(result, Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_write_counters_csv() {
        let cuts = PidCuts::new(Species::Pion, 0).unwrap();
        let mut qa = CutQa::new("PIDCut", &cuts, QaLevel::Light);
        qa.on_run_changed(RunPeriod::new("LHC10b"));
        trackpid_select::CutRecorder::record(&mut qa, &outcome(false, &[]), None);

        let file = NamedTempFile::new().unwrap();
        let mut writer = SelectionWriter::create(file.path()).unwrap();
        writer.write_counters_csv(&qa).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert!(content.contains("PIDCut_pi0_000000000000000000,LHC10b,n tracks,1"));
        assert!(content.contains("PIDCut_pi0_000000000000000000,LHC10b,n cut tracks,1"));
        assert!(content.contains(",LHC10b,TPC+TOF 2D,0"));
    }

    #[test]
    fn test_write_summary_json() {
        let mut summary = SelectionSummary::default();
        summary.add(&outcome(true, &[]));

        let file = NamedTempFile::new().unwrap();
        let mut writer = SelectionWriter::create(file.path()).unwrap();
        writer.write_summary_json(&summary).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        assert_eq!(value["total"], 1);
        assert_eq!(value["accepted"], 1);
    }

    #[test]
    fn test_write_qa_json() {
        let cuts = PidCuts::new(Species::Proton, 0).unwrap();
        let mut qa = CutQa::new("PIDCut", &cuts, QaLevel::Light);
        qa.on_run_changed(RunPeriod::new("LHC11a"));

        let file = NamedTempFile::new().unwrap();
        let mut writer = SelectionWriter::create(file.path()).unwrap();
        writer.write_qa_json(&qa).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        assert_eq!(value["LHC11a"]["name"], "PIDCut_p0_000000000000000000");
        assert_eq!(value["LHC11a"]["counters"]["tracks"], 0);
    }
}

//! JSON readers for track files and cut configurations.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use trackpid_core::{PidCuts, Species, TrackData, TruthParticle};

use crate::{Error, Result};

/// Contents of a track file.
///
/// ```json
/// { "run_period": "LHC10h", "start_time_ps": 0.0,
///   "tracks": [ { "p": 1.2, "label": 4, "n_sigma": [[...], [...], [...]] } ],
///   "particles": [ { "pdg_code": 321, "p": 1.2 } ] }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackFile {
    /// Data-taking period of the tracks.
    #[serde(default)]
    pub run_period: Option<String>,
    /// Event start-time estimate (ps).
    #[serde(default)]
    pub start_time_ps: f64,
    /// Reconstructed tracks.
    pub tracks: Vec<TrackData>,
    /// Truth particles, indexed by track label.
    #[serde(default)]
    pub particles: Vec<TruthParticle>,
}

impl TrackFile {
    /// Parses a track file from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let file: Self = serde_json::from_reader(reader)?;
        if let Some(bad) = file.tracks.iter().position(|t| !t.p.is_finite()) {
            return Err(Error::InvalidFormat(format!(
                "track {bad} has a non-finite momentum"
            )));
        }
        Ok(file)
    }
}

/// Reads a track file.
pub fn read_tracks<P: AsRef<Path>>(path: P) -> Result<TrackFile> {
    let path = path.as_ref();
    let file = TrackFile::from_reader(BufReader::new(File::open(path)?))?;
    log::info!(
        "read {} tracks and {} truth particles from {}",
        file.tracks.len(),
        file.particles.len(),
        path.display()
    );
    Ok(file)
}

/// Cut configuration file.
///
/// Either a `descriptor` string, a `parameters` map from parameter ID to
/// preset code, or both; map entries are applied after the descriptor.
///
/// ```json
/// { "target": "kaon", "cut_number": 2, "parameters": { "10": 7, "17": 1 } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutFile {
    /// Target species.
    pub target: Species,
    /// Label of the cut instance.
    #[serde(default)]
    pub cut_number: u32,
    /// Canonical descriptor string.
    #[serde(default)]
    pub descriptor: Option<String>,
    /// Parameter codes by ID.
    #[serde(default)]
    pub parameters: BTreeMap<i32, i32>,
}

impl CutFile {
    /// Parses a cut file from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Builds the configuration. The first rejected value aborts.
    pub fn to_cuts(&self) -> Result<PidCuts> {
        let mut cuts = match &self.descriptor {
            Some(descriptor) => PidCuts::from_descriptor(self.target, self.cut_number, descriptor)?,
            None => PidCuts::new(self.target, self.cut_number)?,
        };
        for (&id, &value) in &self.parameters {
            cuts.set_parameter(id, value)?;
        }
        Ok(cuts)
    }
}

impl From<&PidCuts> for CutFile {
    fn from(cuts: &PidCuts) -> Self {
        Self {
            target: cuts.target(),
            cut_number: cuts.cut_number(),
            descriptor: Some(cuts.descriptor().to_string()),
            parameters: BTreeMap::new(),
        }
    }
}

/// Reads a cut file and builds the configuration.
pub fn read_cuts<P: AsRef<Path>>(path: P) -> Result<PidCuts> {
    let path = path.as_ref();
    let cuts = CutFile::from_reader(BufReader::new(File::open(path)?))?.to_cuts()?;
    log::info!(
        "loaded {} cut {} from {}",
        cuts.target(),
        cuts.descriptor(),
        path.display()
    );
    Ok(cuts)
}

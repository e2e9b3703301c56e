//! trackpid-io: file input and output for trackpid.
//!
//! Tracks and cut configurations are read from JSON; selection results and
//! QA counters are written as CSV, QA histograms as JSON.
//!

mod error;
mod reader;
mod writer;

pub use error::{Error, Result};
pub use reader::{read_cuts, read_tracks, CutFile, TrackFile};
pub use writer::SelectionWriter;

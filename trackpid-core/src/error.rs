//! Error types for trackpid-core.

use crate::species::Species;
use thiserror::Error;

/// Result type alias for trackpid operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for cut configuration and setup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Preset code outside the frozen table.
    #[error("{table} code {code} not supported")]
    InvalidPreset {
        /// Name of the preset table that rejected the code.
        table: &'static str,
        /// Offending code.
        code: i32,
    },

    /// Parameter ID outside the supported range.
    #[error("cut param id {0} out of supported range")]
    UnknownParameter(i32),

    /// Species without a band table slot.
    #[error("species {0} has no PID band")]
    NoBand(Species),

    /// The cut cannot be built for this target species.
    #[error("unsupported PID target species: {0}")]
    UnsupportedTarget(Species),

    /// Malformed cut descriptor string.
    #[error("invalid cut descriptor '{descriptor}': {reason}")]
    InvalidDescriptor {
        /// The descriptor as supplied.
        descriptor: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A detector cut is active but no detector response is available.
    #[error("no PID response instance while detector cuts are active")]
    MissingResponse,
}

//! Error types for the card export pipeline

use thiserror::Error;

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while composing or exporting a card
#[derive(Error, Debug)]
pub enum Error {
    /// The style snapshot could not be produced (zero-size layout,
    /// tree-shape mismatch between the live tree and its clone)
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// The primary rasterizer could not decode or paint the snapshot
    #[error("Snapshot decode failed: {0}")]
    Decode(String),

    /// The fallback rasterizer failed
    #[error("Fallback rendering failed: {0}")]
    Fallback(String),

    /// A second export was requested while one is still in flight
    #[error("An export is already in flight")]
    ExportInFlight,

    /// Both rasterization paths failed; the only detail shown to users
    #[error("Could not generate image")]
    ExportFailed,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error should hand the export over to the fallback
    /// rasterizer. Only primary-path failures qualify; everything else is
    /// terminal for the attempt.
    pub fn triggers_fallback(&self) -> bool {
        matches!(self, Error::Serialization(_) | Error::Decode(_))
    }
}

/// A per-image embed failure. Deliberately not part of [`Error`]: fetch
/// failures degrade output fidelity but never abort an export, so they are
/// reported per image and logged rather than propagated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("image fetch failed for {uri}: {reason}")]
pub struct SoftFetchFailure {
    /// The image reference that could not be embedded
    pub uri: String,
    /// Human-readable cause (network error, bad status, unsupported payload)
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_trigger_subset() {
        assert!(Error::Serialization("zero size".into()).triggers_fallback());
        assert!(Error::Decode("bad svg".into()).triggers_fallback());
        assert!(!Error::Fallback("paint".into()).triggers_fallback());
        assert!(!Error::ExportInFlight.triggers_fallback());
        assert!(!Error::Config("nope".into()).triggers_fallback());
    }

    #[test]
    fn user_facing_failure_is_generic() {
        let msg = Error::ExportFailed.to_string();
        assert_eq!(msg, "Could not generate image");
    }
}

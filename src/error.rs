//! Library error type.
//!
//! Per-entry failures inside the phrase builder (missing diphone, decode
//! problems, vocoder failures) are recoverable: the builder logs them and
//! moves on.  [`Error::NoSegments`] is the only fatal outcome of a build.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Diphone file not found: {}", .0.display())]
    DiphoneNotFound(PathBuf),

    /// Forward phoneme lookup on a code that is not in the table.
    #[error("Unknown phoneme code '{0}'")]
    UnknownCode(String),

    #[error("Invalid diphone file name '{0}' (expected <code>_<code>.wav)")]
    InvalidDiphoneName(String),

    #[error("Invalid note name '{0}'")]
    InvalidNote(String),

    #[error("Invalid melody entry #{index} ({file}): {reason}")]
    InvalidEntry {
        index: usize,
        file: String,
        reason: String,
    },

    #[error("Invalid segment {file}: {reason}")]
    InvalidSegment { file: String, reason: String },

    #[error("Unsupported audio format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot parse melody plan: {0}")]
    Plan(#[from] serde_json::Error),

    #[error("Vocoder error: {0}")]
    Vocoder(String),

    #[error("No audio segments were successfully processed")]
    NoSegments,
}

pub type Result<T> = std::result::Result<T, Error>;

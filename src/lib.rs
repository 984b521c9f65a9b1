//! # diphone-singer
//!
//! Sing a melody with recorded diphones: every clip is pitch-shifted to its
//! target note with the WORLD vocoder, fitted to its note length and stitched
//! into one waveform.
//!
//! ## Quick start
//!
//! ```no_run
//! # #[cfg(feature = "world")] {
//! use diphone_singer::{BuilderConfig, MelodyPlan, PhraseBuilder, WorldVocoder};
//!
//! let builder = PhraseBuilder::new(BuilderConfig::default(), WorldVocoder::new());
//!
//! // Reads diphones/*.wav, writes phrases/output.wav
//! let phrase = builder.build(&MelodyPlan::default_scale()).unwrap();
//! println!("{} segments, {:.2} s", phrase.segment_lens.len(), phrase.duration_s());
//! # }
//! ```
//!
//! Diphone files are named after phoneme codes, see [`phoneme_index`]:
//!
//! ```
//! use diphone_singer::phoneme_index::{code_to_symbol, diphone_filename};
//!
//! assert_eq!(code_to_symbol("00").unwrap(), "a");
//! assert_eq!(diphone_filename("a", "i").as_deref(), Some("00_02.wav"));
//! ```
//!
//! ## Pipeline
//! 1. **Load**: WAV or FLAC, downmixed to mono, resampled to [`SAMPLE_RATE`].
//! 2. **Analyse**: f0 contour, spectral envelope, aperiodicity.
//! 3. **Shift**: f0 scaled so its voiced mean hits the target pitch.
//! 4. **Resynthesise** with the original envelope and aperiodicity.
//! 5. **Fit**: truncate or zero-pad to the note length.
//! 6. **Concat** in plan order and write a 16-bit WAV.

pub mod audio;
pub mod error;
pub mod melody;
pub mod phoneme_index;
pub mod phrase;
pub mod pitch;
pub mod vocoder;

// ─── Re-exports for convenience ─────────────────────────────────────────────

pub use error::{Error, Result};
pub use melody::{note_to_hz, MelodyEntry, MelodyPlan};
pub use phrase::{BuilderConfig, Phrase, PhraseBuilder, SkippedEntry};
pub use vocoder::{Analysis, Vocoder};

#[cfg(feature = "world")]
pub use vocoder::WorldVocoder;

/// Sample rate every clip is processed and written at.
pub const SAMPLE_RATE: u32 = 22_050;

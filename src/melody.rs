//! Melody plans: which diphone to sing, at what pitch, for how long.
//!
//! A plan is an ordered list of [`MelodyEntry`] values.  Plans can be built
//! in code, taken from [`MelodyPlan::default_scale`], or read from JSON:
//!
//! ```json
//! { "entries": [
//!     { "file": "00_02.wav", "note": "C4",      "duration_s": 0.3 },
//!     { "file": "02_04.wav", "pitch_hz": 293.66, "duration_s": 0.3 }
//! ] }
//! ```
//!
//! A bare JSON array of entries is accepted too.  Each entry names its pitch
//! either as `pitch_hz` or as a `note` name, never both.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Note names
// ─────────────────────────────────────────────────────────────────────────────

/// Concert pitch of A4.
pub const A4_HZ: f64 = 440.0;

/// MIDI number of A4.
const A4_MIDI: i32 = 69;

static RE_NOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Ga-g])([#b]?)(-?\d+)$").expect("valid note regex"));

/// Frequency of a note name such as `"A4"`, `"C#5"` or `"Bb3"` in 12-TET.
pub fn note_to_hz(note: &str) -> Result<f64> {
    let caps = RE_NOTE
        .captures(note.trim())
        .ok_or_else(|| Error::InvalidNote(note.to_string()))?;

    let pitch_class = match caps[1].to_ascii_uppercase().as_str() {
        "C" => 0,
        "D" => 2,
        "E" => 4,
        "F" => 5,
        "G" => 7,
        "A" => 9,
        "B" => 11,
        _ => return Err(Error::InvalidNote(note.to_string())),
    };
    let accidental = match &caps[2] {
        "#" => 1,
        "b" => -1,
        _ => 0,
    };
    let octave: i32 = caps[3]
        .parse()
        .map_err(|_| Error::InvalidNote(note.to_string()))?;

    let midi = 12 * (octave + 1) + pitch_class + accidental;
    Ok(A4_HZ * 2f64.powf((midi - A4_MIDI) as f64 / 12.0))
}

// ─────────────────────────────────────────────────────────────────────────────
// Plan entries
// ─────────────────────────────────────────────────────────────────────────────

/// Longest segment a plan may ask for, in seconds.
pub const MAX_SEGMENT_S: f64 = 600.0;

/// One sung segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MelodyEntry {
    /// Diphone file name, relative to the diphone directory.
    pub file: String,
    /// Target fundamental frequency in Hz.
    pub pitch_hz: f64,
    /// Segment length in seconds.
    pub duration_s: f64,
}

impl MelodyEntry {
    pub fn new(file: impl Into<String>, pitch_hz: f64, duration_s: f64) -> Self {
        Self { file: file.into(), pitch_hz, duration_s }
    }

    /// Entry whose pitch is given as a note name.
    pub fn from_note(file: impl Into<String>, note: &str, duration_s: f64) -> Result<Self> {
        Ok(Self::new(file, note_to_hz(note)?, duration_s))
    }

    /// What is wrong with this entry, if anything.
    pub fn problem(&self) -> Option<&'static str> {
        if self.file.trim().is_empty() {
            return Some("empty file name");
        }
        if !(self.pitch_hz.is_finite() && self.pitch_hz > 0.0) {
            return Some("pitch must be a positive frequency");
        }
        if !(self.duration_s.is_finite() && self.duration_s > 0.0) {
            return Some("duration must be positive");
        }
        if self.duration_s > MAX_SEGMENT_S {
            return Some("duration exceeds the per-segment limit");
        }
        None
    }

    fn validate(&self, index: usize) -> Result<()> {
        match self.problem() {
            Some(reason) => Err(Error::InvalidEntry {
                index,
                file: self.file.clone(),
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// JSON form of an entry, pitch as Hz or as a note name.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEntry {
    file: String,
    #[serde(default)]
    pitch_hz: Option<f64>,
    #[serde(default)]
    note: Option<String>,
    duration_s: f64,
}

impl RawEntry {
    fn into_entry(self, index: usize) -> Result<MelodyEntry> {
        let pitch_hz = match (self.pitch_hz, self.note.as_deref()) {
            (Some(hz), None) => hz,
            (None, Some(note)) => note_to_hz(note)?,
            (Some(_), Some(_)) => {
                return Err(Error::InvalidEntry {
                    index,
                    file: self.file,
                    reason: "give either pitch_hz or note, not both".into(),
                })
            }
            (None, None) => {
                return Err(Error::InvalidEntry {
                    index,
                    file: self.file,
                    reason: "missing pitch_hz or note".into(),
                })
            }
        };
        Ok(MelodyEntry::new(self.file, pitch_hz, self.duration_s))
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPlan {
    Wrapped { entries: Vec<RawEntry> },
    Bare(Vec<RawEntry>),
}

// ─────────────────────────────────────────────────────────────────────────────
// MelodyPlan
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered list of segments; order is playback order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MelodyPlan {
    pub entries: Vec<MelodyEntry>,
}

impl MelodyPlan {
    /// Build a plan, rejecting non-positive pitches or durations.
    pub fn new(entries: Vec<MelodyEntry>) -> Result<Self> {
        for (i, e) in entries.iter().enumerate() {
            e.validate(i)?;
        }
        Ok(Self { entries })
    }

    /// C major scale up to C5 and back down, 0.3 s per note, cycling over
    /// a fixed set of vowel diphones.
    pub fn default_scale() -> Self {
        const STEP: f64 = 0.3;
        let notes: [(&str, f64); 15] = [
            ("00_02.wav", 261.63), // C4
            ("02_04.wav", 293.66), // D4
            ("04_01.wav", 329.63), // E4
            ("01_03.wav", 349.23), // F4
            ("03_00.wav", 392.00), // G4
            ("00_01.wav", 440.00), // A4
            ("01_02.wav", 493.88), // B4
            ("02_00.wav", 523.25), // C5
            // descending
            ("00_02.wav", 493.88), // B4
            ("02_04.wav", 440.00), // A4
            ("04_01.wav", 392.00), // G4
            ("01_03.wav", 349.23), // F4
            ("03_00.wav", 329.63), // E4
            ("00_01.wav", 293.66), // D4
            ("01_02.wav", 261.63), // C4
        ];
        Self {
            entries: notes
                .iter()
                .map(|&(file, hz)| MelodyEntry::new(file, hz, STEP))
                .collect(),
        }
    }

    /// Parse a JSON plan (object with `entries`, or a bare array).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawPlan = serde_json::from_str(json)?;
        let raw = match raw {
            RawPlan::Wrapped { entries } | RawPlan::Bare(entries) => entries,
        };
        let entries = raw
            .into_iter()
            .enumerate()
            .map(|(i, e)| e.into_entry(i))
            .collect::<Result<Vec<_>>>()?;
        Self::new(entries)
    }

    /// Pretty-printed JSON in the `{"entries": [...]}` form, pitches in Hz.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a JSON plan from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Sum of the requested segment durations, in seconds.
    pub fn total_duration(&self) -> f64 {
        self.entries.iter().map(|e| e.duration_s).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

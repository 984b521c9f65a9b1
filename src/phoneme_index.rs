//! Phoneme index: two-character codes ↔ IPA symbols.
//!
//! Diphone recordings are named after the codes of the two phonemes they
//! span, joined by an underscore: the `a → i` transition lives in
//! `00_02.wav`.  The table is fixed at compile time; the forward map is
//! built on first use.
//!
//! Reverse lookup ([`symbol_to_code`]) scans the table in order and returns
//! the first code whose symbol matches.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Table (order matters for reverse lookup)
// ─────────────────────────────────────────────────────────────────────────────

/// Code of the silence pseudo-phoneme.
pub const SILENCE: &str = "__";

/// `(code, IPA symbol)` pairs in table order.
pub const PHONEME_TABLE: &[(&str, &str)] = &[
    ("00", "a"),
    ("01", "e"),
    ("02", "i"),
    ("03", "o"),
    ("04", "u"),
    ("05", "b"),
    ("06", "d"),
    ("07", "ɡ"),
    ("08", "p"),
    ("09", "t"),
    ("10", "k"),
    ("11", "s"),
    ("12", "tʃ"),
    ("13", "x"),
    ("14", "m"),
    ("15", "n"),
    ("16", "ɲ"),
    ("17", "l"),
    ("18", "ʝ"),
    ("19", "ɾ"),
    ("20", "f"),
    ("21", "r"),
    ("22", "j"),
    ("23", "w"),
    ("24", "pl"),
    ("25", "pɾ"),
    ("26", "bl"),
    ("27", "bɾ"),
    ("28", "tɾ"),
    ("29", "dɾ"),
    ("30", "kl"),
    ("31", "kɾ"),
    ("32", "gl"),
    ("33", "ɡɾ"),
    ("34", "fl"),
    ("35", "fɾ"),
    (SILENCE, SILENCE),
];

static CODE_TO_SYMBOL: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| PHONEME_TABLE.iter().copied().collect());

/// `<code>_<code>.<ext>`; codes are exactly two characters, so `___00.wav`
/// is silence followed by `a`.
static RE_DIPHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.{2})_(.{2})\.(?:wav|flac)$").expect("valid diphone regex"));

// ─────────────────────────────────────────────────────────────────────────────
// Lookups
// ─────────────────────────────────────────────────────────────────────────────

/// IPA symbol for `code`.  Unknown codes are an error.
pub fn code_to_symbol(code: &str) -> Result<&'static str> {
    CODE_TO_SYMBOL
        .get(code)
        .copied()
        .ok_or_else(|| Error::UnknownCode(code.to_string()))
}

/// First code (in table order) whose symbol is `symbol`, or `None`.
pub fn symbol_to_code(symbol: &str) -> Option<&'static str> {
    PHONEME_TABLE
        .iter()
        .find(|(_, s)| *s == symbol)
        .map(|(code, _)| *code)
}

/// All codes in table order.
pub fn codes() -> impl Iterator<Item = &'static str> {
    PHONEME_TABLE.iter().map(|(code, _)| *code)
}

// ─────────────────────────────────────────────────────────────────────────────
// Diphone file names
// ─────────────────────────────────────────────────────────────────────────────

/// File name of the diphone spanning `first → second`, e.g. `a, i → 00_02.wav`.
///
/// Returns `None` when either symbol is not in the table.
pub fn diphone_filename(first: &str, second: &str) -> Option<String> {
    let a = symbol_to_code(first)?;
    let b = symbol_to_code(second)?;
    Some(format!("{a}_{b}.wav"))
}

/// IPA pair named by a diphone file (`00_02.wav` → `("a", "i")`).
pub fn parse_diphone_filename(name: &str) -> Result<(&'static str, &'static str)> {
    let caps = RE_DIPHONE
        .captures(name)
        .ok_or_else(|| Error::InvalidDiphoneName(name.to_string()))?;
    let first = code_to_symbol(&caps[1])?;
    let second = code_to_symbol(&caps[2])?;
    Ok((first, second))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

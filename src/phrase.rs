//! Phrase builder: melody plan in, one sung waveform out.
//!
//! For every [`MelodyEntry`]:
//! 1. resolve the diphone under the diphone directory,
//! 2. load it as mono at the project rate,
//! 3. analyse it with the [`Vocoder`],
//! 4. rescale the f0 contour to the target pitch ([`shift_to_target`]),
//! 5. resynthesise,
//! 6. truncate or zero-pad to exactly the requested duration.
//!
//! Segments are concatenated in plan order with no gaps or crossfades.
//! An entry that fails is logged and skipped; only a plan where every entry
//! fails is an error ([`Error::NoSegments`]).

use std::path::{Path, PathBuf};

use crate::{
    audio,
    error::{Error, Result},
    melody::{MelodyEntry, MelodyPlan},
    pitch::shift_to_target,
    vocoder::Vocoder,
    SAMPLE_RATE,
};

/// Default directory holding the diphone recordings.
pub const DEFAULT_DIPHONE_DIR: &str = "diphones";

/// Default output file.
pub const DEFAULT_OUTPUT: &str = "phrases/output.wav";

// ─────────────────────────────────────────────────────────────────────────────
// Duration fitting
// ─────────────────────────────────────────────────────────────────────────────

/// Number of samples a segment of `duration_s` seconds occupies.
///
/// Rounded to the nearest sample, so `0.3 s @ 22 050 Hz` is 6615 even though
/// `0.3 * 22050.0` is not exactly representable.
pub fn target_len(duration_s: f64, sample_rate: u32) -> usize {
    (duration_s * sample_rate as f64).round().max(0.0) as usize
}

/// Cut `samples` to the requested duration or zero-pad it at the end.
pub fn fit_to_duration(mut samples: Vec<f32>, duration_s: f64, sample_rate: u32) -> Vec<f32> {
    samples.resize(target_len(duration_s, sample_rate), 0.0);
    samples
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration and results
// ─────────────────────────────────────────────────────────────────────────────

/// Where diphones are read from and where the phrase is written.
#[derive(Debug, Clone, PartialEq)]
pub struct BuilderConfig {
    pub diphone_dir: PathBuf,
    pub output_path: PathBuf,
    pub sample_rate: u32,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            diphone_dir: PathBuf::from(DEFAULT_DIPHONE_DIR),
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            sample_rate: SAMPLE_RATE,
        }
    }
}

impl BuilderConfig {
    pub fn with_diphone_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.diphone_dir = dir.into();
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }
}

/// A plan entry that contributed no audio.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEntry {
    /// Position in the plan.
    pub index: usize,
    pub file: String,
    pub reason: String,
}

/// Rendered phrase.
#[derive(Debug, Clone, Default)]
pub struct Phrase {
    /// Concatenated segments, mono, at `sample_rate`.
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// Length of every processed segment, in plan order.
    pub segment_lens: Vec<usize>,
    pub skipped: Vec<SkippedEntry>,
}

impl Phrase {
    pub fn duration_s(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PhraseBuilder
// ─────────────────────────────────────────────────────────────────────────────

pub struct PhraseBuilder<V> {
    config: BuilderConfig,
    vocoder: V,
}

impl<V: Vocoder> PhraseBuilder<V> {
    pub fn new(config: BuilderConfig, vocoder: V) -> Self {
        Self { config, vocoder }
    }

    /// Path of `file` inside the diphone directory.
    pub fn diphone_path(&self, file: &str) -> PathBuf {
        self.config.diphone_dir.join(file)
    }

    /// Load, pitch-shift and time-fit one entry.
    pub fn load_and_process(&self, entry: &MelodyEntry) -> Result<Vec<f32>> {
        if let Some(reason) = entry.problem() {
            return Err(Error::InvalidSegment {
                file: entry.file.clone(),
                reason: reason.to_string(),
            });
        }
        let path = self.diphone_path(&entry.file);
        if !path.is_file() {
            return Err(Error::DiphoneNotFound(path));
        }
        let sr = self.config.sample_rate;

        let clip = audio::load_mono(&path, sr)?;
        let x: Vec<f64> = clip.iter().map(|&s| f64::from(s)).collect();

        let mut analysis = self.vocoder.analyze(&x, sr)?;
        let ratio = shift_to_target(&mut analysis, entry.pitch_hz);
        let y = self.vocoder.synthesize(&analysis, sr)?;

        log::debug!(
            "{}: {} frames, ratio {:.3}, {} → {} samples",
            entry.file,
            analysis.frames(),
            ratio,
            y.len(),
            target_len(entry.duration_s, sr)
        );

        let y: Vec<f32> = y.into_iter().map(|s| s as f32).collect();
        Ok(fit_to_duration(y, entry.duration_s, sr))
    }

    /// Render every entry and concatenate the ones that succeed.
    pub fn render(&self, plan: &MelodyPlan) -> Result<Phrase> {
        let mut phrase = Phrase { sample_rate: self.config.sample_rate, ..Default::default() };

        for (index, entry) in plan.entries.iter().enumerate() {
            match self.load_and_process(entry) {
                Ok(segment) => {
                    phrase.segment_lens.push(segment.len());
                    phrase.samples.extend(segment);
                }
                Err(e) => {
                    log::warn!("Error processing {}: {}", entry.file, e);
                    phrase.skipped.push(SkippedEntry {
                        index,
                        file: entry.file.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if phrase.segment_lens.is_empty() {
            return Err(Error::NoSegments);
        }
        Ok(phrase)
    }

    /// Render `plan` and write it to the configured output path.
    ///
    /// The output directory is created only once there is audio to write.
    pub fn build(&self, plan: &MelodyPlan) -> Result<Phrase> {
        let phrase = self.render(plan)?;
        let out = &self.config.output_path;
        ensure_parent_dir(out)?;
        audio::write_wav(out, &phrase.samples, phrase.sample_rate)?;
        log::info!(
            "Saved phrase to {} ({} segments, {:.2} s)",
            out.display(),
            phrase.segment_lens.len(),
            phrase.duration_s()
        );
        Ok(phrase)
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => Ok(std::fs::create_dir_all(dir)?),
        _ => Ok(()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use tempfile::{tempdir, TempDir};

    use super::*;
    use crate::vocoder::Analysis;

    /// Passes the clip through unchanged and remembers the f0 it was asked
    /// to synthesise.
    #[derive(Default)]
    struct EchoVocoder {
        clip_f0: f64,
        seen_f0: RefCell<Vec<Vec<f64>>>,
    }

    impl EchoVocoder {
        fn voiced_at(hz: f64) -> Self {
            Self { clip_f0: hz, ..Default::default() }
        }
    }

    impl Vocoder for EchoVocoder {
        fn analyze(&self, samples: &[f64], _sample_rate: u32) -> Result<Analysis> {
            Ok(Analysis {
                f0: vec![0.0, self.clip_f0, self.clip_f0, 0.0],
                temporal_positions: vec![0.0, 0.005, 0.010, 0.015],
                spectrogram: vec![samples.to_vec()],
                aperiodicity: Vec::new(),
                frame_period: 5.0,
            })
        }

        fn synthesize(&self, analysis: &Analysis, _sample_rate: u32) -> Result<Vec<f64>> {
            self.seen_f0.borrow_mut().push(analysis.f0.clone());
            Ok(analysis.spectrogram[0].clone())
        }
    }

    struct FailingVocoder;

    impl Vocoder for FailingVocoder {
        fn analyze(&self, _samples: &[f64], _sample_rate: u32) -> Result<Analysis> {
            Err(Error::Vocoder("analysis blew up".into()))
        }

        fn synthesize(&self, _analysis: &Analysis, _sample_rate: u32) -> Result<Vec<f64>> {
            unreachable!()
        }
    }

    /// Constant-level clip so segments can be told apart in the output.
    fn write_clip(dir: &Path, name: &str, level: f32, len: usize) {
        audio::write_wav(&dir.join(name), &vec![level; len], SAMPLE_RATE).unwrap();
    }

    fn setup() -> (TempDir, BuilderConfig) {
        let tmp = tempdir().unwrap();
        let diphones = tmp.path().join("diphones");
        std::fs::create_dir(&diphones).unwrap();
        write_clip(&diphones, "00_02.wav", 0.25, 10_000); // longer than 0.3 s
        write_clip(&diphones, "02_04.wav", 0.5, 1_000); // shorter than 0.3 s
        let config = BuilderConfig::default()
            .with_diphone_dir(diphones)
            .with_output_path(tmp.path().join("phrases").join("out.wav"));
        (tmp, config)
    }

    #[test]
    fn test_target_len_rounds() {
        assert_eq!(target_len(0.3, 22_050), 6_615);
        assert_eq!(target_len(1.0, 22_050), 22_050);
        assert_eq!(target_len(0.1, 22_050), 2_205);
        assert_eq!(target_len(0.5, 3), 2);
    }

    #[test]
    fn test_fit_truncates_and_pads() {
        let long = fit_to_duration(vec![1.0; 10_000], 0.3, 22_050);
        assert_eq!(long.len(), 6_615);
        assert!(long.iter().all(|&s| s == 1.0));

        let short = fit_to_duration(vec![1.0; 100], 0.3, 22_050);
        assert_eq!(short.len(), 6_615);
        assert!(short[..100].iter().all(|&s| s == 1.0));
        assert!(short[100..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_default_config() {
        let c = BuilderConfig::default();
        assert_eq!(c.diphone_dir, PathBuf::from("diphones"));
        assert_eq!(c.output_path, PathBuf::from("phrases/output.wav"));
        assert_eq!(c.sample_rate, 22_050);
    }

    #[test]
    fn test_segments_concatenate_in_order() {
        let (_tmp, config) = setup();
        let builder = PhraseBuilder::new(config, EchoVocoder::voiced_at(200.0));
        let plan = MelodyPlan::new(vec![
            MelodyEntry::new("02_04.wav", 440.0, 0.1),
            MelodyEntry::new("00_02.wav", 261.63, 0.3),
            MelodyEntry::new("02_04.wav", 293.66, 0.2),
        ])
        .unwrap();

        let phrase = builder.render(&plan).unwrap();
        assert_eq!(phrase.segment_lens, vec![2_205, 6_615, 4_410]);
        assert_eq!(phrase.samples.len(), 2_205 + 6_615 + 4_410);
        assert!(phrase.skipped.is_empty());

        // first segment: 1000 samples at 0.5 then padding
        assert!((phrase.samples[0] - 0.5).abs() < 1e-3);
        assert_eq!(phrase.samples[1_500], 0.0);
        // second segment: truncated 0.25 clip
        assert!((phrase.samples[2_205] - 0.25).abs() < 1e-3);
        assert!((phrase.samples[2_205 + 6_614] - 0.25).abs() < 1e-3);
        // third segment
        assert!((phrase.samples[2_205 + 6_615] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_contour_is_scaled_to_target() {
        let (_tmp, config) = setup();
        let builder = PhraseBuilder::new(config, EchoVocoder::voiced_at(200.0));
        let entry = MelodyEntry::new("00_02.wav", 300.0, 0.3);
        builder.load_and_process(&entry).unwrap();

        let seen = builder.vocoder.seen_f0.borrow();
        assert_eq!(seen[0], vec![0.0, 300.0, 300.0, 0.0]);
    }

    #[test]
    fn test_silent_clip_does_not_divide_by_zero() {
        let (_tmp, config) = setup();
        let builder = PhraseBuilder::new(config, EchoVocoder::voiced_at(0.0));
        let entry = MelodyEntry::new("00_02.wav", 300.0, 0.3);
        let seg = builder.load_and_process(&entry).unwrap();
        assert_eq!(seg.len(), 6_615);

        let seen = builder.vocoder.seen_f0.borrow();
        assert!(seen[0].iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_missing_entries_are_skipped() {
        let (_tmp, config) = setup();
        let builder = PhraseBuilder::new(config, EchoVocoder::voiced_at(200.0));
        let plan = MelodyPlan::new(vec![
            MelodyEntry::new("99_99.wav", 440.0, 0.3),
            MelodyEntry::new("00_02.wav", 440.0, 0.3),
        ])
        .unwrap();

        let phrase = builder.render(&plan).unwrap();
        assert_eq!(phrase.segment_lens, vec![6_615]);
        assert_eq!(phrase.skipped.len(), 1);
        assert_eq!(phrase.skipped[0].index, 0);
        assert_eq!(phrase.skipped[0].file, "99_99.wav");
        assert!(phrase.skipped[0].reason.contains("not found"));
    }

    #[test]
    fn test_missing_file_error() {
        let (_tmp, config) = setup();
        let builder = PhraseBuilder::new(config, EchoVocoder::default());
        let err = builder
            .load_and_process(&MelodyEntry::new("nope.wav", 440.0, 0.3))
            .unwrap_err();
        assert!(matches!(err, Error::DiphoneNotFound(p) if p.ends_with("nope.wav")));
    }

    #[test]
    fn test_all_missing_writes_nothing() {
        let (_tmp, config) = setup();
        let out = config.output_path.clone();
        let builder = PhraseBuilder::new(config, EchoVocoder::default());
        let plan = MelodyPlan::new(vec![
            MelodyEntry::new("98_98.wav", 440.0, 0.3),
            MelodyEntry::new("99_99.wav", 440.0, 0.3),
        ])
        .unwrap();

        assert!(matches!(builder.build(&plan), Err(Error::NoSegments)));
        assert!(!out.exists());
        assert!(!out.parent().unwrap().exists());
    }

    #[test]
    fn test_vocoder_failures_are_skipped() {
        let (_tmp, config) = setup();
        let builder = PhraseBuilder::new(config, FailingVocoder);
        let plan = MelodyPlan::new(vec![MelodyEntry::new("00_02.wav", 440.0, 0.3)]).unwrap();
        assert!(matches!(builder.render(&plan), Err(Error::NoSegments)));
    }

    #[test]
    fn test_build_writes_wav() {
        let (_tmp, config) = setup();
        let out = config.output_path.clone();
        let builder = PhraseBuilder::new(config, EchoVocoder::voiced_at(220.0));
        let plan = MelodyPlan::new(vec![
            MelodyEntry::new("00_02.wav", 261.63, 0.3),
            MelodyEntry::new("02_04.wav", 293.66, 0.3),
        ])
        .unwrap();

        let phrase = builder.build(&plan).unwrap();
        assert!(out.is_file());

        let reader = hound::WavReader::open(&out).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 22_050);
        assert_eq!(spec.channels, 1);
        assert_eq!(reader.len() as usize, phrase.samples.len());
        assert_eq!(phrase.samples.len(), 2 * 6_615);
        assert!((phrase.duration_s() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_builder_accepts_borrowed_vocoder() {
        let (_tmp, config) = setup();
        let vocoder = EchoVocoder::voiced_at(200.0);
        let builder = PhraseBuilder::new(config, &vocoder);
        builder
            .load_and_process(&MelodyEntry::new("00_02.wav", 400.0, 0.3))
            .unwrap();
        assert_eq!(vocoder.seen_f0.borrow().len(), 1);
    }

    #[test]
    fn test_overlong_entry_is_skipped_not_allocated() {
        let (_tmp, config) = setup();
        let builder = PhraseBuilder::new(config, EchoVocoder::voiced_at(200.0));
        // built directly so plan validation does not catch it first
        let plan = MelodyPlan {
            entries: vec![
                MelodyEntry::new("00_02.wav", 440.0, 1e9),
                MelodyEntry::new("02_04.wav", 440.0, 0.3),
            ],
        };

        let phrase = builder.render(&plan).unwrap();
        assert_eq!(phrase.segment_lens, vec![6_615]);
        assert_eq!(phrase.skipped[0].index, 0);
        assert!(builder.vocoder.seen_f0.borrow().len() == 1);

        let err = builder
            .load_and_process(&MelodyEntry::new("00_02.wav", 440.0, 1e9))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSegment { .. }));
    }

    #[cfg(feature = "world")]
    #[test]
    fn test_world_vocoder_sings_voiced_and_silent_clips() {
        use crate::vocoder::WorldVocoder;

        let tmp = tempdir().unwrap();
        let diphones = tmp.path().join("diphones");
        std::fs::create_dir(&diphones).unwrap();
        let tone: Vec<f32> = (0..13_230)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 220.0 * i as f32 / 22_050.0).sin())
            .collect();
        audio::write_wav(&diphones.join("00_02.wav"), &tone, SAMPLE_RATE).unwrap();
        write_clip(&diphones, "02_04.wav", 0.0, 6_615);

        let out = tmp.path().join("phrases").join("world.wav");
        let config = BuilderConfig::default()
            .with_diphone_dir(&diphones)
            .with_output_path(&out);
        let builder = PhraseBuilder::new(config, WorldVocoder::new());
        let plan = MelodyPlan::new(vec![
            MelodyEntry::new("00_02.wav", 330.0, 0.3),
            MelodyEntry::new("02_04.wav", 261.63, 0.3),
            MelodyEntry::new("00_02.wav", 196.0, 0.5),
        ])
        .unwrap();

        let phrase = builder.build(&plan).unwrap();
        assert!(phrase.skipped.is_empty(), "{:?}", phrase.skipped);
        assert_eq!(phrase.segment_lens, vec![6_615, 6_615, 11_025]);
        assert!(phrase.samples.iter().all(|s| s.is_finite()));
        assert!(phrase.samples[..6_615].iter().any(|s| s.abs() > 0.01));
        assert!(out.is_file());
    }
}

//! Vocoder seam: analysis into (f0, spectral envelope, aperiodicity) and
//! resynthesis back to a waveform.
//!
//! The phrase builder only talks to the [`Vocoder`] trait.  The production
//! implementation is [`WorldVocoder`] (feature `world`), which drives the
//! WORLD vocoder through `rsworld`:
//!
//! | Step                | WORLD routine |
//! |---------------------|---------------|
//! | raw f0 contour      | `dio`         |
//! | f0 refinement       | `stonemask`   |
//! | spectral envelope   | `cheaptrick`  |
//! | aperiodicity        | `d4c`         |
//! | resynthesis         | `synthesis`   |

use crate::error::Result;

/// Vocoder parameters of one clip.
///
/// `f0`, `temporal_positions`, `spectrogram` and `aperiodicity` all have one
/// entry per analysis frame.  Unvoiced frames have `f0 == 0.0`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    pub f0: Vec<f64>,
    pub temporal_positions: Vec<f64>,
    pub spectrogram: Vec<Vec<f64>>,
    pub aperiodicity: Vec<Vec<f64>>,
    /// Frame hop in milliseconds.
    pub frame_period: f64,
}

impl Analysis {
    pub fn frames(&self) -> usize {
        self.f0.len()
    }
}

/// Analysis/resynthesis backend.
pub trait Vocoder {
    fn analyze(&self, samples: &[f64], sample_rate: u32) -> Result<Analysis>;

    fn synthesize(&self, analysis: &Analysis, sample_rate: u32) -> Result<Vec<f64>>;
}

impl<V: Vocoder + ?Sized> Vocoder for &V {
    fn analyze(&self, samples: &[f64], sample_rate: u32) -> Result<Analysis> {
        (**self).analyze(samples, sample_rate)
    }

    fn synthesize(&self, analysis: &Analysis, sample_rate: u32) -> Result<Vec<f64>> {
        (**self).synthesize(analysis, sample_rate)
    }
}

#[cfg(feature = "world")]
pub use world::WorldVocoder;

#[cfg(feature = "world")]
mod world {
    use rsworld::{cheaptrick, d4c, dio, stonemask, synthesis};
    use rsworld_sys::{CheapTrickOption, D4COption, DioOption};

    use super::{Analysis, Vocoder};
    use crate::error::{Error, Result};

    /// WORLD vocoder (DIO + StoneMask + CheapTrick + D4C).
    #[derive(Debug, Clone, Copy, Default)]
    pub struct WorldVocoder;

    impl WorldVocoder {
        pub fn new() -> Self {
            Self
        }
    }

    impl Vocoder for WorldVocoder {
        fn analyze(&self, samples: &[f64], sample_rate: u32) -> Result<Analysis> {
            if samples.is_empty() {
                return Err(Error::Vocoder("cannot analyse an empty clip".into()));
            }
            let fs = i32::try_from(sample_rate)
                .map_err(|_| Error::Vocoder(format!("sample rate {sample_rate} out of range")))?;
            let x = samples.to_vec();

            let dio_option = DioOption::new();
            let frame_period = dio_option.frame_period;
            let (temporal_positions, raw_f0) = dio(&x, fs, &dio_option);
            let f0 = stonemask(&x, fs, &temporal_positions, &raw_f0);

            let mut ct_option = CheapTrickOption::new(fs);
            let spectrogram = cheaptrick(&x, fs, &temporal_positions, &f0, &mut ct_option);
            let aperiodicity = d4c(&x, fs, &temporal_positions, &f0, &D4COption::new());

            Ok(Analysis { f0, temporal_positions, spectrogram, aperiodicity, frame_period })
        }

        fn synthesize(&self, analysis: &Analysis, sample_rate: u32) -> Result<Vec<f64>> {
            if analysis.frames() == 0 {
                return Ok(Vec::new());
            }
            if analysis.spectrogram.len() != analysis.frames()
                || analysis.aperiodicity.len() != analysis.frames()
            {
                return Err(Error::Vocoder("analysis frame counts disagree".into()));
            }
            let fs = i32::try_from(sample_rate)
                .map_err(|_| Error::Vocoder(format!("sample rate {sample_rate} out of range")))?;
            Ok(synthesis(
                &analysis.f0,
                &analysis.spectrogram,
                &analysis.aperiodicity,
                analysis.frame_period,
                fs,
            ))
        }
    }

}

//! Command-line front end.
//!
//! ```text
//! diphone-singer build [--plan plan.json] [--diphones DIR] [--output FILE]
//! diphone-singer plan > plan.json
//! diphone-singer ipa 12          # → tʃ
//! diphone-singer code tʃ         # → 12
//! diphone-singer diphone a i     # → 00_02.wav
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use diphone_singer::{
    phoneme_index::{code_to_symbol, diphone_filename, symbol_to_code},
    phrase::{DEFAULT_DIPHONE_DIR, DEFAULT_OUTPUT},
    BuilderConfig, MelodyPlan, PhraseBuilder, WorldVocoder, SAMPLE_RATE,
};

#[derive(Debug, Parser)]
#[command(name = "diphone-singer", version, about = "Sing melodies from recorded diphones")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a melody plan to a WAV file.
    Build {
        /// JSON melody plan; the built-in C major scale when omitted.
        #[arg(long)]
        plan: Option<PathBuf>,

        /// Directory holding the diphone recordings.
        #[arg(long, default_value = DEFAULT_DIPHONE_DIR)]
        diphones: PathBuf,

        /// Output WAV path.
        #[arg(long, short, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        #[arg(long, default_value_t = SAMPLE_RATE)]
        sample_rate: u32,
    },
    /// Print the built-in melody plan as JSON, a template for `--plan`.
    Plan,
    /// Print the IPA symbol for a phoneme code.
    Ipa { code: String },
    /// Print the phoneme code for an IPA symbol.
    Code { symbol: String },
    /// Print the diphone file name for a pair of IPA symbols.
    Diphone { first: String, second: String },
}

fn main() -> Result<()> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();

    match Cli::parse().command {
        Command::Build { plan, diphones, output, sample_rate } => {
            let plan = match plan {
                Some(path) => MelodyPlan::load(&path)
                    .with_context(|| format!("Cannot load melody plan: {}", path.display()))?,
                None => MelodyPlan::default_scale(),
            };
            let config = BuilderConfig::default()
                .with_diphone_dir(diphones)
                .with_output_path(&output)
                .with_sample_rate(sample_rate);

            let builder = PhraseBuilder::new(config, WorldVocoder::new());
            let phrase = builder.build(&plan).context("Phrase build failed")?;

            println!(
                "Saved {} of {} segments ({:.2} s) to {}",
                phrase.segment_lens.len(),
                plan.len(),
                phrase.duration_s(),
                output.display()
            );
            for skipped in &phrase.skipped {
                println!("  skipped #{} {}: {}", skipped.index, skipped.file, skipped.reason);
            }
        }
        Command::Plan => println!("{}", MelodyPlan::default_scale().to_json_pretty()?),
        Command::Ipa { code } => println!("{}", code_to_symbol(&code)?),
        Command::Code { symbol } => match symbol_to_code(&symbol) {
            Some(code) => println!("{code}"),
            None => bail!("No phoneme code for symbol '{}'", symbol),
        },
        Command::Diphone { first, second } => match diphone_filename(&first, &second) {
            Some(name) => println!("{name}"),
            None => bail!("Unknown IPA symbol in '{}' → '{}'", first, second),
        },
    }
    Ok(())
}

//! `shiftaug` command-line entry point.
//!
//! ```text
//! shiftaug shift a.wav b.wav --out-dir shifted/ --unit seconds --min-shift -0.2 --max-shift 0.2
//! shiftaug config --rollover false --save
//! ```
//!
//! Settings are loaded from the JSON settings file first; any flag given on
//! the command line overrides the stored value for this run only, unless
//! `config --save` writes it back.

mod commands;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use settings::{default_settings_path, load_settings, save_settings, AppSettings};
use shiftaug_core::ShiftUnit;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "shiftaug", version, about = "Randomized time-shift augmentation for WAV files")]
struct Cli {
    /// Settings file (defaults to the user data directory).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Shift WAV files as one batch and write the results.
    Shift {
        /// Input WAV files.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory for the shifted files.
        #[arg(long, short, default_value = "shifted")]
        out_dir: PathBuf,

        #[command(flatten)]
        overrides: Overrides,
    },
    /// Print the effective settings, optionally saving overrides.
    Config {
        /// Write the effective settings back to the settings file.
        #[arg(long)]
        save: bool,

        #[command(flatten)]
        overrides: Overrides,
    },
}

#[derive(Debug, Args)]
struct Overrides {
    /// Lower shift bound, in `--unit`.
    #[arg(long, allow_hyphen_values = true)]
    min_shift: Option<f64>,

    /// Upper shift bound, in `--unit`.
    #[arg(long, allow_hyphen_values = true)]
    max_shift: Option<f64>,

    /// One of `fraction`, `samples`, `seconds`.
    #[arg(long)]
    unit: Option<ShiftUnit>,

    /// Wrap shifted content around (`true`) or zero-fill (`false`).
    #[arg(long)]
    rollover: Option<bool>,

    /// RNG seed for reproducible shifts.
    #[arg(long)]
    seed: Option<u64>,

    /// Resample every input to this rate before batching.
    #[arg(long)]
    target_rate: Option<u32>,
}

impl Overrides {
    fn apply(&self, settings: &mut AppSettings) {
        if let Some(v) = self.min_shift {
            settings.shift.min_shift = v;
        }
        if let Some(v) = self.max_shift {
            settings.shift.max_shift = v;
        }
        if let Some(v) = self.unit {
            settings.shift.shift_unit = v;
        }
        if let Some(v) = self.rollover {
            settings.shift.rollover = v;
        }
        if self.seed.is_some() {
            settings.seed = self.seed;
        }
        if self.target_rate.is_some() {
            settings.target_sample_rate = self.target_rate;
        }
        settings.normalize();
    }
}

fn main() -> Result<()> {
    // ── Tracing ───────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("shiftaug=info,shiftaug_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings_path = cli.settings.unwrap_or_else(default_settings_path);
    let mut settings = load_settings(&settings_path)?;

    match cli.command {
        Command::Shift {
            inputs,
            out_dir,
            overrides,
        } => {
            overrides.apply(&mut settings);
            info!(files = inputs.len(), out_dir = %out_dir.display(), "shifting");
            let reports = commands::shift_files(&settings, &inputs, &out_dir)?;
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        Command::Config { save, overrides } => {
            overrides.apply(&mut settings);
            settings
                .shift
                .validate()
                .context("effective shift configuration is invalid")?;
            if save {
                save_settings(&settings_path, &settings)
                    .with_context(|| format!("saving {}", settings_path.display()))?;
                info!(path = %settings_path.display(), "settings saved");
            }
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }

    Ok(())
}

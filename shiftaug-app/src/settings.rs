//! Persistent tool settings (JSON file in the user data directory).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use shiftaug_core::ShiftConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub shift: ShiftConfig,
    /// Fixed RNG seed; `None` draws from OS entropy on every run.
    pub seed: Option<u64>,
    /// Rate every clip is converted to before batching. `None` keeps the
    /// first input's rate.
    pub target_sample_rate: Option<u32>,
    pub resample_chunk_size: usize,
    pub output_suffix: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            shift: ShiftConfig::default(),
            seed: None,
            target_sample_rate: None,
            resample_chunk_size: 1024,
            output_suffix: "_shifted".into(),
        }
    }
}

impl AppSettings {
    /// Clamp tool-level knobs into range. The shift config is left alone and
    /// validated when the operator is built.
    pub fn normalize(&mut self) {
        self.resample_chunk_size = self.resample_chunk_size.clamp(64, 65_536);
        self.target_sample_rate = self.target_sample_rate.filter(|&rate| rate > 0);
        self.output_suffix = normalize_output_suffix(&self.output_suffix);
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

pub fn normalize_output_suffix(raw: &str) -> String {
    let suffix: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '/' | '\\'))
        .collect();
    if suffix.is_empty() {
        "_shifted".into()
    } else {
        suffix
    }
}

pub fn default_settings_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Lattice Labs")
            .join("shiftaug")
            .join("settings.json")
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var_os("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
                    .join(".local")
                    .join("share")
            })
            .join("shiftaug")
            .join("settings.json")
    }
}

/// Load settings, falling back to defaults only when the file does not exist.
/// A file that exists but does not parse is an error.
pub fn load_settings(path: &Path) -> Result<AppSettings> {
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str::<AppSettings>(&raw)
            .with_context(|| format!("parsing settings {}", path.display()))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => AppSettings::default(),
        Err(e) => return Err(e).with_context(|| format!("reading settings {}", path.display())),
    };
    settings.normalize();
    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &AppSettings) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings).map_err(std::io::Error::other)?;
    fs::write(path, json)
}

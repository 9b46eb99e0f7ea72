//! Runtime configuration, layered from an optional TOML file and
//! `INFORMATTACH_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use informattach_core::import::DEFAULT_PROGRESS_EVERY;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  #[serde(default = "default_database_path")]
  pub database_path:  PathBuf,
  /// Log import progress every this many rows.
  #[serde(default = "default_progress_every")]
  pub progress_every: usize,
}

fn default_database_path() -> PathBuf { PathBuf::from("informattach.db") }

fn default_progress_every() -> usize { DEFAULT_PROGRESS_EVERY }

impl Settings {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("INFORMATTACH"))
      .build()
      .context("failed to read config file")?;

    let mut settings: Settings = settings
      .try_deserialize()
      .context("failed to deserialise Settings")?;
    settings.database_path = expand_tilde(&settings.database_path);
    Ok(settings)
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

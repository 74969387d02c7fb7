//! JSON file helpers shared by the commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

pub fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
  debug!(path = %path.display(), what, "reading");
  let content =
    fs::read_to_string(path).with_context(|| format!("Failed to read {}: {}", what, path.display()))?;
  serde_json::from_str(&content).with_context(|| format!("Failed to parse {}: {}", what, path.display()))
}

/// Writes pretty JSON to `path`, or to stdout when `path` is `None`.
pub fn write_json<T: Serialize>(path: Option<&Path>, value: &T, what: &str) -> Result<()> {
  let json = serde_json::to_string_pretty(value).with_context(|| format!("Failed to serialize {}", what))?;

  match path {
    Some(path) => {
      debug!(path = %path.display(), what, "writing");
      if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
          .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
      }
      fs::write(path, format!("{}\n", json))
        .with_context(|| format!("Failed to write {}: {}", what, path.display()))
    }
    None => {
      println!("{}", json);
      Ok(())
    }
  }
}

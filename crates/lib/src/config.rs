//! Synthesizer configuration.
//!
//! Controls how new drafts are seeded and what the first management network
//! looks like. Every field has a default, so a missing file is the same as an
//! empty one.
//!
//! # Config File Format
//!
//! ```json
//! {
//!   "hostCount": 2,
//!   "bootstrapNetworks": [
//!     { "type": "bcn", "number": 1 },
//!     { "type": "ifn", "number": 1 },
//!     { "type": "sn", "number": 1 }
//!   ],
//!   "managementNetwork": { "minIp": "10.199.0.0", "subnetMask": "255.255.0.0" }
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{APP_NAME, CONFIG_FILENAME};
use crate::draft::NetworkType;

/// A network seeded into every freshly created draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapNetwork {
  #[serde(rename = "type")]
  pub network_type: NetworkType,
  pub number: u32,
}

/// Address block given to the first management network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagementNetwork {
  pub min_ip: String,
  pub subnet_mask: String,
}

impl Default for ManagementNetwork {
  fn default() -> Self {
    Self {
      min_ip: "10.199.0.0".to_string(),
      subnet_mask: "255.255.0.0".to_string(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SynthesizerConfig {
  /// Host slots created for a new manifest.
  pub host_count: u32,
  pub bootstrap_networks: Vec<BootstrapNetwork>,
  pub management_network: ManagementNetwork,
}

impl Default for SynthesizerConfig {
  fn default() -> Self {
    Self {
      host_count: 2,
      bootstrap_networks: [NetworkType::Bcn, NetworkType::Ifn, NetworkType::Sn]
        .into_iter()
        .map(|network_type| BootstrapNetwork { network_type, number: 1 })
        .collect(),
      management_network: ManagementNetwork::default(),
    }
  }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// Failed to read the config file.
  #[error("failed to read config file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Failed to parse the config file JSON.
  #[error("failed to parse config file {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

/// Returns the directory holding the configuration file.
///
/// Uses `$XDG_CONFIG_HOME` when set, otherwise `$HOME/.config`. Returns `None`
/// when neither is available.
pub fn config_dir() -> Option<PathBuf> {
  let config_home = std::env::var_os("XDG_CONFIG_HOME")
    .map(PathBuf::from)
    .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
  Some(config_home.join(APP_NAME))
}

/// Returns the default configuration file path.
pub fn default_config_path() -> Option<PathBuf> {
  config_dir().map(|dir| dir.join(CONFIG_FILENAME))
}

impl SynthesizerConfig {
  /// Load configuration from the given path.
  ///
  /// Returns `Ok(None)` if the file doesn't exist.
  pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
    let content = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
      Err(source) => {
        return Err(ConfigError::Read {
          path: path.to_path_buf(),
          source,
        });
      }
    };

    let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    Ok(Some(config))
  }

  /// Resolve configuration from an explicit path, the default location, or
  /// built-in defaults, in that order.
  pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
    let path = match explicit {
      Some(path) => Some(path.to_path_buf()),
      None => default_config_path(),
    };

    let Some(path) = path else {
      debug!("no config directory available, using defaults");
      return Ok(Self::default());
    };

    match Self::load(&path)? {
      Some(config) => {
        debug!(path = %path.display(), "loaded config");
        Ok(config)
      }
      None => {
        debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Self::default())
      }
    }
  }
}

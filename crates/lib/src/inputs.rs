//! Read-only inputs supplied by the form layer.
//!
//! - [`HostDirectory`] - hosts that have already been provisioned, with the
//!   networks they are configured on
//! - [`ManifestTemplate`] - known fence and UPS devices plus suggested
//!   identity values for a new manifest
//! - [`ManifestRecord`] - a previously stored manifest, for the edit flow

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::wire::{HostConfig, NetworkConfig};

/// Already-provisioned hosts keyed by host id.
pub type HostDirectory = BTreeMap<String, KnownHost>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownHost {
  /// Fully qualified host name, e.g. `an-a01n01.example.com`.
  #[serde(default)]
  pub name: String,
  /// Short host name, e.g. `an-a01n01`.
  #[serde(default)]
  pub short: String,
  #[serde(default)]
  pub netconf: HostNetconf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostNetconf {
  /// Keyed by composite network key.
  #[serde(default)]
  pub networks: BTreeMap<String, HostNetwork>,
  #[serde(default)]
  pub gateway: String,
  /// Composite key of the network carrying the default route.
  #[serde(default)]
  pub gateway_interface: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostNetwork {
  #[serde(default)]
  pub ip: String,
  #[serde(default)]
  pub subnet_mask: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownFence {
  pub fence_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownUps {
  pub ups_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestTemplate {
  #[serde(default)]
  pub domain: String,
  #[serde(default)]
  pub prefix: String,
  /// Highest sequence in use; a new manifest takes the next one.
  #[serde(default)]
  pub sequence: u32,
  /// Keyed by fence id.
  #[serde(default)]
  pub fences: BTreeMap<String, KnownFence>,
  /// Keyed by UPS id.
  #[serde(default)]
  pub upses: BTreeMap<String, KnownUps>,
}

/// A stored manifest. Hosts and networks use the wire shapes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestRecord {
  #[serde(default)]
  pub domain: String,
  #[serde(default)]
  pub prefix: String,
  #[serde(default)]
  pub sequence: u32,
  #[serde(default)]
  pub host_config: HostConfig,
  #[serde(default)]
  pub network_config: NetworkConfig,
}

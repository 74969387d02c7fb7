//! The editable in-memory manifest.
//!
//! A [`ManifestDraft`] is what the form layer edits between opening the
//! manifest dialog and submitting it. It is shaped for editing, not for the
//! wire: networks are keyed by an ephemeral [`NetworkRefId`] so list rows keep
//! a stable identity while the user changes a network's type or number, and
//! hosts are keyed by their position in the cluster.
//!
//! # Invariants
//!
//! - Every host's `networks` map has exactly the keys of
//!   `network_config.networks`. Only [`crate::slots`] adds or removes network
//!   keys, and it updates both sides together.
//! - No two network definitions share a composite key (`bcn1`, `ifn2`, ...).
//!   This is enforced by [`crate::rules`], not by the transforms.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Position of a host within the cluster (1, 2, ...).
pub type HostSequence = u32;

/// Network role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
  /// Back-channel network.
  Bcn,
  /// Internet-facing network.
  Ifn,
  /// Management network.
  Mn,
  /// Storage network.
  Sn,
}

impl NetworkType {
  pub fn as_str(self) -> &'static str {
    match self {
      NetworkType::Bcn => "bcn",
      NetworkType::Ifn => "ifn",
      NetworkType::Mn => "mn",
      NetworkType::Sn => "sn",
    }
  }
}

impl fmt::Display for NetworkType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for NetworkType {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "bcn" => Ok(NetworkType::Bcn),
      "ifn" => Ok(NetworkType::Ifn),
      "mn" => Ok(NetworkType::Mn),
      "sn" => Ok(NetworkType::Sn),
      other => Err(format!("unknown network type '{}'", other)),
    }
  }
}

/// Row identity of a network definition within one draft.
///
/// Never sent over the wire; the composite key is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkRefId(pub u64);

impl fmt::Display for NetworkRefId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl FromStr for NetworkRefId {
  type Err = std::num::ParseIntError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    s.parse().map(NetworkRefId)
  }
}

/// Builds the composite key that identifies a network outside of a draft.
pub fn composite_key(network_type: NetworkType, number: u32) -> String {
  format!("{}{}", network_type, number)
}

/// Splits a composite key back into its type and number, e.g. `ifn12`.
pub fn parse_composite_key(key: &str) -> Option<(NetworkType, u32)> {
  let split = key.find(|c: char| c.is_ascii_digit())?;
  let network_type = key[..split].parse().ok()?;
  let number = key[split..].parse().ok()?;
  Some((network_type, number))
}

/// Zero-pads to at least two digits.
pub fn pad2(n: u32) -> String {
  format!("{:02}", n)
}

/// Parses the trailing digits of a name, e.g. `an-a01n02` -> 2, `node1` -> 1.
pub fn trailing_number(name: &str) -> Option<u32> {
  let digits_start = name
    .char_indices()
    .rev()
    .take_while(|(_, c)| c.is_ascii_digit())
    .last()
    .map(|(i, _)| i)?;
  name[digits_start..].parse().ok()
}

/// The installation identity of a manifest, e.g. `an-anvil-01`.
pub fn manifest_name(prefix: &str, sequence: u32) -> String {
  format!("{}-anvil-{}", prefix, pad2(sequence))
}

/// A network definition as edited in the draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDef {
  #[serde(rename = "type")]
  pub network_type: NetworkType,
  pub number: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub gateway: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub min_ip: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub subnet_mask: Option<String>,
}

impl NetworkDef {
  /// A definition with every address field empty.
  pub fn new(network_type: NetworkType, number: u32) -> Self {
    Self {
      network_type,
      number,
      gateway: None,
      min_ip: None,
      subnet_mask: None,
    }
  }

  pub fn composite_key(&self) -> String {
    composite_key(self.network_type, self.number)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FenceSlot {
  pub port: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSlot {
  pub ip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsSlot {
  pub is_power_source: bool,
}

/// Per-host assignments: fence ports, network addresses and UPS usage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostDraft {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ipmi_ip: Option<String>,
  /// Keyed by fence device id.
  #[serde(default)]
  pub fences: BTreeMap<String, FenceSlot>,
  #[serde(default)]
  pub networks: BTreeMap<NetworkRefId, NetworkSlot>,
  /// Keyed by UPS id.
  #[serde(default)]
  pub upses: BTreeMap<String, UpsSlot>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfigDraft {
  /// Comma-separated DNS server addresses.
  #[serde(default)]
  pub dns: String,
  /// Comma-separated NTP servers.
  #[serde(default)]
  pub ntp: String,
  #[serde(default)]
  pub networks: BTreeMap<NetworkRefId, NetworkDef>,
}

/// Root of the editable manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestDraft {
  #[serde(default)]
  pub domain: String,
  #[serde(default)]
  pub prefix: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sequence: Option<u32>,
  #[serde(default)]
  pub network_config: NetworkConfigDraft,
  #[serde(default)]
  pub hosts: BTreeMap<HostSequence, HostDraft>,
  /// Next value handed out by [`ManifestDraft::allocate_network_id`].
  #[serde(default)]
  pub next_network_id: u64,
}

impl ManifestDraft {
  /// Hands out a network id that is unused in this draft.
  pub fn allocate_network_id(&mut self) -> NetworkRefId {
    let floor = self
      .network_config
      .networks
      .keys()
      .map(|id| id.0 + 1)
      .max()
      .unwrap_or(0);
    let id = NetworkRefId(self.next_network_id.max(floor));
    self.next_network_id = id.0 + 1;
    id
  }

  /// The installation identity, if a sequence has been entered.
  pub fn manifest_name(&self) -> Option<String> {
    self.sequence.map(|sequence| manifest_name(&self.prefix, sequence))
  }

  /// Finds the network definition with the given composite key.
  pub fn network_by_key(&self, key: &str) -> Option<(NetworkRefId, &NetworkDef)> {
    self
      .network_config
      .networks
      .iter()
      .find(|(_, def)| def.composite_key() == key)
      .map(|(id, def)| (*id, def))
  }

  /// Checks the host/network key invariant.
  pub fn slots_in_sync(&self) -> bool {
    let expected: BTreeSet<&NetworkRefId> = self.network_config.networks.keys().collect();
    self
      .hosts
      .values()
      .all(|host| host.networks.keys().collect::<BTreeSet<_>>() == expected)
  }
}

/// Dotted field paths, as reported to [`TouchedFields`].
pub mod path {
  use super::{HostSequence, NetworkRefId};

  pub fn network_field(id: NetworkRefId, field: &str) -> String {
    format!("networkConfig.networks.{}.{}", id, field)
  }

  pub fn network_min_ip(id: NetworkRefId) -> String {
    network_field(id, "minIp")
  }

  pub fn network_subnet_mask(id: NetworkRefId) -> String {
    network_field(id, "subnetMask")
  }

  pub fn network_gateway(id: NetworkRefId) -> String {
    network_field(id, "gateway")
  }

  pub fn host_network_ip(sequence: HostSequence, id: NetworkRefId) -> String {
    format!("hosts.{}.networks.{}.ip", sequence, id)
  }
}

/// Reports whether the user has explicitly set a field.
///
/// The form layer owns this knowledge; inference consults it before every
/// write.
pub trait TouchedFields {
  fn is_touched(&self, path: &str) -> bool;
}

impl<F> TouchedFields for F
where
  F: Fn(&str) -> bool,
{
  fn is_touched(&self, path: &str) -> bool {
    self(path)
  }
}

impl TouchedFields for BTreeSet<String> {
  fn is_touched(&self, path: &str) -> bool {
    self.contains(path)
  }
}

/// Nothing has been touched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Untouched;

impl TouchedFields for Untouched {
  fn is_touched(&self, _path: &str) -> bool {
    false
  }
}

//! Manifest wire format.
//!
//! These types mirror the JSON body the provisioning service accepts on
//! `POST /manifest` and `PUT /manifest/:id`, and the shape it returns for a
//! stored manifest. Field names and nesting must match the service exactly.
//!
//! # Example
//!
//! ```json
//! {
//!   "domain": "example.com",
//!   "hostConfig": {
//!     "hosts": {
//!       "node1": {
//!         "fences": { "pdu1": { "fenceName": "pdu1", "fencePort": "3" } },
//!         "hostNumber": 1,
//!         "hostType": "node",
//!         "ipmiIp": "10.201.13.1",
//!         "networks": {
//!           "bcn1": { "networkIp": "10.201.10.1", "networkNumber": 1, "networkType": "bcn" }
//!         },
//!         "upses": { "ups1": { "isUsed": true, "upsName": "ups1" } }
//!       }
//!     }
//!   },
//!   "networkConfig": {
//!     "dnsCsv": "8.8.8.8",
//!     "networks": {
//!       "bcn1": {
//!         "networkGateway": "",
//!         "networkMinIp": "10.201.0.0",
//!         "networkNumber": 1,
//!         "networkSubnetMask": "255.255.0.0",
//!         "networkType": "bcn"
//!       }
//!     },
//!     "ntpCsv": ""
//!   },
//!   "prefix": "an",
//!   "sequence": 1
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::draft::NetworkType;

/// Host type every manifest host carries at this layer.
pub const HOST_TYPE_NODE: &str = "node";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestRequestBody {
  #[serde(default)]
  pub domain: String,
  #[serde(default)]
  pub host_config: HostConfig,
  #[serde(default)]
  pub network_config: NetworkConfig,
  #[serde(default)]
  pub prefix: String,
  #[serde(default)]
  pub sequence: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
  /// Keyed by `<hostType><hostNumber>`, e.g. `node1`.
  #[serde(default)]
  pub hosts: BTreeMap<String, HostEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostEntry {
  /// Keyed by fence name.
  #[serde(default)]
  pub fences: BTreeMap<String, FenceEntry>,
  #[serde(default)]
  pub host_number: u32,
  #[serde(default)]
  pub host_type: String,
  #[serde(default)]
  pub ipmi_ip: String,
  /// Keyed by composite network key.
  #[serde(default)]
  pub networks: BTreeMap<String, HostNetworkEntry>,
  /// Keyed by UPS name.
  #[serde(default)]
  pub upses: BTreeMap<String, UpsEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FenceEntry {
  #[serde(default)]
  pub fence_name: String,
  #[serde(default)]
  pub fence_port: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostNetworkEntry {
  #[serde(default)]
  pub network_ip: String,
  #[serde(default)]
  pub network_number: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub network_type: Option<NetworkType>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsEntry {
  #[serde(default)]
  pub is_used: bool,
  #[serde(default)]
  pub ups_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
  #[serde(default)]
  pub dns_csv: String,
  /// Keyed by composite network key.
  #[serde(default)]
  pub networks: BTreeMap<String, NetworkEntry>,
  #[serde(default)]
  pub ntp_csv: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkEntry {
  #[serde(default)]
  pub network_gateway: String,
  #[serde(default)]
  pub network_min_ip: String,
  #[serde(default)]
  pub network_number: u32,
  #[serde(default)]
  pub network_subnet_mask: String,
  /// Always present in request bodies. Stored manifests may leave it out, in
  /// which case the composite key it is filed under supplies it.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub network_type: Option<NetworkType>,
}

//! Converting between drafts and the manifest wire format.
//!
//! [`build_initial_draft`] produces the draft a manifest dialog starts from,
//! either a fresh one seeded from the template or one rebuilt from a stored
//! manifest. [`build_request_body`] turns a draft back into the body the
//! provisioning service accepts.
//!
//! Neither function fails. Missing values become empty strings or zero, and
//! checking that the result makes sense is left to [`crate::rules`].

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::config::SynthesizerConfig;
use crate::draft::{
  FenceSlot, HostDraft, HostSequence, ManifestDraft, NetworkConfigDraft, NetworkDef, NetworkRefId, NetworkSlot,
  UpsSlot, parse_composite_key, trailing_number,
};
use crate::inputs::{HostDirectory, ManifestRecord, ManifestTemplate};
use crate::wire::{
  FenceEntry, HOST_TYPE_NODE, HostEntry, HostNetworkEntry, ManifestRequestBody, NetworkConfig, NetworkEntry, UpsEntry,
};

/// Builds the starting draft for a manifest dialog with default settings.
///
/// See [`build_initial_draft_with`].
pub fn build_initial_draft(
  template: &ManifestTemplate,
  known_hosts: &HostDirectory,
  existing: Option<&ManifestRecord>,
) -> ManifestDraft {
  build_initial_draft_with(template, known_hosts, existing, &SynthesizerConfig::default())
}

/// Builds the starting draft for a manifest dialog.
///
/// Without `existing`, the draft takes the template's domain and prefix and
/// the sequence after the template's, and gets the configured bootstrap
/// networks and host slots with every address field empty. The directory is
/// not consulted here; filling addresses from it is left to
/// [`guess_manifest_networks`](crate::guess::guess_manifest_networks).
///
/// With `existing`, the draft mirrors the stored manifest. Networks get fresh
/// ids. Host fence and UPS slots follow the template's current device lists:
/// devices the stored manifest doesn't mention start empty, and devices the
/// template no longer knows are dropped.
pub fn build_initial_draft_with(
  template: &ManifestTemplate,
  _known_hosts: &HostDirectory,
  existing: Option<&ManifestRecord>,
  config: &SynthesizerConfig,
) -> ManifestDraft {
  match existing {
    Some(record) => draft_from_record(template, record),
    None => new_draft(template, config),
  }
}

fn new_draft(template: &ManifestTemplate, config: &SynthesizerConfig) -> ManifestDraft {
  let mut draft = ManifestDraft {
    domain: template.domain.clone(),
    prefix: template.prefix.clone(),
    sequence: Some(template.sequence.saturating_add(1)),
    ..Default::default()
  };

  for network in &config.bootstrap_networks {
    let id = draft.allocate_network_id();
    draft
      .network_config
      .networks
      .insert(id, NetworkDef::new(network.network_type, network.number));
  }

  for sequence in 1..=config.host_count {
    let mut host = HostDraft {
      fences: template
        .fences
        .keys()
        .map(|id| (id.clone(), FenceSlot::default()))
        .collect(),
      upses: template
        .upses
        .keys()
        .map(|id| (id.clone(), UpsSlot::default()))
        .collect(),
      ..Default::default()
    };
    for id in draft.network_config.networks.keys() {
      host.networks.insert(*id, NetworkSlot::default());
    }
    draft.hosts.insert(sequence, host);
  }

  info!(
    prefix = %draft.prefix,
    sequence = template.sequence.saturating_add(1),
    networks = draft.network_config.networks.len(),
    hosts = draft.hosts.len(),
    "created new manifest draft"
  );
  draft
}

fn non_empty(value: &str) -> Option<String> {
  if value.is_empty() {
    None
  } else {
    Some(value.to_string())
  }
}

fn draft_from_record(template: &ManifestTemplate, record: &ManifestRecord) -> ManifestDraft {
  let mut draft = ManifestDraft {
    domain: record.domain.clone(),
    prefix: record.prefix.clone(),
    sequence: Some(record.sequence),
    network_config: NetworkConfigDraft {
      dns: record.network_config.dns_csv.clone(),
      ntp: record.network_config.ntp_csv.clone(),
      networks: BTreeMap::new(),
    },
    ..Default::default()
  };

  for (key, entry) in &record.network_config.networks {
    let from_key = parse_composite_key(key);
    let Some(network_type) = entry.network_type.or(from_key.map(|(network_type, _)| network_type)) else {
      warn!(key = %key, "stored network has no usable type, skipping");
      continue;
    };
    let number = match (entry.network_number, from_key) {
      (0, Some((_, number))) => number,
      (number, _) => number,
    };

    let id = draft.allocate_network_id();
    let def = NetworkDef {
      network_type,
      number,
      gateway: non_empty(&entry.network_gateway),
      min_ip: non_empty(&entry.network_min_ip),
      subnet_mask: non_empty(&entry.network_subnet_mask),
    };
    if def.composite_key() != *key {
      warn!(key = %key, derived = %def.composite_key(), "stored network key disagrees with its type and number");
    }
    draft.network_config.networks.insert(id, def);
  }

  let network_keys: Vec<(NetworkRefId, String)> = draft
    .network_config
    .networks
    .iter()
    .map(|(id, def)| (*id, def.composite_key()))
    .collect();

  for (host_key, entry) in &record.host_config.hosts {
    let Some(sequence) = host_sequence(host_key, entry) else {
      warn!(host = %host_key, "stored host has no usable number, skipping");
      continue;
    };

    let host = HostDraft {
      ipmi_ip: non_empty(&entry.ipmi_ip),
      fences: template
        .fences
        .iter()
        .map(|(id, known)| {
          let port = entry
            .fences
            .get(&known.fence_name)
            .map(|fence| fence.fence_port.clone())
            .unwrap_or_default();
          (id.clone(), FenceSlot { port })
        })
        .collect(),
      networks: network_keys
        .iter()
        .map(|(id, key)| {
          let ip = entry
            .networks
            .get(key)
            .map(|network| network.network_ip.clone())
            .unwrap_or_default();
          (*id, NetworkSlot { ip })
        })
        .collect(),
      upses: template
        .upses
        .iter()
        .map(|(id, known)| {
          let is_power_source = entry.upses.get(&known.ups_name).is_some_and(|ups| ups.is_used);
          (id.clone(), UpsSlot { is_power_source })
        })
        .collect(),
    };
    draft.hosts.insert(sequence, host);
  }

  info!(
    prefix = %draft.prefix,
    sequence = record.sequence,
    networks = draft.network_config.networks.len(),
    hosts = draft.hosts.len(),
    "rebuilt manifest draft from stored manifest"
  );
  draft
}

fn host_sequence(key: &str, entry: &HostEntry) -> Option<HostSequence> {
  if entry.host_number > 0 {
    Some(entry.host_number)
  } else {
    trailing_number(key)
  }
}

/// Builds the request body for submitting `draft`.
///
/// Hosts are keyed `node<sequence>`, fences and UPSes by their template
/// names, networks by composite key. Device ids the template doesn't know
/// are left out since they have no name to key by.
pub fn build_request_body(template: &ManifestTemplate, draft: &ManifestDraft) -> ManifestRequestBody {
  let networks = &draft.network_config.networks;

  let mut body = ManifestRequestBody {
    domain: draft.domain.clone(),
    prefix: draft.prefix.clone(),
    sequence: draft.sequence.unwrap_or(0),
    network_config: NetworkConfig {
      dns_csv: draft.network_config.dns.clone(),
      ntp_csv: draft.network_config.ntp.clone(),
      networks: networks
        .values()
        .map(|def| {
          (
            def.composite_key(),
            NetworkEntry {
              network_gateway: def.gateway.clone().unwrap_or_default(),
              network_min_ip: def.min_ip.clone().unwrap_or_default(),
              network_number: def.number,
              network_subnet_mask: def.subnet_mask.clone().unwrap_or_default(),
              network_type: Some(def.network_type),
            },
          )
        })
        .collect(),
    },
    ..Default::default()
  };

  for (sequence, host) in &draft.hosts {
    let mut entry = HostEntry {
      host_number: *sequence,
      host_type: HOST_TYPE_NODE.to_string(),
      ipmi_ip: host.ipmi_ip.clone().unwrap_or_default(),
      ..Default::default()
    };

    for (id, slot) in &host.fences {
      match template.fences.get(id) {
        Some(known) => {
          entry.fences.insert(
            known.fence_name.clone(),
            FenceEntry {
              fence_name: known.fence_name.clone(),
              fence_port: slot.port.clone(),
            },
          );
        }
        None => debug!(host = sequence, fence = %id, "fence not in template, omitting"),
      }
    }

    for (id, slot) in &host.networks {
      if let Some(def) = networks.get(id) {
        entry.networks.insert(
          def.composite_key(),
          HostNetworkEntry {
            network_ip: slot.ip.clone(),
            network_number: def.number,
            network_type: Some(def.network_type),
          },
        );
      }
    }

    for (id, slot) in &host.upses {
      match template.upses.get(id) {
        Some(known) => {
          entry.upses.insert(
            known.ups_name.clone(),
            UpsEntry {
              is_used: slot.is_power_source,
              ups_name: known.ups_name.clone(),
            },
          );
        }
        None => debug!(host = sequence, ups = %id, "UPS not in template, omitting"),
      }
    }

    body
      .host_config
      .hosts
      .insert(format!("{}{}", HOST_TYPE_NODE, sequence), entry);
  }

  info!(
    hosts = body.host_config.hosts.len(),
    networks = body.network_config.networks.len(),
    "built manifest request body"
  );
  body
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use super::*;
  use crate::config::BootstrapNetwork;
  use crate::draft::{NetworkType, Untouched};
  use crate::guess::guess_manifest_networks;
  use crate::inputs::{HostNetconf, HostNetwork, KnownFence, KnownHost, KnownUps};
  use crate::slots::{add_network, delete_network};

  fn template() -> ManifestTemplate {
    ManifestTemplate {
      domain: "example.com".to_string(),
      prefix: "an".to_string(),
      sequence: 0,
      fences: [
        ("f-1".to_string(), KnownFence { fence_name: "pdu1".to_string() }),
        ("f-2".to_string(), KnownFence { fence_name: "pdu2".to_string() }),
      ]
      .into_iter()
      .collect(),
      upses: [("u-1".to_string(), KnownUps { ups_name: "ups1".to_string() })]
        .into_iter()
        .collect(),
    }
  }

  fn record() -> ManifestRecord {
    serde_json::from_str(
      r#"{
        "domain": "example.com",
        "prefix": "an",
        "sequence": 4,
        "hostConfig": {
          "hosts": {
            "node1": {
              "hostNumber": 1,
              "hostType": "node",
              "ipmiIp": "10.201.13.1",
              "fences": {
                "pdu1": { "fenceName": "pdu1", "fencePort": "3" },
                "retired": { "fenceName": "retired", "fencePort": "9" }
              },
              "networks": {
                "bcn1": { "networkIp": "10.201.10.1", "networkNumber": 1, "networkType": "bcn" },
                "mn1": { "networkIp": "10.199.10.1", "networkNumber": 1, "networkType": "mn" }
              },
              "upses": { "ups1": { "isUsed": true, "upsName": "ups1" } }
            },
            "node2": {
              "networks": {
                "bcn1": { "networkIp": "10.201.10.2", "networkNumber": 1, "networkType": "bcn" }
              }
            }
          }
        },
        "networkConfig": {
          "dnsCsv": "8.8.8.8,8.8.4.4",
          "ntpCsv": "",
          "networks": {
            "bcn1": {
              "networkGateway": "",
              "networkMinIp": "10.201.0.0",
              "networkNumber": 1,
              "networkSubnetMask": "255.255.0.0",
              "networkType": "bcn"
            },
            "mn1": {
              "networkGateway": "10.199.255.254",
              "networkMinIp": "10.199.0.0",
              "networkNumber": 1,
              "networkSubnetMask": "255.255.0.0",
              "networkType": "mn"
            }
          }
        }
      }"#,
    )
    .unwrap()
  }

  fn keys<V>(map: &BTreeMap<String, V>) -> BTreeSet<&str> {
    map.keys().map(String::as_str).collect()
  }

  #[test]
  fn create_path_seeds_bootstrap_networks_and_two_hosts() {
    let template = template();
    let draft = build_initial_draft(&template, &HostDirectory::new(), None);

    assert_eq!(draft.domain, "example.com");
    assert_eq!(draft.prefix, "an");
    assert_eq!(draft.sequence, Some(1));

    let network_keys: Vec<String> = draft.network_config.networks.values().map(NetworkDef::composite_key).collect();
    assert_eq!(network_keys, vec!["bcn1", "ifn1", "sn1"]);
    assert!(
      draft
        .network_config
        .networks
        .values()
        .all(|def| def.min_ip.is_none() && def.subnet_mask.is_none() && def.gateway.is_none())
    );

    assert_eq!(draft.hosts.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
    for host in draft.hosts.values() {
      assert_eq!(host.ipmi_ip, None);
      assert_eq!(keys(&host.fences), BTreeSet::from(["f-1", "f-2"]));
      assert!(host.fences.values().all(|f| f.port.is_empty()));
      assert_eq!(keys(&host.upses), BTreeSet::from(["u-1"]));
      assert!(host.upses.values().all(|u| !u.is_power_source));
      assert!(host.networks.values().all(|n| n.ip.is_empty()));
    }
    assert!(draft.slots_in_sync());
  }

  #[test]
  fn create_then_build_has_two_hosts_and_three_networks() {
    let template = template();
    let body = build_request_body(&template, &build_initial_draft(&template, &HostDirectory::new(), None));

    assert_eq!(keys(&body.host_config.hosts), BTreeSet::from(["node1", "node2"]));
    assert_eq!(keys(&body.network_config.networks), BTreeSet::from(["bcn1", "ifn1", "sn1"]));
    for host in body.host_config.hosts.values() {
      assert_eq!(host.host_type, "node");
      assert_eq!(keys(&host.fences), BTreeSet::from(["pdu1", "pdu2"]));
      assert_eq!(keys(&host.upses), BTreeSet::from(["ups1"]));
      assert_eq!(keys(&host.networks), BTreeSet::from(["bcn1", "ifn1", "sn1"]));
    }
    assert_eq!(body.sequence, 1);
  }

  #[test]
  fn create_path_leaves_addresses_empty() {
    let mut directory = HostDirectory::new();
    directory.insert(
      "h1".to_string(),
      KnownHost {
        name: "an-a01n01.example.com".to_string(),
        short: "an-a01n01".to_string(),
        netconf: HostNetconf {
          networks: [(
            "bcn1".to_string(),
            HostNetwork {
              ip: "10.201.10.1".to_string(),
              subnet_mask: "255.255.0.0".to_string(),
            },
          )]
          .into_iter()
          .collect(),
          ..Default::default()
        },
      },
    );

    let draft = build_initial_draft(&template(), &directory, None);
    for def in draft.network_config.networks.values() {
      assert_eq!(def.min_ip, None);
      assert_eq!(def.subnet_mask, None);
      assert_eq!(def.gateway, None);
    }
    for host in draft.hosts.values() {
      assert!(host.networks.values().all(|slot| slot.ip.is_empty()));
    }

    // inference is a separate step
    let guessed = guess_manifest_networks(&draft, &directory, &Untouched);
    let (bcn, def) = guessed.network_by_key("bcn1").unwrap();
    assert_eq!(def.min_ip.as_deref(), Some("10.201.0.0"));
    assert_eq!(guessed.hosts[&1].networks[&bcn].ip, "10.201.10.1");
  }

  #[test]
  fn create_path_saturates_sequence() {
    let template = ManifestTemplate {
      sequence: u32::MAX,
      ..template()
    };
    let draft = build_initial_draft(&template, &HostDirectory::new(), None);
    assert_eq!(draft.sequence, Some(u32::MAX));
  }

  #[test]
  fn create_path_follows_config() {
    let config = SynthesizerConfig {
      host_count: 3,
      bootstrap_networks: vec![BootstrapNetwork {
        network_type: NetworkType::Bcn,
        number: 1,
      }],
      ..Default::default()
    };

    let draft = build_initial_draft_with(&template(), &HostDirectory::new(), None, &config);
    assert_eq!(draft.hosts.len(), 3);
    assert_eq!(draft.network_config.networks.len(), 1);
    assert!(draft.slots_in_sync());
  }

  #[test]
  fn edit_path_mirrors_record() {
    let draft = build_initial_draft(&template(), &HostDirectory::new(), Some(&record()));

    assert_eq!(draft.sequence, Some(4));
    assert_eq!(draft.network_config.dns, "8.8.8.8,8.8.4.4");
    assert_eq!(draft.network_config.networks.len(), 2);

    let (mn, mn_def) = draft.network_by_key("mn1").unwrap();
    assert_eq!(mn_def.gateway.as_deref(), Some("10.199.255.254"));
    let (bcn, bcn_def) = draft.network_by_key("bcn1").unwrap();
    assert_eq!(bcn_def.gateway, None);

    let node1 = &draft.hosts[&1];
    assert_eq!(node1.ipmi_ip.as_deref(), Some("10.201.13.1"));
    assert_eq!(node1.networks[&mn].ip, "10.199.10.1");
    assert_eq!(node1.networks[&bcn].ip, "10.201.10.1");

    // node2 has no hostNumber; its key supplies it
    let node2 = &draft.hosts[&2];
    assert_eq!(node2.networks[&mn].ip, "");
    assert_eq!(node2.ipmi_ip, None);
    assert!(draft.slots_in_sync());
  }

  #[test]
  fn edit_path_cross_references_template_devices() {
    let draft = build_initial_draft(&template(), &HostDirectory::new(), Some(&record()));
    let node1 = &draft.hosts[&1];

    // pdu1 keeps its port, pdu2 is new and empty, "retired" is gone
    assert_eq!(keys(&node1.fences), BTreeSet::from(["f-1", "f-2"]));
    assert_eq!(node1.fences["f-1"].port, "3");
    assert_eq!(node1.fences["f-2"].port, "");
    assert!(node1.upses["u-1"].is_power_source);

    assert!(!draft.hosts[&2].upses["u-1"].is_power_source);
  }

  #[test]
  fn edit_path_ignores_directory() {
    let mut directory = HostDirectory::new();
    directory.insert(
      "h1".to_string(),
      KnownHost {
        name: "an-a04n01.example.com".to_string(),
        short: "an-a04n01".to_string(),
        netconf: HostNetconf {
          networks: [(
            "bcn1".to_string(),
            HostNetwork {
              ip: "10.222.10.1".to_string(),
              subnet_mask: "255.255.0.0".to_string(),
            },
          )]
          .into_iter()
          .collect(),
          ..Default::default()
        },
      },
    );

    let draft = build_initial_draft(&template(), &directory, Some(&record()));
    let (bcn, _) = draft.network_by_key("bcn1").unwrap();
    assert_eq!(draft.hosts[&1].networks[&bcn].ip, "10.201.10.1");
  }

  #[test]
  fn edit_round_trip_keeps_composite_keys() {
    let template = template();
    let record = record();
    let draft = build_initial_draft(&template, &HostDirectory::new(), Some(&record));
    let body = build_request_body(&template, &draft);

    let record_keys = keys(&record.network_config.networks);
    assert_eq!(keys(&body.network_config.networks), record_keys);
    for host in body.host_config.hosts.values() {
      assert_eq!(keys(&host.networks), record_keys);
    }
    assert_eq!(body.network_config.networks, record.network_config.networks);
    assert_eq!(body.host_config.hosts["node1"].networks, record.host_config.hosts["node1"].networks);
    assert_eq!(body.host_config.hosts["node1"].fences["pdu1"].fence_port, "3");
  }

  #[test]
  fn edit_path_takes_missing_network_type_from_key() {
    let record: ManifestRecord = serde_json::from_str(
      r#"{
        "domain": "example.com",
        "prefix": "an",
        "sequence": 2,
        "hostConfig": {
          "hosts": {
            "node1": { "hostNumber": 1, "networks": { "ifn2": { "networkIp": "10.255.10.1" } } }
          }
        },
        "networkConfig": {
          "networks": {
            "ifn2": { "networkMinIp": "10.255.0.0", "networkSubnetMask": "255.255.0.0" },
            "bogus": { "networkMinIp": "10.9.0.0" }
          }
        }
      }"#,
    )
    .unwrap();

    let draft = build_initial_draft(&template(), &HostDirectory::new(), Some(&record));
    assert_eq!(draft.network_config.networks.len(), 1);
    let (ifn, def) = draft.network_by_key("ifn2").unwrap();
    assert_eq!(def.network_type, NetworkType::Ifn);
    assert_eq!(def.number, 2);
    assert_eq!(draft.hosts[&1].networks[&ifn].ip, "10.255.10.1");

    let body = build_request_body(&template(), &draft);
    assert_eq!(body.network_config.networks["ifn2"].network_type, Some(NetworkType::Ifn));
    assert_eq!(body.network_config.networks["ifn2"].network_number, 2);
  }

  #[test]
  fn sparse_draft_builds_with_defaults() {
    let mut draft = ManifestDraft::default();
    draft.hosts.insert(1, HostDraft::default());
    let id = add_network(&mut draft);

    let body = build_request_body(&template(), &draft);

    assert_eq!(body.sequence, 0);
    assert_eq!(body.domain, "");
    let node1 = &body.host_config.hosts["node1"];
    assert_eq!(node1.host_number, 1);
    assert_eq!(node1.ipmi_ip, "");
    assert!(node1.fences.is_empty());
    assert_eq!(node1.networks["mn1"].network_ip, "");
    assert_eq!(body.network_config.networks["mn1"].network_gateway, "");

    delete_network(&mut draft, id);
    let body = build_request_body(&template(), &draft);
    assert!(body.network_config.networks.is_empty());
    assert!(body.host_config.hosts["node1"].networks.is_empty());
  }

  #[test]
  fn unknown_devices_are_omitted() {
    let mut draft = ManifestDraft::default();
    let mut host = HostDraft::default();
    host.fences.insert("f-gone".to_string(), FenceSlot { port: "1".to_string() });
    host.fences.insert("f-1".to_string(), FenceSlot { port: "2".to_string() });
    host.upses.insert("u-gone".to_string(), UpsSlot { is_power_source: true });
    draft.hosts.insert(1, host);

    let body = build_request_body(&template(), &draft);
    let node1 = &body.host_config.hosts["node1"];
    assert_eq!(keys(&node1.fences), BTreeSet::from(["pdu1"]));
    assert!(node1.upses.is_empty());
  }
}

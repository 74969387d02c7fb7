//! Advisory checks on a built request body.
//!
//! Nothing here blocks submission. The messages are shown next to the
//! pre-submit summary so the operator can decide whether to go ahead, e.g.
//! leaving hosts unfenced in a test environment.

use std::collections::BTreeMap;

use tracing::debug;

use crate::subnet::{contains, is_ipv4};
use crate::wire::{HOST_TYPE_NODE, HostEntry, ManifestRequestBody};

/// Per-host fence port counts and the warnings derived from them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FenceCoverage {
  /// Fences with a port assigned, keyed like `hostConfig.hosts`.
  pub counts: BTreeMap<String, usize>,
  /// One message per host with no fence port at all.
  pub messages: Vec<String>,
}

impl FenceCoverage {
  pub fn is_complete(&self) -> bool {
    self.messages.is_empty()
  }
}

/// Display label of a host, e.g. `subnode1` for `node` number 1.
pub fn host_label(host: &HostEntry) -> String {
  format!("{}{}", host.host_type.replace(HOST_TYPE_NODE, "subnode"), host.host_number)
}

/// Counts assigned fence ports per host and warns about hosts with none.
pub fn count_host_fences(body: &ManifestRequestBody) -> FenceCoverage {
  let mut coverage = FenceCoverage::default();

  for (key, host) in &body.host_config.hosts {
    let count = host.fences.values().filter(|fence| !fence.fence_port.is_empty()).count();
    debug!(host = %key, count, "fence ports assigned");

    if count == 0 {
      coverage
        .messages
        .push(format!("No fence device port specified for {}", host_label(host)));
    }
    coverage.counts.insert(key.clone(), count);
  }

  coverage
}

/// Warns about host addresses and gateways outside their network's block.
///
/// Networks whose block doesn't parse, and addresses that aren't IPv4, are
/// skipped; the structural rules report those.
pub fn check_network_addressing(body: &ManifestRequestBody) -> Vec<String> {
  let mut messages = Vec::new();

  for (key, network) in &body.network_config.networks {
    let min_ip = &network.network_min_ip;
    let mask = &network.network_subnet_mask;

    if is_ipv4(&network.network_gateway) && contains(min_ip, mask, &network.network_gateway) == Ok(false) {
      messages.push(format!(
        "Gateway {} of {} is outside {}/{}",
        network.network_gateway, key, min_ip, mask
      ));
    }

    for host in body.host_config.hosts.values() {
      let Some(slot) = host.networks.get(key) else {
        continue;
      };
      if !is_ipv4(&slot.network_ip) {
        continue;
      }
      if contains(min_ip, mask, &slot.network_ip) == Ok(false) {
        messages.push(format!(
          "{} address {} on {} is outside {}/{}",
          host_label(host),
          slot.network_ip,
          key,
          min_ip,
          mask
        ));
      }
    }
  }

  messages
}

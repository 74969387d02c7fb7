//! Backfilling network values from already-provisioned hosts.
//!
//! When hosts belonging to a manifest have been configured individually, the
//! addresses they ended up with are the best guess for the manifest's own
//! fields. [`guess_manifest_networks`] copies them in, but never over a field
//! the user has set: each write is guarded by [`TouchedFields::is_touched`]
//! on that field's path.
//!
//! # Matching
//!
//! A directory host belongs to the draft when its full name matches
//! `^<prefix>-a<NN>n<MM>\.<domain>$`, where `NN` is the draft's sequence
//! padded to two digits. The trailing digits of its short name pick the host
//! slot.

use regex::Regex;
use tracing::{debug, warn};

use crate::draft::{HostSequence, ManifestDraft, NetworkRefId, TouchedFields, pad2, path, trailing_number};
use crate::inputs::{HostDirectory, KnownHost};
use crate::subnet::base_address;

/// Returns a copy of `draft` with untouched network fields filled from
/// `known_hosts`.
///
/// Running it again with the same inputs gives the same draft.
pub fn guess_manifest_networks<T>(draft: &ManifestDraft, known_hosts: &HostDirectory, touched: &T) -> ManifestDraft
where
  T: TouchedFields + ?Sized,
{
  let mut guessed = draft.clone();

  let Some(pattern) = host_name_pattern(draft) else {
    return guessed;
  };

  let networks: Vec<(NetworkRefId, String)> = draft
    .network_config
    .networks
    .iter()
    .map(|(id, def)| (*id, def.composite_key()))
    .collect();

  for host in known_hosts.values().filter(|host| pattern.is_match(&host.name)) {
    let Some(sequence) = trailing_number(&host.short) else {
      debug!(host = %host.short, "no subnode sequence in short name");
      continue;
    };

    if !guessed.hosts.contains_key(&sequence) {
      debug!(host = %host.short, sequence, "no host slot for sequence");
      continue;
    }

    for (id, key) in &networks {
      apply_host_network(&mut guessed, host, sequence, *id, key, touched);
    }
  }

  guessed
}

fn apply_host_network<T>(
  draft: &mut ManifestDraft,
  host: &KnownHost,
  sequence: HostSequence,
  id: NetworkRefId,
  key: &str,
  touched: &T,
) where
  T: TouchedFields + ?Sized,
{
  let Some(configured) = host.netconf.networks.get(key) else {
    debug!(host = %host.short, network = key, "host not configured on network");
    return;
  };

  if let Some(def) = draft.network_config.networks.get_mut(&id) {
    if !touched.is_touched(&path::network_min_ip(id)) {
      match base_address(&configured.ip, &configured.subnet_mask) {
        Ok(base) => def.min_ip = Some(base.to_string()),
        Err(e) => warn!(host = %host.short, network = key, error = %e, "cannot derive network base address"),
      }
    }

    if !touched.is_touched(&path::network_subnet_mask(id)) {
      def.subnet_mask = Some(configured.subnet_mask.clone());
    }

    if host.netconf.gateway_interface == key && !touched.is_touched(&path::network_gateway(id)) {
      def.gateway = Some(host.netconf.gateway.clone());
    }
  }

  if touched.is_touched(&path::host_network_ip(sequence, id)) {
    return;
  }
  if let Some(slot) = draft
    .hosts
    .get_mut(&sequence)
    .and_then(|slot_host| slot_host.networks.get_mut(&id))
  {
    slot.ip = configured.ip.clone();
  }
}

/// Builds the full-name pattern for hosts of this draft's installation.
fn host_name_pattern(draft: &ManifestDraft) -> Option<Regex> {
  let Some(sequence) = draft.sequence else {
    debug!("draft has no sequence, nothing to match hosts against");
    return None;
  };

  let pattern = format!(
    r"^{}-a{}n\d{{2}}\.{}$",
    regex::escape(&draft.prefix),
    pad2(sequence),
    regex::escape(&draft.domain)
  );

  match Regex::new(&pattern) {
    Ok(regex) => Some(regex),
    Err(e) => {
      warn!(pattern = %pattern, error = %e, "invalid host name pattern");
      None
    }
  }
}

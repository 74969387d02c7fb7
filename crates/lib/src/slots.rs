//! Adding and removing networks.
//!
//! These are the only functions that change the key set of
//! `network_config.networks`, and each one applies the same change to every
//! host's `networks` map before returning.

use tracing::debug;

use crate::config::ManagementNetwork;
use crate::draft::{ManifestDraft, NetworkDef, NetworkRefId, NetworkSlot, NetworkType};

/// Adds a network using the default management block.
///
/// See [`add_network_with`].
pub fn add_network(draft: &mut ManifestDraft) -> NetworkRefId {
  add_network_with(draft, &ManagementNetwork::default())
}

/// Adds the next network a cluster usually needs.
///
/// The first call on a draft without a management network adds `mn1` with
/// the given address block. Afterwards each call adds the next internet-facing
/// network (`ifn<max + 1>`) with empty addresses. Every host gets an empty
/// slot for the new network.
pub fn add_network_with(draft: &mut ManifestDraft, management: &ManagementNetwork) -> NetworkRefId {
  let has_management = draft
    .network_config
    .networks
    .values()
    .any(|def| def.network_type == NetworkType::Mn);

  let def = if has_management {
    let number = draft
      .network_config
      .networks
      .values()
      .filter(|def| def.network_type == NetworkType::Ifn)
      .map(|def| def.number)
      .max()
      .unwrap_or(0)
      + 1;
    NetworkDef::new(NetworkType::Ifn, number)
  } else {
    NetworkDef {
      min_ip: Some(management.min_ip.clone()),
      subnet_mask: Some(management.subnet_mask.clone()),
      ..NetworkDef::new(NetworkType::Mn, 1)
    }
  };

  let id = draft.allocate_network_id();
  debug!(id = %id, key = %def.composite_key(), "adding network");

  draft.network_config.networks.insert(id, def);
  for host in draft.hosts.values_mut() {
    host.networks.insert(id, NetworkSlot::default());
  }

  id
}

/// Removes a network and every host's slot for it.
///
/// Returns false, leaving the draft untouched, if no such network exists.
pub fn delete_network(draft: &mut ManifestDraft, id: NetworkRefId) -> bool {
  let Some(def) = draft.network_config.networks.remove(&id) else {
    return false;
  };
  debug!(id = %id, key = %def.composite_key(), "removing network");

  for host in draft.hosts.values_mut() {
    host.networks.remove(&id);
  }

  true
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::draft::HostDraft;

  fn draft_with_hosts(count: u32) -> ManifestDraft {
    let mut draft = ManifestDraft::default();
    for sequence in 1..=count {
      draft.hosts.insert(sequence, HostDraft::default());
    }
    draft
  }

  fn insert(draft: &mut ManifestDraft, network_type: NetworkType, number: u32) -> NetworkRefId {
    let id = draft.allocate_network_id();
    draft
      .network_config
      .networks
      .insert(id, NetworkDef::new(network_type, number));
    for host in draft.hosts.values_mut() {
      host.networks.insert(id, NetworkSlot::default());
    }
    id
  }

  #[test]
  fn first_add_creates_management_network() {
    let mut draft = draft_with_hosts(2);
    insert(&mut draft, NetworkType::Bcn, 1);

    let id = add_network(&mut draft);

    let def = &draft.network_config.networks[&id];
    assert_eq!(def.network_type, NetworkType::Mn);
    assert_eq!(def.number, 1);
    assert_eq!(def.min_ip.as_deref(), Some("10.199.0.0"));
    assert_eq!(def.subnet_mask.as_deref(), Some("255.255.0.0"));
    assert_eq!(def.gateway, None);

    for host in draft.hosts.values() {
      assert_eq!(host.networks[&id], NetworkSlot::default());
    }
    assert!(draft.slots_in_sync());
  }

  #[test]
  fn later_adds_number_ifn_after_highest() {
    let mut draft = draft_with_hosts(2);
    insert(&mut draft, NetworkType::Mn, 1);
    insert(&mut draft, NetworkType::Ifn, 1);
    insert(&mut draft, NetworkType::Ifn, 2);

    let id = add_network(&mut draft);

    assert_eq!(draft.network_config.networks[&id], NetworkDef::new(NetworkType::Ifn, 3));
    assert!(draft.slots_in_sync());
  }

  #[test]
  fn ifn_numbering_uses_max_not_count() {
    let mut draft = draft_with_hosts(1);
    insert(&mut draft, NetworkType::Mn, 1);
    insert(&mut draft, NetworkType::Ifn, 4);

    let id = add_network(&mut draft);
    assert_eq!(draft.network_config.networks[&id].composite_key(), "ifn5");
  }

  #[test]
  fn add_without_ifn_starts_at_one() {
    let mut draft = draft_with_hosts(1);
    insert(&mut draft, NetworkType::Mn, 1);

    let id = add_network(&mut draft);
    assert_eq!(draft.network_config.networks[&id].composite_key(), "ifn1");
  }

  #[test]
  fn custom_management_block() {
    let mut draft = draft_with_hosts(1);
    let block = ManagementNetwork {
      min_ip: "10.50.0.0".to_string(),
      subnet_mask: "255.255.255.0".to_string(),
    };

    let id = add_network_with(&mut draft, &block);
    assert_eq!(draft.network_config.networks[&id].min_ip.as_deref(), Some("10.50.0.0"));
  }

  #[test]
  fn delete_removes_from_every_host_and_is_idempotent() {
    let mut draft = draft_with_hosts(3);
    let keep = insert(&mut draft, NetworkType::Bcn, 1);
    let gone = insert(&mut draft, NetworkType::Ifn, 1);

    assert!(delete_network(&mut draft, gone));
    assert!(!draft.network_config.networks.contains_key(&gone));
    for host in draft.hosts.values() {
      assert!(!host.networks.contains_key(&gone));
      assert!(host.networks.contains_key(&keep));
    }

    let before = draft.clone();
    assert!(!delete_network(&mut draft, gone));
    assert_eq!(draft, before);
  }

  #[test]
  fn invariant_holds_across_mixed_operations() {
    let mut draft = draft_with_hosts(2);
    let mut ids = Vec::new();
    for _ in 0..5 {
      ids.push(add_network(&mut draft));
      assert!(draft.slots_in_sync());
    }
    delete_network(&mut draft, ids[1]);
    assert!(draft.slots_in_sync());
    delete_network(&mut draft, ids[0]);
    assert!(draft.slots_in_sync());
    ids.push(add_network(&mut draft));
    assert!(draft.slots_in_sync());

    // ids are never reused within a draft
    let last = ids[ids.len() - 1];
    assert!(!ids[..ids.len() - 1].contains(&last));
  }
}

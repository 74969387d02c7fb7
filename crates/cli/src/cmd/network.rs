//! Network add/remove command implementation.

use std::path::Path;

use anyhow::{Context, Result};

use anvil_manifest_lib::config::SynthesizerConfig;
use anvil_manifest_lib::draft::{ManifestDraft, NetworkRefId};
use anvil_manifest_lib::slots::{add_network_with, delete_network};

use crate::files::{read_json, write_json};
use crate::output::{print_success, print_warning};

pub fn cmd_network_add(path: &Path, config: Option<&Path>) -> Result<()> {
  let config = SynthesizerConfig::resolve(config).context("Failed to load config")?;
  let mut draft: ManifestDraft = read_json(path, "draft")?;

  let id = add_network_with(&mut draft, &config.management_network);
  let key = draft
    .network_config
    .networks
    .get(&id)
    .map(|def| def.composite_key())
    .unwrap_or_default();

  write_json(Some(path), &draft, "draft")?;
  print_success(&format!("Added network {} (id {})", key, id));
  Ok(())
}

pub fn cmd_network_remove(path: &Path, id: NetworkRefId) -> Result<()> {
  let mut draft: ManifestDraft = read_json(path, "draft")?;

  if !delete_network(&mut draft, id) {
    print_warning(&format!("No network with id {}", id));
    return Ok(());
  }

  write_json(Some(path), &draft, "draft")?;
  print_success(&format!("Removed network {}", id));
  Ok(())
}

//! Draft command implementation.
//!
//! Builds the starting draft for a manifest dialog from the template and host
//! directory, plus the stored manifest when editing.

use std::path::Path;

use anyhow::{Context, Result};

use anvil_manifest_lib::config::SynthesizerConfig;
use anvil_manifest_lib::inputs::{HostDirectory, ManifestRecord, ManifestTemplate};
use anvil_manifest_lib::transcode::build_initial_draft_with;

use crate::files::{read_json, write_json};
use crate::output::{count_noun, print_success};

pub fn cmd_draft(
  template: &Path,
  hosts: &Path,
  record: Option<&Path>,
  output: Option<&Path>,
  config: Option<&Path>,
) -> Result<()> {
  let config = SynthesizerConfig::resolve(config).context("Failed to load config")?;
  let template: ManifestTemplate = read_json(template, "template")?;
  let known_hosts: HostDirectory = read_json(hosts, "host directory")?;
  let record: Option<ManifestRecord> = record.map(|path| read_json(path, "manifest record")).transpose()?;

  let draft = build_initial_draft_with(&template, &known_hosts, record.as_ref(), &config);

  write_json(output, &draft, "draft")?;

  if let Some(path) = output {
    print_success(&format!(
      "Wrote draft {} ({}, {}) to {}",
      draft.manifest_name().unwrap_or_default(),
      count_noun(draft.hosts.len(), "host"),
      count_noun(draft.network_config.networks.len(), "network"),
      path.display()
    ));
  }

  Ok(())
}

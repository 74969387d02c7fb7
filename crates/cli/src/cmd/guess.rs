//! Guess command implementation.
//!
//! Fills network fields the user hasn't set from hosts that are already
//! configured, then writes the draft back.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Result;

use anvil_manifest_lib::draft::ManifestDraft;
use anvil_manifest_lib::guess::guess_manifest_networks;
use anvil_manifest_lib::inputs::HostDirectory;

use crate::files::{read_json, write_json};
use crate::output::{print_info, print_success};

pub fn cmd_guess(path: &Path, hosts: &Path, touched: Vec<String>) -> Result<()> {
  let draft: ManifestDraft = read_json(path, "draft")?;
  let known_hosts: HostDirectory = read_json(hosts, "host directory")?;
  let touched: BTreeSet<String> = touched.into_iter().collect();

  let guessed = guess_manifest_networks(&draft, &known_hosts, &touched);

  if guessed == draft {
    print_info("Nothing to guess");
    return Ok(());
  }

  write_json(Some(path), &guessed, "draft")?;
  print_success(&format!("Updated {}", path.display()));
  Ok(())
}

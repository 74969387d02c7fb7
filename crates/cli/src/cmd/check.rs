//! Check command implementation.
//!
//! Runs the structural rules against a draft and prints the pre-submit
//! summary with fence coverage and addressing warnings. Only rule violations
//! make the command fail.

use std::path::Path;

use anyhow::{Result, bail};

use anvil_manifest_lib::draft::ManifestDraft;
use anvil_manifest_lib::fences::{check_network_addressing, count_host_fences, host_label};
use anvil_manifest_lib::inputs::ManifestTemplate;
use anvil_manifest_lib::rules::validate_draft;
use anvil_manifest_lib::transcode::build_request_body;

use crate::files::read_json;
use crate::output::{count_noun, print_error, print_info, print_json, print_stat, print_success, print_warning};

pub fn cmd_check(
  draft: &Path,
  template: &Path,
  existing: &[String],
  editing: Option<&str>,
  json: bool,
) -> Result<()> {
  let draft: ManifestDraft = read_json(draft, "draft")?;
  let template: ManifestTemplate = read_json(template, "template")?;

  let violations = validate_draft(&draft, existing, editing);
  let body = build_request_body(&template, &draft);
  let coverage = count_host_fences(&body);
  let addressing = check_network_addressing(&body);

  if json {
    let violation_list: Vec<_> = violations
      .iter()
      .map(|v| serde_json::json!({ "path": v.path, "message": v.rule.to_string() }))
      .collect();
    let json_output = serde_json::json!({
      "name": draft.manifest_name(),
      "violations": violation_list,
      "fenceCounts": coverage.counts,
      "warnings": coverage.messages.iter().chain(addressing.iter()).collect::<Vec<_>>(),
    });
    print_json(&json_output)?;
  } else {
    print_info(&format!(
      "Manifest {}",
      draft.manifest_name().unwrap_or_else(|| "(no sequence)".to_string())
    ));
    print_stat("Domain", &body.domain);
    print_stat(
      "Networks",
      &body
        .network_config
        .networks
        .keys()
        .cloned()
        .collect::<Vec<_>>()
        .join(", "),
    );
    for (key, host) in &body.host_config.hosts {
      let fenced = coverage.counts.get(key).copied().unwrap_or(0);
      print_stat(&host_label(host), &count_noun(fenced, "fence port"));
    }

    for message in coverage.messages.iter().chain(addressing.iter()) {
      print_warning(message);
    }
    for violation in &violations {
      print_error(&violation.to_string());
    }
    if violations.is_empty() {
      print_success("Ready to submit");
    }
  }

  if !violations.is_empty() {
    bail!("{} found", count_noun(violations.len(), "validation error"));
  }

  Ok(())
}

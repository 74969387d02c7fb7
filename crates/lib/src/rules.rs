//! Structural validation of a draft.
//!
//! These are the blocking checks: a draft with any [`RuleViolation`] must not
//! be submitted. Each violation names the dotted field path it belongs to
//! (the same paths as [`crate::draft::path`]) so the form layer can show it
//! next to the field.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::draft::{ManifestDraft, path};
use crate::subnet::is_ipv4;

/// Longest allowed manifest prefix.
pub const MAX_PREFIX_LEN: usize = 5;

/// What is wrong with a field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rule {
  #[error("required")]
  Required,

  #[error("must be at most {max} characters")]
  TooLong { max: usize },

  #[error("'{value}' is not an IPv4 address")]
  NotIpv4 { value: String },

  #[error("must be at least {min}")]
  BelowMinimum { min: u32 },

  #[error("manifest name '{name}' is already in use")]
  NameTaken { name: String },

  #[error("network '{key}' is defined more than once")]
  DuplicateNetwork { key: String },

  #[error("entry {index} is empty")]
  EmptyEntry { index: usize },
}

/// A rule broken by the field at `path`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {rule}")]
pub struct RuleViolation {
  pub path: String,
  pub rule: Rule,
}

#[derive(Default)]
struct Violations(Vec<RuleViolation>);

impl Violations {
  fn push(&mut self, path: impl Into<String>, rule: Rule) {
    self.0.push(RuleViolation {
      path: path.into(),
      rule,
    });
  }

  fn required_ipv4(&mut self, path: impl Into<String>, value: Option<&str>) {
    match value.map(str::trim) {
      None | Some("") => self.push(path, Rule::Required),
      Some(value) => self.optional_ipv4(path, Some(value)),
    }
  }

  fn optional_ipv4(&mut self, path: impl Into<String>, value: Option<&str>) {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
      return;
    };
    if !is_ipv4(value) {
      self.push(
        path,
        Rule::NotIpv4 {
          value: value.to_string(),
        },
      );
    }
  }

  fn into_sorted(mut self) -> Vec<RuleViolation> {
    self.0.sort_by(|a, b| a.path.cmp(&b.path));
    self.0
  }
}

/// Checks `draft` against the structural rules.
///
/// `existing_names` are the installation names of stored manifests;
/// `editing` is the name of the manifest being edited, which may keep its own
/// name. Violations are sorted by path.
pub fn validate_draft(draft: &ManifestDraft, existing_names: &[String], editing: Option<&str>) -> Vec<RuleViolation> {
  let mut violations = Violations::default();

  let prefix = draft.prefix.trim();
  if prefix.is_empty() {
    violations.push("prefix", Rule::Required);
  } else if prefix.chars().count() > MAX_PREFIX_LEN {
    violations.push("prefix", Rule::TooLong { max: MAX_PREFIX_LEN });
  }

  if draft.domain.trim().is_empty() {
    violations.push("domain", Rule::Required);
  }

  match draft.sequence {
    None => violations.push("sequence", Rule::Required),
    Some(0) => violations.push("sequence", Rule::BelowMinimum { min: 1 }),
    Some(_) => {}
  }

  if let Some(name) = draft.manifest_name() {
    let taken = existing_names.iter().any(|existing| *existing == name) && editing != Some(name.as_str());
    if taken {
      violations.push("sequence", Rule::NameTaken { name });
    }
  }

  check_csv(&mut violations, "networkConfig.dns", &draft.network_config.dns, true);
  check_csv(&mut violations, "networkConfig.ntp", &draft.network_config.ntp, false);

  let mut seen_keys: BTreeMap<String, usize> = BTreeMap::new();
  for (id, def) in &draft.network_config.networks {
    if def.number < 1 {
      violations.push(path::network_field(*id, "number"), Rule::BelowMinimum { min: 1 });
    }
    violations.required_ipv4(path::network_min_ip(*id), def.min_ip.as_deref());
    violations.required_ipv4(path::network_subnet_mask(*id), def.subnet_mask.as_deref());
    violations.optional_ipv4(path::network_gateway(*id), def.gateway.as_deref());

    let key = def.composite_key();
    let count = seen_keys.entry(key.clone()).or_default();
    *count += 1;
    if *count == 2 {
      violations.push(path::network_field(*id, "number"), Rule::DuplicateNetwork { key });
    }
  }

  for (sequence, host) in &draft.hosts {
    violations.optional_ipv4(format!("hosts.{}.ipmiIp", sequence), host.ipmi_ip.as_deref());
    for (id, slot) in &host.networks {
      violations.required_ipv4(path::host_network_ip(*sequence, *id), Some(&slot.ip));
    }
  }

  violations.into_sorted()
}

fn check_csv(violations: &mut Violations, path: &str, csv: &str, ipv4: bool) {
  if csv.trim().is_empty() {
    return;
  }

  for (index, entry) in csv.split(',').map(str::trim).enumerate() {
    if entry.is_empty() {
      violations.push(path, Rule::EmptyEntry { index });
    } else if ipv4 && !is_ipv4(entry) {
      violations.push(
        path,
        Rule::NotIpv4 {
          value: entry.to_string(),
        },
      );
    }
  }
}

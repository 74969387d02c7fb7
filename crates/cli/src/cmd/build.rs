use std::path::Path;

use anyhow::Result;

use anvil_manifest_lib::draft::ManifestDraft;
use anvil_manifest_lib::inputs::ManifestTemplate;
use anvil_manifest_lib::transcode::build_request_body;

use crate::files::{read_json, write_json};

pub fn cmd_build(draft: &Path, template: &Path, output: Option<&Path>) -> Result<()> {
  let draft: ManifestDraft = read_json(draft, "draft")?;
  let template: ManifestTemplate = read_json(template, "template")?;

  let body = build_request_body(&template, &draft);
  write_json(output, &body, "request body")
}

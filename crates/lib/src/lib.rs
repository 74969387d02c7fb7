//! anvil-manifest-lib: install manifest synthesis for Anvil clusters
//!
//! This crate builds, infers and encodes the installation manifest that
//! describes a node cluster before it is handed to the provisioning service:
//! - `ManifestDraft`: the editable manifest, with networks kept in lock-step
//!   across every host slot
//! - `guess_manifest_networks`: backfills untouched fields from hosts that are
//!   already configured
//! - `build_initial_draft` / `build_request_body`: conversion from and to the
//!   service's wire format
//! - `count_host_fences` and `validate_draft`: advisory and blocking checks

pub mod config;
pub mod consts;
pub mod draft;
pub mod fences;
pub mod guess;
pub mod inputs;
pub mod rules;
pub mod slots;
pub mod subnet;
pub mod transcode;
pub mod wire;

//! Deferred-loading adapter descriptors
//!
//! Descriptors carry everything a downstream model loader needs to apply an
//! adapter later, without the adapter having been read here.

use crate::scope::Scope;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One active adapter slot, resolved to a file path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterDescriptor {
    /// Full path of the adapter file
    pub path: PathBuf,
    /// Merge strength
    pub strength: f64,
    /// Registry name up to its first `.`
    pub name: String,
    /// Blocks the adapter is restricted to
    #[serde(rename = "blocks_type")]
    pub scope: Scope,
    /// Reserved for per-block selection; always empty when collected
    pub blocks: Option<Vec<String>>,
}

impl AdapterDescriptor {
    /// Create a descriptor for the registry name `file`, resolved to `path`
    pub fn new(path: impl Into<PathBuf>, file: &str, strength: f64, scope: Scope) -> Self {
        Self {
            path: path.into(),
            strength,
            name: adapter_stem(file).to_string(),
            scope,
            blocks: None,
        }
    }
}

/// The part of a registry name before its first `.`
///
/// `"style.v2.safetensors"` becomes `"style"`. Directory components are
/// kept, so `"sub/ink.safetensors"` becomes `"sub/ink"`.
pub fn adapter_stem(file: &str) -> &str {
    file.split('.').next().unwrap_or(file)
}

//! Error types for adapter collection and application

use crate::loader::LoaderError;
use crate::merge::MergeError;
use crate::registry::RegistryError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a multi-slot invocation
#[derive(Debug, Error)]
pub enum LoraError {
    /// Resolved adapter path does not exist
    #[error("LoRA file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// Adapter file could not be read or parsed
    #[error(transparent)]
    Load(#[from] LoaderError),

    /// Model merge routine failed
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// Adapter name could not be resolved
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Slot configuration rejected before execution
    #[error("Invalid slot configuration: {0}")]
    InvalidSlot(String),
}

/// Result type for adapter operations
pub type Result<T> = std::result::Result<T, LoraError>;

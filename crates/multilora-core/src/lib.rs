//! MultiLoRA Core - Adapter slot types and key filtering
//!
//! Shared, I/O-free building blocks for loading up to four LoRA adapters,
//! each at its own strength and restricted to its own subset of model blocks.
//!
//! # Flow
//!
//! ```text
//! AdapterSlots (4) → active slots → canonical_key → filter_by_scope → merge
//!                         │
//!                         └──────→ AdapterDescriptor list (deferred loading)
//! ```
//!
//! Nothing in this crate touches the file system or a model. Path
//! resolution, deserialization and merging live in `multilora-lora`.

pub mod descriptor;
pub mod filter;
pub mod fingerprint;
pub mod keys;
pub mod scope;
pub mod slot;

// Re-export commonly used types
pub use descriptor::{adapter_stem, AdapterDescriptor};
pub use filter::{filter_by_scope, WeightDelta};
pub use fingerprint::fingerprint;
pub use keys::{canonical_key, KNOWN_PREFIXES};
pub use scope::{ParseScopeError, Scope};
pub use slot::{AdapterRef, AdapterSlot, AdapterSlots, SlotsError, SLOT_COUNT};

//! MultiLoRA - Loading and merging of stacked LoRA adapters
//!
//! Applies up to four LoRA adapters, each with its own strength and block
//! scope, either directly to model weights or as descriptors for a later
//! loading stage.
//!
//! # Components
//!
//! - [`LoraRegistry`]: lists adapter files and resolves names to paths
//! - [`SafetensorsLoader`]: reads an adapter file into a weight delta
//! - [`LowRankMerger`]: merges a delta into [`ModelWeights`]
//! - [`DescriptorCollector`]: active slots → [`AdapterDescriptor`] list
//! - [`LoraApplicator`]: active slots → load → filter → merge, in order
//! - [`MultiLoraWrapperNode`] / [`MultiLoraLoaderNode`]: host entry points
//!
//! Loading and merging sit behind the [`DeltaLoader`] and [`ModelMerger`]
//! traits so other tensor backends can be plugged in.
//!
//! [`AdapterDescriptor`]: multilora_core::AdapterDescriptor

pub mod applicator;
pub mod collector;
pub mod error;
pub mod loader;
pub mod merge;
pub mod model;
pub mod nodes;
pub mod registry;
pub mod tensor;
pub mod validator;

pub use applicator::LoraApplicator;
pub use collector::DescriptorCollector;
pub use error::{LoraError, Result};
pub use loader::{DeltaLoader, LoaderConfig, LoaderError, SafetensorsLoader};
pub use merge::{LowRankMerger, MergeError, ModelMerger};
pub use model::ModelWeights;
pub use nodes::{MultiLoraLoaderNode, MultiLoraWrapperNode, NodeSchema};
pub use registry::{LoraRegistry, RegistryError};
pub use tensor::{TensorError, WeightTensor};
pub use validator::{SlotValidator, ValidationResult};

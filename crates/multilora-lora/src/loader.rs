//! Adapter file loading

use crate::tensor::{TensorError, WeightTensor};
use multilora_core::WeightDelta;
use safetensors::SafeTensors;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Loader errors
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Weights not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("File too large: {size} > {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Tensor '{name}': {source}")]
    Tensor {
        name: String,
        #[source]
        source: TensorError,
    },

    #[error("Failed to serialize weights: {0}")]
    Serialize(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Loader configuration
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Maximum file size in bytes
    pub max_file_size: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_file_size: 4 * 1024 * 1024 * 1024, // 4GB
        }
    }
}

impl LoaderConfig {
    /// No size limit, for full model checkpoints
    pub fn unlimited() -> Self {
        Self {
            max_file_size: u64::MAX,
        }
    }
}

/// Reads a whole adapter file into a weight delta
pub trait DeltaLoader {
    /// Tensor type stored in the delta
    type Tensor;

    /// Load every tensor in the file at `path`
    fn load(&self, path: &Path) -> Result<WeightDelta<Self::Tensor>, LoaderError>;
}

/// Safetensors adapter loader
#[derive(Debug, Clone, Default)]
pub struct SafetensorsLoader {
    config: LoaderConfig,
}

impl SafetensorsLoader {
    /// Create a new loader
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Read the raw file, enforcing the size limit
    fn read(&self, path: &Path) -> Result<Vec<u8>, LoaderError> {
        if !path.exists() {
            return Err(LoaderError::NotFound(path.to_path_buf()));
        }

        let metadata = std::fs::metadata(path)?;
        if metadata.len() > self.config.max_file_size {
            return Err(LoaderError::TooLarge {
                size: metadata.len(),
                limit: self.config.max_file_size,
            });
        }

        Ok(std::fs::read(path)?)
    }
}

impl DeltaLoader for SafetensorsLoader {
    type Tensor = WeightTensor;

    fn load(&self, path: &Path) -> Result<WeightDelta<WeightTensor>, LoaderError> {
        let bytes = self.read(path)?;
        let tensors = decode_safetensors(&bytes).map_err(|e| match e {
            DecodeError::Parse(message) => LoaderError::Parse {
                path: path.to_path_buf(),
                message,
            },
            DecodeError::Tensor { name, source } => LoaderError::Tensor { name, source },
        })?;

        debug!(path = %path.display(), tensors = tensors.len(), "loaded adapter");
        Ok(tensors)
    }
}

pub(crate) enum DecodeError {
    Parse(String),
    Tensor { name: String, source: TensorError },
}

/// Decode every tensor of a safetensors buffer
pub(crate) fn decode_safetensors(bytes: &[u8]) -> Result<WeightDelta<WeightTensor>, DecodeError> {
    let file = SafeTensors::deserialize(bytes).map_err(|e| DecodeError::Parse(e.to_string()))?;

    file.tensors()
        .into_iter()
        .map(|(name, view)| match WeightTensor::from_view(&view) {
            Ok(tensor) => Ok((name, tensor)),
            Err(source) => Err(DecodeError::Tensor { name, source }),
        })
        .collect()
}

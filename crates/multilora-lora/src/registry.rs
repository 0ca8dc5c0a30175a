//! LoRA file registry
//!
//! Lists the adapter files available under a set of search directories and
//! resolves registry names to full paths.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// File extensions recognized as adapter files
pub const SUPPORTED_EXTENSIONS: [&str; 7] = ["safetensors", "ckpt", "pt", "pt2", "bin", "pth", "sft"];

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid adapter name '{0}': must be relative and stay inside a search path")]
    InvalidName(String),
}

/// Whether `path` has a supported adapter extension
pub fn has_supported_extension(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

/// Adapter file registry
#[derive(Debug, Clone)]
pub struct LoraRegistry {
    /// Directories searched for adapter files, in priority order
    search_paths: Vec<PathBuf>,
}

impl LoraRegistry {
    /// Create a registry with the default search paths
    pub fn new() -> Self {
        Self {
            search_paths: vec![
                PathBuf::from("loras"),
                dirs::data_local_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("multilora")
                    .join("loras"),
            ],
        }
    }

    /// Create a registry searching only `paths`
    pub fn with_search_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            search_paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Get search paths
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Scan search paths for adapter files.
    ///
    /// Names are relative to their search path, `/`-separated, sorted and
    /// de-duplicated. The file system is read on every call.
    pub fn filename_list(&self) -> Vec<String> {
        let mut names = BTreeSet::new();

        for search_path in &self.search_paths {
            if !search_path.is_dir() {
                continue;
            }

            for entry in WalkDir::new(search_path)
                .follow_links(true)
                .into_iter()
                .flatten()
            {
                let path = entry.path();
                if !entry.file_type().is_file() || !has_supported_extension(path) {
                    continue;
                }
                if let Some(name) = relative_name(search_path, path) {
                    names.insert(name);
                }
            }
        }

        debug!(count = names.len(), "scanned LoRA search paths");
        names.into_iter().collect()
    }

    /// Selector choices: the unused sentinel followed by every adapter file
    pub fn choices(&self) -> Vec<String> {
        std::iter::once(multilora_core::slot::UNUSED.to_string())
            .chain(self.filename_list())
            .collect()
    }

    /// Check if `name` exists under any search path
    pub fn contains(&self, name: &str) -> bool {
        validate_name(name).is_ok()
            && self
                .search_paths
                .iter()
                .any(|dir| dir.join(name).is_file())
    }

    /// Resolve a registry name to a full path.
    ///
    /// Returns the first existing match. When nothing matches, the path the
    /// file would have under the first search path is returned; existence is
    /// the caller's concern.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, RegistryError> {
        validate_name(name)?;

        let found = self
            .search_paths
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file());

        Ok(match (found, self.search_paths.first()) {
            (Some(path), _) => path,
            (None, Some(first)) => first.join(name),
            (None, None) => PathBuf::from(name),
        })
    }
}

impl Default for LoraRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject absolute names and names that climb out of a search path
fn validate_name(name: &str) -> Result<(), RegistryError> {
    let escapes = Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });

    if name.is_empty() || escapes {
        Err(RegistryError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}

fn relative_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_filename_list_recursive_and_sorted() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "zeta.safetensors");
        touch(dir.path(), "alpha.pt");
        touch(dir.path(), "style/ink.safetensors");
        touch(dir.path(), "readme.txt");

        let registry = LoraRegistry::with_search_paths([dir.path()]);
        assert_eq!(
            registry.filename_list(),
            vec!["alpha.pt", "style/ink.safetensors", "zeta.safetensors"]
        );
    }

    #[test]
    fn test_filename_list_dedups_across_paths() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        touch(first.path(), "shared.safetensors");
        touch(second.path(), "shared.safetensors");
        touch(second.path(), "only.safetensors");

        let registry = LoraRegistry::with_search_paths([first.path(), second.path()]);
        assert_eq!(
            registry.filename_list(),
            vec!["only.safetensors", "shared.safetensors"]
        );
    }

    #[test]
    fn test_filename_list_is_fresh() {
        let dir = TempDir::new().unwrap();
        let registry = LoraRegistry::with_search_paths([dir.path()]);
        assert!(registry.filename_list().is_empty());

        touch(dir.path(), "new.safetensors");
        assert_eq!(registry.filename_list(), vec!["new.safetensors"]);
    }

    #[test]
    fn test_choices_start_with_sentinel() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.safetensors");

        let registry = LoraRegistry::with_search_paths([dir.path()]);
        assert_eq!(registry.choices(), vec!["None", "a.safetensors"]);
    }

    #[test]
    fn test_resolve_prefers_first_existing() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        touch(second.path(), "a.safetensors");

        let registry = LoraRegistry::with_search_paths([first.path(), second.path()]);
        assert_eq!(
            registry.resolve("a.safetensors").unwrap(),
            second.path().join("a.safetensors")
        );
        assert!(registry.contains("a.safetensors"));
    }

    #[test]
    fn test_resolve_missing_uses_first_path() {
        let first = TempDir::new().unwrap();
        let registry = LoraRegistry::with_search_paths([first.path()]);

        let path = registry.resolve("gone.safetensors").unwrap();
        assert_eq!(path, first.path().join("gone.safetensors"));
        assert!(!path.exists());
        assert!(!registry.contains("gone.safetensors"));
    }

    #[test]
    fn test_resolve_rejects_escaping_names() {
        let registry = LoraRegistry::with_search_paths(["loras"]);
        assert!(registry.resolve("../secret.safetensors").is_err());
        assert!(registry.resolve("/etc/passwd").is_err());
        assert!(registry.resolve("").is_err());
        assert!(!registry.contains("../secret.safetensors"));
    }

    #[test]
    fn test_supported_extensions() {
        assert!(has_supported_extension("a.safetensors"));
        assert!(has_supported_extension("a.SAFETENSORS"));
        assert!(has_supported_extension("dir/a.pt"));
        assert!(!has_supported_extension("a.json"));
        assert!(!has_supported_extension("safetensors"));
    }
}

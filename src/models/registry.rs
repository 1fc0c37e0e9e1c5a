//! Style identifier to model artifact lookup.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::control::StyleId;

/// File extension of bundled style models.
pub const MODEL_EXTENSION: &str = "onnx";

/// Registry errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No candidate directory exists.
    #[error("models directory not found (searched {searched} locations)")]
    ModelsDirNotFound { searched: usize },
    #[error("failed to resolve working directory: {0}")]
    /// The working directory could not be read.
    Io(#[from] std::io::Error),
}

/// Where one style's model lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    /// Style this artifact implements.
    pub style: StyleId,
    /// Expected location of the model file.
    pub path: PathBuf,
}

impl ModelDescriptor {
    /// True if the model file is present.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

/// Fixed set of seven model artifacts under one directory.
#[derive(Debug, Clone)]
pub struct StyleRegistry {
    root: PathBuf,
    descriptors: [ModelDescriptor; 7],
}

impl StyleRegistry {
    /// Builds the registry for artifacts named `<style>.onnx` in `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let descriptors = StyleId::ALL.map(|style| ModelDescriptor {
            style,
            path: root.join(format!("{}.{}", style.name(), MODEL_EXTENSION)),
        });
        Self { root, descriptors }
    }

    /// Locates a `models` directory and builds the registry from it.
    pub fn discover() -> Result<Self, RegistryError> {
        let candidates = candidate_dirs()?;
        let searched = candidates.len();
        candidates
            .into_iter()
            .find(|dir| dir.is_dir())
            .map(|dir| {
                tracing::info!("Model directory: {:?}", dir);
                Self::new(dir)
            })
            .ok_or(RegistryError::ModelsDirNotFound { searched })
    }

    /// Directory the artifacts are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a style to its artifact.
    pub fn resolve(&self, style: StyleId) -> &ModelDescriptor {
        &self.descriptors[style.index()]
    }

    /// All seven descriptors, in style order.
    pub fn descriptors(&self) -> &[ModelDescriptor] {
        &self.descriptors
    }

    /// Styles whose artifact file is absent.
    pub fn missing_artifacts(&self) -> Vec<StyleId> {
        self.descriptors
            .iter()
            .filter(|d| !d.exists())
            .map(|d| d.style)
            .collect()
    }
}

/// Search order: next to the executable, then up to three levels above it
/// (covers `target/debug` and `target/release`), then the working directory.
fn candidate_dirs() -> Result<Vec<PathBuf>, RegistryError> {
    let mut dirs = Vec::new();
    if let Ok(exe) = std::env::current_exe() {
        dirs.extend(exe.ancestors().skip(1).take(4).map(|dir| dir.join("models")));
    }
    dirs.push(std::env::current_dir()?.join("models"));
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_is_data_driven() {
        let registry = StyleRegistry::new("/opt/styles");
        for style in StyleId::ALL {
            let descriptor = registry.resolve(style);
            assert_eq!(descriptor.style, style);
            assert_eq!(
                descriptor.path,
                PathBuf::from(format!("/opt/styles/{}.onnx", style.name()))
            );
        }
    }

    #[test]
    fn test_missing_artifacts_in_empty_dir() {
        let dir = std::env::temp_dir().join(format!("style-preview-registry-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("style2.onnx"), b"stub").unwrap();

        let registry = StyleRegistry::new(&dir);
        let missing = registry.missing_artifacts();

        assert_eq!(missing.len(), 6);
        assert!(!missing.contains(&StyleId::Style2));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}

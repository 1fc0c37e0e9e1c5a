//! Bundled style models: where they live and which are loaded.

mod cache;
mod registry;

pub use cache::{CacheStats, ModelCache, ModelKey};
pub use registry::{ModelDescriptor, RegistryError, StyleRegistry, MODEL_EXTENSION};

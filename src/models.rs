//! Model configuration store.
//!
//! A JSON object keyed by model name; each entry carries the checkpoint, VAE,
//! sampling defaults, and default prompts merged into every request for that
//! model. The store is re-read per lookup request so edits show up without a
//! restart.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Per-model generation defaults, as persisted in the store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    pub checkpoint_name: String,
    pub vae: String,
    pub steps: u32,
    pub image_width: u32,
    pub image_height: u32,
    pub default_positive_prompt: String,
    pub default_negative_prompt: String,
    /// Images per request; the builder falls back to a constant when unset.
    #[serde(default, rename = "batch_size")]
    pub batch_size: Option<u32>,
}

/// The loaded store: model name → defaults.
#[derive(Debug, Clone)]
pub struct ModelLibrary {
    models: BTreeMap<String, ModelConfig>,
}

impl ModelLibrary {
    /// Read and parse the store at `path`.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ModelError::StoreNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        let models = serde_json::from_str(&raw).map_err(|source| ModelError::StoreMalformed {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { models })
    }

    /// Look up a model's defaults. An empty name resolves to `default_name`.
    pub fn resolve(&self, name: &str, default_name: &str) -> Result<&ModelConfig, ModelError> {
        let effective = if name.is_empty() { default_name } else { name };
        self.models
            .get(effective)
            .ok_or_else(|| ModelError::UnknownModel(effective.to_string()))
    }

    /// Comma-joined model names, sorted, for the `--models` listing.
    pub fn model_names(&self) -> String {
        self.models.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model configuration store not found at {}", path.display())]
    StoreNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model configuration store at {} is not valid JSON", path.display())]
    StoreMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown model {0:?}")]
    UnknownModel(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const STORE: &str = r#"{
        "meina": {
            "checkpointName": "MeinaMix_v11.safetensors",
            "vae": "kl-f8-anime2.safetensors",
            "steps": 20,
            "imageWidth": 512,
            "imageHeight": 768,
            "defaultPositivePrompt": "masterpiece",
            "defaultNegativePrompt": "lowres",
            "batch_size": 2
        },
        "epic": {
            "checkpointName": "epicrealism.safetensors",
            "vae": "vae.safetensors",
            "steps": 30,
            "imageWidth": 1024,
            "imageHeight": 1024,
            "defaultPositivePrompt": "photo",
            "defaultNegativePrompt": "cartoon"
        }
    }"#;

    fn store_file(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn resolves_named_model() {
        let f = store_file(STORE);
        let library = ModelLibrary::load(f.path()).unwrap();
        let config = library.resolve("meina", "epic").unwrap();
        assert_eq!(config.checkpoint_name, "MeinaMix_v11.safetensors");
        assert_eq!(config.batch_size, Some(2));
    }

    #[test]
    fn empty_name_falls_back_to_default() {
        let f = store_file(STORE);
        let library = ModelLibrary::load(f.path()).unwrap();
        let config = library.resolve("", "epic").unwrap();
        assert_eq!(config.checkpoint_name, "epicrealism.safetensors");
        // batch_size is absent in the store for this model
        assert_eq!(config.batch_size, None);
    }

    #[test]
    fn unknown_model_is_an_error() {
        let f = store_file(STORE);
        let library = ModelLibrary::load(f.path()).unwrap();
        let err = library.resolve("nonexistent", "epic").unwrap_err();
        assert!(matches!(err, ModelError::UnknownModel(name) if name == "nonexistent"));
    }

    #[test]
    fn resolve_is_idempotent() {
        let f = store_file(STORE);
        let library = ModelLibrary::load(f.path()).unwrap();
        let first = library.resolve("meina", "epic").unwrap().clone();
        let second = library.resolve("meina", "epic").unwrap().clone();
        assert_eq!(first, second);
    }

    #[test]
    fn names_are_sorted_and_comma_joined() {
        let f = store_file(STORE);
        let library = ModelLibrary::load(f.path()).unwrap();
        assert_eq!(library.model_names(), "epic, meina");
    }

    #[test]
    fn missing_store_is_an_error() {
        let err = ModelLibrary::load(Path::new("/nonexistent/models.json")).unwrap_err();
        assert!(matches!(err, ModelError::StoreNotFound { .. }));
    }

    #[test]
    fn malformed_store_is_an_error() {
        let f = store_file("{ not json");
        let err = ModelLibrary::load(f.path()).unwrap_err();
        assert!(matches!(err, ModelError::StoreMalformed { .. }));
    }
}

//! Image persistence and public-path mapping.
//!
//! Generated images land in one output folder under seed-derived names; the
//! folder prefix is rewritten to a configured public domain prefix when a
//! path is handed back to chat users.

use std::path::{Path, PathBuf};

/// Write target for generated images and composites.
#[derive(Debug, Clone)]
pub struct FileStore {
    folder: PathBuf,
    domain_prefix: Option<String>,
}

impl FileStore {
    pub fn new(folder: impl Into<PathBuf>, domain_prefix: Option<String>) -> Self {
        Self {
            folder: folder.into(),
            domain_prefix,
        }
    }

    /// Write each payload as `{seed}_{NNN}.png` (1-based, zero-padded).
    ///
    /// A failed write is logged and skipped; the rest of the batch still
    /// lands. Only the paths that were actually written are returned.
    pub async fn save_images(
        &self,
        images: &[Vec<u8>],
        seed: u64,
    ) -> Result<Vec<PathBuf>, FilesError> {
        tokio::fs::create_dir_all(&self.folder)
            .await
            .map_err(|source| FilesError::CreateFolder {
                path: self.folder.clone(),
                source,
            })?;

        let mut saved = Vec::with_capacity(images.len());
        for (index, bytes) in images.iter().enumerate() {
            let filename = format!("{seed}_{:03}.png", index + 1);
            let path = self.folder.join(&filename);
            match tokio::fs::write(&path, bytes).await {
                Ok(()) => saved.push(path),
                Err(e) => {
                    tracing::warn!(error = %e, file = %filename, "Failed to save image, skipping")
                }
            }
        }
        Ok(saved)
    }

    /// Rewrite the local folder prefix of `path` to the public domain prefix.
    pub fn public_url(&self, path: &Path) -> Result<String, FilesError> {
        let Some(prefix) = &self.domain_prefix else {
            return Err(FilesError::DomainUnconfigured);
        };
        let folder = self.folder.to_string_lossy();
        Ok(path.to_string_lossy().replacen(folder.as_ref(), prefix, 1))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    #[error("could not create output folder {}", path.display())]
    CreateFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no public domain mapping is configured")]
    DomainUnconfigured,
}

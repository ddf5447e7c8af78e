use crate::core::recognizer::{Embedding, EmbeddingProvider};
use crate::error::{GateError, Result};
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

#[derive(Debug, Clone)]
pub struct AuthorizedFace {
    pub identifier: String,
    pub embedding: Embedding,
}

/// Embeddings of every authorized face, computed once at startup.
///
/// Entries keep the order in which their files were enumerated; the default
/// match policy depends on it.
#[derive(Debug, Default)]
pub struct AuthorizedRegistry {
    entries: Vec<AuthorizedFace>,
}

impl AuthorizedRegistry {
    /// Embeds every `.jpg`, `.jpeg` and `.png` file in `dir`, in file-name
    /// order. A file that cannot be embedded is logged and skipped.
    pub fn build(dir: &Path, provider: &dyn EmbeddingProvider) -> Result<Self> {
        if !dir.is_dir() {
            return Err(GateError::Config(format!(
                "Authorized faces directory not found: {}", dir.display()
            )));
        }

        let mut registry = Self::default();
        for path in list_face_images(dir)? {
            let Some(identifier) = identifier_for(&path) else {
                tracing::warn!("Skipping {:?}: file name is not valid UTF-8", path);
                continue;
            };

            match provider.embed_path(&path) {
                Ok(embedding) => {
                    tracing::debug!("Embedded authorized face {} ({} dims)", identifier, embedding.len());
                    registry.insert(identifier, embedding);
                }
                Err(e) => {
                    tracing::warn!("Error processing {}: {}", path.display(), e);
                }
            }
        }

        if registry.is_empty() {
            tracing::warn!("No authorized faces loaded from {}", dir.display());
        } else {
            tracing::info!("Loaded {} authorized face(s) from {}", registry.len(), dir.display());
        }
        Ok(registry)
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (String, Embedding)>) -> Self {
        let mut registry = Self::default();
        for (identifier, embedding) in entries {
            registry.insert(identifier, embedding);
        }
        registry
    }

    /// A repeated identifier (`alice.jpg` next to `alice.png`) replaces the
    /// earlier embedding but keeps its position.
    fn insert(&mut self, identifier: String, embedding: Embedding) {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.identifier == identifier) {
            tracing::warn!("Duplicate authorized face {}, keeping the later image", identifier);
            existing.embedding = embedding;
        } else {
            self.entries.push(AuthorizedFace { identifier, embedding });
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AuthorizedFace> {
        self.entries.iter()
    }

    pub fn get(&self, identifier: &str) -> Option<&Embedding> {
        self.entries
            .iter()
            .find(|e| e.identifier == identifier)
            .map(|e| &e.embedding)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn list_face_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_image_extension(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

fn identifier_for(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_image_extensions() {
        assert!(has_image_extension(Path::new("a/alice.jpg")));
        assert!(has_image_extension(Path::new("bob.JPEG")));
        assert!(has_image_extension(Path::new("carol.png")));
        assert!(!has_image_extension(Path::new("notes.txt")));
        assert!(!has_image_extension(Path::new("README")));
        assert!(!has_image_extension(Path::new("face.gif")));
    }

    #[test]
    fn identifier_is_file_stem() {
        assert_eq!(identifier_for(Path::new("faces/alice.smith.jpg")).as_deref(), Some("alice.smith"));
    }

    #[test]
    fn duplicate_identifier_keeps_position() {
        let registry = AuthorizedRegistry::from_entries(vec![
            ("alice".to_string(), vec![1.0, 0.0]),
            ("bob".to_string(), vec![0.0, 1.0]),
            ("alice".to_string(), vec![0.5, 0.5]),
        ]);
        let ids: Vec<&str> = registry.iter().map(|e| e.identifier.as_str()).collect();
        assert_eq!(ids, vec!["alice", "bob"]);
        assert_eq!(registry.get("alice"), Some(&vec![0.5, 0.5]));
    }
}

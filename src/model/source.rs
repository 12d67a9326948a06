//! Model source and download logic.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{BrevityError, Result};

/// Where a model bundle (weights + tokenizer) comes from.
///
/// In TOML this is the `source` key of a model section:
///
/// ```toml
/// [models.summarizer]
/// source = "local"
/// path = "./t5_model"
///
/// [models.sentiment]
/// source = "hub"
/// repo_id = "Xenova/twitter-roberta-base-sentiment-latest"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ModelSource {
    /// Load from a HuggingFace Hub repository.
    #[serde(rename = "hub")]
    HuggingFace {
        /// Repository ID (e.g., "Xenova/twitter-roberta-base-sentiment-latest").
        repo_id: String,
        /// Branch, tag or commit; the default branch when absent.
        #[serde(default)]
        revision: Option<String>,
    },

    /// Load from a local directory holding the exported bundle.
    Local {
        /// Path to the bundle directory.
        path: PathBuf,
    },
}

impl ModelSource {
    /// Create a HuggingFace source.
    pub fn huggingface(repo_id: impl Into<String>) -> Self {
        Self::HuggingFace {
            repo_id: repo_id.into(),
            revision: None,
        }
    }

    /// Create a local source.
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::Local { path: path.into() }
    }

    /// Identifier for logs.
    pub fn describe(&self) -> String {
        match self {
            Self::HuggingFace {
                repo_id,
                revision: Some(rev),
            } => format!("hub:{repo_id}@{rev}"),
            Self::HuggingFace { repo_id, .. } => format!("hub:{repo_id}"),
            Self::Local { path } => format!("local:{}", path.display()),
        }
    }

    /// Resolve one file of the bundle to a local path.
    ///
    /// Hub files are downloaded into `cache_dir` on first use. Local files
    /// must already exist.
    pub fn resolve_file(&self, file: &str, cache_dir: &Path) -> Result<PathBuf> {
        match self {
            Self::HuggingFace { repo_id, revision } => {
                use hf_hub::api::sync::ApiBuilder;
                use hf_hub::{Repo, RepoType};

                let api = ApiBuilder::new()
                    .with_cache_dir(cache_dir.to_path_buf())
                    .build()
                    .map_err(|e| {
                        BrevityError::Source(format!("Failed to initialize HF API: {}", e))
                    })?;

                let repo = match revision {
                    Some(rev) => api.repo(Repo::with_revision(
                        repo_id.clone(),
                        RepoType::Model,
                        rev.clone(),
                    )),
                    None => api.model(repo_id.clone()),
                };

                repo.get(file).map_err(|e| {
                    BrevityError::Source(format!(
                        "Failed to download {} from {}: {}",
                        file, repo_id, e
                    ))
                })
            }
            Self::Local { path } => {
                let candidate = path.join(file);
                if !candidate.exists() {
                    return Err(BrevityError::Source(format!(
                        "Local model file does not exist: {}",
                        candidate.display()
                    )));
                }
                Ok(candidate)
            }
        }
    }

    /// Like [`resolve_file`](Self::resolve_file), but a missing file is `None`
    /// instead of an error. Used for optional bundle metadata.
    pub fn resolve_optional(&self, file: &str, cache_dir: &Path) -> Option<PathBuf> {
        self.resolve_file(file, cache_dir).ok()
    }
}

/// Default directory for downloaded models.
///
/// `BREVITY_CACHE_DIR` wins; otherwise the platform cache directory.
pub fn default_cache_dir() -> PathBuf {
    std::env::var("BREVITY_CACHE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from(".cache"))
                .join("brevity")
                .join("models")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_source_resolves_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tokenizer.json"), "{}").unwrap();

        let source = ModelSource::local(dir.path());
        let path = source
            .resolve_file("tokenizer.json", Path::new("/unused"))
            .unwrap();
        assert_eq!(path, dir.path().join("tokenizer.json"));
    }

    #[test]
    fn local_source_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = ModelSource::local(dir.path());

        let err = source
            .resolve_file("encoder_model.onnx", Path::new("/unused"))
            .unwrap_err();
        assert!(err.to_string().contains("encoder_model.onnx"));
        assert!(
            source
                .resolve_optional("config.json", Path::new("/unused"))
                .is_none()
        );
    }

    #[test]
    fn describe_sources() {
        assert_eq!(ModelSource::huggingface("org/model").describe(), "hub:org/model");
        let pinned = ModelSource::HuggingFace {
            repo_id: "org/model".into(),
            revision: Some("v2".into()),
        };
        assert_eq!(pinned.describe(), "hub:org/model@v2");
        assert_eq!(ModelSource::local("./t5_model").describe(), "local:./t5_model");
    }

    #[test]
    fn parses_tagged_sources() {
        let local: ModelSource =
            serde_json::from_str(r#"{"source": "local", "path": "./t5_model"}"#).unwrap();
        assert_eq!(local, ModelSource::local("./t5_model"));

        let hub: ModelSource =
            serde_json::from_str(r#"{"source": "hub", "repo_id": "org/model"}"#).unwrap();
        assert_eq!(hub, ModelSource::huggingface("org/model"));
    }

    #[test]
    fn default_cache_dir_mentions_brevity_or_override() {
        let dir = default_cache_dir();
        match std::env::var("BREVITY_CACHE_DIR") {
            Ok(custom) => assert_eq!(dir, PathBuf::from(custom)),
            Err(_) => assert!(dir.to_string_lossy().contains("brevity")),
        }
    }
}

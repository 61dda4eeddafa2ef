//! Embedding provider contract and the local fastembed adapter.

use crate::error::{ProviderError, ProviderResult};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;
use std::path::PathBuf;

/// Turns text into a fixed-length vector.
///
/// Implementations must be thread-safe: map construction calls `embed` from
/// a rayon pool. Calls are fallible and a failure only affects the text that
/// was being embedded.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> ProviderResult<Vec<f32>>;

    /// Name recorded in logs
    fn name(&self) -> &str;
}

/// Local embedding model through fastembed.
pub struct FastEmbedProvider {
    model: Mutex<TextEmbedding>,
    name: String,
}

impl FastEmbedProvider {
    /// Load `model_name`, downloading it into the model cache on first use.
    ///
    /// # Errors
    /// Returns an error if the name is unknown or the model fails to
    /// initialize or download.
    pub fn new(model_name: &str, show_download_progress: bool) -> ProviderResult<Self> {
        let model = parse_model_name(model_name)?;
        tracing::info!("[embed] loading embedding model {model_name}");

        let model = TextEmbedding::try_new(
            InitOptions::new(model)
                .with_cache_dir(models_dir())
                .with_show_download_progress(show_download_progress),
        )
        .map_err(|e| ProviderError::Embedding {
            reason: format!(
                "Failed to initialize embedding model: {e}. Ensure you have internet connection for first-time model download"
            ),
        })?;

        Ok(Self {
            model: Mutex::new(model),
            name: model_name.to_string(),
        })
    }
}

impl EmbeddingProvider for FastEmbedProvider {
    fn embed(&self, text: &str) -> ProviderResult<Vec<f32>> {
        let mut embeddings = self
            .model
            .lock()
            .embed(vec![text.to_string()], None)
            .map_err(|e| ProviderError::Embedding {
                reason: format!("Failed to generate embedding: {e}"),
            })?;

        embeddings.pop().ok_or_else(|| ProviderError::Embedding {
            reason: "Model returned no embedding".to_string(),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Directory where downloaded models are cached
pub fn models_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("symdex")
        .join("models")
}

fn parse_model_name(name: &str) -> ProviderResult<EmbeddingModel> {
    match name {
        "AllMiniLML6V2" | "all-MiniLM-L6-v2" | "all-minilm-l6-v2" => {
            Ok(EmbeddingModel::AllMiniLML6V2)
        }
        "AllMiniLML12V2" | "all-MiniLM-L12-v2" | "all-minilm-l12-v2" => {
            Ok(EmbeddingModel::AllMiniLML12V2)
        }
        "BGESmallENV15" | "bge-small-en-v1.5" | "bge-small" => Ok(EmbeddingModel::BGESmallENV15),
        "BGEBaseENV15" | "bge-base-en-v1.5" | "bge-base" => Ok(EmbeddingModel::BGEBaseENV15),
        "NomicEmbedTextV15" | "nomic-embed-text-v1.5" | "nomic-embed-text" => {
            Ok(EmbeddingModel::NomicEmbedTextV15)
        }
        other => Err(ProviderError::Embedding {
            reason: format!("Unknown embedding model '{other}'"),
        }),
    }
}

/// Deterministic provider for tests: keyword buckets plus a small
/// per-text component, normalized to unit length.
#[cfg(test)]
pub(crate) struct MockProvider {
    pub calls: std::sync::atomic::AtomicUsize,
    pub fail_on: Option<&'static str>,
}

#[cfg(test)]
impl MockProvider {
    pub fn new() -> Self {
        Self {
            calls: std::sync::atomic::AtomicUsize::new(0),
            fail_on: None,
        }
    }

    pub fn failing_on(marker: &'static str) -> Self {
        Self {
            fail_on: Some(marker),
            ..Self::new()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl EmbeddingProvider for MockProvider {
    fn embed(&self, text: &str) -> ProviderResult<Vec<f32>> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.fail_on.is_some_and(|marker| text.contains(marker)) {
            return Err(ProviderError::Embedding {
                reason: "mock failure".to_string(),
            });
        }

        let mut embedding = vec![0.1_f32; 8];
        for (slot, word) in ["parse", "json", "error", "async"].iter().enumerate() {
            if text.contains(word) {
                embedding[slot * 2] = 0.9;
                embedding[slot * 2 + 1] = 0.8;
            }
        }
        embedding[7] += (text.len() % 7) as f32 * 0.01;

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        for val in &mut embedding {
            *val /= magnitude;
        }
        Ok(embedding)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

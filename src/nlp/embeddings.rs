//! Sentence embedding adapters built on fastembed.

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    sync::Arc,
};

use anyhow::Result;

#[cfg(feature = "embeddings")]
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::{config::Settings, error::ServiceError, nlp::similarity::l2_normalize};

/// Dimension of all-MiniLM-L12-v2 sentence vectors.
pub const MINILM_DIM: usize = 384;

/// Text to fixed-dimension vector service.
pub trait Embedder: Send + Sync {
    fn dimension(&self) -> usize;

    /// Embed a batch, one vector per input in input order.
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError>;

    fn encode_one(&self, text: &str) -> Result<Vec<f32>, ServiceError> {
        self.encode(&[text.to_string()])?
            .pop()
            .ok_or_else(|| ServiceError::unavailable("embedding", "empty batch returned"))
    }
}

/// MiniLM sentence embeddings. The ONNX session is not shared across
/// threads, so calls are serialized through a mutex.
#[cfg(feature = "embeddings")]
pub struct FastEmbedder {
    model: std::sync::Mutex<TextEmbedding>,
}

#[cfg(feature = "embeddings")]
impl FastEmbedder {
    pub fn try_new(settings: &Settings) -> Result<Self> {
        let options = InitOptions::new(EmbeddingModel::AllMiniLML12V2)
            .with_cache_dir(settings.join_model("fastembed"))
            .with_show_download_progress(false);
        let model = TextEmbedding::try_new(options)?;
        Ok(Self {
            model: std::sync::Mutex::new(model),
        })
    }
}

#[cfg(feature = "embeddings")]
impl Embedder for FastEmbedder {
    fn dimension(&self) -> usize {
        MINILM_DIM
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut model = self
            .model
            .lock()
            .map_err(|_| ServiceError::unavailable("embedding", "model lock poisoned"))?;
        model
            .embed(texts.to_vec(), None)
            .map_err(|err| ServiceError::unavailable("embedding", err))
    }
}

/// Deterministic character-trigram hashing embedder for offline runs.
///
/// Surface forms sharing many trigrams ("usa", "u.s.a") land close together,
/// which is enough to exercise diversity filtering without a model.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimension];
        let padded: Vec<char> = format!("  {}  ", text.to_lowercase()).chars().collect();
        for window in padded.windows(3) {
            let mut hasher = DefaultHasher::new();
            window.hash(&mut hasher);
            let hash = hasher.finish();
            let slot = (hash % self.dimension as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            vector[slot] += sign;
        }
        l2_normalize(&mut vector);
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(MINILM_DIM)
    }
}

impl Embedder for HashingEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

/// Build the embedding service for this build configuration.
pub fn load_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    #[cfg(feature = "embeddings")]
    {
        let embedder = FastEmbedder::try_new(settings)?;
        tracing::info!(dim = MINILM_DIM, "loaded MiniLM sentence embedder");
        Ok(Arc::new(embedder) as Arc<dyn Embedder>)
    }

    #[cfg(not(feature = "embeddings"))]
    {
        let _ = settings;
        tracing::warn!(dim = MINILM_DIM, "embeddings feature disabled; using hashing embedder");
        Ok(Arc::new(HashingEmbedder::default()) as Arc<dyn Embedder>)
    }
}

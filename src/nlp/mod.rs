//! Natural language processing orchestration layer.

pub mod distractors;
pub mod embeddings;
pub mod keywords;
pub mod mmr;
pub mod senses;
pub mod similarity;
pub mod summarizer;

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::{config::Settings, error::SummarizeError};

use self::{
    distractors::DistractorGenerator,
    keywords::{EmbeddingKeywords, KeywordExtractor},
    summarizer::Summarizer,
};

/// Long-lived service handles shared by the CLI and the HTTP layer.
#[derive(Clone)]
pub struct Pipelines {
    pub distractors: Arc<DistractorGenerator>,
    pub keywords: Arc<dyn KeywordExtractor>,
    /// Kept as a result so requests can report why summaries are unavailable.
    pub summarizer: Result<Arc<Summarizer>, SummarizeError>,
}

impl Pipelines {
    /// Load all pipelines. Distractor services are mandatory; the summarizer
    /// degrades to `ModelUnavailable` per request.
    pub fn load(settings: &Settings) -> Result<Self> {
        let senses = senses::load_sense_lookup(settings)?;
        let embedder = embeddings::load_embedder(settings)?;
        let distractors = Arc::new(DistractorGenerator::new(senses, embedder.clone()));
        let summarizer = summarizer::load_summarizer(settings).map(Arc::new);
        if let Err(err) = &summarizer {
            warn!(%err, "summarizer disabled");
        }
        info!(summaries = summarizer.is_ok(), "pipelines ready");
        Ok(Self {
            distractors,
            keywords: Arc::new(EmbeddingKeywords::new(embedder)),
            summarizer,
        })
    }

    pub fn summarizer(&self) -> Result<Arc<Summarizer>, SummarizeError> {
        self.summarizer.clone()
    }
}

/// Build the distractor generator from the sense table and embedding model.
pub fn load_distractors(settings: &Settings) -> Result<DistractorGenerator> {
    let senses = senses::load_sense_lookup(settings)?;
    let embedder = embeddings::load_embedder(settings)?;
    Ok(DistractorGenerator::new(senses, embedder))
}

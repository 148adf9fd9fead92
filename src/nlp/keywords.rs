//! Keyword extraction and the original/summary keyword overlap filter.

use std::{
    collections::{BTreeSet, HashSet},
    sync::Arc,
};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use stop_words::LANGUAGE;

use crate::{
    error::ServiceError,
    nlp::{embeddings::Embedder, similarity::cosine},
};

/// Keyword extraction service.
pub trait KeywordExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Result<Vec<String>, ServiceError>;
}

/// Keywords extracted from both texts.
pub fn common_keywords(
    extractor: &dyn KeywordExtractor,
    original: &str,
    summarized: &str,
) -> Result<BTreeSet<String>, ServiceError> {
    let original: HashSet<String> = extractor.extract(original)?.into_iter().collect();
    let summarized = extractor.extract(summarized)?;
    Ok(summarized
        .into_iter()
        .filter(|kw| original.contains(kw))
        .collect())
}

static WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+(?:['’-][\p{L}\p{N}]+)*").expect("valid regex"));

static STOPWORDS: Lazy<HashSet<String>> = Lazy::new(|| {
    stop_words::get(LANGUAGE::English)
        .iter()
        .map(|word| word.to_lowercase())
        .collect()
});

/// Local keyphrase extractor: stopword-delimited runs of content words,
/// lightly lemmatized, ranked by frequency then first occurrence.
#[derive(Debug, Clone)]
pub struct LexicalKeywords {
    max_keywords: usize,
    max_phrase_words: usize,
}

impl Default for LexicalKeywords {
    fn default() -> Self {
        Self {
            max_keywords: 10,
            max_phrase_words: 3,
        }
    }
}

impl LexicalKeywords {
    pub fn new(max_keywords: usize, max_phrase_words: usize) -> Self {
        Self {
            max_keywords,
            max_phrase_words: max_phrase_words.max(1),
        }
    }

    fn runs(text: &str) -> Vec<Vec<String>> {
        let mut runs = Vec::new();
        let mut current = Vec::new();
        let mut last_end = 0;
        for token in WORD.find_iter(text) {
            // punctuation between tokens ends a phrase
            let gap = &text[last_end..token.start()];
            last_end = token.end();
            if gap.chars().any(|c| !c.is_whitespace()) && !current.is_empty() {
                runs.push(std::mem::take(&mut current));
            }
            let lower = token.as_str().to_lowercase();
            if STOPWORDS.contains(&lower) || lower.chars().all(|c| c.is_numeric()) {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
                continue;
            }
            current.push(lemmatize(&lower));
        }
        if !current.is_empty() {
            runs.push(current);
        }
        runs
    }

    /// Candidate phrases with occurrence counts, in first-occurrence order.
    pub fn candidates(&self, text: &str) -> IndexMap<String, usize> {
        let mut counts: IndexMap<String, usize> = IndexMap::new();
        for run in Self::runs(text) {
            for len in 1..=self.max_phrase_words.min(run.len()) {
                for window in run.windows(len) {
                    *counts.entry(window.join(" ")).or_default() += 1;
                }
            }
        }
        counts
    }
}

impl KeywordExtractor for LexicalKeywords {
    fn extract(&self, text: &str) -> Result<Vec<String>, ServiceError> {
        let mut ranked: Vec<(String, usize)> = self.candidates(text).into_iter().collect();
        // stable sort keeps first-occurrence order among equal counts
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(ranked
            .into_iter()
            .take(self.max_keywords)
            .map(|(kw, _)| kw)
            .collect())
    }
}

/// Keyphrases ranked by embedding similarity to the whole document.
///
/// Candidates come from [`LexicalKeywords`]; ties keep first-occurrence order.
#[derive(Clone)]
pub struct EmbeddingKeywords {
    embedder: Arc<dyn Embedder>,
    phrases: LexicalKeywords,
    max_keywords: usize,
}

impl EmbeddingKeywords {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self::with_limits(embedder, 5, 3)
    }

    pub fn with_limits(
        embedder: Arc<dyn Embedder>,
        max_keywords: usize,
        max_phrase_words: usize,
    ) -> Self {
        Self {
            embedder,
            phrases: LexicalKeywords::new(usize::MAX, max_phrase_words),
            max_keywords,
        }
    }
}

impl KeywordExtractor for EmbeddingKeywords {
    fn extract(&self, text: &str) -> Result<Vec<String>, ServiceError> {
        let phrases: Vec<String> = self.phrases.candidates(text).into_keys().collect();
        if phrases.is_empty() || self.max_keywords == 0 {
            return Ok(Vec::new());
        }
        let document = self.embedder.encode_one(text)?;
        let vectors = self.embedder.encode(&phrases)?;
        let dim = self.embedder.dimension();
        if vectors.len() != phrases.len()
            || document.len() != dim
            || vectors.iter().any(|v| v.len() != dim)
        {
            return Err(ServiceError::unavailable(
                "embedding",
                format!("expected {} vectors of dimension {dim}", phrases.len() + 1),
            ));
        }

        let mut scored: Vec<(String, f32)> = phrases
            .into_iter()
            .zip(&vectors)
            .map(|(phrase, vector)| (phrase, cosine(&document, vector)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(scored
            .into_iter()
            .take(self.max_keywords)
            .map(|(phrase, _)| phrase)
            .collect())
    }
}

/// Strip possessives and common inflection suffixes.
pub fn lemmatize(word: &str) -> String {
    let word = word
        .strip_suffix("'s")
        .or_else(|| word.strip_suffix("’s"))
        .unwrap_or(word);
    let len = word.chars().count();
    if len > 4 {
        if let Some(stem) = word.strip_suffix("ies") {
            return format!("{stem}y");
        }
        if let Some(stem) = word.strip_suffix("sses") {
            return format!("{stem}ss");
        }
    }
    if len > 3
        && word.ends_with('s')
        && !["ss", "us", "is"].iter().any(|suffix| word.ends_with(suffix))
    {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

//! Distractor generation: sense lookup, candidate formatting and diversity filtering.

use std::{collections::HashSet, sync::Arc};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    error::ServiceError,
    nlp::{
        embeddings::Embedder,
        mmr::{self, MmrConfig},
        senses::{SenseLookup, SenseTag},
    },
};

/// Tuning for the distractor pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistractorConfig {
    /// Similar senses requested from the lookup service.
    pub candidate_pool: usize,
    /// Distractors returned per answer.
    pub top_n: usize,
    /// MMR diversity weight for non-numeric answers.
    pub diversity: f32,
}

impl Default for DistractorConfig {
    fn default() -> Self {
        Self {
            candidate_pool: 20,
            top_n: 4,
            diversity: 0.9,
        }
    }
}

/// A formatted similar-sense candidate with the lookup's similarity score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub text: String,
    pub score: f32,
}

/// Why no distractors could be produced for an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum NoDistractorsReason {
    /// The answer has no entry in the sense index.
    NoSenseFound,
    /// Every similar sense collapsed into the answer or an earlier candidate.
    NoCandidates,
    /// An external service failed while serving this answer.
    ServiceUnavailable(String),
    /// The embedding service returned vectors the selector rejected.
    InvalidEmbeddings(String),
}

/// Result of a distractor request. Absence of distractors is a normal outcome
/// the caller handles by skipping the question.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DistractorOutcome {
    Distractors { distractors: Vec<String> },
    NoDistractors { reason: NoDistractorsReason },
}

impl DistractorOutcome {
    pub fn distractors(&self) -> Option<&[String]> {
        match self {
            Self::Distractors { distractors } => Some(distractors),
            Self::NoDistractors { .. } => None,
        }
    }

    pub fn has_distractors(&self) -> bool {
        matches!(self, Self::Distractors { .. })
    }
}

/// Generates false answers from a correct answer using injected services.
#[derive(Clone)]
pub struct DistractorGenerator {
    senses: Arc<dyn SenseLookup>,
    embedder: Arc<dyn Embedder>,
    config: DistractorConfig,
}

impl DistractorGenerator {
    pub fn new(senses: Arc<dyn SenseLookup>, embedder: Arc<dyn Embedder>) -> Self {
        Self::with_config(senses, embedder, DistractorConfig::default())
    }

    pub fn with_config(
        senses: Arc<dyn SenseLookup>,
        embedder: Arc<dyn Embedder>,
        config: DistractorConfig,
    ) -> Self {
        Self {
            senses,
            embedder,
            config,
        }
    }

    pub fn config(&self) -> &DistractorConfig {
        &self.config
    }

    /// Same service handles, different tuning.
    pub fn reconfigured(&self, config: DistractorConfig) -> Self {
        Self {
            config,
            ..self.clone()
        }
    }

    /// Produce up to `top_n` capitalized distractors for `answer`.
    ///
    /// Never fails: lookup and embedding problems degrade to `NoDistractors`.
    pub fn generate(&self, answer: &str) -> DistractorOutcome {
        match self.try_generate(answer) {
            Ok(distractors) => {
                debug!(%answer, count = distractors.len(), "generated distractors");
                DistractorOutcome::Distractors { distractors }
            }
            Err(reason) => {
                warn!(%answer, ?reason, "no distractors for answer");
                DistractorOutcome::NoDistractors { reason }
            }
        }
    }

    fn try_generate(&self, answer: &str) -> Result<Vec<String>, NoDistractorsReason> {
        let normalized = normalize_answer(answer);
        if normalized.is_empty() {
            return Err(NoDistractorsReason::NoSenseFound);
        }
        let sense = self
            .senses
            .best_sense(&normalized)
            .map_err(service_failure)?
            .ok_or(NoDistractorsReason::NoSenseFound)?;
        let similar = self
            .senses
            .most_similar(&sense, self.config.candidate_pool)
            .map_err(service_failure)?;
        info!(%sense, similar = similar.len(), "resolved answer sense");

        let candidates = format_candidates(answer, &sense, &similar);
        let Some(closest) = candidates.first() else {
            return Err(NoDistractorsReason::NoCandidates);
        };
        debug!(
            closest = %closest.text,
            score = closest.score,
            pool = candidates.len(),
            "formatted candidates"
        );

        let chosen: Vec<String> = if sense.is_cardinal() {
            candidates
                .into_iter()
                .take(self.config.top_n)
                .map(|c| c.text)
                .collect()
        } else {
            self.diversify(answer, candidates)?
        };
        Ok(chosen.iter().map(|text| capitalize_first(text)).collect())
    }

    fn diversify(
        &self,
        answer: &str,
        candidates: Vec<Candidate>,
    ) -> Result<Vec<String>, NoDistractorsReason> {
        let labels: Vec<String> = candidates.into_iter().map(|c| c.text).collect();
        let target = self.embedder.encode_one(answer).map_err(service_failure)?;
        let embeddings = self.embedder.encode(&labels).map_err(service_failure)?;
        let dim = self.embedder.dimension();
        if target.len() != dim {
            return Err(NoDistractorsReason::InvalidEmbeddings(format!(
                "answer vector has dimension {}, expected {dim}",
                target.len()
            )));
        }
        let config = MmrConfig {
            top_n: self.config.top_n,
            diversity: self.config.diversity,
        };
        let selection = mmr::select(&target, &embeddings, &labels, &config)
            .map_err(|err| NoDistractorsReason::InvalidEmbeddings(err.to_string()))?;
        Ok(selection.into_iter().map(|s| s.label).collect())
    }
}

fn service_failure(err: ServiceError) -> NoDistractorsReason {
    NoDistractorsReason::ServiceUnavailable(err.to_string())
}

/// Lowercase, trim and join words with underscores, the sense index key form.
pub fn normalize_answer(answer: &str) -> String {
    answer
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Turn similar senses into display candidates, keeping the lookup's ranking.
///
/// The correct answer seeds the duplicate filter and is never emitted.
/// Surface forms differing only in case or punctuation collapse to the first
/// one seen; for numeric senses, equal numeric values collapse as well.
pub fn format_candidates(
    answer: &str,
    sense: &SenseTag,
    similar: &[(SenseTag, f32)],
) -> Vec<Candidate> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut seen_numbers: HashSet<u64> = HashSet::new();
    seen.insert(dedup_key(answer));
    if sense.is_cardinal() {
        seen_numbers.extend(numeric_value(answer));
    }

    let mut out = Vec::new();
    for (tag, score) in similar {
        let text = tag.surface();
        let key = dedup_key(&text);
        if key.is_empty() || !seen.insert(key) {
            continue;
        }
        if sense.is_cardinal() {
            if let Some(value) = numeric_value(&text) {
                if !seen_numbers.insert(value) {
                    continue;
                }
            }
        }
        out.push(Candidate {
            text,
            score: *score,
        });
    }
    out
}

fn dedup_key(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Uppercase the first character, leaving the rest untouched.
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Parse digits ("1,200") or English number words ("twenty-one", "two hundred").
/// Values beyond `u64` yield `None`.
pub fn numeric_value(text: &str) -> Option<u64> {
    let compact: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' '))
        .collect();
    if !compact.is_empty() && compact.chars().all(|c| c.is_ascii_digit()) {
        return compact.parse().ok();
    }

    let lower = text.to_lowercase();
    let mut total = 0u64;
    let mut current = 0u64;
    let mut matched = false;
    for word in lower
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|w| !w.is_empty())
    {
        if word == "and" {
            continue;
        }
        if let Some(value) = small_number(word) {
            current = current.checked_add(value)?;
        } else if word == "hundred" {
            current = current.max(1).checked_mul(100)?;
        } else if let Some(scale) = scale_number(word) {
            total = total.checked_add(current.max(1).checked_mul(scale)?)?;
            current = 0;
        } else {
            return None;
        }
        matched = true;
    }
    if !matched {
        return None;
    }
    total.checked_add(current)
}

fn small_number(word: &str) -> Option<u64> {
    const UNITS: [&str; 20] = [
        "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
        "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
        "nineteen",
    ];
    const TENS: [&str; 8] = [
        "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
    ];
    if let Some(idx) = UNITS.iter().position(|w| *w == word) {
        return Some(idx as u64);
    }
    TENS.iter()
        .position(|w| *w == word)
        .map(|idx| (idx as u64 + 2) * 10)
}

fn scale_number(word: &str) -> Option<u64> {
    match word {
        "thousand" => Some(1_000),
        "million" => Some(1_000_000),
        "billion" => Some(1_000_000_000),
        _ => None,
    }
}

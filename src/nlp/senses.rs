//! Word-sense lookup: sense tags and an in-memory sense vector index.

use std::{collections::HashMap, fmt, fs::File, io::Read, path::Path, str::FromStr, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use tracing::info;

use crate::{
    config::Settings,
    error::ServiceError,
    nlp::similarity::{cosine, l2_normalize},
};

/// Category marking numeric answers.
pub const CARDINAL: &str = "CARDINAL";

/// A word paired with its category, serialised as `word|CATEGORY`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SenseTag {
    word: String,
    category: String,
}

impl SenseTag {
    pub fn new(word: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            category: category.into(),
        }
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn is_cardinal(&self) -> bool {
        self.category == CARDINAL
    }

    /// Display text: underscores become spaces.
    pub fn surface(&self) -> String {
        self.word.replace('_', " ").trim().to_string()
    }
}

impl fmt::Display for SenseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.word, self.category)
    }
}

impl FromStr for SenseTag {
    type Err = anyhow::Error;

    fn from_str(key: &str) -> Result<Self> {
        let (word, category) = key
            .rsplit_once('|')
            .ok_or_else(|| anyhow!("sense key {key:?} lacks a category"))?;
        if word.is_empty() || category.is_empty() {
            bail!("sense key {key:?} has an empty word or category");
        }
        Ok(Self::new(word, category))
    }
}

/// Sense disambiguation and neighbourhood lookup.
pub trait SenseLookup: Send + Sync {
    /// Most frequent sense of a normalized word, if the word is known.
    fn best_sense(&self, word: &str) -> Result<Option<SenseTag>, ServiceError>;

    /// Up to `n` other senses ranked by similarity, highest first.
    fn most_similar(&self, sense: &SenseTag, n: usize) -> Result<Vec<(SenseTag, f32)>, ServiceError>;
}

#[derive(Debug, Clone)]
struct SenseEntry {
    tag: SenseTag,
    frequency: u64,
    vector: Vec<f32>,
}

/// Sense vectors held in memory, searched by brute-force cosine.
#[derive(Debug, Default)]
pub struct SenseIndex {
    entries: Vec<SenseEntry>,
    by_key: HashMap<String, usize>,
    by_word: HashMap<String, Vec<usize>>,
    dimension: usize,
}

impl SenseIndex {
    /// Load a table of `key<TAB>frequency<TAB>v1<TAB>v2...` rows.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("open sense table {path:?}"))?;
        let index = Self::from_reader(file)?;
        info!(path = %path.display(), senses = index.len(), dim = index.dimension, "loaded sense index");
        Ok(index)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .comment(Some(b'#'))
            .from_reader(reader);
        let mut index = Self::default();
        for (line, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("read sense row {line}"))?;
            let key = record
                .get(0)
                .ok_or_else(|| anyhow!("sense row {line} is empty"))?;
            let frequency: u64 = record
                .get(1)
                .ok_or_else(|| anyhow!("sense row {line} lacks a frequency"))?
                .trim()
                .parse()
                .with_context(|| format!("sense row {line} frequency"))?;
            let vector = record
                .iter()
                .skip(2)
                .map(|v| v.trim().parse::<f32>())
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("sense row {line} vector"))?;
            index.insert(key.parse()?, frequency, vector)?;
        }
        Ok(index)
    }

    /// Add one sense; later duplicates of a key are rejected.
    pub fn insert(&mut self, tag: SenseTag, frequency: u64, mut vector: Vec<f32>) -> Result<()> {
        if vector.is_empty() {
            bail!("sense {tag} has an empty vector");
        }
        if self.entries.is_empty() {
            self.dimension = vector.len();
        } else if vector.len() != self.dimension {
            bail!(
                "sense {tag} has dimension {}, expected {}",
                vector.len(),
                self.dimension
            );
        }
        let key = tag.to_string();
        if self.by_key.contains_key(&key) {
            bail!("duplicate sense {key}");
        }
        l2_normalize(&mut vector);
        let idx = self.entries.len();
        self.by_word.entry(tag.word.clone()).or_default().push(idx);
        self.by_key.insert(key, idx);
        self.entries.push(SenseEntry {
            tag,
            frequency,
            vector,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, sense: &SenseTag) -> bool {
        self.by_key.contains_key(&sense.to_string())
    }
}

impl SenseLookup for SenseIndex {
    fn best_sense(&self, word: &str) -> Result<Option<SenseTag>, ServiceError> {
        let Some(indices) = self.by_word.get(word) else {
            return Ok(None);
        };
        let mut best: Option<&SenseEntry> = None;
        for entry in indices.iter().map(|&i| &self.entries[i]) {
            if best.map_or(true, |b| entry.frequency > b.frequency) {
                best = Some(entry);
            }
        }
        Ok(best.map(|entry| entry.tag.clone()))
    }

    fn most_similar(&self, sense: &SenseTag, n: usize) -> Result<Vec<(SenseTag, f32)>, ServiceError> {
        let Some(&query_idx) = self.by_key.get(&sense.to_string()) else {
            return Ok(Vec::new());
        };
        let query = &self.entries[query_idx].vector;
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != query_idx)
            .map(|(idx, entry)| (idx, cosine(query, &entry.vector)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(n);
        Ok(scored
            .into_iter()
            .map(|(idx, score)| (self.entries[idx].tag.clone(), score))
            .collect())
    }
}

/// Open the provisioned sense table.
pub fn load_sense_lookup(settings: &Settings) -> Result<Arc<dyn SenseLookup>> {
    let path = &settings.sense_vectors_path;
    if !path.exists() {
        bail!(
            "sense table {} missing; run `quizgen fetch` or set SENSE_VECTORS_PATH",
            path.display()
        );
    }
    Ok(Arc::new(SenseIndex::open(path)?) as Arc<dyn SenseLookup>)
}

//! Maximal Marginal Relevance selection over candidate embeddings.
//!
//! Relevance of every candidate to the target and the candidate-candidate
//! similarity matrix are computed once up front; the greedy loop then only
//! moves indices from `remaining` to `selected`. Both index lists stay in
//! ascending candidate order, which makes tie-breaking deterministic.

use std::collections::HashSet;

use serde::Serialize;

use crate::{error::SelectError, nlp::similarity::cosine_matrix};

/// Selector parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MmrConfig {
    /// Number of candidates to keep; clamped to the pool size.
    pub top_n: usize,
    /// 0 ranks purely by relevance, 1 purely by dissimilarity to the selection.
    pub diversity: f32,
}

impl Default for MmrConfig {
    fn default() -> Self {
        Self {
            top_n: 4,
            diversity: 0.9,
        }
    }
}

/// A chosen label with its relevance to the target, rounded to 4 decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredLabel {
    pub label: String,
    pub relevance: f64,
}

/// Greedily pick up to `config.top_n` labels balancing relevance to `target`
/// against redundancy with what is already picked.
///
/// Output order is selection order, most relevant first.
pub fn select(
    target: &[f32],
    candidates: &[Vec<f32>],
    labels: &[String],
    config: &MmrConfig,
) -> Result<Vec<ScoredLabel>, SelectError> {
    validate(target, candidates, labels, config)?;

    let dim = target.len();
    let target_row = [target.to_vec()];
    let relevance = cosine_matrix(candidates, &target_row, dim).column(0).to_vec();
    let pairwise = cosine_matrix(candidates, candidates, dim);

    let top_n = config.top_n.min(candidates.len());
    let diversity = config.diversity;

    let seed = argmax(0..candidates.len(), |i| relevance[i]);
    let mut selected = vec![seed];
    let mut remaining: Vec<usize> = (0..candidates.len()).filter(|&i| i != seed).collect();

    while selected.len() < top_n {
        let best = argmax(remaining.iter().copied(), |i| {
            let redundancy = selected
                .iter()
                .map(|&s| pairwise[[i, s]])
                .fold(f32::NEG_INFINITY, f32::max);
            (1.0 - diversity) * relevance[i] - diversity * redundancy
        });
        remaining.retain(|&i| i != best);
        selected.push(best);
    }

    Ok(selected
        .into_iter()
        .map(|i| ScoredLabel {
            label: labels[i].clone(),
            relevance: round4(relevance[i]),
        })
        .collect())
}

fn validate(
    target: &[f32],
    candidates: &[Vec<f32>],
    labels: &[String],
    config: &MmrConfig,
) -> Result<(), SelectError> {
    if candidates.is_empty() {
        return Err(SelectError::InvalidInput("candidate pool is empty".into()));
    }
    if candidates.len() != labels.len() {
        return Err(SelectError::InvalidInput(format!(
            "{} embeddings but {} labels",
            candidates.len(),
            labels.len()
        )));
    }
    if config.top_n == 0 {
        return Err(SelectError::InvalidInput("top_n must be positive".into()));
    }
    if !(0.0..=1.0).contains(&config.diversity) {
        return Err(SelectError::InvalidInput(format!(
            "diversity {} outside [0, 1]",
            config.diversity
        )));
    }
    if target.is_empty() || !target.iter().all(|v| v.is_finite()) {
        return Err(SelectError::InvalidInput(
            "target embedding is empty or non-finite".into(),
        ));
    }
    for (idx, vector) in candidates.iter().enumerate() {
        if vector.len() != target.len() {
            return Err(SelectError::InvalidInput(format!(
                "candidate {idx} has dimension {}, expected {}",
                vector.len(),
                target.len()
            )));
        }
        if !vector.iter().all(|v| v.is_finite()) {
            return Err(SelectError::InvalidInput(format!(
                "candidate {idx} embedding is non-finite"
            )));
        }
    }
    let mut seen = HashSet::with_capacity(labels.len());
    if let Some(dup) = labels.iter().find(|label| !seen.insert(label.as_str())) {
        return Err(SelectError::InvalidInput(format!("duplicate label {dup:?}")));
    }
    Ok(())
}

/// First index reaching the maximum score in iteration order.
fn argmax<I, F>(indices: I, score: F) -> usize
where
    I: IntoIterator<Item = usize>,
    F: Fn(usize) -> f32,
{
    let mut best: Option<(usize, f32)> = None;
    for idx in indices {
        let value = score(idx);
        match best {
            Some((_, top)) if value <= top => {}
            _ => best = Some((idx, value)),
        }
    }
    best.map(|(idx, _)| idx).unwrap_or_default()
}

fn round4(value: f32) -> f64 {
    (f64::from(value) * 10_000.0).round() / 10_000.0
}

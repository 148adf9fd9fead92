//! Request and response bodies for the JSON API.

use serde::{Deserialize, Serialize};

use crate::nlp::{distractors::NoDistractorsReason, summarizer::SummaryParams};

#[derive(Debug, Clone, Deserialize)]
pub struct DistractorRequest {
    pub answer: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistractorDto {
    pub answer: String,
    /// `None` when the question should be skipped.
    pub distractors: Option<Vec<String>>,
    pub reason: Option<NoDistractorsReason>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeywordRequest {
    pub original: String,
    pub summarized: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeywordDto {
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryRequest {
    pub text: String,
    pub beam_count: Option<usize>,
    pub no_repeat_ngram_size: Option<usize>,
    pub max_output_length: Option<usize>,
    pub max_input_length: Option<usize>,
    pub num_return_sequences: Option<usize>,
}

impl SummaryRequest {
    /// Request fields layered over server defaults.
    pub fn params(&self, defaults: SummaryParams) -> SummaryParams {
        SummaryParams {
            beam_count: self.beam_count.unwrap_or(defaults.beam_count),
            no_repeat_ngram_size: self
                .no_repeat_ngram_size
                .unwrap_or(defaults.no_repeat_ngram_size),
            max_output_length: self.max_output_length.unwrap_or(defaults.max_output_length),
            max_input_length: self.max_input_length.unwrap_or(defaults.max_input_length),
            num_return_sequences: self
                .num_return_sequences
                .unwrap_or(defaults.num_return_sequences),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryDto {
    pub summary: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthDto {
    pub status: &'static str,
    pub summaries: bool,
}

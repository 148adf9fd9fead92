//! Abstractive summarization through an external encoder-decoder service.
//!
//! Tokenization happens locally; beam search runs behind the [`Generator`]
//! seam, normally a remote service reached over HTTP.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{
    config::Settings,
    error::{ServiceError, SummarizeError},
};

/// Token ids and attention mask for one input, unpadded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub input_ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
}

/// Text to token ids and back.
pub trait TextTokenizer: Send + Sync {
    /// Encode with special tokens, truncated to `max_length`, never padded.
    fn encode(&self, text: &str, max_length: usize) -> Result<Encoded, ServiceError>;

    /// Decode ids, dropping special tokens.
    fn decode(&self, ids: &[u32]) -> Result<String, ServiceError>;
}

/// Beam search request sent to the generation service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub input_ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub num_beams: usize,
    pub no_repeat_ngram_size: usize,
    pub max_length: usize,
    pub num_return_sequences: usize,
    pub early_stopping: bool,
}

/// Sequence generation service returning token sequences, best first.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Vec<u32>>, ServiceError>;
}

/// Per-request generation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SummaryParams {
    pub beam_count: usize,
    pub no_repeat_ngram_size: usize,
    pub max_output_length: usize,
    pub max_input_length: usize,
    pub num_return_sequences: usize,
}

impl Default for SummaryParams {
    fn default() -> Self {
        Self {
            beam_count: 4,
            no_repeat_ngram_size: 2,
            max_output_length: 128,
            max_input_length: 512,
            num_return_sequences: 1,
        }
    }
}

impl SummaryParams {
    /// Defaults with the input cap taken from `SUMMARY_MAX_INPUT_TOKENS`.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_input_length: settings.summary_max_input_tokens,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), SummarizeError> {
        let invalid = |msg: &str| Err(SummarizeError::InvalidRequest(msg.to_string()));
        if self.beam_count == 0 {
            return invalid("beam_count must be at least 1");
        }
        if self.max_output_length == 0 {
            return invalid("max_output_length must be at least 1");
        }
        if self.max_input_length == 0 {
            return invalid("max_input_length must be at least 1");
        }
        if self.num_return_sequences == 0 || self.num_return_sequences > self.beam_count {
            return invalid("num_return_sequences must be between 1 and beam_count");
        }
        Ok(())
    }
}

/// Summarization orchestrator over injected tokenizer and generator handles.
#[derive(Clone)]
pub struct Summarizer {
    tokenizer: Arc<dyn TextTokenizer>,
    generator: Arc<dyn Generator>,
    task_prefix: String,
}

impl Summarizer {
    pub fn new(tokenizer: Arc<dyn TextTokenizer>, generator: Arc<dyn Generator>) -> Self {
        Self {
            tokenizer,
            generator,
            task_prefix: String::new(),
        }
    }

    /// Prefix prepended to every input, e.g. `"summarize: "` for T5 checkpoints.
    pub fn with_task_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.task_prefix = prefix.into();
        self
    }

    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn summarize(
        &self,
        text: &str,
        params: &SummaryParams,
    ) -> Result<String, SummarizeError> {
        params.validate()?;
        let text = text.trim();
        if text.is_empty() {
            return Err(SummarizeError::InvalidRequest("text is empty".into()));
        }

        let input = format!("{}{}", self.task_prefix, text);
        let encoded = self.tokenizer.encode(&input, params.max_input_length)?;
        debug!(tokens = encoded.input_ids.len(), "encoded summarizer input");

        let request = GenerationRequest {
            input_ids: encoded.input_ids,
            attention_mask: encoded.attention_mask,
            num_beams: params.beam_count,
            no_repeat_ngram_size: params.no_repeat_ngram_size,
            max_length: params.max_output_length,
            num_return_sequences: params.num_return_sequences,
            early_stopping: true,
        };
        let sequences = self.generator.generate(&request).await?;
        let best = sequences.first().ok_or_else(|| {
            SummarizeError::ModelUnavailable("generation service returned no sequences".into())
        })?;

        let decoded = self.tokenizer.decode(best)?;
        let summary = clean_up_tokenization(&decoded);
        info!(output_chars = summary.len(), "generated summary");
        Ok(summary)
    }
}

static SPECIAL_TOKENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<pad>|</s>|<s>|<unk>|<extra_id_\d+>").expect("valid regex"));

static SPACE_BEFORE_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" ([.,!?;:]|n't|'m|'s|'ve|'re|'ll|'d)").expect("valid regex"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Remove leftover special tokens and tokenizer spacing artefacts.
pub fn clean_up_tokenization(text: &str) -> String {
    let stripped = SPECIAL_TOKENS.replace_all(text, " ");
    let collapsed = WHITESPACE.replace_all(stripped.trim(), " ");
    SPACE_BEFORE_PUNCT
        .replace_all(&collapsed, "$1")
        .replace(" ' ", "'")
}

/// Generation service reached over HTTP with a JSON body.
#[derive(Debug, Clone)]
pub struct RemoteGenerator {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    sequences: Vec<Vec<u32>>,
}

impl RemoteGenerator {
    pub fn new(endpoint: impl Into<String>, settings: &Settings) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .user_agent(concat!("quizgen/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.generation_timeout())
            .gzip(true)
            .build()
            .map_err(|err| ServiceError::unavailable("generation", err))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Generator for RemoteGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Vec<u32>>, ServiceError> {
        let unavailable = |err: reqwest::Error| ServiceError::unavailable("generation", err);
        let resp = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(unavailable)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ServiceError::unavailable(
                "generation",
                format!("{} returned {status}", self.endpoint),
            ));
        }
        let payload: GenerationResponse = resp.json().await.map_err(unavailable)?;
        Ok(payload.sequences)
    }
}

/// `tokenizers`-backed tokenizer loaded from a `tokenizer.json`.
#[cfg(feature = "summaries")]
pub struct HfTokenizer {
    inner: tokenizers::Tokenizer,
    eos_id: Option<u32>,
}

#[cfg(feature = "summaries")]
impl HfTokenizer {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ServiceError> {
        let mut inner = tokenizers::Tokenizer::from_file(path)
            .map_err(|err| ServiceError::unavailable("tokenizer", err))?;
        inner.with_padding(None);
        let eos_id = inner.token_to_id("</s>");
        Ok(Self { inner, eos_id })
    }
}

#[cfg(feature = "summaries")]
impl TextTokenizer for HfTokenizer {
    fn encode(&self, text: &str, max_length: usize) -> Result<Encoded, ServiceError> {
        let encoding = self
            .inner
            .encode(text, true)
            .map_err(|err| ServiceError::unavailable("tokenizer", err))?;
        let mut input_ids = encoding.get_ids().to_vec();
        if input_ids.len() > max_length {
            let eos = self.eos_id.filter(|id| input_ids.last() == Some(id));
            input_ids.truncate(max_length - usize::from(eos.is_some()));
            input_ids.extend(eos);
        }
        let attention_mask = vec![1; input_ids.len()];
        Ok(Encoded {
            input_ids,
            attention_mask,
        })
    }

    fn decode(&self, ids: &[u32]) -> Result<String, ServiceError> {
        self.inner
            .decode(ids, true)
            .map_err(|err| ServiceError::unavailable("tokenizer", err))
    }
}

/// Wire up the summarizer from provisioned artefacts and the configured service.
pub fn load_summarizer(settings: &Settings) -> Result<Summarizer, SummarizeError> {
    let endpoint = settings.generation_url.as_deref().ok_or_else(|| {
        SummarizeError::ModelUnavailable("GENERATION_URL is not configured".into())
    })?;
    let generator = Arc::new(RemoteGenerator::new(endpoint, settings)?) as Arc<dyn Generator>;
    let tokenizer = load_tokenizer(settings)?;
    Ok(Summarizer::new(tokenizer, generator).with_task_prefix(settings.summary_task_prefix.clone()))
}

#[cfg(feature = "summaries")]
fn load_tokenizer(settings: &Settings) -> Result<Arc<dyn TextTokenizer>, SummarizeError> {
    let path = settings.summarizer_dir.join("tokenizer.json");
    if !path.exists() {
        return Err(SummarizeError::ModelUnavailable(format!(
            "tokenizer {} missing; run `quizgen fetch`",
            path.display()
        )));
    }
    let tokenizer = HfTokenizer::from_file(&path)?;
    info!(path = %path.display(), "loaded summarizer tokenizer");
    Ok(Arc::new(tokenizer) as Arc<dyn TextTokenizer>)
}

#[cfg(not(feature = "summaries"))]
fn load_tokenizer(_settings: &Settings) -> Result<Arc<dyn TextTokenizer>, SummarizeError> {
    Err(SummarizeError::ModelUnavailable(
        "built without the `summaries` feature".into(),
    ))
}

//! CLI entry-point for abstractive summaries.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use crate::{
    cli::keywords::read_text,
    config::Settings,
    nlp::summarizer::{self, SummaryParams},
};

/// Args for the `summarize` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Text to summarize.
    #[arg(long, conflicts_with = "input", required_unless_present = "input")]
    pub text: Option<String>,
    /// File holding the text to summarize.
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Beam count for beam search.
    #[arg(long, default_value_t = 4)]
    pub beams: usize,
    /// N-gram size that may occur only once in the output.
    #[arg(long, default_value_t = 2)]
    pub no_repeat_ngram: usize,
    /// Maximum generated tokens.
    #[arg(long, default_value_t = 128)]
    pub max_length: usize,
    /// Input token cap; defaults to SUMMARY_MAX_INPUT_TOKENS.
    #[arg(long)]
    pub max_input: Option<usize>,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let text = read_text(args.text, args.input)?;
    let defaults = SummaryParams::from_settings(&settings);
    let params = SummaryParams {
        beam_count: args.beams,
        no_repeat_ngram_size: args.no_repeat_ngram,
        max_output_length: args.max_length,
        max_input_length: args.max_input.unwrap_or(defaults.max_input_length),
        ..defaults
    };
    let summarizer = summarizer::load_summarizer(&settings)?;
    let summary = summarizer.summarize(&text, &params).await?;
    info!(chars = summary.len(), "generated summary");
    println!("{summary}");
    Ok(())
}

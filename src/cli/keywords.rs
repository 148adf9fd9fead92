//! CLI entry-point for the keyword overlap filter.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use crate::{
    config::Settings,
    nlp::{
        embeddings,
        keywords::{common_keywords, EmbeddingKeywords},
    },
};

/// Args for the `keywords` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Original text.
    #[arg(long, conflicts_with = "original_file", required_unless_present = "original_file")]
    pub original: Option<String>,
    /// File holding the original text.
    #[arg(long)]
    pub original_file: Option<PathBuf>,
    /// Summarized text.
    #[arg(long, conflicts_with = "summary_file", required_unless_present = "summary_file")]
    pub summary: Option<String>,
    /// File holding the summarized text.
    #[arg(long)]
    pub summary_file: Option<PathBuf>,
    /// Keywords extracted per text.
    #[arg(long, default_value_t = 5)]
    pub max_keywords: usize,
    /// Longest keyphrase in words.
    #[arg(long, default_value_t = 3)]
    pub max_phrase_words: usize,
}

#[instrument(skip(args, settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let original = read_text(args.original, args.original_file)?;
    let summary = read_text(args.summary, args.summary_file)?;
    let embedder = embeddings::load_embedder(&settings)?;
    let extractor =
        EmbeddingKeywords::with_limits(embedder, args.max_keywords, args.max_phrase_words);
    let shared = common_keywords(&extractor, &original, &summary)?;
    info!(count = shared.len(), "computed common keywords");
    for keyword in shared {
        println!("{keyword}");
    }
    Ok(())
}

pub(crate) fn read_text(inline: Option<String>, file: Option<PathBuf>) -> Result<String> {
    match (inline, file) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) => {
            std::fs::read_to_string(&path).with_context(|| format!("read {path:?}"))
        }
        (None, None) => anyhow::bail!("no text supplied"),
    }
}

//! CLI entry-point for distractor generation.

use anyhow::Result;
use clap::Args as ClapArgs;
use serde::Serialize;
use tracing::instrument;

use crate::{
    config::Settings,
    nlp::{self, distractors::DistractorOutcome},
};

/// Args for the `distract` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Correct answers to generate false options for.
    #[arg(required = true)]
    pub answers: Vec<String>,
    /// Distractors per answer.
    #[arg(long, default_value_t = 4)]
    pub top_n: usize,
    /// Diversity weight in [0, 1].
    #[arg(long, default_value_t = 0.9, value_parser = parse_diversity)]
    pub diversity: f32,
}

fn parse_diversity(raw: &str) -> Result<f32, String> {
    let value: f32 = raw.parse().map_err(|err| format!("{raw:?} is not a number: {err}"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is outside [0, 1]"))
    }
}

#[derive(Debug, Serialize)]
struct AnswerReport<'a> {
    answer: &'a str,
    #[serde(flatten)]
    outcome: DistractorOutcome,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    let generator = nlp::load_distractors(&settings)?;
    let mut config = *generator.config();
    config.top_n = args.top_n;
    config.diversity = args.diversity;
    let generator = generator.reconfigured(config);

    let reports: Vec<AnswerReport<'_>> = args
        .answers
        .iter()
        .map(|answer| AnswerReport {
            answer,
            outcome: generator.generate(answer),
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}

//! Command-line interface wiring for quizgen.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Settings;

pub mod distract;
pub mod fetch;
pub mod keywords;
pub mod serve;
pub mod summarize;

/// Top-level CLI definition.
#[derive(Debug, Parser)]
#[command(author, version, about = "Quiz distractor and summary assistant", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Parse CLI arguments from the environment.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Dispatch the selected sub-command.
    pub async fn dispatch(self, settings: Settings) -> Result<()> {
        match self.command {
            Commands::Fetch => fetch::run(settings).await,
            Commands::Distract(args) => distract::run(args, settings).await,
            Commands::Keywords(args) => keywords::run(args, settings).await,
            Commands::Summarize(args) => summarize::run(args, settings).await,
            Commands::Serve(args) => serve::run(args, settings).await,
        }
    }
}

/// Supported sub-commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Download missing model artefacts.
    Fetch,
    /// Generate distractors for one or more correct answers.
    Distract(distract::Args),
    /// List keywords shared by an original text and its summary.
    Keywords(keywords::Args),
    /// Summarize text through the generation service.
    Summarize(summarize::Args),
    /// Serve the JSON API.
    Serve(serve::Args),
}

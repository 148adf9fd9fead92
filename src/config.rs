//! Runtime configuration for quizgen.

use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;

/// Application configuration resolved from `.env` and defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Root folder for provisioned model artefacts.
    pub models_dir: PathBuf,
    /// Tab-separated sense vector table.
    pub sense_vectors_path: PathBuf,
    /// Zip archive holding the sense table, fetched when the table is missing.
    pub sense_archive_url: Option<String>,
    /// Folder holding the summarizer `tokenizer.json`.
    pub summarizer_dir: PathBuf,
    /// Zip archive holding the summarizer artefacts.
    pub summarizer_archive_url: Option<String>,
    /// Endpoint of the sequence generation service.
    pub generation_url: Option<String>,
    /// Request timeout for the generation service.
    pub generation_timeout_secs: u64,
    /// Input token cap applied before generation.
    pub summary_max_input_tokens: usize,
    /// Task prefix prepended to summarizer input.
    pub summary_task_prefix: String,
}

impl Settings {
    /// Load configuration from environment with reasonable defaults.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let models_dir = env::var("MODELS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./resources"));
        std::fs::create_dir_all(&models_dir).context("creating models dir")?;

        let mut settings = Self::rooted_at(models_dir);
        if let Ok(path) = env::var("SENSE_VECTORS_PATH") {
            settings.sense_vectors_path = PathBuf::from(path);
        }
        if let Ok(path) = env::var("SUMMARIZER_DIR") {
            settings.summarizer_dir = PathBuf::from(path);
        }
        settings.sense_archive_url = non_empty_var("SENSE_ARCHIVE_URL");
        settings.summarizer_archive_url = non_empty_var("SUMMARIZER_ARCHIVE_URL");
        settings.generation_url = non_empty_var("GENERATION_URL");
        settings.generation_timeout_secs = parsed_var("GENERATION_TIMEOUT_SECS").unwrap_or(60);
        settings.summary_max_input_tokens =
            parsed_var("SUMMARY_MAX_INPUT_TOKENS").unwrap_or(512);
        if let Ok(prefix) = env::var("SUMMARY_TASK_PREFIX") {
            settings.summary_task_prefix = prefix;
        }
        Ok(settings)
    }

    /// Defaults laid out beneath `models_dir`, without touching the environment.
    pub fn rooted_at<P: Into<PathBuf>>(models_dir: P) -> Self {
        let models_dir = models_dir.into();
        Self {
            sense_vectors_path: models_dir.join("s2v/vectors.tsv"),
            sense_archive_url: None,
            summarizer_dir: models_dir.join("summarizer"),
            summarizer_archive_url: None,
            generation_url: None,
            generation_timeout_secs: 60,
            summary_max_input_tokens: 512,
            summary_task_prefix: "summarize: ".to_string(),
            models_dir,
        }
    }

    /// Convenience helper for derived model path segments.
    pub fn join_model<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.models_dir.join(path)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

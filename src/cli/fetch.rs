//! CLI entry-point for provisioning model artefacts.

use anyhow::Result;
use tracing::{info, instrument};

use crate::{
    config::Settings,
    data::artifacts::{self, ArtifactStatus},
};

#[instrument(skip(settings))]
pub async fn run(settings: Settings) -> Result<()> {
    let outcomes = artifacts::provision(&settings).await?;
    for (artifact, status) in &outcomes {
        info!(name = artifact.name, ?status, "artefact status");
        let label = match status {
            ArtifactStatus::Cached => "cached".to_string(),
            ArtifactStatus::Downloaded { files } => format!("downloaded ({files} files)"),
            ArtifactStatus::Missing => "missing (no archive url)".to_string(),
        };
        println!("{:<14} {label}  {}", artifact.name, artifact.marker.display());
    }
    Ok(())
}

//! Model artefact provisioning from remote zip archives.

use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use tracing::{info, warn};
use zip::ZipArchive;

use crate::config::Settings;

/// One downloadable artefact bundle.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub name: &'static str,
    /// File whose presence marks the bundle as provisioned.
    pub marker: PathBuf,
    /// Directory the archive is unpacked into.
    pub dest_dir: PathBuf,
    pub archive_url: Option<String>,
}

/// Where an artefact ended up after provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactStatus {
    Cached,
    Downloaded { files: usize },
    /// Absent locally and no archive URL configured.
    Missing,
}

/// Artefacts the pipelines need, derived from settings.
pub fn required_artifacts(settings: &Settings) -> Vec<Artifact> {
    let sense_dir = settings
        .sense_vectors_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| settings.models_dir.clone());
    vec![
        Artifact {
            name: "sense-vectors",
            marker: settings.sense_vectors_path.clone(),
            dest_dir: sense_dir,
            archive_url: settings.sense_archive_url.clone(),
        },
        Artifact {
            name: "summarizer",
            marker: settings.summarizer_dir.join("tokenizer.json"),
            dest_dir: settings.summarizer_dir.clone(),
            archive_url: settings.summarizer_archive_url.clone(),
        },
    ]
}

/// Ensure every required artefact is present, downloading what is missing.
pub async fn provision(settings: &Settings) -> Result<Vec<(Artifact, ArtifactStatus)>> {
    let client = Client::builder()
        .user_agent(concat!("quizgen/", env!("CARGO_PKG_VERSION")))
        .gzip(true)
        .brotli(true)
        .build()?;

    let mut outcomes = Vec::new();
    for artifact in required_artifacts(settings) {
        let status = ensure_artifact(&client, &artifact, &settings.models_dir).await?;
        outcomes.push((artifact, status));
    }
    Ok(outcomes)
}

async fn ensure_artifact(
    client: &Client,
    artifact: &Artifact,
    models_dir: &Path,
) -> Result<ArtifactStatus> {
    if artifact.marker.exists() {
        info!(name = artifact.name, path = %artifact.marker.display(), "using cached artefact");
        return Ok(ArtifactStatus::Cached);
    }
    let Some(url) = artifact.archive_url.as_deref() else {
        warn!(name = artifact.name, path = %artifact.marker.display(), "artefact missing and no archive url configured");
        return Ok(ArtifactStatus::Missing);
    };

    std::fs::create_dir_all(&artifact.dest_dir)
        .with_context(|| format!("create {:?}", artifact.dest_dir))?;
    let archive_path = models_dir.join(format!("{}.zip", artifact.name));
    download_archive(client, url, &archive_path).await?;

    let dest = artifact.dest_dir.clone();
    let archive = archive_path.clone();
    let files = tokio::task::spawn_blocking(move || extract_archive(&archive, &dest)).await??;
    std::fs::remove_file(&archive_path).ok();

    if !artifact.marker.exists() {
        return Err(anyhow!(
            "archive for {} did not contain {}",
            artifact.name,
            artifact.marker.display()
        ));
    }
    info!(name = artifact.name, files, "provisioned artefact");
    Ok(ArtifactStatus::Downloaded { files })
}

async fn download_archive(client: &Client, url: &str, dest: &Path) -> Result<()> {
    info!(%url, "downloading artefact archive");
    let resp = client.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(anyhow!("download of {url} failed with {}", resp.status()));
    }
    let bytes = resp.bytes().await?;
    let mut file = File::create(dest).with_context(|| format!("create {dest:?}"))?;
    file.write_all(&bytes)?;
    info!(?dest, size = bytes.len(), "downloaded artefact archive");
    Ok(())
}

/// Unpack a zip archive into `dest_dir`, returning the number of entries.
pub fn extract_archive(archive_path: &Path, dest_dir: &Path) -> Result<usize> {
    let file =
        File::open(archive_path).with_context(|| format!("open archive {archive_path:?}"))?;
    let mut archive = ZipArchive::new(file)?;
    let entries = archive.len();
    archive
        .extract(dest_dir)
        .with_context(|| format!("extract {archive_path:?} into {dest_dir:?}"))?;
    Ok(entries)
}

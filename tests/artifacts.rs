use std::{fs::File, io::Write};

use quizgen::{
    config::Settings,
    data::artifacts::{extract_archive, provision, required_artifacts, ArtifactStatus},
};
use zip::{write::FileOptions, ZipWriter};

fn write_zip(path: &std::path::Path, entries: &[(&str, &str)]) {
    let mut writer = ZipWriter::new(File::create(path).unwrap());
    for (name, body) in entries {
        writer.start_file(*name, FileOptions::default()).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

#[test]
fn archives_unpack_into_destination() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("bundle.zip");
    write_zip(
        &archive,
        &[("vectors.tsv", "a|NOUN\t1\t1.0\n"), ("nested/readme.txt", "hi")],
    );
    let dest = dir.path().join("out");
    let files = extract_archive(&archive, &dest).unwrap();
    assert_eq!(files, 2);
    assert!(dest.join("vectors.tsv").exists());
    assert!(dest.join("nested/readme.txt").exists());
}

#[test]
fn artifacts_follow_settings_layout() {
    let settings = Settings::rooted_at("/models");
    let artifacts = required_artifacts(&settings);
    let names: Vec<&str> = artifacts.iter().map(|a| a.name).collect();
    assert_eq!(names, vec!["sense-vectors", "summarizer"]);
    assert_eq!(artifacts[0].dest_dir, std::path::Path::new("/models/s2v"));
    assert_eq!(
        artifacts[1].marker,
        std::path::Path::new("/models/summarizer/tokenizer.json")
    );
}

#[tokio::test]
async fn present_or_unconfigured_artifacts_need_no_network() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::rooted_at(dir.path());
    std::fs::create_dir_all(settings.sense_vectors_path.parent().unwrap()).unwrap();
    std::fs::write(&settings.sense_vectors_path, "a|NOUN\t1\t1.0\n").unwrap();

    let outcomes = provision(&settings).await.unwrap();
    let statuses: Vec<&ArtifactStatus> = outcomes.iter().map(|(_, s)| s).collect();
    assert_eq!(statuses, vec![&ArtifactStatus::Cached, &ArtifactStatus::Missing]);
}

//! Artefact provisioning layer.

pub mod artifacts;

//! probes.toml seed-manifest parser.
//!
//! A manifest declares the monitored-service types (and optionally their
//! initial targets) that an operator wants registered, replacing per-service
//! one-off seeding scripts. `probectl apply` consumes it.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedManifest {
    #[serde(default)]
    pub services: Vec<SeedService>,
}

/// One monitored-service type declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedService {
    pub name: String,
    /// Probe protocol family: "mongodb", "redis", "http_json", ...
    pub db_type: String,
    pub commands: Vec<String>,
    pub sample_count: u32,
    pub interval_seconds: u64,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Initial targets as `host:port` strings.
    #[serde(default)]
    pub targets: Vec<String>,
}

impl SeedManifest {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let manifest: SeedManifest = toml::from_str(&content)?;
        Ok(manifest)
    }
}

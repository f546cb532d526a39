//! Where the blacklist and role weights come from.
//!
//! Scoring requests load a fresh [`ScoringConfig`] through a
//! [`BlacklistSource`] once per page. The built-in list ships with the server;
//! a TOML file can replace it and is re-read on every load, so edits apply
//! without a restart.

mod defaults;

pub use defaults::default_entries;

use crate::scoring::{BlacklistEntry, Role, RoleWeights, ScoringConfig};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

pub trait BlacklistSource: Send + Sync {
    fn load(&self) -> Result<ScoringConfig>;
}

/// The list compiled into the server.
pub struct StaticBlacklistSource {
    config: ScoringConfig,
}

impl StaticBlacklistSource {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }
}

impl Default for StaticBlacklistSource {
    fn default() -> Self {
        let weights = RoleWeights::default();
        Self::new(ScoringConfig {
            entries: default_entries(&weights),
            weights,
        })
    }
}

impl BlacklistSource for StaticBlacklistSource {
    fn load(&self) -> Result<ScoringConfig> {
        Ok(self.config.clone())
    }
}

#[derive(Debug, Deserialize)]
struct BlacklistFile {
    #[serde(default)]
    weights: Option<BTreeMap<String, u32>>,
    #[serde(default)]
    entries: Vec<BlacklistFileEntry>,
}

#[derive(Debug, Deserialize)]
struct BlacklistFileEntry {
    id: String,
    name: String,
    role: Role,
    weight: Option<u32>,
}

/// Reads the blacklist from a TOML file on every load.
///
/// ```toml
/// [weights]
/// artist = 50
/// default = 5
///
/// [[entries]]
/// id = "cabb4fcf-4067-4ba5-908d-76ee66fcf0c6"
/// name = "Diddy"
/// role = "artist"
/// ```
///
/// Entries without a weight take the weight of their role. A missing
/// `[weights]` table means the built-in weights.
pub struct FileBlacklistSource {
    path: PathBuf,
}

impl FileBlacklistSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn parse(content: &str) -> Result<ScoringConfig> {
        let file: BlacklistFile = toml::from_str(content)?;
        let weights = match file.weights {
            Some(table) => {
                let mut weights = BTreeMap::new();
                for (role, weight) in table {
                    let role = role.parse::<Role>().map_err(anyhow::Error::msg)?;
                    weights.insert(role, weight);
                }
                RoleWeights::new(weights)
            }
            None => RoleWeights::default(),
        };

        let mut entries = Vec::with_capacity(file.entries.len());
        for entry in file.entries {
            let weight = match entry.weight.or_else(|| weights.get(entry.role)) {
                Some(weight) => weight,
                None => bail!(
                    "Entry {} ({}) has no weight and role '{}' has no default weight",
                    entry.name,
                    entry.id,
                    entry.role
                ),
            };
            entries.push(BlacklistEntry {
                id: entry.id,
                name: entry.name,
                role: entry.role,
                weight,
            });
        }

        Ok(ScoringConfig { entries, weights })
    }
}

impl BlacklistSource for FileBlacklistSource {
    fn load(&self) -> Result<ScoringConfig> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read blacklist file: {:?}", self.path))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse blacklist file: {:?}", self.path))?;
        debug!(
            "Loaded {} blacklist entries from {:?}",
            config.entries.len(),
            self.path
        );
        Ok(config)
    }
}

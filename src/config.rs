//! Filter profiles.
//!
//! The two built-in profiles (`hst`, `galex`) are always present. A JSON file
//! may add profiles or replace the built-ins:
//!
//! ```json
//! {
//!   "profiles": {
//!     "hst": {
//!       "sort_by": "name",
//!       "predicates": [
//!         { "kind": "equals", "column": "insname", "value": "WFC3/IR" }
//!       ]
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::filter::{Predicate, ResultFilter};

/// Environment variable the command line reads when `--config` is absent.
pub const CONFIG_ENV: &str = "ARCHIVE_FILTER_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("profile '{profile}': {reason}")]
    Invalid { profile: String, reason: String },

    #[error("unknown profile '{name}' (available: {})", available.join(", "))]
    UnknownProfile {
        name: String,
        available: Vec<String>,
    },
}

/// Profile file contents, merged over the built-ins by [`FilterConfig::load`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub profiles: BTreeMap<String, ResultFilter>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        let profiles = [ResultFilter::hst(), ResultFilter::galex()]
            .into_iter()
            .map(|f| (f.name.clone(), f))
            .collect();
        Self { profiles }
    }
}

impl FilterConfig {
    /// Built-ins merged with the profiles in `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&content)?;
        info!(
            "loaded {} profile(s) from {}",
            config.profiles.len(),
            path.display()
        );
        Ok(config)
    }

    /// Built-ins merged with the profiles in a JSON document.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let file: FilterConfig = serde_json::from_str(content)?;
        let mut config = Self::default();
        config.merge(file)?;
        Ok(config)
    }

    /// Load `path` if given, else the built-ins alone.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Add or replace profiles. Entries are validated before insertion.
    pub fn merge(&mut self, other: FilterConfig) -> Result<(), ConfigError> {
        for (name, mut filter) in other.profiles {
            filter.name = name.clone();
            validate(&filter)?;
            if self.profiles.contains_key(&name) {
                warn!("profile '{name}' from config replaces the built-in one");
            }
            self.profiles.insert(name, filter);
        }
        Ok(())
    }

    pub fn profile(&self, name: &str) -> Result<&ResultFilter, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile {
                name: name.to_string(),
                available: self.profiles.keys().cloned().collect(),
            })
    }
}

fn validate(filter: &ResultFilter) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        profile: filter.name.clone(),
        reason: reason.to_string(),
    };

    if filter.sort_by.is_empty() {
        return Err(invalid("sort_by must name a column"));
    }
    for p in &filter.predicates {
        if p.column().is_empty() {
            return Err(invalid("predicate column must not be empty"));
        }
        if let Predicate::Contains { needle, .. } = p {
            if needle.is_empty() {
                return Err(invalid("contains needle must not be empty"));
            }
        }
    }
    Ok(())
}

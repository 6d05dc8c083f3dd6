use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RepositoryError, RepositoryResult};

/// Items per put or delete call unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Hard per-call mutation limit of the hosted store.
pub const MAX_BATCH_SIZE: usize = 500;

/// Configuration for a [`DatastoreRepository`](crate::DatastoreRepository).
///
/// ```toml
/// batch_size = 100
/// kind = "People"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Flush ceiling for batched saves and deletes.
    pub batch_size: usize,
    /// Entity kind to use instead of the type's simple name.
    pub kind: Option<String>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            kind: None,
        }
    }
}

impl RepositoryConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> RepositoryResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| RepositoryError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> RepositoryResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> RepositoryResult<String> {
        toml::to_string(self).map_err(|e| RepositoryError::Config(e.to_string()))
    }

    pub fn validate(&self) -> RepositoryResult<()> {
        if self.batch_size == 0 {
            return Err(RepositoryError::Config("batch_size must be at least 1".into()));
        }
        if self.batch_size > MAX_BATCH_SIZE {
            return Err(RepositoryError::Config(format!(
                "batch_size {} exceeds the store limit of {MAX_BATCH_SIZE}",
                self.batch_size
            )));
        }
        if self.kind.as_deref() == Some("") {
            return Err(RepositoryError::Config("kind must not be empty".into()));
        }
        Ok(())
    }
}

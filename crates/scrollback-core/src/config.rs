//! Loader configuration.

use serde::Deserialize;

use crate::constants::PAGE_SIZE;
use crate::error::ConfigError;

/// Tunables for a [`Loader`](crate::Loader).
///
/// Deserializes from any serde format with every field optional, so a config
/// file only has to mention what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Items requested per remote fetch.
    pub initial_load_size: usize,

    /// Check cache/anchor consistency during anchored refreshes and panic on
    /// violation. For test harnesses; never enable in production.
    pub verify: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            initial_load_size: PAGE_SIZE,
            verify: cfg!(feature = "verify"),
        }
    }
}

impl LoaderConfig {
    pub fn with_load_size(mut self, size: usize) -> Self {
        self.initial_load_size = size;
        self
    }

    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Reject values the loader cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_load_size == 0 {
            return Err(ConfigError::LoadSize(self.initial_load_size));
        }
        Ok(())
    }
}

//! RON config file for the `scrollback` binary.
//!
//! Looked up at `~/.config/scrollback/config.ron` unless `--config` names a
//! file. Every field is optional:
//!
//! ```ron
//! (
//!     loader: (initial_load_size: 20, verify: true),
//!     feed: (items: 500, overlap: 3, latency_ms: 25),
//! )
//! ```

use std::path::{Path, PathBuf};

use scrollback_core::LoaderConfig;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("invalid loader config: {0}")]
    Loader(#[from] scrollback_core::ConfigError),
}

/// Shape of the synthetic feed the CLI pages through.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub items: usize,
    /// How far inside each batch the advertised cursors point.
    pub overlap: usize,
    pub latency_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            items: 300,
            overlap: 2,
            latency_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub loader: LoaderConfig,
    pub feed: FeedConfig,
}

impl CliConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        Ok(self.loader.validate()?)
    }
}

/// Default config location (~/.config/scrollback/config.ron).
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("scrollback").join("config.ron"))
}

/// Load the config from `explicit`, or from the default location.
///
/// A missing default file means defaults; a missing explicit file is an error.
pub fn load_config(explicit: Option<&Path>) -> Result<CliConfig, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match config_file_path() {
            Some(path) if path.exists() => path,
            _ => {
                debug!("no config file, using defaults");
                return Ok(CliConfig::default());
            }
        },
    };

    let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let config = parse_config(&text)?;
    info!("loaded config from {}", path.display());
    Ok(config)
}

pub fn parse_config(text: &str) -> Result<CliConfig, ConfigError> {
    let config: CliConfig = ron::from_str(text)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(parse_config("()").unwrap(), CliConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let config = parse_config("(feed: (items: 42))").unwrap();
        assert_eq!(config.feed.items, 42);
        assert_eq!(config.feed.overlap, FeedConfig::default().overlap);
        assert_eq!(config.loader, LoaderConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = parse_config("(loader: (initial_load_size: 0))").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Loader(scrollback_core::ConfigError::LoadSize(0))
        ));
    }

    #[test]
    fn test_syntax_error() {
        let err = parse_config("(feed: ").unwrap_err();
        assert!(matches!(err, ConfigError::Ron(_)));
    }

    #[test]
    fn test_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ron");
        std::fs::write(&path, "(loader: (initial_load_size: 7))").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.loader.initial_load_size, 7);

        let missing = dir.path().join("nope.ron");
        assert!(matches!(
            load_config(Some(&missing)),
            Err(ConfigError::Io { .. })
        ));
    }
}

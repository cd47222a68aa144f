//! Codec configuration (TOML)
//!
//! ```toml
//! [builder]
//! initial_capacity = 1024
//! max_capacity = 2147483647
//! verify_placement = true
//! ```
//!
//! Every key is optional; missing keys take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};
use crate::{DEFAULT_INITIAL_CAPACITY, MAX_BUFFER_SIZE};

/// Top-level codec configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CodecConfig {
    /// Builder allocation settings
    #[serde(default)]
    pub builder: BuilderConfig,
}

/// Builder allocation and checking settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Bytes allocated up front (default: 1024)
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,
    /// Largest buffer the builder may grow to (default: 2 GiB - 1)
    #[serde(default = "default_max_capacity")]
    pub max_capacity: usize,
    /// Check that each placement wrote exactly the layout size (default: true)
    #[serde(default = "default_true")]
    pub verify_placement: bool,
}

fn default_initial_capacity() -> usize {
    DEFAULT_INITIAL_CAPACITY
}
fn default_max_capacity() -> usize {
    MAX_BUFFER_SIZE
}
fn default_true() -> bool {
    true
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            initial_capacity: default_initial_capacity(),
            max_capacity: default_max_capacity(),
            verify_placement: default_true(),
        }
    }
}

impl CodecConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CodecError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        let builder = &self.builder;
        if builder.max_capacity == 0 {
            return Err(CodecError::Config("builder.max_capacity must be > 0".into()));
        }
        if builder.initial_capacity > builder.max_capacity {
            return Err(CodecError::Config(format!(
                "builder.initial_capacity {} exceeds builder.max_capacity {}",
                builder.initial_capacity, builder.max_capacity
            )));
        }
        Ok(())
    }
}

/// Loads the configuration from `path`.
///
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load(path: &Path) -> CodecConfig {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return CodecConfig::default(),
    };
    match CodecConfig::from_toml_str(&content) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring invalid codec config");
            CodecConfig::default()
        }
    }
}

//! Engine configuration
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! logging = "production"
//! max_examples_per_diff = 20
//!
//! [normalize]
//! structured_media_types = ["application/json", "text/json"]
//! json_suffix = true
//!
//! [suggest]
//! infer_path_parameters = false
//! ```

#![allow(clippy::result_large_err)]

use serde::{Deserialize, Serialize};
use specdiff_core::diff::GroupOptions;
use specdiff_core::errors::{ExError, ExErrorKind};
use specdiff_core::interpreters::SuggestOptions;
use specdiff_core::logging_facility::{self, Profile};
use specdiff_core::NormalizeOptions;
use specdiff_store::errors::{io_error, Result};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub logging: Profile,
    pub normalize: NormalizeOptions,
    /// Interaction ids retained per diff; occurrences are always counted in full
    pub max_examples_per_diff: Option<usize>,
    pub suggest: SuggestOptions,
}

impl EngineConfig {
    /// Parse a TOML document
    ///
    /// # Errors
    ///
    /// `InvalidConfig` on syntax errors, unknown keys or values that fail validation.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source).map_err(|e| {
            ExError::new(ExErrorKind::InvalidConfig)
                .with_op("config_parse")
                .with_message(e.to_string())
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, otherwise as [`EngineConfig::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path.as_ref()).map_err(|e| io_error("config_read", e))?;
        Self::from_toml_str(&source)
    }

    fn validate(&self) -> Result<()> {
        if self.max_examples_per_diff == Some(0) {
            return Err(ExError::new(ExErrorKind::InvalidConfig)
                .with_op("config_validate")
                .with_message("max_examples_per_diff must be at least 1"));
        }
        if self
            .normalize
            .structured_media_types
            .iter()
            .any(|m| m.trim().is_empty() || !m.contains('/'))
        {
            return Err(ExError::new(ExErrorKind::InvalidConfig)
                .with_op("config_validate")
                .with_message("structured_media_types entries must be type/subtype media types"));
        }
        Ok(())
    }

    pub fn group_options(&self) -> GroupOptions {
        GroupOptions {
            max_examples_per_diff: self.max_examples_per_diff,
        }
    }

    /// Initialize logging with the configured profile (first call wins)
    pub fn init_logging(&self) {
        logging_facility::init(self.logging);
    }
}

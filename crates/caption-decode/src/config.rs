//! Decoder configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default caption length limit
pub const DEFAULT_MAX_LENGTH: usize = 35;

/// Parameters of a [`CaptionDecoder`](crate::CaptionDecoder)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Maximum number of predictor calls, also the padded input length
    pub max_length: usize,
    /// Required feature vector length; unchecked when `None`
    pub feature_dim: Option<usize>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            feature_dim: None,
        }
    }
}

impl DecoderConfig {
    /// Configuration with the given length limit and no dimension check
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length,
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file
    ///
    /// Missing fields take their default values.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read decoder config: {:?}", path))?;
        let config: DecoderConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse decoder config: {:?}", path))?;
        Ok(config)
    }
}

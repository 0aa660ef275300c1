//! Model configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised by [`MergeConfig::validate`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroDimension(&'static str),
    #[error("vocab_size {vocab_size} does not match tokenizer vocabulary size {tokenizer}")]
    VocabMismatch { vocab_size: usize, tokenizer: usize },
}

/// Merge-architecture caption model configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Size of the output distribution (including the padding slot)
    pub vocab_size: usize,
    /// Length of the image feature vector
    pub feature_dim: usize,
    /// Word embedding dimension
    pub embed_dim: usize,
    /// Width of the image projection, LSTM state and decoder layer
    pub hidden_dim: usize,
    /// Fixed length of the padded caption input
    pub max_length: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            vocab_size: 8485,
            feature_dim: 4096,
            embed_dim: 256,
            hidden_dim: 256,
            max_length: 35,
        }
    }
}

impl MergeConfig {
    /// Check that every dimension is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dims = [
            ("vocab_size", self.vocab_size),
            ("feature_dim", self.feature_dim),
            ("embed_dim", self.embed_dim),
            ("hidden_dim", self.hidden_dim),
            ("max_length", self.max_length),
        ];
        for (name, value) in dims {
            if value == 0 {
                return Err(ConfigError::ZeroDimension(name));
            }
        }
        Ok(())
    }

    /// Check that the output layer covers a tokenizer's id space
    ///
    /// # Arguments
    /// * `tokenizer_vocab_size` - Size of the tokenizer id space, padding slot included
    pub fn check_vocab_size(&self, tokenizer_vocab_size: usize) -> Result<(), ConfigError> {
        if self.vocab_size != tokenizer_vocab_size {
            return Err(ConfigError::VocabMismatch {
                vocab_size: self.vocab_size,
                tokenizer: tokenizer_vocab_size,
            });
        }
        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read model config: {:?}", path))?;
        let config: MergeConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse model config: {:?}", path))?;
        config.validate()?;
        Ok(config)
    }
}

//! Next-token prediction for caption decoding
//!
//! This crate provides:
//! - The [`Predictor`] capability consumed by the caption decoder
//! - A merge-architecture (image projection + LSTM) predictor
//! - Checkpoint save/load in safetensors + JSON form
//! - The cached image [`FeatureStore`]
//!
//! # Example
//!
//! ```no_run
//! use caption_model::{load_checkpoint, FeatureStore, Predictor};
//!
//! let (model, _metadata) = load_checkpoint("models/caption")?;
//! let store = FeatureStore::from_file("models/features.json")?;
//! let features = store.get("1000268201.jpg").expect("unknown image");
//!
//! let mut input = vec![0u32; model.config().max_length];
//! input[0] = 1; // start token
//! let scores = model.predict_next(features, &input)?;
//! assert_eq!(scores.len(), model.config().vocab_size);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod checkpoint;
pub mod config;
pub mod features;
mod init;
pub mod merge;
pub mod predictor;
pub mod stability;

/// Model checkpoint management
pub use checkpoint::{load_checkpoint, save_checkpoint, CheckpointMetadata};

/// Model configuration
pub use config::{ConfigError, MergeConfig};

/// Cached encoder output
pub use features::{FeatureStatistics, FeatureStore};

/// Merge-architecture predictor
pub use merge::MergeDecoder;

/// The prediction capability
pub use predictor::{FnPredictor, Predictor};

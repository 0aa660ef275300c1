//! Checkpoint save/load functionality
//!
//! A checkpoint is a pair of files sharing a stem:
//! - `<stem>.safetensors`: little-endian f32 weights named per [`TENSOR_NAMES`](crate::merge::TENSOR_NAMES)
//! - `<stem>.json`: format version, model configuration and metadata

use crate::config::MergeConfig;
use crate::merge::MergeDecoder;
use anyhow::{Context, Result};
use safetensors::tensor::{Dtype, TensorView};
use safetensors::SafeTensors;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Checkpoint format version for compatibility checking
const CHECKPOINT_VERSION: &str = "1.0.0";

/// Free-form information about where the weights came from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    /// Training epoch the weights were taken from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch: Option<usize>,
    /// Validation loss at that epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss: Option<f32>,
    /// Additional metadata as key-value pairs
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CheckpointFile {
    version: String,
    config: MergeConfig,
    #[serde(default)]
    metadata: CheckpointMetadata,
}

/// Save a model checkpoint to disk
///
/// # Arguments
/// * `model` - The model to save
/// * `path` - Checkpoint stem; `.safetensors` and `.json` files are written next to it
/// * `metadata` - Optional checkpoint metadata
///
/// # Errors
/// Returns an error if the directory cannot be created, weights cannot be serialized,
/// or either file cannot be written.
pub fn save_checkpoint<P: AsRef<Path>>(
    model: &MergeDecoder,
    path: P,
    metadata: Option<CheckpointMetadata>,
) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create checkpoint directory: {}", parent.display())
            })?;
        }
    }

    let tensors = model.tensors();
    let buffers: Vec<(&str, Vec<usize>, Vec<u8>)> = tensors
        .iter()
        .map(|(name, shape, data)| {
            let bytes = data.iter().flat_map(|v| v.to_le_bytes()).collect();
            (*name, shape.clone(), bytes)
        })
        .collect();

    let mut views = Vec::with_capacity(buffers.len());
    for (name, shape, bytes) in &buffers {
        let view = TensorView::new(Dtype::F32, shape.clone(), bytes)
            .map_err(|e| anyhow::anyhow!("Invalid tensor '{}': {:?}", name, e))?;
        views.push((*name, view));
    }
    let tensor_list: Vec<(&str, &TensorView)> = views.iter().map(|(k, v)| (*k, v)).collect();

    let serialized = safetensors::serialize(tensor_list, &None)
        .map_err(|e| anyhow::anyhow!("Failed to serialize weights: {:?}", e))?;
    let weights_path = path.with_extension("safetensors");
    fs::write(&weights_path, serialized)
        .with_context(|| format!("Failed to write weights: {}", weights_path.display()))?;

    let metadata_path = path.with_extension("json");
    let file = CheckpointFile {
        version: CHECKPOINT_VERSION.to_string(),
        config: model.config().clone(),
        metadata: metadata.unwrap_or_default(),
    };
    let json = serde_json::to_string_pretty(&file).context("Failed to serialize checkpoint metadata")?;
    fs::write(&metadata_path, json)
        .with_context(|| format!("Failed to write metadata: {}", metadata_path.display()))?;

    tracing::info!(path = %path.display(), "saved checkpoint");
    Ok(())
}

/// Load a model checkpoint from disk
///
/// # Arguments
/// * `path` - Checkpoint stem used with [`save_checkpoint`]
///
/// # Returns
/// The model and its metadata
///
/// # Errors
/// Returns an error if either file is missing or malformed, the version is
/// unsupported, or a tensor disagrees with the stored configuration.
pub fn load_checkpoint<P: AsRef<Path>>(path: P) -> Result<(MergeDecoder, CheckpointMetadata)> {
    let path = path.as_ref();

    let metadata_path = path.with_extension("json");
    let content = fs::read_to_string(&metadata_path)
        .with_context(|| format!("Failed to read metadata: {}", metadata_path.display()))?;
    let file: CheckpointFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse metadata: {}", metadata_path.display()))?;

    if file.version != CHECKPOINT_VERSION {
        anyhow::bail!(
            "Unsupported checkpoint version {} (expected {})",
            file.version,
            CHECKPOINT_VERSION
        );
    }

    let weights_path = path.with_extension("safetensors");
    let bytes = fs::read(&weights_path)
        .with_context(|| format!("Failed to read weights: {}", weights_path.display()))?;
    let safetensors = SafeTensors::deserialize(&bytes)
        .map_err(|e| anyhow::anyhow!("Failed to parse weights {}: {:?}", weights_path.display(), e))?;

    let mut tensors = HashMap::new();
    for (name, view) in safetensors.tensors() {
        if view.dtype() != Dtype::F32 {
            anyhow::bail!("Tensor '{}' has dtype {:?}, expected F32", name, view.dtype());
        }
        let data: Vec<f32> = view
            .data()
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        tensors.insert(name, (view.shape().to_vec(), data));
    }

    let model = MergeDecoder::from_tensors(file.config, tensors)
        .with_context(|| format!("Invalid checkpoint: {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        vocab_size = model.config().vocab_size,
        "loaded checkpoint"
    );
    Ok((model, file.metadata))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> MergeConfig {
        MergeConfig {
            vocab_size: 6,
            feature_dim: 4,
            embed_dim: 3,
            hidden_dim: 2,
            max_length: 5,
        }
    }

    #[test]
    fn test_metadata_extra_fields_flatten() {
        let mut metadata = CheckpointMetadata {
            epoch: Some(20),
            ..Default::default()
        };
        metadata
            .extra
            .insert("dataset".to_string(), serde_json::json!("flickr8k"));

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["epoch"], 20);
        assert_eq!(json["dataset"], "flickr8k");
        assert!(json.get("loss").is_none());
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("model");
        let model = MergeDecoder::random(small_config(), Some(1)).unwrap();
        save_checkpoint(&model, &stem, None).unwrap();

        let json_path = stem.with_extension("json");
        let content = fs::read_to_string(&json_path).unwrap();
        fs::write(&json_path, content.replace(CHECKPOINT_VERSION, "0.0.1")).unwrap();

        let err = load_checkpoint(&stem).unwrap_err();
        assert!(err.to_string().contains("Unsupported checkpoint version"));
    }
}

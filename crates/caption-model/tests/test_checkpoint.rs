//! Integration tests for checkpoint persistence

use caption_model::{
    load_checkpoint, save_checkpoint, CheckpointMetadata, MergeConfig, MergeDecoder, Predictor,
};
use tempfile::TempDir;

fn small_config() -> MergeConfig {
    MergeConfig {
        vocab_size: 9,
        feature_dim: 6,
        embed_dim: 4,
        hidden_dim: 3,
        max_length: 4,
    }
}

#[test]
fn test_save_and_load_round_trip() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let stem = temp_dir.path().join("checkpoints").join("caption");
    let model = MergeDecoder::random(small_config(), Some(7))?;
    let metadata = CheckpointMetadata {
        epoch: Some(20),
        loss: Some(2.5),
        ..Default::default()
    };

    save_checkpoint(&model, &stem, Some(metadata.clone()))?;
    assert!(stem.with_extension("safetensors").exists());
    assert!(stem.with_extension("json").exists());

    let (loaded, loaded_metadata) = load_checkpoint(&stem)?;
    assert_eq!(loaded.config(), model.config());
    assert_eq!(loaded.tensors(), model.tensors());
    assert_eq!(loaded_metadata, metadata);

    let features = [0.2f32; 6];
    let ids = [1u32, 2, 0, 0];
    assert_eq!(
        loaded.predict_next(&features, &ids)?,
        model.predict_next(&features, &ids)?
    );
    Ok(())
}

#[test]
fn test_load_missing_checkpoint() {
    let temp_dir = TempDir::new().unwrap();
    let err = load_checkpoint(temp_dir.path().join("absent")).unwrap_err();
    assert!(err.to_string().contains("Failed to read metadata"));
}

#[test]
fn test_load_rejects_config_mismatch() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let stem = temp_dir.path().join("caption");
    let model = MergeDecoder::random(small_config(), Some(7))?;
    save_checkpoint(&model, &stem, None)?;

    // Claim a larger vocabulary than the stored weights hold
    let json_path = stem.with_extension("json");
    let mut json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&json_path)?)?;
    json["config"]["vocab_size"] = serde_json::json!(10);
    std::fs::write(&json_path, serde_json::to_string(&json)?)?;

    let err = load_checkpoint(&stem).unwrap_err();
    assert!(format!("{:#}", err).contains("embedding.weight"));
    Ok(())
}

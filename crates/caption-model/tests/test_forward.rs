//! Integration tests for the merge model forward pass

use caption_model::{MergeConfig, MergeDecoder, Predictor};

fn small_config() -> MergeConfig {
    MergeConfig {
        vocab_size: 12,
        feature_dim: 8,
        embed_dim: 6,
        hidden_dim: 4,
        max_length: 5,
    }
}

fn small_model() -> MergeDecoder {
    MergeDecoder::random(small_config(), Some(42)).expect("Failed to build model")
}

#[test]
fn test_forward_output_is_distribution() {
    let model = small_model();
    let probs = model
        .predict_next(&[0.5; 8], &[1, 3, 0, 0, 0])
        .expect("Forward pass failed");

    assert_eq!(probs.len(), 12);
    assert!(probs.iter().all(|&p| (0.0..=1.0).contains(&p)));
    let total: f32 = probs.iter().sum();
    assert!((total - 1.0).abs() < 1e-5);
}

#[test]
fn test_forward_is_deterministic() {
    let model = small_model();
    let a = model.predict_next(&[0.1; 8], &[1, 2, 0, 0, 0]).unwrap();
    let b = model.predict_next(&[0.1; 8], &[1, 2, 0, 0, 0]).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_padding_steps_are_masked() {
    let model = small_model();
    // Zeros only ever appear as padding, wherever they sit
    let post = model.predict_next(&[0.3; 8], &[1, 4, 0, 0, 0]).unwrap();
    let pre = model.predict_next(&[0.3; 8], &[0, 0, 0, 1, 4]).unwrap();
    for (a, b) in post.iter().zip(&pre) {
        assert!((a - b).abs() < 1e-6);
    }
}

#[test]
fn test_caption_changes_prediction() {
    let model = small_model();
    let a = model.predict_next(&[0.3; 8], &[1, 4, 0, 0, 0]).unwrap();
    let b = model.predict_next(&[0.3; 8], &[1, 5, 0, 0, 0]).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_rejects_wrong_feature_length() {
    let model = small_model();
    let err = model.predict_next(&[0.0; 7], &[1, 0, 0, 0, 0]).unwrap_err();
    assert!(err.to_string().contains("Feature vector has length 7"));
}

#[test]
fn test_rejects_wrong_sequence_length() {
    let model = small_model();
    assert!(model.predict_next(&[0.0; 8], &[1, 0, 0]).is_err());
}

#[test]
fn test_rejects_out_of_vocabulary_id() {
    let model = small_model();
    let err = model.predict_next(&[0.0; 8], &[1, 12, 0, 0, 0]).unwrap_err();
    assert!(err.to_string().contains("outside the model vocabulary"));
}

#[test]
fn test_nan_features_are_reported() {
    let model = small_model();
    let mut features = [0.0f32; 8];
    features[0] = f32::NAN;
    let err = model.predict_next(&features, &[1, 0, 0, 0, 0]).unwrap_err();
    assert!(err.to_string().contains("NaN"));
}

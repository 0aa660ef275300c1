//! Integration tests for the feature store

use caption_model::FeatureStore;
use tempfile::TempDir;

#[test]
fn test_load_path_keyed_json() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("features.json");
    std::fs::write(
        &path,
        r#"{
  "images/dog.jpg": [0.1, 0.2, 0.3],
  "images/cat.jpg": [0.4, 0.5, 0.6]
}"#,
    )
    .unwrap();

    let store = FeatureStore::from_file(&path).expect("Failed to load features");
    assert_eq!(store.len(), 2);
    assert_eq!(store.feature_dim(), Some(3));
    assert_eq!(store.get("images/cat.jpg"), Some(&[0.4f32, 0.5, 0.6][..]));
    assert_eq!(
        store.keys().collect::<Vec<_>>(),
        vec!["images/cat.jpg", "images/dog.jpg"]
    );
}

#[test]
fn test_load_rejects_mixed_dimensions() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("features.json");
    std::fs::write(&path, r#"{"a.jpg": [0.1, 0.2], "b.jpg": [0.3]}"#).unwrap();

    let err = FeatureStore::from_file(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("expected 2"));
}

#[test]
fn test_save_and_reload() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("out").join("features.json");

    let mut store = FeatureStore::new();
    store.insert("a.jpg", vec![1.0, -1.0]).unwrap();
    store.insert("b.jpg", vec![0.5, 0.25]).unwrap();
    store.save(&path).expect("Failed to save features");

    let loaded = FeatureStore::from_file(&path).expect("Failed to reload features");
    assert_eq!(loaded, store);
}

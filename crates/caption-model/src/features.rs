//! Image feature store
//!
//! Feature vectors are produced by the image encoder ahead of time and cached
//! as a JSON object mapping an image key (usually its path) to the vector.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Summary statistics over all stored feature values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureStatistics {
    pub num_images: usize,
    pub feature_dim: usize,
    pub overall_mean: f32,
    pub overall_std: f32,
    pub min_value: f32,
    pub max_value: f32,
}

/// Feature vectors keyed by image, all of one dimension
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureStore {
    features: BTreeMap<String, Vec<f32>>,
}

impl FeatureStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from a JSON file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if the
    /// vectors do not all share one non-zero dimension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read feature file: {}", path.display()))?;
        let raw: BTreeMap<String, Vec<f32>> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse feature file: {}", path.display()))?;

        let mut store = Self::new();
        for (key, vector) in raw {
            store
                .insert(key, vector)
                .with_context(|| format!("Invalid feature file: {}", path.display()))?;
        }

        tracing::info!(
            path = %path.display(),
            images = store.len(),
            feature_dim = store.feature_dim().unwrap_or(0),
            "loaded feature store"
        );
        Ok(store)
    }

    /// Save the store as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }
        let content =
            serde_json::to_string_pretty(&self.features).context("Failed to serialize features")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write feature file: {}", path.display()))?;
        Ok(())
    }

    /// Add or replace the vector for `key`
    ///
    /// # Errors
    /// Returns an error if the vector is empty or its length differs from the
    /// vectors already stored
    pub fn insert(&mut self, key: impl Into<String>, vector: Vec<f32>) -> Result<()> {
        let key = key.into();
        if vector.is_empty() {
            anyhow::bail!("Feature vector for '{}' is empty", key);
        }
        if let Some(dim) = self.feature_dim() {
            let replacing_only = self.features.len() == 1 && self.features.contains_key(&key);
            if vector.len() != dim && !replacing_only {
                anyhow::bail!(
                    "Feature vector for '{}' has length {}, expected {}",
                    key,
                    vector.len(),
                    dim
                );
            }
        }
        self.features.insert(key, vector);
        Ok(())
    }

    /// Vector for `key`
    pub fn get(&self, key: &str) -> Option<&[f32]> {
        self.features.get(key).map(Vec::as_slice)
    }

    /// Dimension shared by all vectors, `None` when empty
    pub fn feature_dim(&self) -> Option<usize> {
        self.features.values().next().map(Vec::len)
    }

    /// Number of stored images
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Image keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    /// `(key, vector)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f32])> {
        self.features
            .iter()
            .map(|(key, vector)| (key.as_str(), vector.as_slice()))
    }

    /// Statistics over every stored value, `None` when empty
    pub fn statistics(&self) -> Option<FeatureStatistics> {
        let feature_dim = self.feature_dim()?;
        let values = || self.features.values().flatten().copied();

        let count = (self.features.len() * feature_dim) as f64;
        let mean = values().map(f64::from).sum::<f64>() / count;
        let variance = values()
            .map(|v| (f64::from(v) - mean).powi(2))
            .sum::<f64>()
            / count;

        Some(FeatureStatistics {
            num_images: self.features.len(),
            feature_dim,
            overall_mean: mean as f32,
            overall_std: variance.sqrt() as f32,
            min_value: values().fold(f32::INFINITY, f32::min),
            max_value: values().fold(f32::NEG_INFINITY, f32::max),
        })
    }
}

//! Merge-architecture caption model
//!
//! Architecture (inference only, dropout is the identity):
//! - Image branch: `relu(features · K_img + b_img)`
//! - Caption branch: embedding with zero masking -> LSTM, final hidden state
//! - Merge: element-wise sum of both branches
//! - Decoder: `relu(merged · K_dec + b_dec)`
//! - Output: `softmax(decoded · K_out + b_out)` over the vocabulary
//!
//! Dense kernels use the `[in, out]` layout and the LSTM packs its gates in
//! `i, f, c, o` order, so weights exported from the training framework load
//! without transposition.

use crate::config::MergeConfig;
use crate::predictor::Predictor;
use crate::stability::validate_finite;
use anyhow::{Context, Result};
use ndarray::{s, Array1, Array2, ArrayView1};
use std::collections::HashMap;

/// Names of the checkpoint tensors in a fixed order
pub const TENSOR_NAMES: [&str; 10] = [
    "image_dense.kernel",
    "image_dense.bias",
    "embedding.weight",
    "lstm.kernel",
    "lstm.recurrent_kernel",
    "lstm.bias",
    "decoder_dense.kernel",
    "decoder_dense.bias",
    "output.kernel",
    "output.bias",
];

/// Expected shape of every checkpoint tensor for `config`
pub fn tensor_shapes(config: &MergeConfig) -> Vec<(&'static str, Vec<usize>)> {
    let h = config.hidden_dim;
    let shapes = [
        vec![config.feature_dim, h],
        vec![h],
        vec![config.vocab_size, config.embed_dim],
        vec![config.embed_dim, 4 * h],
        vec![h, 4 * h],
        vec![4 * h],
        vec![h, h],
        vec![h],
        vec![h, config.vocab_size],
        vec![config.vocab_size],
    ];
    TENSOR_NAMES.into_iter().zip(shapes).collect()
}

/// Fully connected layer
#[derive(Debug, Clone)]
pub(crate) struct Dense {
    kernel: Array2<f32>,
    bias: Array1<f32>,
}

impl Dense {
    pub(crate) fn new(kernel: Array2<f32>, bias: Array1<f32>) -> Self {
        Self { kernel, bias }
    }

    fn forward(&self, x: &Array1<f32>) -> Array1<f32> {
        x.dot(&self.kernel) + &self.bias
    }
}

/// Single-layer LSTM returning its last hidden state
#[derive(Debug, Clone)]
pub(crate) struct Lstm {
    kernel: Array2<f32>,
    recurrent_kernel: Array2<f32>,
    bias: Array1<f32>,
}

impl Lstm {
    pub(crate) fn new(
        kernel: Array2<f32>,
        recurrent_kernel: Array2<f32>,
        bias: Array1<f32>,
    ) -> Self {
        Self {
            kernel,
            recurrent_kernel,
            bias,
        }
    }

    fn units(&self) -> usize {
        self.recurrent_kernel.nrows()
    }

    fn step(
        &self,
        x: ArrayView1<f32>,
        h: &Array1<f32>,
        c: &Array1<f32>,
    ) -> (Array1<f32>, Array1<f32>) {
        let units = self.units();
        let z = x.dot(&self.kernel) + h.dot(&self.recurrent_kernel) + &self.bias;

        let input_gate = z.slice(s![0..units]).mapv(sigmoid);
        let forget_gate = z.slice(s![units..2 * units]).mapv(sigmoid);
        let candidate = z.slice(s![2 * units..3 * units]).mapv(f32::tanh);
        let output_gate = z.slice(s![3 * units..]).mapv(sigmoid);

        let c_next = &forget_gate * c + &input_gate * &candidate;
        let h_next = &output_gate * &c_next.mapv(f32::tanh);
        (h_next, c_next)
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

fn relu(x: f32) -> f32 {
    // NaN must propagate, so no f32::max here
    if x < 0.0 {
        0.0
    } else {
        x
    }
}

/// Numerically stable softmax
pub fn softmax(logits: &Array1<f32>) -> Array1<f32> {
    let max = logits.fold(f32::NEG_INFINITY, |acc, &x| acc.max(x));
    let exp = logits.mapv(|x| (x - max).exp());
    let sum = exp.sum();
    exp / sum
}

/// Merge-architecture caption model
#[derive(Debug, Clone)]
pub struct MergeDecoder {
    config: MergeConfig,
    image_dense: Dense,
    embedding: Array2<f32>,
    lstm: Lstm,
    decoder_dense: Dense,
    output: Dense,
}

impl MergeDecoder {
    pub(crate) fn from_parts(
        config: MergeConfig,
        image_dense: Dense,
        embedding: Array2<f32>,
        lstm: Lstm,
        decoder_dense: Dense,
        output: Dense,
    ) -> Self {
        Self {
            config,
            image_dense,
            embedding,
            lstm,
            decoder_dense,
            output,
        }
    }

    /// Build a model from named flat tensors
    ///
    /// # Arguments
    /// * `config` - Model configuration
    /// * `tensors` - Tensor name -> (shape, row-major data)
    ///
    /// # Errors
    /// Returns an error if a tensor is missing or its shape disagrees with `config`
    pub fn from_tensors(
        config: MergeConfig,
        mut tensors: HashMap<String, (Vec<usize>, Vec<f32>)>,
    ) -> Result<Self> {
        config.validate()?;

        for (name, expected) in tensor_shapes(&config) {
            let (shape, _) = tensors
                .get(name)
                .with_context(|| format!("Missing tensor '{}'", name))?;
            if *shape != expected {
                anyhow::bail!(
                    "Tensor '{}' has shape {:?}, expected {:?}",
                    name,
                    shape,
                    expected
                );
            }
        }

        let mut matrix = |name: &str| -> Result<Array2<f32>> {
            let (shape, data) = tensors
                .remove(name)
                .with_context(|| format!("Missing tensor '{}'", name))?;
            Array2::from_shape_vec((shape[0], shape[1]), data)
                .with_context(|| format!("Tensor '{}' data does not fill its shape", name))
        };
        let image_kernel = matrix("image_dense.kernel")?;
        let embedding = matrix("embedding.weight")?;
        let lstm_kernel = matrix("lstm.kernel")?;
        let lstm_recurrent = matrix("lstm.recurrent_kernel")?;
        let decoder_kernel = matrix("decoder_dense.kernel")?;
        let output_kernel = matrix("output.kernel")?;

        let mut vector = |name: &str| -> Result<Array1<f32>> {
            let (shape, data) = tensors
                .remove(name)
                .with_context(|| format!("Missing tensor '{}'", name))?;
            if data.len() != shape[0] {
                anyhow::bail!("Tensor '{}' data does not fill its shape", name);
            }
            Ok(Array1::from_vec(data))
        };
        let image_bias = vector("image_dense.bias")?;
        let lstm_bias = vector("lstm.bias")?;
        let decoder_bias = vector("decoder_dense.bias")?;
        let output_bias = vector("output.bias")?;

        Ok(Self::from_parts(
            config,
            Dense::new(image_kernel, image_bias),
            embedding,
            Lstm::new(lstm_kernel, lstm_recurrent, lstm_bias),
            Dense::new(decoder_kernel, decoder_bias),
            Dense::new(output_kernel, output_bias),
        ))
    }

    /// Named flat tensors, in [`TENSOR_NAMES`] order
    pub fn tensors(&self) -> Vec<(&'static str, Vec<usize>, Vec<f32>)> {
        fn flat<D: ndarray::Dimension>(a: &ndarray::Array<f32, D>) -> (Vec<usize>, Vec<f32>) {
            (a.shape().to_vec(), a.iter().copied().collect())
        }

        let arrays = [
            flat(&self.image_dense.kernel),
            flat(&self.image_dense.bias),
            flat(&self.embedding),
            flat(&self.lstm.kernel),
            flat(&self.lstm.recurrent_kernel),
            flat(&self.lstm.bias),
            flat(&self.decoder_dense.kernel),
            flat(&self.decoder_dense.bias),
            flat(&self.output.kernel),
            flat(&self.output.bias),
        ];
        TENSOR_NAMES
            .into_iter()
            .zip(arrays)
            .map(|(name, (shape, data))| (name, shape, data))
            .collect()
    }

    /// Model configuration
    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Forward pass producing next-token probabilities
    ///
    /// # Arguments
    /// * `features` - Image feature vector of length `feature_dim`
    /// * `padded_ids` - Caption ids of length `max_length`; id 0 is masked
    ///
    /// # Returns
    /// Probability distribution of length `vocab_size`
    pub fn forward(&self, features: &[f32], padded_ids: &[u32]) -> Result<Array1<f32>> {
        if features.len() != self.config.feature_dim {
            anyhow::bail!(
                "Feature vector has length {}, model expects {}",
                features.len(),
                self.config.feature_dim
            );
        }
        if padded_ids.len() != self.config.max_length {
            anyhow::bail!(
                "Caption input has length {}, model expects {}",
                padded_ids.len(),
                self.config.max_length
            );
        }

        let features = Array1::from_vec(features.to_vec());
        let image = self.image_dense.forward(&features).mapv(relu);

        let units = self.lstm.units();
        let mut h = Array1::<f32>::zeros(units);
        let mut c = Array1::<f32>::zeros(units);
        for &id in padded_ids {
            // Masked steps carry the previous state forward
            if id == 0 {
                continue;
            }
            let idx = id as usize;
            if idx >= self.config.vocab_size {
                anyhow::bail!(
                    "Token id {} is outside the model vocabulary ({})",
                    id,
                    self.config.vocab_size
                );
            }
            let (h_next, c_next) = self.lstm.step(self.embedding.row(idx), &h, &c);
            h = h_next;
            c = c_next;
        }

        let merged = image + &h;
        let decoded = self.decoder_dense.forward(&merged).mapv(relu);
        let probs = softmax(&self.output.forward(&decoded));

        if let Some(slice) = probs.as_slice() {
            validate_finite(slice, "next-token probabilities")?;
        }
        Ok(probs)
    }
}

impl Predictor for MergeDecoder {
    fn predict_next(&self, features: &[f32], padded_ids: &[u32]) -> Result<Vec<f32>> {
        Ok(self.forward(features, padded_ids)?.to_vec())
    }
}

//! Random weight initialization
//!
//! Glorot-uniform kernels and zero biases, with the LSTM forget-gate bias set
//! to one. Intended for tests, benchmarks and smoke runs; real weights come
//! from a checkpoint.

use crate::config::MergeConfig;
use crate::merge::{Dense, Lstm, MergeDecoder};
use anyhow::Result;
use ndarray::{s, Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Glorot-uniform matrix with shape `[fan_in, fan_out]`
///
/// Limit is `sqrt(6 / (fan_in + fan_out))`.
pub(crate) fn glorot_uniform(fan_in: usize, fan_out: usize, rng: &mut StdRng) -> Array2<f32> {
    let limit = (6.0 / (fan_in + fan_out) as f32).sqrt();
    Array2::from_shape_simple_fn((fan_in, fan_out), || rng.gen_range(-limit..limit))
}

impl MergeDecoder {
    /// Create a model with random weights
    ///
    /// # Arguments
    /// * `config` - Model configuration
    /// * `seed` - Optional random seed for reproducibility
    pub fn random(config: MergeConfig, seed: Option<u64>) -> Result<Self> {
        config.validate()?;

        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let h = config.hidden_dim;

        let image_dense = Dense::new(
            glorot_uniform(config.feature_dim, h, &mut rng),
            Array1::zeros(h),
        );
        let embedding = Array2::from_shape_simple_fn((config.vocab_size, config.embed_dim), || {
            rng.gen_range(-0.05f32..0.05f32)
        });

        let mut lstm_bias = Array1::<f32>::zeros(4 * h);
        lstm_bias.slice_mut(s![h..2 * h]).fill(1.0);
        let lstm = Lstm::new(
            glorot_uniform(config.embed_dim, 4 * h, &mut rng),
            glorot_uniform(h, 4 * h, &mut rng),
            lstm_bias,
        );

        let decoder_dense = Dense::new(glorot_uniform(h, h, &mut rng), Array1::zeros(h));
        let output = Dense::new(
            glorot_uniform(h, config.vocab_size, &mut rng),
            Array1::zeros(config.vocab_size),
        );

        Ok(Self::from_parts(
            config,
            image_dense,
            embedding,
            lstm,
            decoder_dense,
            output,
        ))
    }
}

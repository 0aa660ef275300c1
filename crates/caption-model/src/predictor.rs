//! Next-token prediction capability

use anyhow::Result;
use std::sync::Arc;

/// Scores every vocabulary id as the next caption token
///
/// Implementations are treated as pure functions of their inputs: the
/// decoder never retries or caches a call. Implementations shared across
/// threads must be `Sync`.
pub trait Predictor {
    /// Score the next token
    ///
    /// # Arguments
    /// * `features` - Image feature vector
    /// * `padded_ids` - Caption so far, padded to the model's sequence length
    ///
    /// # Returns
    /// One score per vocabulary id, indexed by id. Only the relative order
    /// of scores matters to greedy decoding.
    fn predict_next(&self, features: &[f32], padded_ids: &[u32]) -> Result<Vec<f32>>;
}

impl<P: Predictor + ?Sized> Predictor for &P {
    fn predict_next(&self, features: &[f32], padded_ids: &[u32]) -> Result<Vec<f32>> {
        (**self).predict_next(features, padded_ids)
    }
}

impl<P: Predictor + ?Sized> Predictor for Box<P> {
    fn predict_next(&self, features: &[f32], padded_ids: &[u32]) -> Result<Vec<f32>> {
        (**self).predict_next(features, padded_ids)
    }
}

impl<P: Predictor + ?Sized> Predictor for Arc<P> {
    fn predict_next(&self, features: &[f32], padded_ids: &[u32]) -> Result<Vec<f32>> {
        (**self).predict_next(features, padded_ids)
    }
}

/// Adapts a closure into a [`Predictor`]
///
/// ```
/// use caption_model::{FnPredictor, Predictor};
///
/// let uniform = FnPredictor::new(|_features: &[f32], _ids: &[u32]| Ok(vec![0.25; 4]));
/// let scores = uniform.predict_next(&[0.0], &[1, 0, 0]).unwrap();
/// assert_eq!(scores.len(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct FnPredictor<F>(F);

impl<F> FnPredictor<F>
where
    F: Fn(&[f32], &[u32]) -> Result<Vec<f32>>,
{
    /// Wrap a scoring closure
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Predictor for FnPredictor<F>
where
    F: Fn(&[f32], &[u32]) -> Result<Vec<f32>>,
{
    fn predict_next(&self, features: &[f32], padded_ids: &[u32]) -> Result<Vec<f32>> {
        (self.0)(features, padded_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant(Vec<f32>);

    impl Predictor for Constant {
        fn predict_next(&self, _features: &[f32], _padded_ids: &[u32]) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_predictor_through_pointers() {
        let base = Constant(vec![0.1, 0.9]);
        let boxed: Box<dyn Predictor> = Box::new(Constant(vec![0.1, 0.9]));
        let shared = Arc::new(Constant(vec![0.1, 0.9]));

        assert_eq!((&base).predict_next(&[], &[]).unwrap(), vec![0.1, 0.9]);
        assert_eq!(boxed.predict_next(&[], &[]).unwrap(), vec![0.1, 0.9]);
        assert_eq!(shared.predict_next(&[], &[]).unwrap(), vec![0.1, 0.9]);
    }

    #[test]
    fn test_fn_predictor_sees_inputs() {
        let predictor = FnPredictor::new(|features: &[f32], ids: &[u32]| {
            Ok(vec![features.len() as f32, ids.len() as f32])
        });
        assert_eq!(
            predictor.predict_next(&[1.0, 2.0, 3.0], &[1, 0]).unwrap(),
            vec![3.0, 2.0]
        );
    }
}

//! Parallel decoding over a feature store
//!
//! Decode calls share nothing mutable, so each image is decoded on its own
//! rayon task against the same read-only tokenizer and predictor.

use crate::decoder::CaptionDecoder;
use crate::error::DecodeError;
use crate::result::{DecodeResult, DecodeState};
use caption_model::{FeatureStore, Predictor};
use caption_tokenizer::Tokenizer;
use rayon::prelude::*;

/// Outcome of decoding one stored image
#[derive(Debug)]
pub struct BatchEntry {
    /// Image key in the feature store
    pub image: String,
    /// Caption, or the error that stopped it
    pub result: Result<DecodeResult, DecodeError>,
}

/// Decode every image in `store`
///
/// # Returns
/// One entry per image, ordered by image key. A failing image does not stop
/// the others.
pub fn decode_batch<P>(
    store: &FeatureStore,
    predictor: &P,
    tokenizer: &Tokenizer,
    decoder: &CaptionDecoder,
) -> Vec<BatchEntry>
where
    P: Predictor + Sync + ?Sized,
{
    let items: Vec<(&str, &[f32])> = store.iter().collect();

    let entries: Vec<BatchEntry> = items
        .par_iter()
        .map(|&(image, features)| BatchEntry {
            image: image.to_string(),
            result: decoder.decode(features, predictor, tokenizer),
        })
        .collect();

    let failed = entries.iter().filter(|e| e.result.is_err()).count();
    let complete = entries
        .iter()
        .filter(|e| matches!(&e.result, Ok(r) if r.state == DecodeState::Complete))
        .count();
    tracing::info!(
        images = entries.len(),
        complete,
        failed,
        "batch decode finished"
    );

    entries
}

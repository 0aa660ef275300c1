//! Greedy autoregressive caption decoding
//!
//! The loop starts from the start token and, at most `max_length` times:
//! re-encodes the caption text accumulated so far, pads it at the tail to
//! `max_length` ids, asks the predictor for next-token scores, and takes the
//! highest-scoring id. It stops early when that id has no token (aborted) or
//! when the token is the end marker (complete).
//!
//! The model input is rebuilt from the caption *text* on every step, not from
//! the accepted ids. A token whose text does not survive normalization (for
//! example `"two-dogs"`, which encodes as `two dogs`) therefore reaches the
//! predictor in its re-encoded form.

use crate::config::DecoderConfig;
use crate::error::{ConfigurationError, DecodeError, PredictionError};
use crate::result::{DecodeResult, DecodeState};
use caption_model::stability::first_nan;
use caption_model::Predictor;
use caption_tokenizer::{pad_sequence, Padding, Tokenizer, Truncating};

/// Index of the highest score, lowest index on ties
///
/// Returns `None` for an empty slice. NaN scores are never selected.
pub fn greedy_argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (id, &score) in scores.iter().enumerate() {
        match best {
            Some((_, top)) if score <= top => {}
            _ if score.is_nan() => {}
            _ => best = Some((id, score)),
        }
    }
    best.map(|(id, _)| id)
}

/// Id of a reserved marker, which must also encode to exactly that id
///
/// The model input is re-encoded from text, so a marker that normalization
/// rewrites (for example `<start>` with the default filters) would silently
/// vanish from it.
fn marker_id(
    role: &'static str,
    token: &str,
    tokenizer: &Tokenizer,
) -> Result<u32, ConfigurationError> {
    let id = tokenizer
        .id_for_token(token)
        .ok_or_else(|| ConfigurationError::MissingReservedToken {
            role,
            token: token.to_string(),
        })?;
    if tokenizer.encode(token) != [id] {
        return Err(ConfigurationError::MarkerNotNormalized {
            role,
            token: token.to_string(),
        });
    }
    Ok(id)
}

/// Turns image feature vectors into captions by greedy decoding
#[derive(Debug, Clone, Default)]
pub struct CaptionDecoder {
    config: DecoderConfig,
}

impl CaptionDecoder {
    /// Create a decoder
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    /// Decoder configuration
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Check inputs and resolve the start token id
    fn validate(&self, features: &[f32], tokenizer: &Tokenizer) -> Result<u32, ConfigurationError> {
        if self.config.max_length == 0 {
            return Err(ConfigurationError::ZeroMaxLength);
        }
        if features.is_empty() {
            return Err(ConfigurationError::EmptyFeatureVector);
        }
        if let Some(expected) = self.config.feature_dim {
            if features.len() != expected {
                return Err(ConfigurationError::FeatureDimMismatch {
                    expected,
                    actual: features.len(),
                });
            }
        }

        let start_id = marker_id("start", tokenizer.start_token(), tokenizer)?;
        marker_id("end", tokenizer.end_token(), tokenizer)?;
        Ok(start_id)
    }

    /// Decode one caption
    ///
    /// # Arguments
    /// * `features` - Image feature vector
    /// * `predictor` - Next-token scorer
    /// * `tokenizer` - Vocabulary with start and end markers
    ///
    /// # Returns
    /// The caption and the state the loop ended in. At most `max_length`
    /// predictor calls are made.
    ///
    /// # Errors
    /// - [`DecodeError::Configuration`] before any predictor call for a zero
    ///   `max_length`, an empty or wrongly sized feature vector, or markers that
    ///   are missing or do not encode to their own id
    /// - [`DecodeError::Prediction`] when the predictor fails or returns an
    ///   unusable distribution
    pub fn decode<P: Predictor + ?Sized>(
        &self,
        features: &[f32],
        predictor: &P,
        tokenizer: &Tokenizer,
    ) -> Result<DecodeResult, DecodeError> {
        let start_id = self.validate(features, tokenizer)?;
        let max_length = self.config.max_length;
        let vocab_size = tokenizer.vocab_size();

        let mut text = tokenizer.start_token().to_string();
        let mut token_ids = vec![start_id];
        let mut state = DecodeState::Truncated;
        let mut steps = 0;

        for step in 0..max_length {
            let ids = tokenizer.encode(&text);
            let input = pad_sequence(
                &ids,
                max_length,
                Padding::Post,
                Truncating::Pre,
                tokenizer.pad_id(),
            );

            let scores = predictor
                .predict_next(features, &input)
                .map_err(|source| PredictionError::Failed {
                    step,
                    source: source.into(),
                })?;
            steps += 1;

            if scores.len() < vocab_size {
                return Err(PredictionError::Incomplete {
                    step,
                    expected: vocab_size,
                    actual: scores.len(),
                }
                .into());
            }
            if let Some(id) = first_nan(&scores) {
                return Err(PredictionError::NotANumber { step, id }.into());
            }

            let next = greedy_argmax(&scores).ok_or(PredictionError::Incomplete {
                step,
                expected: vocab_size,
                actual: 0,
            })?;
            let token = u32::try_from(next)
                .ok()
                .and_then(|id| tokenizer.token_for_id(id).map(|token| (id, token)));

            let Some((id, token)) = token else {
                tracing::warn!(step, id = next, "predicted id has no token, stopping");
                state = DecodeState::Aborted;
                break;
            };

            tracing::debug!(step, id, token, "decoded token");
            text.push(' ');
            text.push_str(token);
            token_ids.push(id);

            if token == tokenizer.end_token() {
                state = DecodeState::Complete;
                break;
            }
        }

        let result = finish(&text, token_ids, state, steps, tokenizer);
        tracing::debug!(state = %result.state, steps, caption = %result.text, "decode finished");
        Ok(result)
    }
}

/// Strip markers from the accumulated text and build the result
///
/// A truncated caption also loses its final word, so a caption never has
/// more than `max_length - 1` words whichever way the loop ends.
fn finish(
    text: &str,
    token_ids: Vec<u32>,
    state: DecodeState,
    steps: usize,
    tokenizer: &Tokenizer,
) -> DecodeResult {
    let mut words: Vec<&str> = text.split_whitespace().collect();

    if words.first() == Some(&tokenizer.start_token()) {
        words.remove(0);
    }
    match state {
        DecodeState::Complete => {
            if words.last() == Some(&tokenizer.end_token()) {
                words.pop();
            }
        }
        DecodeState::Truncated => {
            words.pop();
        }
        // a lookup miss keeps every accepted word
        DecodeState::Aborted => {}
    }

    let tokens: Vec<String> = words
        .into_iter()
        .filter(|word| !tokenizer.special_tokens().is_marker(word))
        .map(str::to_string)
        .collect();

    DecodeResult {
        text: tokens.join(" "),
        tokens,
        token_ids,
        state,
        steps,
    }
}

/// Decode one caption with a default decoder limited to `max_length` steps
///
/// # Example
///
/// ```
/// use caption_decode::{decode_caption, DecodeState};
/// use caption_model::FnPredictor;
/// use caption_tokenizer::{SpecialTokens, Tokenizer, Vocabulary};
///
/// let mut vocab = Vocabulary::new();
/// for word in ["startseq", "a", "cat", "endseq"] {
///     vocab.add_token(word.to_string());
/// }
/// let tokenizer = Tokenizer::new(vocab, SpecialTokens::default());
///
/// // Scores id 2 ("a"), then id 3 ("cat"), then id 4 ("endseq")
/// let predictor = FnPredictor::new(|_features: &[f32], ids: &[u32]| {
///     let filled = ids.iter().filter(|&&id| id != 0).count();
///     let mut scores = vec![0.0; 5];
///     scores[filled + 1] = 1.0;
///     Ok(scores)
/// });
///
/// let result = decode_caption(&[0.5; 4], &predictor, &tokenizer, 35).unwrap();
/// assert_eq!(result.text, "a cat");
/// assert_eq!(result.state, DecodeState::Complete);
/// ```
pub fn decode_caption<P: Predictor + ?Sized>(
    features: &[f32],
    predictor: &P,
    tokenizer: &Tokenizer,
    max_length: usize,
) -> Result<DecodeResult, DecodeError> {
    CaptionDecoder::new(DecoderConfig::with_max_length(max_length)).decode(
        features,
        predictor,
        tokenizer,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_picks_highest() {
        assert_eq!(greedy_argmax(&[0.1, 0.7, 0.2]), Some(1));
    }

    #[test]
    fn test_argmax_ties_pick_lowest_id() {
        let mut scores = vec![0.0; 10];
        scores[5] = 0.4;
        scores[7] = 0.4;
        assert_eq!(greedy_argmax(&scores), Some(5));
    }

    #[test]
    fn test_argmax_skips_nan() {
        assert_eq!(greedy_argmax(&[f32::NAN, 0.2, 0.1]), Some(1));
    }

    #[test]
    fn test_argmax_handles_negative_infinity() {
        assert_eq!(
            greedy_argmax(&[f32::NEG_INFINITY, f32::NEG_INFINITY]),
            Some(0)
        );
    }

    #[test]
    fn test_argmax_empty() {
        assert_eq!(greedy_argmax(&[]), None);
    }
}

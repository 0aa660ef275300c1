//! Greedy caption decoding
//!
//! Turns a pre-computed image feature vector into a caption by repeatedly
//! asking a [`Predictor`](caption_model::Predictor) for the next token.
//!
//! This crate provides:
//! - [`CaptionDecoder`] and [`decode_caption`]: the decoding loop
//! - [`DecodeError`]: configuration and prediction failures
//! - [`decode_batch`]: parallel decoding of a whole feature store
//! - [`CaptionReport`]: JSON/Markdown summaries of a batch run

pub mod batch;
pub mod config;
pub mod decoder;
pub mod error;
pub mod report;
pub mod result;

pub use batch::{decode_batch, BatchEntry};
pub use config::{DecoderConfig, DEFAULT_MAX_LENGTH};
pub use decoder::{decode_caption, greedy_argmax, CaptionDecoder};
pub use error::{ConfigurationError, DecodeError, PredictionError};
pub use report::{CaptionRecord, CaptionReport};
pub use result::{DecodeResult, DecodeState};

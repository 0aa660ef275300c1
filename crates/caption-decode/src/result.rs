//! Decode output types

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a decode call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeState {
    /// The end token was produced
    Complete,
    /// `max_length` predictions were made without producing the end token
    Truncated,
    /// A predicted id had no token in the vocabulary
    Aborted,
}

impl fmt::Display for DecodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Complete => "complete",
            Self::Truncated => "truncated",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Caption produced by one decode call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeResult {
    /// Caption words, without start or end markers
    pub tokens: Vec<String>,
    /// `tokens` joined with single spaces
    pub text: String,
    /// Every id accepted by the loop, starting with the start token id
    pub token_ids: Vec<u32>,
    /// Terminal state of the loop
    pub state: DecodeState,
    /// Number of predictor calls made
    pub steps: usize,
}

impl DecodeResult {
    /// Whether the caption ended with the end token
    pub fn is_complete(&self) -> bool {
        self.state == DecodeState::Complete
    }
}

impl fmt::Display for DecodeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

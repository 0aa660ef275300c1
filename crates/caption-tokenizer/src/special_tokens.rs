//! Special token handling

use serde::{Deserialize, Serialize};

/// Reserved tokens that frame a caption
///
/// Captions are trained as `startseq <words> endseq`; decoding is seeded
/// with the start token and stops once the end token is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialTokens {
    /// Token that opens every caption
    start: String,
    /// Token that closes a finished caption
    end: String,
    /// Token standing in for out-of-vocabulary words, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    oov: Option<String>,
}

impl Default for SpecialTokens {
    fn default() -> Self {
        Self {
            start: "startseq".to_string(),
            end: "endseq".to_string(),
            oov: None,
        }
    }
}

impl SpecialTokens {
    /// Create special tokens with custom start/end markers and no OOV token
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            oov: None,
        }
    }

    /// Use `token` for words missing from the vocabulary
    pub fn with_oov(mut self, token: impl Into<String>) -> Self {
        self.oov = Some(token.into());
        self
    }

    /// Get the start-of-caption token
    pub fn start(&self) -> &str {
        &self.start
    }

    /// Get the end-of-caption token
    pub fn end(&self) -> &str {
        &self.end
    }

    /// Get the out-of-vocabulary token
    pub fn oov(&self) -> Option<&str> {
        self.oov.as_deref()
    }

    /// Check if a token is one of the caption markers
    pub fn is_marker(&self, token: &str) -> bool {
        token == self.start || token == self.end
    }
}

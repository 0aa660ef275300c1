//! Text normalization applied before vocabulary lookup

use serde::{Deserialize, Serialize};

/// Characters stripped from text before splitting into words
pub const DEFAULT_FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

/// Options controlling how raw text is split into words
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerOptions {
    /// Lowercase text before splitting
    pub lower: bool,
    /// Every character in this set is replaced by `split`
    pub filters: String,
    /// Word separator
    pub split: char,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self {
            lower: true,
            filters: DEFAULT_FILTERS.to_string(),
            split: ' ',
        }
    }
}

/// Split text into normalized words
///
/// Filter characters become separators, so `"two-dogs"` yields
/// `["two", "dogs"]`. Empty pieces are dropped.
pub fn text_to_word_sequence(text: &str, options: &TokenizerOptions) -> Vec<String> {
    let text = if options.lower {
        text.to_lowercase()
    } else {
        text.to_string()
    };

    let normalized: String = text
        .chars()
        .map(|c| {
            if options.filters.contains(c) {
                options.split
            } else {
                c
            }
        })
        .collect();

    normalized
        .split(options.split)
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

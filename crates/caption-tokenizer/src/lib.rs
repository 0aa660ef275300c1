//! Word-level tokenizer for caption decoding
//!
//! This crate provides:
//! - Vocabulary management with a reserved padding id
//! - Text normalization (lowercasing, punctuation filtering)
//! - Fitting a vocabulary from a caption corpus
//! - Fixed-length sequence padding
//! - Tokenizer persistence as JSON
//!
//! # Example
//!
//! ```no_run
//! use caption_tokenizer::{SpecialTokens, Tokenizer, TokenizerOptions};
//!
//! let corpus = ["startseq a dog runs endseq", "startseq a cat sleeps endseq"];
//! let tokenizer = Tokenizer::fit_on_texts(
//!     corpus.iter(),
//!     SpecialTokens::default(),
//!     TokenizerOptions::default(),
//! );
//!
//! let ids = tokenizer.encode("startseq a dog");
//! let text = tokenizer.decode(&ids);
//! assert_eq!(text, "startseq a dog");
//! ```

pub mod sequence;
pub mod special_tokens;
pub mod text;
pub mod vocab;

pub use sequence::{pad_sequence, Padding, Truncating};
pub use special_tokens::SpecialTokens;
pub use text::{text_to_word_sequence, TokenizerOptions, DEFAULT_FILTERS};
pub use vocab::{Vocabulary, VocabularyError, PAD_ID};

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// File name used inside a tokenizer directory
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Tokenizer data
///
/// On-disk form of a [`Tokenizer`]: the word index plus everything needed to
/// reproduce its normalization.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct TokenizerData {
    /// Token to ID mapping
    pub word_index: HashMap<String, u32>,
    /// Caption markers
    #[serde(default)]
    pub special_tokens: SpecialTokens,
    /// Normalization options
    #[serde(default)]
    pub options: TokenizerOptions,
}

/// Main tokenizer interface combining vocabulary, special tokens and normalization
#[derive(Debug, Clone)]
pub struct Tokenizer {
    vocab: Vocabulary,
    special: SpecialTokens,
    options: TokenizerOptions,
}

impl Tokenizer {
    /// Create a tokenizer over an existing vocabulary with default normalization
    pub fn new(vocab: Vocabulary, special: SpecialTokens) -> Self {
        Self::with_options(vocab, special, TokenizerOptions::default())
    }

    /// Create a tokenizer with explicit normalization options
    pub fn with_options(
        vocab: Vocabulary,
        special: SpecialTokens,
        options: TokenizerOptions,
    ) -> Self {
        Self {
            vocab,
            special,
            options,
        }
    }

    /// Fit a vocabulary on a corpus of captions
    ///
    /// Words are ranked by descending frequency, ties keeping the order of
    /// first appearance, and numbered from 1. A configured OOV token always
    /// takes the first id.
    ///
    /// # Arguments
    /// * `texts` - Iterator over training captions
    /// * `special` - Caption markers; they must appear in the corpus to be learned
    /// * `options` - Normalization options
    pub fn fit_on_texts<I, S>(texts: I, special: SpecialTokens, options: TokenizerOptions) -> Self
    where
        I: Iterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        for text in texts {
            for word in text_to_word_sequence(text.as_ref(), &options) {
                let seen = counts.len();
                counts.entry(word).or_insert((0, seen)).0 += 1;
            }
        }

        let mut ranked: Vec<(String, usize, usize)> = counts
            .into_iter()
            .map(|(word, (count, first_seen))| (word, count, first_seen))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

        let mut vocab = Vocabulary::new();
        if let Some(oov) = special.oov() {
            vocab.add_token(oov.to_string());
        }
        for (word, _, _) in ranked {
            vocab.add_token(word);
        }

        tracing::debug!(words = vocab.size(), "fitted tokenizer vocabulary");

        Self {
            vocab,
            special,
            options,
        }
    }

    /// Encode text to token IDs
    ///
    /// Unknown words are dropped unless an OOV token is configured and
    /// present in the vocabulary.
    pub fn encode(&self, text: &str) -> Vec<u32> {
        let oov_id = self
            .special
            .oov()
            .and_then(|token| self.vocab.token_to_id(token).ok());

        text_to_word_sequence(text, &self.options)
            .iter()
            .filter_map(|word| self.vocab.token_to_id(word).ok().or(oov_id))
            .collect()
    }

    /// Encode a batch of texts
    pub fn encode_batch(&self, texts: &[&str]) -> Vec<Vec<u32>> {
        texts.iter().map(|text| self.encode(text)).collect()
    }

    /// Decode token IDs to text
    ///
    /// Ids without a token, including [`PAD_ID`], are skipped.
    pub fn decode(&self, ids: &[u32]) -> String {
        ids.iter()
            .filter_map(|&id| self.vocab.id_to_token(id).ok())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Reverse lookup; `None` is a lookup miss
    pub fn token_for_id(&self, id: u32) -> Option<&str> {
        self.vocab.id_to_token(id).ok()
    }

    /// Forward lookup for a single, already normalized token
    pub fn id_for_token(&self, token: &str) -> Option<u32> {
        self.vocab.token_to_id(token).ok()
    }

    /// Caption start marker
    pub fn start_token(&self) -> &str {
        self.special.start()
    }

    /// Caption end marker
    pub fn end_token(&self) -> &str {
        self.special.end()
    }

    /// Id used to pad model inputs
    pub fn pad_id(&self) -> u32 {
        PAD_ID
    }

    /// Size of the id space, counting the padding slot
    pub fn vocab_size(&self) -> usize {
        self.vocab.max_id() as usize + 1
    }

    /// Underlying vocabulary
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Caption markers
    pub fn special_tokens(&self) -> &SpecialTokens {
        &self.special
    }

    /// Normalization options
    pub fn options(&self) -> &TokenizerOptions {
        &self.options
    }

    /// Build a tokenizer from its serialized form
    ///
    /// # Errors
    /// Returns an error if the word index is not a valid vocabulary
    pub fn from_data(data: TokenizerData) -> Result<Self> {
        let vocab = Vocabulary::from_word_index(data.word_index)
            .context("Invalid tokenizer word index")?;
        Ok(Self::with_options(vocab, data.special_tokens, data.options))
    }

    /// Serializable form of this tokenizer
    pub fn to_data(&self) -> TokenizerData {
        TokenizerData {
            word_index: self.vocab.word_index().clone(),
            special_tokens: self.special.clone(),
            options: self.options.clone(),
        }
    }

    /// Load tokenizer from a JSON file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tokenizer file: {}", path.display()))?;
        let data: TokenizerData = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse tokenizer file: {}", path.display()))?;
        let tokenizer = Self::from_data(data)?;

        tracing::info!(
            path = %path.display(),
            words = tokenizer.vocab.size(),
            "loaded tokenizer"
        );
        Ok(tokenizer)
    }

    /// Load tokenizer from a directory containing `tokenizer.json`
    ///
    /// # Errors
    /// Returns an error if the tokenizer file is missing or invalid
    pub fn from_directory<P: AsRef<Path>>(path: P) -> Result<Self> {
        let tokenizer_file = path.as_ref().join(TOKENIZER_FILE);

        if !tokenizer_file.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_file.display());
        }

        Self::from_file(tokenizer_file)
    }

    /// Save tokenizer to a directory as `tokenizer.json`
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created or the file cannot be written
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;

        let tokenizer_file = path.join(TOKENIZER_FILE);
        let content =
            serde_json::to_string(&self.to_data()).context("Failed to serialize tokenizer")?;

        std::fs::write(&tokenizer_file, content).with_context(|| {
            format!(
                "Failed to write tokenizer file: {}",
                tokenizer_file.display()
            )
        })?;

        Ok(())
    }
}

//! Vocabulary management

use std::collections::HashMap;
use thiserror::Error;

/// Id reserved for padding; never assigned to a token
pub const PAD_ID: u32 = 0;

/// Errors that can occur during vocabulary operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VocabularyError {
    #[error("Token not found in vocabulary: {0}")]
    TokenNotFound(String),
    #[error("ID not found in vocabulary: {0}")]
    IdNotFound(u32),
    #[error("Token {0:?} uses the reserved padding id 0")]
    ReservedId(String),
    #[error("Tokens {first:?} and {second:?} share id {id}")]
    DuplicateId {
        id: u32,
        first: String,
        second: String,
    },
    #[error("Vocabulary contains an empty token")]
    EmptyToken,
}

/// Vocabulary mapping between tokens and IDs
///
/// Maintains bidirectional mappings:
/// - token -> ID (for encoding)
/// - ID -> token (for decoding)
///
/// Ids are assigned from 1; [`PAD_ID`] is never mapped to a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    /// Mapping from token to ID
    token_to_id: HashMap<String, u32>,
    /// Mapping from ID to token
    id_to_token: HashMap<u32, String>,
    /// Next available ID for new tokens
    next_id: u32,
}

impl Vocabulary {
    /// Create a new empty vocabulary
    pub fn new() -> Self {
        Self {
            token_to_id: HashMap::new(),
            id_to_token: HashMap::new(),
            next_id: PAD_ID + 1,
        }
    }

    /// Build a vocabulary from an existing word index
    ///
    /// The index must be a true bijection that leaves [`PAD_ID`] unused.
    pub fn from_word_index(word_index: HashMap<String, u32>) -> Result<Self, VocabularyError> {
        let mut id_to_token: HashMap<u32, String> = HashMap::with_capacity(word_index.len());
        let mut next_id = PAD_ID + 1;

        for (token, &id) in &word_index {
            if token.is_empty() {
                return Err(VocabularyError::EmptyToken);
            }
            if id == PAD_ID {
                return Err(VocabularyError::ReservedId(token.clone()));
            }
            if let Some(existing) = id_to_token.insert(id, token.clone()) {
                // Report the pair in a stable order regardless of map iteration
                let (first, second) = if existing < *token {
                    (existing, token.clone())
                } else {
                    (token.clone(), existing)
                };
                return Err(VocabularyError::DuplicateId { id, first, second });
            }
            next_id = next_id.max(id.saturating_add(1));
        }

        Ok(Self {
            token_to_id: word_index,
            id_to_token,
            next_id,
        })
    }

    /// Add a token to the vocabulary
    ///
    /// Returns the ID assigned to the token. If the token already exists,
    /// returns its existing ID.
    pub fn add_token(&mut self, token: String) -> u32 {
        if let Some(&id) = self.token_to_id.get(&token) {
            return id;
        }

        let id = self.next_id;
        self.token_to_id.insert(token.clone(), id);
        self.id_to_token.insert(id, token);
        self.next_id += 1;
        id
    }

    /// Get the ID for a token
    pub fn token_to_id(&self, token: &str) -> Result<u32, VocabularyError> {
        self.token_to_id
            .get(token)
            .copied()
            .ok_or_else(|| VocabularyError::TokenNotFound(token.to_string()))
    }

    /// Get the token for an ID
    pub fn id_to_token(&self, id: u32) -> Result<&str, VocabularyError> {
        self.id_to_token
            .get(&id)
            .map(|s| s.as_str())
            .ok_or(VocabularyError::IdNotFound(id))
    }

    /// Check if a token exists in the vocabulary
    pub fn contains_token(&self, token: &str) -> bool {
        self.token_to_id.contains_key(token)
    }

    /// Check if an ID exists in the vocabulary
    pub fn contains_id(&self, id: u32) -> bool {
        self.id_to_token.contains_key(&id)
    }

    /// Number of tokens (the padding slot is not counted)
    pub fn size(&self) -> usize {
        self.token_to_id.len()
    }

    /// Check if the vocabulary is empty
    pub fn is_empty(&self) -> bool {
        self.token_to_id.is_empty()
    }

    /// Largest id in use, or [`PAD_ID`] for an empty vocabulary
    pub fn max_id(&self) -> u32 {
        self.next_id - 1
    }

    /// The underlying token -> ID map
    pub fn word_index(&self) -> &HashMap<String, u32> {
        &self.token_to_id
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

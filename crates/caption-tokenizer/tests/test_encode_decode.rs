//! Tests for encoding and decoding captions

use caption_tokenizer::{
    pad_sequence, Padding, SpecialTokens, Tokenizer, TokenizerOptions, Truncating, Vocabulary,
};
use std::collections::HashMap;

fn create_test_tokenizer() -> Tokenizer {
    let word_index = HashMap::from([
        ("startseq".to_string(), 1),
        ("endseq".to_string(), 2),
        ("a".to_string(), 3),
        ("dog".to_string(), 4),
        ("two".to_string(), 5),
        ("dogs".to_string(), 6),
        ("two-dogs".to_string(), 7),
        ("Cat".to_string(), 8),
    ]);
    let vocab = Vocabulary::from_word_index(word_index).expect("Invalid word index");
    Tokenizer::new(vocab, SpecialTokens::default())
}

#[test]
fn test_encode_basic() {
    let tokenizer = create_test_tokenizer();
    assert_eq!(tokenizer.encode("startseq a dog"), vec![1, 3, 4]);
}

#[test]
fn test_token_with_filter_character_does_not_round_trip() {
    let tokenizer = create_test_tokenizer();
    // The vocabulary knows "two-dogs" but normalization splits it
    assert_eq!(tokenizer.id_for_token("two-dogs"), Some(7));
    assert_eq!(tokenizer.encode("two-dogs"), vec![5, 6]);
}

#[test]
fn test_uppercase_token_is_unreachable_by_encoding() {
    let tokenizer = create_test_tokenizer();
    assert_eq!(tokenizer.token_for_id(8), Some("Cat"));
    assert!(tokenizer.encode("Cat").is_empty());
}

#[test]
fn test_encode_empty_string() {
    let tokenizer = create_test_tokenizer();
    assert!(tokenizer.encode("").is_empty());
}

#[test]
fn test_decode_empty_ids() {
    let tokenizer = create_test_tokenizer();
    assert_eq!(tokenizer.decode(&[]), "");
}

#[test]
fn test_encode_batch() {
    let tokenizer = create_test_tokenizer();
    let texts = vec!["a dog", "two dogs", "unknown"];
    let all_ids = tokenizer.encode_batch(&texts);
    assert_eq!(all_ids, vec![vec![3, 4], vec![5, 6], vec![]]);
}

#[test]
fn test_encode_then_pad_for_model_input() {
    let tokenizer = create_test_tokenizer();
    let ids = tokenizer.encode("startseq a dog");
    let padded = pad_sequence(&ids, 6, Padding::Post, Truncating::Pre, tokenizer.pad_id());
    assert_eq!(padded, vec![1, 3, 4, 0, 0, 0]);
}

#[test]
fn test_custom_options_keep_hyphenated_words() {
    let word_index = HashMap::from([("two-dogs".to_string(), 1)]);
    let vocab = Vocabulary::from_word_index(word_index).expect("Invalid word index");
    let options = TokenizerOptions {
        filters: String::new(),
        ..TokenizerOptions::default()
    };
    let tokenizer = Tokenizer::with_options(vocab, SpecialTokens::default(), options);
    assert_eq!(tokenizer.encode("two-dogs"), vec![1]);
}

//! Batch decoding and reporting

use anyhow::Result;
use caption_decode::{decode_batch, CaptionDecoder, CaptionReport, DecodeState, DecoderConfig};
use caption_model::{FeatureStore, Predictor};
use caption_tokenizer::{SpecialTokens, Tokenizer, Vocabulary};

/// Picks the next token from the first feature value
///
/// 0: "a cat" then end, 1: "a" forever, 2: unknown id, 3: error
struct FeatureKeyed;

impl Predictor for FeatureKeyed {
    fn predict_next(&self, features: &[f32], padded_ids: &[u32]) -> Result<Vec<f32>> {
        let filled = padded_ids.iter().filter(|&&id| id != 0).count();
        let id = match features[0] as u32 {
            0 => filled + 1,
            1 => 2,
            2 => 9,
            _ => anyhow::bail!("no weights for this image"),
        };
        let mut scores = vec![0.0; 10];
        scores[id] = 1.0;
        Ok(scores)
    }
}

fn create_test_tokenizer() -> Tokenizer {
    let mut vocab = Vocabulary::new();
    for word in ["startseq", "a", "cat", "endseq"] {
        vocab.add_token(word.to_string());
    }
    Tokenizer::new(vocab, SpecialTokens::default())
}

fn create_test_store() -> FeatureStore {
    let mut store = FeatureStore::new();
    store.insert("d_error.jpg", vec![3.0, 0.0]).unwrap();
    store.insert("a_complete.jpg", vec![0.0, 0.0]).unwrap();
    store.insert("c_aborted.jpg", vec![2.0, 0.0]).unwrap();
    store.insert("b_truncated.jpg", vec![1.0, 0.0]).unwrap();
    store
}

#[test]
fn test_batch_keeps_key_order_and_isolates_failures() {
    let decoder = CaptionDecoder::new(DecoderConfig::with_max_length(4));
    let entries = decode_batch(
        &create_test_store(),
        &FeatureKeyed,
        &create_test_tokenizer(),
        &decoder,
    );

    let images: Vec<&str> = entries.iter().map(|e| e.image.as_str()).collect();
    assert_eq!(
        images,
        vec![
            "a_complete.jpg",
            "b_truncated.jpg",
            "c_aborted.jpg",
            "d_error.jpg"
        ]
    );

    let complete = entries[0].result.as_ref().unwrap();
    assert_eq!(complete.text, "a cat");
    assert_eq!(complete.state, DecodeState::Complete);

    let truncated = entries[1].result.as_ref().unwrap();
    assert_eq!(truncated.text, "a a a");
    assert_eq!(truncated.state, DecodeState::Truncated);

    let aborted = entries[2].result.as_ref().unwrap();
    assert_eq!(aborted.text, "");
    assert_eq!(aborted.state, DecodeState::Aborted);

    assert!(entries[3].result.is_err());
}

#[test]
fn test_batch_matches_sequential_decoding() {
    let store = create_test_store();
    let tokenizer = create_test_tokenizer();
    let decoder = CaptionDecoder::default();

    let entries = decode_batch(&store, &FeatureKeyed, &tokenizer, &decoder);

    for entry in &entries {
        let features = store.get(&entry.image).unwrap();
        let sequential = decoder.decode(features, &FeatureKeyed, &tokenizer);
        match (&entry.result, sequential) {
            (Ok(batch), Ok(single)) => assert_eq!(*batch, single),
            (Err(_), Err(_)) => {}
            _ => panic!("batch and sequential disagree for {}", entry.image),
        }
    }
}

#[test]
fn test_report_counts_states() {
    let decoder = CaptionDecoder::new(DecoderConfig::with_max_length(4));
    let entries = decode_batch(
        &create_test_store(),
        &FeatureKeyed,
        &create_test_tokenizer(),
        &decoder,
    );

    let report = CaptionReport::generate_report(&entries);
    assert_eq!(report.records.len(), 4);
    assert_eq!(report.complete, 1);
    assert_eq!(report.truncated, 1);
    assert_eq!(report.aborted, 1);
    assert_eq!(report.failed, 1);

    let failed = &report.records[3];
    assert!(failed.caption.is_none());
    assert!(failed
        .error
        .as_deref()
        .unwrap()
        .contains("predictor failed at step 0"));
}

#[test]
fn test_report_markdown() {
    let decoder = CaptionDecoder::new(DecoderConfig::with_max_length(4));
    let entries = decode_batch(
        &create_test_store(),
        &FeatureKeyed,
        &create_test_tokenizer(),
        &decoder,
    );
    let md = CaptionReport::generate_report(&entries).to_markdown();

    assert!(md.starts_with("# Caption Report"));
    assert!(md.contains("| a_complete.jpg | a cat | complete | 3 |"));
    assert!(md.contains("| b_truncated.jpg | a a a | truncated | 4 |"));
    assert!(md.contains("| d_error.jpg | error: predictor failed at step 0 | failed | 0 |"));
}

#[test]
fn test_report_serializes_to_json() {
    let entries = decode_batch(
        &create_test_store(),
        &FeatureKeyed,
        &create_test_tokenizer(),
        &CaptionDecoder::default(),
    );
    let report = CaptionReport::generate_report(&entries);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["complete"], 1);
    assert_eq!(json["records"][0]["state"], "complete");
    assert!(json["records"][3]["state"].is_null());
}

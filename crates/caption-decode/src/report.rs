//! Report generation for batch captioning

use crate::batch::BatchEntry;
use crate::result::DecodeState;
use serde::{Deserialize, Serialize};

/// Caption outcome for a single image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionRecord {
    /// Image key
    pub image: String,
    /// Caption text, absent when decoding failed
    pub caption: Option<String>,
    /// Terminal state, absent when decoding failed
    pub state: Option<DecodeState>,
    /// Predictor calls made
    pub steps: usize,
    /// Error message when decoding failed
    pub error: Option<String>,
}

impl From<&BatchEntry> for CaptionRecord {
    fn from(entry: &BatchEntry) -> Self {
        match &entry.result {
            Ok(result) => Self {
                image: entry.image.clone(),
                caption: Some(result.text.clone()),
                state: Some(result.state),
                steps: result.steps,
                error: None,
            },
            Err(err) => Self {
                image: entry.image.clone(),
                caption: None,
                state: None,
                steps: 0,
                error: Some(err.to_string()),
            },
        }
    }
}

/// Batch captioning report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionReport {
    /// One record per image, in image key order
    pub records: Vec<CaptionRecord>,
    /// Captions ended by the end token
    pub complete: usize,
    /// Captions cut at the length limit
    pub truncated: usize,
    /// Captions stopped by an unknown id
    pub aborted: usize,
    /// Images whose decoding raised an error
    pub failed: usize,
    /// Timestamp of the run
    pub timestamp: String,
}

impl CaptionReport {
    /// Generate a report from batch entries
    pub fn generate_report(entries: &[BatchEntry]) -> Self {
        let records: Vec<CaptionRecord> = entries.iter().map(CaptionRecord::from).collect();
        let count = |state: DecodeState| records.iter().filter(|r| r.state == Some(state)).count();

        Self {
            complete: count(DecodeState::Complete),
            truncated: count(DecodeState::Truncated),
            aborted: count(DecodeState::Aborted),
            failed: records.iter().filter(|r| r.error.is_some()).count(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            records,
        }
    }

    /// Format report as markdown
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str("# Caption Report\n\n");
        md.push_str(&format!("**Timestamp**: {}\n\n", self.timestamp));
        md.push_str(&format!(
            "**Images**: {} (complete {}, truncated {}, aborted {}, failed {})\n\n",
            self.records.len(),
            self.complete,
            self.truncated,
            self.aborted,
            self.failed
        ));
        md.push_str("## Captions\n\n");
        md.push_str("| Image | Caption | State | Steps |\n");
        md.push_str("|-------|---------|-------|-------|\n");

        for record in &self.records {
            let caption = match (&record.caption, &record.error) {
                (Some(caption), _) => caption.clone(),
                (None, Some(error)) => format!("error: {}", error),
                (None, None) => String::new(),
            };
            let state = record
                .state
                .map(|s| s.to_string())
                .unwrap_or_else(|| "failed".to_string());
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                record.image,
                caption.replace('|', "\\|"),
                state,
                record.steps
            ));
        }

        md
    }
}

//! Numerical checks over score vectors
//!
//! Used to reject malformed predictor output before greedy selection.

/// Check if scores contain any NaN values
pub fn has_nan(scores: &[f32]) -> bool {
    scores.iter().any(|x| x.is_nan())
}

/// Check if scores contain any infinite values
pub fn has_inf(scores: &[f32]) -> bool {
    scores.iter().any(|x| x.is_infinite())
}

/// Index of the first NaN score, if any
pub fn first_nan(scores: &[f32]) -> Option<usize> {
    scores.iter().position(|x| x.is_nan())
}

/// Validate that scores contain neither NaN nor infinite values
///
/// # Arguments
/// * `scores` - Values to validate
/// * `name` - Name used in error messages
pub fn validate_finite(scores: &[f32], name: &str) -> anyhow::Result<()> {
    if let Some(idx) = first_nan(scores) {
        anyhow::bail!("'{}' contains NaN at index {}", name, idx);
    }
    if has_inf(scores) {
        anyhow::bail!("'{}' contains Inf values", name);
    }
    Ok(())
}

//! Fixed-length sequence padding

/// Side on which padding values are inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Padding {
    /// Pad at the head
    Pre,
    /// Pad at the tail
    Post,
}

/// Side from which overlong sequences lose ids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truncating {
    /// Drop ids from the head, keeping the most recent ones
    Pre,
    /// Drop ids from the tail
    Post,
}

/// Pad or truncate `ids` to exactly `max_len` entries
///
/// # Arguments
/// * `ids` - Token ids to fit
/// * `max_len` - Output length
/// * `padding` - Where `value` is inserted when `ids` is short
/// * `truncating` - Which end is cut when `ids` is long
/// * `value` - Padding id
pub fn pad_sequence(
    ids: &[u32],
    max_len: usize,
    padding: Padding,
    truncating: Truncating,
    value: u32,
) -> Vec<u32> {
    let kept = if ids.len() > max_len {
        match truncating {
            Truncating::Pre => &ids[ids.len() - max_len..],
            Truncating::Post => &ids[..max_len],
        }
    } else {
        ids
    };

    let fill = max_len - kept.len();
    let mut padded = Vec::with_capacity(max_len);
    match padding {
        Padding::Pre => {
            padded.extend(std::iter::repeat(value).take(fill));
            padded.extend_from_slice(kept);
        }
        Padding::Post => {
            padded.extend_from_slice(kept);
            padded.extend(std::iter::repeat(value).take(fill));
        }
    }
    padded
}

//! Character-safe text helpers.
//!
//! Every budget in riskiq is measured in Unicode scalar values (`char`s), never
//! bytes, so a cut can never land inside a multi-byte sequence.

/// Number of characters in `s`.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Return the first `max_chars` characters of `s` (a hard cut, not word aware).
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_is_char_safe() {
        let s = "héllo wörld";
        assert_eq!(truncate_chars(s, 2), "hé");
        assert_eq!(truncate_chars(s, 100), s);
        assert_eq!(truncate_chars(s, 0), "");
        assert_eq!(char_len(s), 11);
    }
}

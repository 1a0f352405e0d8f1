//! Natural-key normalization.
//!
//! Records carry no surrogate identifier. Identity is the tuple of their key
//! fields compared after trimming surrounding whitespace and lowercasing.
//! Nothing derived is ever stored: normalization happens at comparison time.

/// Lowercase + trim.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// `true` when the component carries no identity (empty or only whitespace).
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Case- and whitespace-insensitive equality of two key components.
pub fn eq_normalized(left: &str, right: &str) -> bool {
    let left = left.trim();
    let right = right.trim();
    // ASCII keys compare without allocating.
    if left.is_ascii() && right.is_ascii() {
        return left.eq_ignore_ascii_case(right);
    }
    left.to_lowercase() == right.to_lowercase()
}

/// Component-wise comparison of two composite keys. Keys of different arity never match.
pub fn keys_match(stored: &[&str], query: &[&str]) -> bool {
    stored.len() == query.len()
        && stored
            .iter()
            .zip(query)
            .all(|(left, right)| eq_normalized(left, right))
}

/// A query key is usable only when it has the expected arity and no blank component.
pub fn is_usable_key(parts: &[&str], arity: usize) -> bool {
    parts.len() == arity && !parts.iter().any(|part| is_blank(part))
}

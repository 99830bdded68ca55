//! Pattern matching for LIKE predicates.
//!
//! SQL LIKE with two wildcards:
//! - `%` matches zero or more characters
//! - `_` matches exactly one character
//!
//! Matching is **case-sensitive** and operates on Unicode scalar values.

use alloc::vec::Vec;

/// SQL LIKE pattern matching.
///
/// `%` matches any sequence of zero or more characters.
/// `_` matches exactly one character.
///
/// ```
/// use ripple_core::pattern_match::like;
/// assert!(like("booya2", "booya%"));
/// assert!(like("booya", "_ooya"));
/// assert!(!like("booya", "boo"));
/// ```
pub fn like(value: &str, pattern: &str) -> bool {
    let v: Vec<char> = value.chars().collect();
    let p: Vec<char> = pattern.chars().collect();
    matches_from(&v, &p)
}

fn matches_from(v: &[char], p: &[char]) -> bool {
    match p.first() {
        None => v.is_empty(),
        Some('%') => {
            // Zero or more characters: try every split point.
            (0..=v.len()).any(|skip| matches_from(&v[skip..], &p[1..]))
        }
        Some('_') => !v.is_empty() && matches_from(&v[1..], &p[1..]),
        Some(&ch) => v.first() == Some(&ch) && matches_from(&v[1..], &p[1..]),
    }
}

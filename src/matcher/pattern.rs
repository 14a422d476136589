//! Prefix matching implementation.

use crate::error::EngineError;

/// Longest prefix a search may ask for.
pub const MAX_PREFIX_LEN: usize = 8;

/// Result of a pattern match operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// Full match found
    Match,
    /// No match
    NoMatch,
}

impl MatchResult {
    #[inline]
    pub fn is_match(self) -> bool {
        matches!(self, MatchResult::Match)
    }
}

/// Validates a raw prefix and folds it to the canonical (upper) case.
///
/// Accepts 1 to [`MAX_PREFIX_LEN`] characters from `[A-Za-z0-9]`.
pub fn normalize_prefix(raw: &str) -> Result<String, EngineError> {
    if raw.is_empty() {
        return Err(EngineError::InvalidPrefix("Prefix cannot be empty".into()));
    }

    if raw.chars().count() > MAX_PREFIX_LEN {
        return Err(EngineError::InvalidPrefix(format!(
            "Prefix cannot be longer than {} characters",
            MAX_PREFIX_LEN
        )));
    }

    if !raw.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(EngineError::InvalidPrefix(
            "Prefix can only contain letters and numbers".into(),
        ));
    }

    Ok(raw.to_ascii_uppercase())
}

/// A validated prefix, ready for matching.
///
/// The prefix is always stored upper-case. With case-sensitive matching the
/// candidate is compared as-is, so a base58 address has to carry the
/// upper-case letters itself. Otherwise the candidate's leading characters
/// are folded to upper case before comparing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    /// The prefix (normalized)
    prefix: String,
    /// Whether matching is case sensitive
    case_sensitive: bool,
}

impl Pattern {
    /// Validates and normalizes `prefix`.
    pub fn new(prefix: &str, case_sensitive: bool) -> Result<Self, EngineError> {
        Ok(Self {
            prefix: normalize_prefix(prefix)?,
            case_sensitive,
        })
    }

    /// Returns the normalized prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Matches a candidate address against this prefix.
    #[inline]
    pub fn matches(&self, address: &str) -> MatchResult {
        let matched = if self.case_sensitive {
            address.starts_with(&self.prefix)
        } else {
            address
                .as_bytes()
                .get(..self.prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(self.prefix.as_bytes()))
        };

        if matched {
            MatchResult::Match
        } else {
            MatchResult::NoMatch
        }
    }

    /// Returns the characters of the prefix that can never appear in an
    /// address drawn from `alphabet`.
    ///
    /// A non-empty result means the search cannot succeed.
    pub fn unreachable_chars(&self, alphabet: &str) -> Vec<char> {
        self.prefix
            .chars()
            .filter(|&c| {
                if self.case_sensitive {
                    !alphabet.contains(c)
                } else {
                    !alphabet.chars().any(|a| a.eq_ignore_ascii_case(&c))
                }
            })
            .collect()
    }

    /// Returns the expected number of attempts to find a match.
    ///
    /// Each position is one of `radix` symbols, so the expectation is
    /// `radix^n` where n is the prefix length.
    pub fn estimated_difficulty(&self, radix: u64) -> u64 {
        radix.saturating_pow(self.prefix.len() as u32)
    }

    /// Returns a human-readable difficulty estimate.
    pub fn difficulty_description(&self, radix: u64) -> String {
        let diff = self.estimated_difficulty(radix);
        match diff {
            0..=1_000 => "Very Easy (< 1 second)".into(),
            1_001..=100_000 => "Easy (seconds)".into(),
            100_001..=10_000_000 => "Medium (minutes)".into(),
            10_000_001..=1_000_000_000 => "Hard (hours)".into(),
            _ => "Very Hard (days or more)".into(),
        }
    }
}

//! Prefix matching for candidate addresses.
//!
//! Prefixes are validated and folded to upper case once, at job creation.
//! The same [`Pattern`] is then used for every candidate of that job, so
//! validation and matching can never disagree on case.

mod pattern;

pub use pattern::{normalize_prefix, MatchResult, Pattern, MAX_PREFIX_LEN};

//! Target matching with trailing-wildcard support
//!
//! A target pattern is either a literal resource identifier
//! (`invoice:787`) or a prefix followed by a single trailing `*`
//! (`invoice:*`). There is no other wildcard position: a `*` anywhere but
//! the end is an ordinary character.
//!
//! ## Examples
//! - `invoice:*` covers `invoice:555` but not `user:1`
//! - `invoice:787` covers only `invoice:787`
//! - `*` covers every non-empty identifier

use crate::error::{PolicyError, Result};
use crate::MAX_TARGET_PATTERN_LENGTH;
use alloc::string::String;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Check whether `pattern` covers the concrete target `actual`
///
/// Total over any pair of strings; a non-match is `false`, never an error.
#[must_use]
pub fn matches(pattern: &str, actual: &str) -> bool {
    if pattern == actual {
        return true;
    }

    match pattern.strip_suffix('*') {
        // An empty identifier is never covered by a wildcard, even a bare `*`
        Some(prefix) => !actual.is_empty() && actual.starts_with(prefix),
        None => false,
    }
}

/// Target pattern attached to a rule
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetPattern {
    pattern: String,
}

impl TargetPattern {
    /// Create a new target pattern
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::PatternTooLong` if pattern exceeds `MAX_TARGET_PATTERN_LENGTH`
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();

        if pattern.len() > MAX_TARGET_PATTERN_LENGTH {
            return Err(PolicyError::PatternTooLong {
                max: MAX_TARGET_PATTERN_LENGTH,
                length: pattern.len(),
            });
        }

        Ok(Self { pattern })
    }

    /// Create a pattern without the length check
    ///
    /// Rules built this way are still checked by `Policy::validate()`.
    #[must_use]
    pub(crate) fn new_unchecked(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    /// Check if a concrete target is covered by this pattern
    #[must_use]
    pub fn matches(&self, actual: &str) -> bool {
        matches(&self.pattern, actual)
    }

    /// Whether the pattern ends in a wildcard
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.pattern.ends_with('*')
    }

    /// Get the pattern string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

impl fmt::Display for TargetPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

impl TryFrom<String> for TargetPattern {
    type Error = PolicyError;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<&str> for TargetPattern {
    type Error = PolicyError;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl From<TargetPattern> for String {
    fn from(target: TargetPattern) -> Self {
        target.pattern
    }
}

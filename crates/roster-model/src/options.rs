//! Configuration options for cell mapping.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// What happens to a token that no rule matches.
///
/// Both behaviors have shipped as "correct" versions of the roster tool, so
/// the choice is always explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmappedPolicy {
    /// Keep the token verbatim; the token counts as unchanged.
    #[default]
    Preserve,
    /// Drop the token; the token counts as empty.
    Delete,
}

impl UnmappedPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preserve => "preserve",
            Self::Delete => "delete",
        }
    }
}

/// Recognized token separators in priority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Separators(Vec<char>);

impl Separators {
    /// Slash, comma, semicolon, then a single space.
    pub const DEFAULT: [char; 4] = ['/', ',', ';', ' '];

    /// Builds a separator list from characters in priority order.
    ///
    /// Duplicates are dropped; control characters are rejected.
    pub fn new(chars: impl IntoIterator<Item = char>) -> Result<Self> {
        let mut list = Vec::new();
        for ch in chars {
            if ch.is_control() {
                return Err(ModelError::InvalidSeparator(ch));
            }
            if !list.contains(&ch) {
                list.push(ch);
            }
        }
        if list.is_empty() {
            return Err(ModelError::EmptySeparators);
        }
        Ok(Self(list))
    }

    /// Parses a string where every character is one separator, e.g. `"/,; "`.
    pub fn parse(raw: &str) -> Result<Self> {
        Self::new(raw.chars())
    }

    pub fn as_slice(&self) -> &[char] {
        &self.0
    }

    pub fn contains(&self, ch: char) -> bool {
        self.0.contains(&ch)
    }
}

impl Default for Separators {
    fn default() -> Self {
        Self(Self::DEFAULT.to_vec())
    }
}

/// Options for transforming cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformOptions {
    pub unmapped_policy: UnmappedPolicy,
    pub separators: Separators,
}

impl TransformOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_unmapped_policy(mut self, policy: UnmappedPolicy) -> Self {
        self.unmapped_policy = policy;
        self
    }

    #[must_use]
    pub fn with_separators(mut self, separators: Separators) -> Self {
        self.separators = separators;
        self
    }
}

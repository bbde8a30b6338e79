//! Token resolution against a station mapping table.

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};
use tracing::debug;

use roster_model::{MappingKey, MappingTable, normalize_code};

use crate::error::{MappingError, Result};

/// Which tier of the table produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Pattern,
}

/// A successful lookup, borrowed from the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMatch<'a> {
    pub kind: MatchKind,
    /// Key as written in the mapping table.
    pub key: &'a str,
    /// Replacement exactly as stored; may be empty.
    pub replacement: &'a str,
}

#[derive(Debug, Clone)]
struct ExactRule {
    key: String,
    replacement: String,
}

#[derive(Debug, Clone)]
struct PatternRule {
    key: String,
    regex: Regex,
    replacement: String,
}

/// Resolves single tokens to replacements.
///
/// Exact keys are tried before pattern keys. Both tiers are indexed
/// longest-key-first at build time, so `B19` can never be shadowed by `B1`;
/// pattern keys of equal length keep table order. Matching is
/// case-insensitive, replacements are returned as stored.
#[derive(Debug, Clone)]
pub struct CodeMatcher {
    station_code: String,
    exact: Vec<ExactRule>,
    exact_index: HashMap<String, usize>,
    patterns: Vec<PatternRule>,
}

impl CodeMatcher {
    /// Builds a matcher, compiling every pattern key up front.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::InvalidPattern`] for the first pattern key that
    /// does not compile.
    pub fn new(table: &MappingTable) -> Result<Self> {
        let mut exact = Vec::new();
        let mut patterns = Vec::new();
        for entry in table.entries() {
            match entry.key() {
                MappingKey::Exact(key) => exact.push(ExactRule {
                    key,
                    replacement: entry.replacement.clone(),
                }),
                MappingKey::Pattern(key) => {
                    let regex = compile_pattern(&key)?;
                    patterns.push(PatternRule {
                        key,
                        regex,
                        replacement: entry.replacement.clone(),
                    });
                }
            }
        }
        // Stable sorts keep table order among keys of equal length.
        exact.sort_by(|a, b| key_len(&b.key).cmp(&key_len(&a.key)));
        patterns.sort_by(|a, b| key_len(&b.key).cmp(&key_len(&a.key)));

        let exact_index = exact
            .iter()
            .enumerate()
            .map(|(position, rule)| (normalize_code(&rule.key), position))
            .collect();

        debug!(
            station = table.station_code(),
            exact_rules = exact.len(),
            pattern_rules = patterns.len(),
            "code matcher built"
        );

        Ok(Self {
            station_code: table.station_code().to_string(),
            exact,
            exact_index,
            patterns,
        })
    }

    /// A matcher with no rules; every token is unmapped.
    pub fn empty(station_code: impl Into<String>) -> Self {
        Self {
            station_code: station_code.into(),
            exact: Vec::new(),
            exact_index: HashMap::new(),
            patterns: Vec::new(),
        }
    }

    pub fn station_code(&self) -> &str {
        &self.station_code
    }

    pub fn rule_count(&self) -> usize {
        self.exact.len() + self.patterns.len()
    }

    /// Resolves a token.
    ///
    /// `Some("")` is an explicit deletion rule; `None` means no rule matched,
    /// which callers handle through their unmapped policy.
    pub fn resolve(&self, token: &str) -> Option<&str> {
        self.explain(token).map(|found| found.replacement)
    }

    /// Resolves a token and reports which rule matched.
    pub fn explain(&self, token: &str) -> Option<RuleMatch<'_>> {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Some(&position) = self.exact_index.get(&normalize_code(trimmed)) {
            let rule = &self.exact[position];
            return Some(RuleMatch {
                kind: MatchKind::Exact,
                key: &rule.key,
                replacement: &rule.replacement,
            });
        }
        self.patterns
            .iter()
            .find(|rule| rule.regex.is_match(trimmed))
            .map(|rule| RuleMatch {
                kind: MatchKind::Pattern,
                key: &rule.key,
                replacement: &rule.replacement,
            })
    }

    /// Exact keys in the order they are indexed (longest first).
    pub fn exact_keys(&self) -> impl Iterator<Item = &str> {
        self.exact.iter().map(|rule| rule.key.as_str())
    }

    /// Pattern keys in the order they are tried.
    pub fn pattern_keys(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|rule| rule.key.as_str())
    }
}

fn key_len(key: &str) -> usize {
    key.chars().count()
}

/// Compiles a pattern key into a case-insensitive regex anchored at the token start.
///
/// Keys written as regexes (`^...` or `...$`) keep their syntax. Other keys
/// are `*` globs and must match the whole token.
fn compile_pattern(key: &str) -> Result<Regex> {
    let source = if key.starts_with('^') || key.ends_with('$') {
        format!("^(?:{})", key.strip_prefix('^').unwrap_or(key))
    } else {
        let parts: Vec<String> = key.split('*').map(regex::escape).collect();
        format!("^{}$", parts.join(".*"))
    };
    RegexBuilder::new(&source)
        .case_insensitive(true)
        .build()
        .map_err(|error| MappingError::InvalidPattern {
            key: key.to_string(),
            message: error.to_string(),
        })
}

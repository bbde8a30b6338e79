//! Cell-level mapping: tokenize, resolve each code, reassemble.

use std::borrow::Cow;

use tracing::trace;

use roster_model::{CellCategory, CellValue, TransformOptions, UnmappedPolicy, normalize_code};

use crate::matcher::CodeMatcher;
use crate::tokenizer::CellTokenizer;

/// Result of mapping a text value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextOutcome {
    pub value: String,
    pub category: CellCategory,
}

/// Result of mapping one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformResult {
    pub original: CellValue,
    pub transformed: CellValue,
    pub category: CellCategory,
}

impl TransformResult {
    pub fn is_changed(&self) -> bool {
        self.original != self.transformed
    }
}

/// Maps cell values through a [`CodeMatcher`].
#[derive(Debug, Clone)]
pub struct CellMapper<'m> {
    matcher: &'m CodeMatcher,
    tokenizer: CellTokenizer,
    policy: UnmappedPolicy,
}

impl<'m> CellMapper<'m> {
    pub fn new(matcher: &'m CodeMatcher, options: &TransformOptions) -> Self {
        Self {
            matcher,
            tokenizer: CellTokenizer::new(options.separators.clone()),
            policy: options.unmapped_policy,
        }
    }

    pub fn policy(&self) -> UnmappedPolicy {
        self.policy
    }

    pub fn matcher(&self) -> &CodeMatcher {
        self.matcher
    }

    /// Maps any cell value. Only literal text is tokenized; everything else
    /// passes through as [`CellCategory::Untouched`].
    pub fn map_value(&self, value: &CellValue) -> TransformResult {
        match value {
            CellValue::Text(text) => {
                let outcome = self.map_text(text);
                TransformResult {
                    original: value.clone(),
                    transformed: CellValue::Text(outcome.value),
                    category: outcome.category,
                }
            }
            _ => TransformResult {
                original: value.clone(),
                transformed: value.clone(),
                category: CellCategory::Untouched,
            },
        }
    }

    /// Maps a text value.
    ///
    /// The whole trimmed cell is tried as one code first, so a key containing
    /// a separator (`"A/B"`) wins over splitting. Otherwise each token is
    /// resolved on its own and the cell category is the most significant
    /// token category.
    pub fn map_text(&self, raw: &str) -> TextOutcome {
        let core = raw.trim();
        if core.is_empty() {
            return TextOutcome {
                value: raw.to_string(),
                category: CellCategory::Untouched,
            };
        }

        if let Some(replacement) = self.matcher.resolve(core) {
            let category = categorize(core, replacement);
            let value = if replacement.is_empty() {
                String::new()
            } else {
                rewrap(raw, core, replacement)
            };
            trace!(raw, value = %value, category = category.as_str(), "cell resolved whole");
            return TextOutcome { value, category };
        }

        let cell = self.tokenizer.tokenize(raw);
        if cell.is_single() {
            let outcome = match self.policy {
                UnmappedPolicy::Preserve => TextOutcome {
                    value: raw.to_string(),
                    category: CellCategory::Unchanged,
                },
                UnmappedPolicy::Delete => TextOutcome {
                    value: String::new(),
                    category: CellCategory::Empty,
                },
            };
            trace!(raw, category = outcome.category.as_str(), "cell unmapped");
            return outcome;
        }

        let mut category = CellCategory::Unchanged;
        let mut replacements: Vec<Cow<'_, str>> = Vec::with_capacity(cell.tokens.len());
        for token in &cell.tokens {
            let (replacement, token_category) = self.map_token(token.text);
            category = category.combine(token_category);
            replacements.push(replacement);
        }
        let value = cell.join(&replacements);
        trace!(raw, value = %value, category = category.as_str(), "cell resolved by tokens");
        TextOutcome { value, category }
    }

    fn map_token<'t>(&'t self, token: &'t str) -> (Cow<'t, str>, CellCategory) {
        if token.is_empty() {
            return (Cow::Borrowed(""), CellCategory::Empty);
        }
        match self.matcher.resolve(token) {
            Some(replacement) => (Cow::Borrowed(replacement), categorize(token, replacement)),
            None => match self.policy {
                UnmappedPolicy::Preserve => (Cow::Borrowed(token), CellCategory::Unchanged),
                UnmappedPolicy::Delete => (Cow::Borrowed(""), CellCategory::Empty),
            },
        }
    }
}

fn categorize(token: &str, replacement: &str) -> CellCategory {
    if replacement.is_empty() {
        CellCategory::Empty
    } else if normalize_code(replacement) == normalize_code(token) {
        CellCategory::Unchanged
    } else {
        CellCategory::Mapped
    }
}

/// Replaces the trimmed core of `raw` with `replacement`, keeping outer whitespace.
fn rewrap(raw: &str, core: &str, replacement: &str) -> String {
    let prefix_len = raw.len() - raw.trim_start().len();
    let mut out = String::with_capacity(raw.len() - core.len() + replacement.len());
    out.push_str(&raw[..prefix_len]);
    out.push_str(replacement);
    out.push_str(&raw[prefix_len + core.len()..]);
    out
}

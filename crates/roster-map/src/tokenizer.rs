//! Splitting cell text into codes.
//!
//! A cell uses at most one separator kind. The first configured separator
//! (in priority order) that occurs in the cell is used for every split; other
//! separator characters stay inside the tokens. Whitespace around each token
//! and around the whole cell is kept so the cell can be rebuilt byte-for-byte.

use roster_model::Separators;

/// One code inside a cell, with the whitespace around it and the separator
/// that followed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub leading: &'a str,
    /// The code with surrounding whitespace removed; empty for `"B1//B2"`-style gaps.
    pub text: &'a str,
    pub trailing: &'a str,
    /// Separator after this token; `None` for the last token.
    pub separator: Option<char>,
}

/// A cell split into tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedCell<'a> {
    /// Whitespace before the first token.
    pub prefix: &'a str,
    pub tokens: Vec<Token<'a>>,
    /// Whitespace after the last token.
    pub suffix: &'a str,
    pub separator: Option<char>,
}

impl TokenizedCell<'_> {
    pub fn is_single(&self) -> bool {
        self.tokens.len() <= 1
    }

    /// Rebuilds the cell with each token text replaced by `replacements[i]`.
    pub fn join<S: AsRef<str>>(&self, replacements: &[S]) -> String {
        let mut out = String::with_capacity(self.prefix.len() + self.suffix.len() + 16);
        out.push_str(self.prefix);
        for (token, replacement) in self.tokens.iter().zip(replacements) {
            out.push_str(token.leading);
            out.push_str(replacement.as_ref());
            out.push_str(token.trailing);
            if let Some(separator) = token.separator {
                out.push(separator);
            }
        }
        out.push_str(self.suffix);
        out
    }
}

/// Returns the highest-priority separator present in `value`.
pub fn detect_separator(value: &str, separators: &Separators) -> Option<char> {
    separators
        .as_slice()
        .iter()
        .copied()
        .find(|&separator| value.contains(separator))
}

#[derive(Debug, Clone, Default)]
pub struct CellTokenizer {
    separators: Separators,
}

impl CellTokenizer {
    pub fn new(separators: Separators) -> Self {
        Self { separators }
    }

    pub fn separators(&self) -> &Separators {
        &self.separators
    }

    pub fn tokenize<'a>(&self, raw: &'a str) -> TokenizedCell<'a> {
        let core = raw.trim();
        let prefix_len = raw.len() - raw.trim_start().len();
        let prefix = &raw[..prefix_len];
        let suffix = &raw[prefix_len + core.len()..];

        let separator = detect_separator(core, &self.separators);
        let tokens = match separator {
            None => vec![split_whitespace_edges(core, None)],
            Some(separator) => {
                let pieces: Vec<&str> = core.split(separator).collect();
                let last = pieces.len().saturating_sub(1);
                pieces
                    .into_iter()
                    .enumerate()
                    .map(|(position, piece)| {
                        let next = (position < last).then_some(separator);
                        split_whitespace_edges(piece, next)
                    })
                    .collect()
            }
        };

        TokenizedCell {
            prefix,
            tokens,
            suffix,
            separator,
        }
    }
}

fn split_whitespace_edges(piece: &str, separator: Option<char>) -> Token<'_> {
    let text = piece.trim();
    let leading_len = piece.len() - piece.trim_start().len();
    Token {
        leading: &piece[..leading_len],
        text,
        trailing: &piece[leading_len + text.len()..],
        separator,
    }
}

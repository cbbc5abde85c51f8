//! Tokenizer for the `.sm` key/value surface syntax.
//!
//! A simfile is a sequence of `#KEY:VALUE;` pairs. The key must close with
//! `:` on the line it starts on; the value may span lines and ends at the
//! first `;`. `//` starts a comment that runs to the end of the line.
//! Continuation lines are trimmed and joined with `\n`, so multi-line
//! values such as `NOTES` keep their row structure.

use thiserror::Error;

/// A single `#KEY:VALUE;` pair, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyValue {
    /// Key text between `#` and `:`. Original casing is preserved; lookups
    /// downstream are case-insensitive.
    pub key: String,
    /// Value text between `:` and `;`.
    pub value: String,
}

impl KeyValue {
    /// Builds a pair from anything string-like.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A recoverable problem found while tokenizing. The affected text is
/// skipped and lexing continues with the next line.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LexWarning {
    /// A `#` opened a key but no `:` followed on the same line.
    #[error("key `{key}` is not closed by `:` on line {line}")]
    UnterminatedKey {
        /// The text after `#`, as far as it got.
        key: String,
        /// Line number, starting at 1.
        line: usize,
    },
    /// `#:` with nothing in between.
    #[error("empty key on line {line}")]
    EmptyKey {
        /// Line number, starting at 1.
        line: usize,
    },
    /// The file ended inside a value, before its `;`. The partial pair is
    /// dropped.
    #[error("value of `{key}` is not terminated by `;`")]
    UnterminatedValue {
        /// Key of the dropped pair.
        key: String,
    },
}

/// Tokenizing results: the pairs plus any warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[must_use]
pub struct LexOutput {
    /// The pairs, in source order.
    pub pairs: Vec<KeyValue>,
    /// Warnings, in encounter order.
    pub lex_warnings: Vec<LexWarning>,
}

/// Tokenizes `.sm` source text into its ordered key/value pairs.
pub fn parse(source: &str) -> LexOutput {
    let mut pairs = Vec::new();
    let mut warnings = Vec::new();
    // (key, value-so-far) of the pair whose `;` has not been seen yet.
    let mut open: Option<(String, String)> = None;

    for (index, raw) in source.lines().enumerate() {
        let line_number = index + 1;
        let line = raw.split_once("//").map_or(raw, |(before, _)| before).trim();

        let mut rest = line;
        let mut started_here = false;
        if open.is_none() {
            let Some(hash) = rest.find('#') else {
                continue;
            };
            let after = &rest[hash + 1..];
            let Some(colon) = after.find(':') else {
                warnings.push(LexWarning::UnterminatedKey {
                    key: after.to_owned(),
                    line: line_number,
                });
                continue;
            };
            if colon == 0 {
                warnings.push(LexWarning::EmptyKey { line: line_number });
                continue;
            }
            open = Some((after[..colon].to_owned(), String::new()));
            rest = &after[colon + 1..];
            started_here = true;
        }

        let Some((_, value)) = open.as_mut() else {
            continue;
        };
        if !started_here {
            value.push('\n');
        }
        let terminator = rest.find(';');
        value.push_str(terminator.map_or(rest, |end| &rest[..end]));
        if terminator.is_some()
            && let Some((key, value)) = open.take()
        {
            pairs.push(KeyValue { key, value });
        }
    }

    if let Some((key, _)) = open {
        warnings.push(LexWarning::UnterminatedValue { key });
    }

    LexOutput {
        pairs,
        lex_warnings: warnings,
    }
}

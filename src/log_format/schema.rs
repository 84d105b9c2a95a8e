//! A tokenizer plus a schema descriptor for the fixed-arity,
//! whitespace separated benchmark log lines.
//!
//! Matching a line against a schema is purely lexical: each token has
//! to consist of the characters its `FieldKind` allows. A line that
//! does not conform is a `LineMatch::Mismatch` (what that means is up
//! to the log format: end of data, or a line to skip). Converting the
//! tokens of a conforming line to numbers can still fail (e.g. "1.2.3"
//! is lexically an `UnsignedFloat`), and that is an error.

use std::{num::ParseFloatError, num::ParseIntError, path::Path};

/// The lexical class of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// ASCII digits
    Int,
    /// Digits and '.'
    UnsignedFloat,
    /// Digits, '.' and '-'
    SignedFloat,
    /// Digits, '.', '-' and 'e'
    ScientificFloat,
    /// "0" or "1"
    Flag,
    /// ASCII alphanumeric characters
    Word,
    /// Anything that is not whitespace
    Name,
}

impl FieldKind {
    pub fn matches(self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }
        let all = |f: fn(char) -> bool| token.chars().all(f);
        match self {
            FieldKind::Int => all(|c| c.is_ascii_digit()),
            FieldKind::UnsignedFloat => all(|c| c.is_ascii_digit() || c == '.'),
            FieldKind::SignedFloat => all(|c| c.is_ascii_digit() || c == '.' || c == '-'),
            FieldKind::ScientificFloat => {
                all(|c| c.is_ascii_digit() || c == '.' || c == '-' || c == 'e')
            }
            FieldKind::Flag => token == "0" || token == "1",
            FieldKind::Word => all(|c| c.is_ascii_alphanumeric()),
            // The tokenizer already split at whitespace
            FieldKind::Name => true,
        }
    }
}

/// Whether tokens beyond the schema's fields are accepted (and
/// ignored).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact,
    AtLeast,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    fields: Vec<FieldKind>,
    arity: Arity,
}

/// The tagged result of matching a line against a `Schema`.
#[derive(Debug, PartialEq)]
pub enum LineMatch<'l> {
    /// The tokens corresponding to the schema fields (any additional
    /// tokens are cut off).
    Record(Vec<&'l str>),
    Mismatch,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FieldParseError {
    #[error("invalid integer {token:?} in field {field:?}: {error}")]
    Int {
        field: String,
        token: String,
        error: ParseIntError,
    },
    #[error("invalid number {token:?} in field {field:?}: {error}")]
    Float {
        field: String,
        token: String,
        error: ParseFloatError,
    },
}

impl FieldParseError {
    /// Wrap with the location in the log file.
    pub fn at(self, path: &Path, lineno: usize) -> anyhow::Error {
        anyhow::Error::new(self).context(format!("parsing log file {path:?}:{lineno}"))
    }
}

pub fn parse_int(field: &str, token: &str) -> Result<u64, FieldParseError> {
    token.parse().map_err(|error| FieldParseError::Int {
        field: field.into(),
        token: token.into(),
        error,
    })
}

pub fn parse_float(field: &str, token: &str) -> Result<f64, FieldParseError> {
    token.parse().map_err(|error| FieldParseError::Float {
        field: field.into(),
        token: token.into(),
        error,
    })
}

/// Flags are lexically checked to be "0" or "1" already.
pub fn parse_flag(token: &str) -> bool {
    token == "1"
}

impl Schema {
    pub fn new(fields: Vec<FieldKind>, arity: Arity) -> Self {
        Self { fields, arity }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, i: usize) -> FieldKind {
        self.fields[i]
    }

    pub fn match_line<'l>(&self, line: &'l str) -> LineMatch<'l> {
        let mut tokens: Vec<&str> = line.split_whitespace().collect();
        let arity_ok = match self.arity {
            Arity::Exact => tokens.len() == self.fields.len(),
            Arity::AtLeast => tokens.len() >= self.fields.len(),
        };
        if !arity_ok {
            return LineMatch::Mismatch;
        }
        tokens.truncate(self.fields.len());
        if self
            .fields
            .iter()
            .zip(&tokens)
            .all(|(kind, token)| kind.matches(token))
        {
            LineMatch::Record(tokens)
        } else {
            LineMatch::Mismatch
        }
    }
}

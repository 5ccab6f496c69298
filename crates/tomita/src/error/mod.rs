//! # Error Handling
//!
//! Error types for table decoding, terminal sources and the parser driver.
//!
//! ## Overview
//!
//! Errors fall into three families:
//!
//! - [`TableError`]: the encoded tables are malformed. This is a configuration
//!   error and is reported once, when the tables are decoded.
//! - [`SourceError`]: the terminal source ran out of input or failed to read.
//!   End of input is not a failure; the driver turns it into the end-of-stream
//!   terminal.
//! - [`ParseError`]: the parse could not produce a result.
//!
//! Repaired syntax errors, unresolved ambiguities and merge-policy discards are
//! not errors. They are reported through a [`DiagnosticSink`] while parsing
//! continues.
//!
//! ## Diagnostics Support
//!
//! When the `diagnostics` feature is enabled, errors integrate with [`miette`]
//! for rich error reporting.

pub mod diagnostics;

pub use diagnostics::{
    BufferedSink, Diagnostic, DiagnosticSink, Level, LogSink, NullSink, StderrSink,
};

use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic as MietteDiagnostic;

/// Which encoded blob a [`TableError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableBlob {
    Action,
    Goto,
    Rule,
    Merge,
    Overflow,
}

impl std::fmt::Display for TableBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Action => "action",
            Self::Goto => "goto",
            Self::Rule => "rule",
            Self::Merge => "merge",
            Self::Overflow => "overflow",
        };
        f.write_str(name)
    }
}

/// A malformed parse table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(MietteDiagnostic))]
pub enum TableError {
    #[error("{blob} table is truncated: expected {expected} bytes, found {found}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(tomita::table::truncated)))]
    Truncated {
        blob: TableBlob,
        expected: usize,
        found: usize,
    },

    #[error("{blob} table length is not a multiple of 4 bytes ({len})")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(tomita::table::misaligned)))]
    Misaligned { blob: TableBlob, len: usize },

    #[error("goto table has {found} states but the action table has {expected}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(tomita::table::dimensions)))]
    DimensionMismatch { expected: usize, found: usize },

    #[error("merge table has {found} entries but there are {expected} rules")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(tomita::table::merge_count)))]
    MergeCountMismatch { expected: usize, found: usize },

    #[error("invalid action tag {tag} at state {state}, terminal {terminal}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(tomita::table::tag)))]
    InvalidTag { state: usize, terminal: usize, tag: u32 },

    #[error("{blob} table refers to state {state}, but only {num_states} states exist")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(tomita::table::state)))]
    StateOutOfRange {
        blob: TableBlob,
        state: usize,
        num_states: usize,
    },

    #[error("{blob} table refers to rule {rule}, but only {num_rules} rules exist")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(tomita::table::rule)))]
    RuleOutOfRange {
        blob: TableBlob,
        rule: usize,
        num_rules: usize,
    },

    #[error("rule {rule} has left-hand side {lhs}, but only {num_nonterminals} nonterminals exist")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(tomita::table::nonterminal)))]
    NonterminalOutOfRange {
        rule: usize,
        lhs: usize,
        num_nonterminals: usize,
    },

    #[error("malformed overflow list at offset {offset}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(tomita::table::overflow)))]
    BadOverflow { offset: usize },

    #[error("end-of-input terminal {eof} is outside the {num_terminals} terminals")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(tomita::table::eof)))]
    EofOutOfRange { eof: usize, num_terminals: usize },

    #[error("no goto entry for state {state} on nonterminal {nonterminal}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(tomita::table::goto)))]
    MissingGoto { state: usize, nonterminal: usize },
}

/// Failure raised by a terminal source.
#[derive(Debug, Error)]
#[cfg_attr(feature = "diagnostics", derive(MietteDiagnostic))]
pub enum SourceError {
    #[error("end of input")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(tomita::source::eof)))]
    EndOfInput,

    #[error("failed to read input: {0}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(tomita::source::io)))]
    Io(#[from] std::io::Error),
}

/// A parse that produced no result.
#[derive(Debug, Error)]
#[cfg_attr(feature = "diagnostics", derive(MietteDiagnostic))]
pub enum ParseError {
    #[error("syntax error at {position}: unexpected {found}, expected {}", format_expected_list(.expected))]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(tomita::syntax)))]
    Syntax {
        position: usize,
        found: String,
        expected: Vec<String>,
    },

    #[error("error recovery gave up after {limit} repairs")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(tomita::too_many_repairs)))]
    TooManyRepairs { limit: usize },

    #[error("failed to read input: {0}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(tomita::io)))]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    #[cfg_attr(feature = "diagnostics", diagnostic(transparent))]
    Table(#[from] TableError),
}

impl ParseError {
    /// Create a syntax error.
    #[must_use]
    pub fn syntax(position: usize, found: impl Into<String>, expected: Vec<String>) -> Self {
        Self::Syntax {
            position,
            found: found.into(),
            expected,
        }
    }

    /// Check whether this is a syntax error (as opposed to an I/O or table failure)
    #[must_use]
    pub const fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax { .. } | Self::TooManyRepairs { .. })
    }

    /// Input position of a syntax error, if any.
    #[must_use]
    pub const fn position(&self) -> Option<usize> {
        match self {
            Self::Syntax { position, .. } => Some(*position),
            _ => None,
        }
    }
}

/// Format a list of expected symbols as a human-readable string
#[must_use]
pub fn format_expected_list(expected: &[String]) -> String {
    match expected.len() {
        0 => "nothing".to_string(),
        1 => expected[0].clone(),
        2 => format!("{} or {}", expected[0], expected[1]),
        _ => {
            let mut result = expected[..expected.len() - 1].join(", ");
            result.push_str(", or ");
            result.push_str(&expected[expected.len() - 1]);
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_expected_list() {
        assert_eq!(format_expected_list(&[]), "nothing");
        assert_eq!(format_expected_list(&["`a`".into()]), "`a`");
        assert_eq!(
            format_expected_list(&["`a`".into(), "`b`".into()]),
            "`a` or `b`"
        );
        assert_eq!(
            format_expected_list(&["`a`".into(), "`b`".into(), "`c`".into()]),
            "`a`, `b`, or `c`"
        );
    }

    #[test]
    fn test_syntax_error_message() {
        let error = ParseError::syntax(3, "`$`", vec!["`b`".into()]);
        assert!(error.is_syntax());
        assert_eq!(error.position(), Some(3));
        assert_eq!(
            error.to_string(),
            "syntax error at 3: unexpected `$`, expected `b`"
        );
    }

    #[test]
    fn test_io_error_is_not_syntax() {
        let error = ParseError::from(std::io::Error::other("disk"));
        assert!(!error.is_syntax());
        assert_eq!(error.position(), None);
    }
}

//! # Diagnostic Sinks
//!
//! The parser reports repairs, ambiguities and step traces as text through a
//! [`DiagnosticSink`]. The verbosity is chosen per parse with
//! [`ParserConfig::log_level`](crate::glr::ParserConfig::log_level); there is
//! no global state.
//!
//! ```rust
//! use tomita::error::{BufferedSink, Diagnostic, DiagnosticSink, Level};
//!
//! let mut sink = BufferedSink::new();
//! sink.emit(Diagnostic::new(Level::Warning, "unresolved ambiguity"));
//! assert_eq!(sink.warnings().count(), 1);
//! ```

use std::fmt;

/// Severity of a diagnostic, ordered from most to least important.
///
/// A parser configured with level `L` emits every diagnostic whose level is
/// `<= L`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Level {
    /// Syntax errors, repaired or fatal
    Error,
    /// Unresolved ambiguities
    #[default]
    Warning,
    /// Summaries (e.g. merge-policy discards)
    Note,
    /// Fallbacks from the fast path, reduction rounds
    Debug,
    /// Every shift and reduction
    Trace,
}

impl Level {
    const fn label(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Note => "NOTE",
            Self::Debug => "DEBUG",
            Self::Trace => "TRACE",
        }
    }

    const fn to_log(self) -> log::Level {
        match self {
            Self::Error => log::Level::Error,
            Self::Warning => log::Level::Warn,
            Self::Note => log::Level::Info,
            Self::Debug => log::Level::Debug,
            Self::Trace => log::Level::Trace,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic
    #[must_use]
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<8} {}", format!("{}:", self.level), self.message)
    }
}

/// Receiver for parser diagnostics.
pub trait DiagnosticSink {
    /// Handle a diagnostic
    fn emit(&mut self, diagnostic: Diagnostic);
}

/// A sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&mut self, _diagnostic: Diagnostic) {}
}

/// A sink that stores diagnostics in emission order.
#[derive(Debug, Clone, Default)]
pub struct BufferedSink {
    diagnostics: Vec<Diagnostic>,
}

impl BufferedSink {
    /// Create an empty sink
    #[must_use]
    pub const fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    /// All diagnostics received so far
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Iterate over diagnostics of exactly the given level
    pub fn at_level(&self, level: Level) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.level == level)
    }

    /// Diagnostics at [`Level::Error`]
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.at_level(Level::Error)
    }

    /// Diagnostics at [`Level::Warning`]
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.at_level(Level::Warning)
    }

    /// Render every diagnostic, one per line.
    #[must_use]
    pub fn render(&self) -> String {
        self.diagnostics
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Drop every collected diagnostic
    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }

    /// The collected diagnostics, in emission order
    #[must_use]
    pub fn into_inner(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl DiagnosticSink for BufferedSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// A sink that prints to stderr without storing anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        eprintln!("{diagnostic}");
    }
}

/// A sink that forwards to the [`log`] facade under the `tomita` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        log::log!(target: "tomita", diagnostic.level.to_log(), "{}", diagnostic.message);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn emit(&mut self, diagnostic: Diagnostic) {
        (**self).emit(diagnostic);
    }
}

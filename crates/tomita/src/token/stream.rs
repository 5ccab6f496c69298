//! # Terminal Sources
//!
//! The parser pulls terminals one at a time. A source signals the end of
//! input with [`SourceError::EndOfInput`]; the driver then feeds the
//! end-of-stream terminal from the tables.
//!
//! ```rust
//! use tomita::token::{Terminal, TerminalSource, VecSource};
//! use tomita::error::SourceError;
//!
//! let mut source = VecSource::new(vec![Terminal::new(0, "a", 0)]);
//! assert_eq!(source.next_terminal().unwrap().symbol, 0);
//! assert!(matches!(source.next_terminal(), Err(SourceError::EndOfInput)));
//! ```

use super::Terminal;
use crate::error::SourceError;
use std::collections::VecDeque;

/// Pull-based terminal producer.
pub trait TerminalSource {
    /// Produce the next terminal.
    ///
    /// # Errors
    ///
    /// [`SourceError::EndOfInput`] once the input is exhausted, or
    /// [`SourceError::Io`] if reading failed.
    fn next_terminal(&mut self) -> Result<Terminal, SourceError>;
}

impl<S: TerminalSource + ?Sized> TerminalSource for &mut S {
    fn next_terminal(&mut self) -> Result<Terminal, SourceError> {
        (**self).next_terminal()
    }
}

/// Pre-scanned terminals.
#[derive(Debug, Clone, Default)]
pub struct VecSource {
    terminals: VecDeque<Terminal>,
}

impl VecSource {
    /// Create a source over pre-scanned terminals
    #[must_use]
    pub fn new(terminals: impl IntoIterator<Item = Terminal>) -> Self {
        Self {
            terminals: terminals.into_iter().collect(),
        }
    }

    /// Build a source from bare symbol ids; each terminal's text is its
    /// symbol id and its position its index.
    #[must_use]
    pub fn from_symbols(symbols: &[u32]) -> Self {
        Self::new(
            symbols
                .iter()
                .enumerate()
                .map(|(i, &s)| Terminal::new(s, s.to_string(), i)),
        )
    }

    /// Number of terminals not yet handed out
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.terminals.len()
    }
}

impl TerminalSource for VecSource {
    fn next_terminal(&mut self) -> Result<Terminal, SourceError> {
        self.terminals.pop_front().ok_or(SourceError::EndOfInput)
    }
}

/// Adapter over any iterator of fallible terminals, e.g. a streaming scanner.
#[derive(Debug, Clone)]
pub struct IterSource<I> {
    iter: I,
}

impl<I> IterSource<I>
where
    I: Iterator<Item = Result<Terminal, std::io::Error>>,
{
    /// Wrap an iterator of terminals
    pub const fn new(iter: I) -> Self {
        Self { iter }
    }
}

impl<I> TerminalSource for IterSource<I>
where
    I: Iterator<Item = Result<Terminal, std::io::Error>>,
{
    fn next_terminal(&mut self) -> Result<Terminal, SourceError> {
        match self.iter.next() {
            Some(Ok(terminal)) => Ok(terminal),
            Some(Err(e)) => Err(SourceError::Io(e)),
            None => Err(SourceError::EndOfInput),
        }
    }
}

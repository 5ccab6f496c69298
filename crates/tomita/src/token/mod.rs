//! Terminal symbols as produced by an external scanner.

pub mod stream;

pub use stream::{IterSource, TerminalSource, VecSource};

use compact_str::CompactString;

/// Index of a terminal symbol in the parse tables.
pub type SymbolId = u32;

/// A terminal handed to the parser.
///
/// Terminals compare by symbol only, which is what matters when matching
/// repairs against the real input.
///
/// ```rust
/// use tomita::token::Terminal;
///
/// let a = Terminal::new(0, "x", 4);
/// let b = Terminal::new(0, "y", 9);
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Terminal {
    /// Terminal symbol id
    pub symbol: SymbolId,
    /// Display value (usually the matched source text)
    pub text: CompactString,
    /// Source position, opaque to the parser
    pub position: usize,
    /// True if the terminal was synthesized by error repair
    pub synthetic: bool,
}

impl Terminal {
    /// Create a terminal
    #[must_use]
    pub fn new(symbol: SymbolId, text: impl Into<CompactString>, position: usize) -> Self {
        Self {
            symbol,
            text: text.into(),
            position,
            synthetic: false,
        }
    }

    /// A terminal inserted by error repair.
    #[must_use]
    pub fn synthetic(symbol: SymbolId, text: impl Into<CompactString>, position: usize) -> Self {
        Self {
            symbol,
            text: text.into(),
            position,
            synthetic: true,
        }
    }
}

impl PartialEq for Terminal {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
    }
}

impl Eq for Terminal {}

impl std::hash::Hash for Terminal {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.symbol.hash(state);
    }
}

impl std::fmt::Display for Terminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "`{}`", self.text)
    }
}

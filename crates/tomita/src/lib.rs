//! # Tomita
//!
//! A generalized LR parsing engine for context-free grammars that are not
//! necessarily LR(1).
//!
//! ## Overview
//!
//! Tomita consumes precompiled parse tables and a stream of terminals and
//! produces the semantic value(s) of the accepted input. It supports:
//!
//! - **Deterministic fast path**: plain shift-reduce steps while only one
//!   parser state is active
//! - **Generalized parsing**: a graph-structured stack that shares common
//!   prefixes and merges reconverging states
//! - **Lazy semantic actions**: every reduction is evaluated at most once,
//!   after the parse is accepted
//! - **Merge policies**: grammar-level disambiguation between sibling rules
//! - **Error repair**: a minimum-edit-distance search that splices a
//!   correction into the input and keeps parsing
//!
//! ## Quick Start
//!
//! Tables for `S -> a S b | a b`:
//!
//! ```rust
//! use tomita::glr::{Accepted, Parser, ParserConfig, SemanticActions};
//! use tomita::tables::{RuleId, TableBuilder};
//! use tomita::token::{Terminal, VecSource};
//!
//! let tables = TableBuilder::new(2)
//!     .shift(0, 0, 2)
//!     .goto(0, 0, 1)
//!     .accept(1)
//!     .shift(2, 0, 2)
//!     .shift(2, 1, 4)
//!     .goto(2, 0, 3)
//!     .shift(3, 1, 5)
//!     .reduce(4, 1, 1)
//!     .reduce(4, 2, 1)
//!     .reduce(5, 1, 0)
//!     .reduce(5, 2, 0)
//!     .rule(0, 3)
//!     .rule(0, 2)
//!     .terminal_names(["a", "b", "$"])
//!     .build()
//!     .unwrap();
//!
//! /// Computes the nesting depth
//! struct Depth;
//!
//! impl SemanticActions for Depth {
//!     type Value = usize;
//!
//!     fn terminal(&mut self, _: &Terminal) -> usize {
//!         0
//!     }
//!
//!     fn reduce(&mut self, rule: RuleId, children: Vec<usize>) -> usize {
//!         if rule == 0 { children[1] + 1 } else { 1 }
//!     }
//! }
//!
//! let parser = Parser::new(tables, ParserConfig::default());
//! let input = VecSource::from_symbols(&[0, 0, 1, 1]);
//! let parsed = parser.parse(input, &mut Depth).unwrap();
//! assert_eq!(parsed.result, Accepted::Unique(2));
//! ```
//!
//! ## Modules
//!
//! - [`tables`]: table entries, the encoded blob format and a builder
//! - [`token`]: terminals and terminal sources
//! - [`glr`]: the stack, forest, steppers, repair engine and driver
//! - [`error`]: error types and diagnostic sinks

pub mod error;
pub mod glr;
pub mod tables;
pub mod token;

pub use error::{Diagnostic, DiagnosticSink, Level, ParseError, SourceError, TableError};
pub use glr::{Accepted, ParseMetrics, Parsed, Parser, ParserConfig, SemanticActions};
pub use tables::{ParseTables, TableBuilder};
pub use token::{Terminal, TerminalSource};

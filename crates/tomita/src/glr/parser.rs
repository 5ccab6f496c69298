//! Parser driver
//!
//! [`Parser`] owns the decoded tables and configuration and can run any
//! number of independent parses. Each call to [`Parser::parse`] builds a
//! fresh [`Session`]: the graph-structured stack, the action forest and the
//! topmost set live only for that parse.
//!
//! The main loop scans a terminal, tries the deterministic fast path, falls
//! back to a full GLR round when the fast path cannot decide, and hands
//! unshiftable input to error repair.

use crate::error::{Diagnostic, DiagnosticSink, Level, LogSink, ParseError, SourceError};
use crate::glr::config::ParserConfig;
use crate::glr::fast_path::FastOutcome;
use crate::glr::forest::{ActionId, Forest, SemanticActions};
use crate::glr::stack::{Frontier, Gss};
use crate::glr::step::Step;
use crate::tables::ParseTables;
use crate::token::{SymbolId, Terminal, TerminalSource};
#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

/// Counters collected during one parse
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct ParseMetrics {
    /// Lookahead terminals shifted
    pub tokens_shifted: usize,
    /// Reductions performed by the fast path
    pub fast_path_reductions: usize,
    /// GLR rounds (reduce, accept, shift) executed
    pub glr_rounds: usize,
    /// Reductions popped from the path queue
    pub glr_reductions: usize,
    /// Largest topmost set observed
    pub max_topmost: usize,
    /// GSS nodes allocated
    pub nodes_created: usize,
    /// GSS links allocated
    pub links_created: usize,
    /// Nodes reached by more than one link
    pub shared_nodes: usize,
    /// Reductions folded into an existing link's ambiguity chain
    pub ambiguities: usize,
    /// Nodes removed by merge policies
    pub merge_discards: usize,
    /// Accepted derivations, counting ones beyond the evaluation limit
    pub derivations: usize,
    /// Syntax errors repaired
    pub repairs: usize,
}

/// Value(s) of an accepted parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accepted<V> {
    /// Exactly one derivation survived
    Unique(V),
    /// Several derivations survived; the caller must choose
    Ambiguous(Vec<V>),
}

impl<V> Accepted<V> {
    /// True if several derivations survived
    #[must_use]
    pub const fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous(_))
    }

    /// The value if the parse was unambiguous
    #[must_use]
    pub fn into_unique(self) -> Option<V> {
        match self {
            Self::Unique(value) => Some(value),
            Self::Ambiguous(_) => None,
        }
    }

    /// Every accepted value
    #[must_use]
    pub fn values(&self) -> &[V] {
        match self {
            Self::Unique(value) => std::slice::from_ref(value),
            Self::Ambiguous(values) => values,
        }
    }

    #[must_use]
    pub fn into_values(self) -> Vec<V> {
        match self {
            Self::Unique(value) => vec![value],
            Self::Ambiguous(values) => values,
        }
    }
}

/// Result of a successful parse
#[derive(Debug, Clone)]
pub struct Parsed<V> {
    pub result: Accepted<V>,
    pub metrics: ParseMetrics,
}

/// A GLR parser over precompiled tables.
///
/// The tables are shared read-only, so a parser is cheap to clone and parses
/// may run concurrently on separate clones or threads.
#[derive(Debug, Clone)]
pub struct Parser {
    tables: Arc<ParseTables>,
    config: ParserConfig,
}

impl Parser {
    /// Create a parser over decoded tables
    #[must_use]
    pub fn new(tables: impl Into<Arc<ParseTables>>, config: ParserConfig) -> Self {
        Self {
            tables: tables.into(),
            config,
        }
    }

    /// The shared parse tables
    #[must_use]
    pub fn tables(&self) -> &ParseTables {
        &self.tables
    }

    /// The parser configuration
    #[must_use]
    pub const fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse `source`, forwarding diagnostics to the `log` facade.
    ///
    /// # Errors
    ///
    /// See [`Parser::parse_with_sink`].
    pub fn parse<S, A>(&self, source: S, actions: &mut A) -> Result<Parsed<A::Value>, ParseError>
    where
        S: TerminalSource,
        A: SemanticActions + ?Sized,
    {
        self.parse_with_sink(source, actions, &mut LogSink)
    }

    /// Parse `source`, evaluating the accepted derivations with `actions`.
    ///
    /// Repairs, ambiguities and (at verbose levels) step traces are reported
    /// to `sink`.
    ///
    /// # Errors
    ///
    /// - [`ParseError::Syntax`] if a syntax error could not be repaired
    /// - [`ParseError::TooManyRepairs`] if the repair budget ran out
    /// - [`ParseError::Io`] if the source failed
    /// - [`ParseError::Table`] if the tables lack a goto the parse needed
    pub fn parse_with_sink<S, A>(
        &self,
        source: S,
        actions: &mut A,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Parsed<A::Value>, ParseError>
    where
        S: TerminalSource,
        A: SemanticActions + ?Sized,
    {
        let mut session = Session::new(&self.tables, &self.config, sink, source);
        let roots = session.run()?;
        Ok(session.finish(&roots, actions))
    }
}

/// Parse state that does not depend on where terminals come from.
pub(crate) struct Engine<'a, V> {
    pub(crate) tables: &'a ParseTables,
    pub(crate) config: &'a ParserConfig,
    sink: &'a mut dyn DiagnosticSink,
    pub(crate) gss: Gss,
    pub(crate) forest: Forest<V>,
    pub(crate) frontier: Frontier,
    pub(crate) metrics: ParseMetrics,
}

impl<'a, V> Engine<'a, V> {
    pub(crate) fn new(
        tables: &'a ParseTables,
        config: &'a ParserConfig,
        sink: &'a mut dyn DiagnosticSink,
    ) -> Self {
        let mut gss = Gss::new();
        let start = gss.add_node(0, None);
        let frontier = Frontier::single(&gss, start);
        Self {
            tables,
            config,
            sink,
            gss,
            forest: Forest::new(),
            frontier,
            metrics: ParseMetrics {
                max_topmost: 1,
                ..ParseMetrics::default()
            },
        }
    }

    /// Emit a diagnostic; `message` is only built if `level` is enabled.
    pub(crate) fn emit(&mut self, level: Level, message: impl FnOnce() -> String) {
        if self.config.enabled(level) {
            self.sink.emit(Diagnostic::new(level, message()));
        }
    }

    pub(crate) fn note_frontier_size(&mut self) {
        self.metrics.max_topmost = self.metrics.max_topmost.max(self.frontier.len());
    }

    /// Terminals with a non-error action in any frontier state, ascending.
    pub(crate) fn expected_terminals(&self) -> Vec<SymbolId> {
        let mut expected: Vec<SymbolId> = self
            .frontier
            .nodes()
            .iter()
            .flat_map(|&n| self.tables.valid_terminals(self.gss.state(n)).iter().copied())
            .collect();
        expected.sort_unstable();
        expected.dedup();
        expected
    }

    /// The error for `lookahead` when no repair is attempted or possible.
    pub(crate) fn syntax_error(&mut self, lookahead: &Terminal) -> ParseError {
        let expected: Vec<String> = self
            .expected_terminals()
            .into_iter()
            .map(|t| format!("`{}`", self.tables.terminal_name(t)))
            .collect();
        let error = ParseError::syntax(lookahead.position, lookahead.to_string(), expected);
        self.emit(Level::Error, || error.to_string());
        error
    }
}

/// One parse: an [`Engine`] plus the terminal intake.
pub(crate) struct Session<'a, S, V> {
    pub(crate) engine: Engine<'a, V>,
    source: S,
    /// Terminals read ahead or spliced in by a repair, served before the source
    pending: VecDeque<Terminal>,
    eof_reached: bool,
    next_position: usize,
    /// Terminals handed to the main loop so far
    pub(crate) taken: usize,
    /// Last terminal index covered by the most recent repair
    pub(crate) repair_end: usize,
}

impl<'a, S: TerminalSource, V: Clone> Session<'a, S, V> {
    pub(crate) fn new(
        tables: &'a ParseTables,
        config: &'a ParserConfig,
        sink: &'a mut dyn DiagnosticSink,
        source: S,
    ) -> Self {
        Self {
            engine: Engine::new(tables, config, sink),
            source,
            pending: VecDeque::new(),
            eof_reached: false,
            next_position: 0,
            taken: 0,
            repair_end: 0,
        }
    }

    /// Read the next terminal without counting it as consumed.
    ///
    /// End of input becomes the end-of-stream terminal, repeated on every
    /// later call.
    pub(crate) fn pull(&mut self) -> Result<Terminal, ParseError> {
        if let Some(terminal) = self.pending.pop_front() {
            return Ok(terminal);
        }
        if !self.eof_reached {
            match self.source.next_terminal() {
                Ok(terminal) => {
                    self.next_position = self.next_position.max(terminal.position + 1);
                    return Ok(terminal);
                }
                Err(SourceError::EndOfInput) => self.eof_reached = true,
                Err(SourceError::Io(e)) => return Err(ParseError::Io(e)),
            }
        }
        let eof = self.engine.tables.eof();
        Ok(Terminal::new(
            eof,
            self.engine.tables.terminal_name(eof),
            self.next_position,
        ))
    }

    /// Put terminals back in front of the input, in order.
    pub(crate) fn unread(&mut self, terminals: Vec<Terminal>) {
        for terminal in terminals.into_iter().rev() {
            self.pending.push_front(terminal);
        }
    }

    fn next_terminal(&mut self) -> Result<Terminal, ParseError> {
        let terminal = self.pull()?;
        self.taken += 1;
        Ok(terminal)
    }

    /// Drive the parse to acceptance; returns the accepted root actions.
    pub(crate) fn run(&mut self) -> Result<Vec<ActionId>, ParseError> {
        let mut lookahead = self.next_terminal()?;
        loop {
            if self.engine.config.fast_path {
                match self.engine.fast_step(&lookahead)? {
                    FastOutcome::Shifted => {
                        lookahead = self.next_terminal()?;
                        continue;
                    }
                    FastOutcome::Error => {
                        self.recover(&lookahead)?;
                        lookahead = self.next_terminal()?;
                        continue;
                    }
                    FastOutcome::Fallback => {}
                }
            }

            match self.engine.glr_step(&lookahead)? {
                Step::Accepted(roots) => return Ok(roots),
                Step::Shifted => {}
                Step::Stuck => self.recover(&lookahead)?,
            }
            lookahead = self.next_terminal()?;
        }
    }

    /// Evaluate the accepted derivations and report surviving ambiguity.
    ///
    /// `roots` are the actions of the accepting links; their ambiguity
    /// chains and every ambiguity below them are expanded by the forest.
    pub(crate) fn finish<A>(mut self, roots: &[ActionId], actions: &mut A) -> Parsed<V>
    where
        A: SemanticActions<Value = V> + ?Sized,
    {
        let engine = &mut self.engine;
        let limit = engine.config.max_derivations.max(1);
        let mut values: Vec<V> = Vec::new();
        let mut count = 0usize;
        for &root in roots {
            let derived = engine.forest.run(root, actions, limit);
            count = count.saturating_add(derived.count());
            let room = limit.saturating_sub(values.len());
            values.extend(derived.into_values().into_iter().take(room));
        }

        if count > 1 {
            let kept = values.len();
            engine.emit(Level::Warning, || {
                if kept < count {
                    format!("unresolved ambiguity: {count} derivations accepted, {kept} evaluated")
                } else {
                    format!("unresolved ambiguity: {count} derivations accepted")
                }
            });
        }

        engine.metrics.derivations = count;
        engine.metrics.nodes_created = engine.gss.node_count();
        engine.metrics.links_created = engine.gss.link_count();
        engine.metrics.shared_nodes = engine.gss.shared_node_count();

        let result = match <[V; 1]>::try_from(values) {
            Ok([value]) if count == 1 => Accepted::Unique(value),
            Ok(single) => Accepted::Ambiguous(Vec::from(single)),
            Err(values) => Accepted::Ambiguous(values),
        };
        Parsed {
            result,
            metrics: std::mem::take(&mut engine.metrics),
        }
    }
}

//! Deterministic stepper
//!
//! While the topmost set holds a single node and its action is a plain shift
//! or a reduction whose right-hand side lies on an unbranched chain, the
//! parser runs as an ordinary LR parser directly on the GSS. Anything else is
//! handed to the GLR stepper.

use crate::error::{Level, ParseError, TableError};
use crate::glr::parser::Engine;
use crate::glr::stack::Frontier;
use crate::tables::{ActionKind, RuleId};
use crate::token::Terminal;
use smallvec::SmallVec;

/// How a run of deterministic steps ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FastOutcome {
    /// The lookahead was shifted
    Shifted,
    /// No action exists for the lookahead
    Error,
    /// A conflict, merge-sensitive rule, shallow stack or accept; run a GLR round
    Fallback,
}

impl<V> Engine<'_, V> {
    /// Reduce deterministically until the lookahead is shifted or the fast
    /// path has to give up.
    pub(crate) fn fast_step(&mut self, lookahead: &Terminal) -> Result<FastOutcome, ParseError> {
        loop {
            let Some(node) = self.frontier.sole() else {
                return Ok(FastOutcome::Fallback);
            };
            let state = self.gss.state(node);

            match self.tables.action(state, lookahead.symbol).kind() {
                ActionKind::Error => return Ok(FastOutcome::Error),
                ActionKind::Shift(dest) => {
                    let action = self.forest.terminal(lookahead.clone());
                    let top = self.gss.add_node(dest, None);
                    self.gss.add_link(node, top, action, 1);
                    self.frontier = Frontier::single(&self.gss, top);
                    self.metrics.tokens_shifted += 1;
                    self.emit(Level::Trace, || format!("shift {lookahead} to state {dest}"));
                    return Ok(FastOutcome::Shifted);
                }
                ActionKind::Reduce(rule) => {
                    if !self.tables.merge(rule).is_none() || !self.reduce_in_place(rule)? {
                        self.emit(Level::Debug, || {
                            format!("fast path falls back to GLR at state {state} on rule {rule}")
                        });
                        return Ok(FastOutcome::Fallback);
                    }
                }
                ActionKind::Accept | ActionKind::Overflow(_) => return Ok(FastOutcome::Fallback),
            }
        }
    }

    /// Reduce the sole frontier node by `rule` if its deterministic depth
    /// covers the whole right-hand side. Returns false if it does not.
    fn reduce_in_place(&mut self, rule: RuleId) -> Result<bool, ParseError> {
        let Some(node) = self.frontier.sole() else {
            return Ok(false);
        };
        let info = self.tables.rule(rule);
        let len = info.rhs_len();
        if self.gss.node(node).depth() < len {
            return Ok(false);
        }

        let mut children: SmallVec<[_; 4]> = SmallVec::with_capacity(len);
        let mut bottom = node;
        let mut span = 0;
        for _ in 0..len {
            let Some(link_id) = self.gss.sole_link(bottom) else {
                return Ok(false);
            };
            let link = self.gss.link(link_id);
            children.push(link.action());
            span += link.span();
            bottom = link.bottom();
        }
        children.reverse();

        let bottom_state = self.gss.state(bottom);
        let dest = self
            .tables
            .goto(bottom_state, info.lhs())
            .ok_or(TableError::MissingGoto {
                state: bottom_state as usize,
                nonterminal: info.lhs() as usize,
            })?;

        let action = self.forest.reduction(rule, children);
        let top = self.gss.add_node(dest, Some(rule));
        self.gss.add_link(bottom, top, action, span);
        self.frontier = Frontier::single(&self.gss, top);
        self.metrics.fast_path_reductions += 1;
        self.emit(Level::Trace, || format!("reduce by rule {rule} to state {dest}"));
        Ok(true)
    }
}

//! Simulated parsing for the repair search.
//!
//! A [`SimStack`] is a private stack of states sitting on top of a real GSS
//! node. Shifts and reductions only touch the private part; a reduction
//! deeper than the private part walks the real links below the base node and
//! forks once per path. The GSS itself is never modified. Merge policies
//! prune simulated stacks exactly as they prune the frontier, so a candidate
//! that survives simulation also survives the real parse.

use crate::glr::disambiguation::should_discard;
use crate::glr::stack::{Gss, NodeId};
use crate::tables::{ActionKind, ParseTables, RuleId, StateId};
use crate::token::SymbolId;
use hashbrown::HashSet;
use smallvec::SmallVec;
use std::collections::VecDeque;

/// Reductions allowed while simulating one terminal. Bounds the work done on
/// grammars with cycles of empty reductions.
pub const MAX_SIMULATED_REDUCTIONS: usize = 1024;

/// A copy-on-write view of one parse stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimStack {
    states: SmallVec<[StateId; 8]>,
    base: NodeId,
}

impl SimStack {
    /// A stack whose top is the real node `base`
    #[must_use]
    pub fn at(base: NodeId) -> Self {
        Self {
            states: SmallVec::new(),
            base,
        }
    }

    /// State on top of the stack
    #[must_use]
    pub fn top(&self, gss: &Gss) -> StateId {
        self.states
            .last()
            .copied()
            .unwrap_or_else(|| gss.state(self.base))
    }

    /// Real node the private states sit on
    #[must_use]
    pub const fn base(&self) -> NodeId {
        self.base
    }

    /// States pushed above the base, bottom first
    #[must_use]
    pub fn states(&self) -> &[StateId] {
        &self.states
    }

    /// Every stack left after popping `count` states.
    #[must_use]
    pub fn pop(&self, gss: &Gss, count: usize) -> SmallVec<[Self; 2]> {
        if count <= self.states.len() {
            let mut popped = self.clone();
            popped.states.truncate(self.states.len() - count);
            return smallvec::smallvec![popped];
        }
        gss.paths(self.base, count - self.states.len())
            .into_iter()
            .map(|path| Self::at(path.bottom))
            .collect()
    }
}

/// Stacks resulting from feeding one terminal to a set of stacks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Simulation {
    /// Stacks that shifted the terminal, without duplicates
    pub stacks: Vec<SimStack>,
    /// True if some stack accepted the terminal
    pub accepted: bool,
}

/// Feed `symbol` to every stack, performing all reductions it enables.
///
/// Reductions run first, as one round. Stacks whose top was produced by a
/// rule whose merge policy fails against the rules reduced in that round
/// are dropped before anything shifts, the way the real parser prunes its
/// frontier.
#[must_use]
pub fn simulate(
    tables: &ParseTables,
    gss: &Gss,
    stacks: &[SimStack],
    symbol: SymbolId,
) -> Simulation {
    let mut work: VecDeque<(SimStack, Option<RuleId>)> =
        stacks.iter().cloned().map(|s| (s, None)).collect();
    let mut seen: HashSet<SimStack> = HashSet::new();
    let mut settled: Vec<(SimStack, Option<RuleId>)> = Vec::new();
    let mut present: HashSet<RuleId> = HashSet::new();
    let mut reductions = 0;

    while let Some((stack, created_by)) = work.pop_front() {
        if !seen.insert(stack.clone()) {
            continue;
        }
        let state = stack.top(gss);
        for kind in tables.actions(state, symbol) {
            let ActionKind::Reduce(rule) = kind else {
                continue;
            };
            reductions += 1;
            if reductions > MAX_SIMULATED_REDUCTIONS {
                continue;
            }
            present.insert(rule);
            let info = tables.rule(rule);
            for mut popped in stack.pop(gss, info.rhs_len()) {
                if let Some(dest) = tables.goto(popped.top(gss), info.lhs()) {
                    popped.states.push(dest);
                    work.push_back((popped, Some(rule)));
                }
            }
        }
        settled.push((stack, created_by));
    }

    let mut result = Simulation::default();
    for (stack, created_by) in settled {
        if created_by.is_some_and(|rule| fails_merge(tables, rule, &present)) {
            continue;
        }
        for kind in tables.actions(stack.top(gss), symbol) {
            match kind {
                ActionKind::Shift(dest) => {
                    let mut shifted = stack.clone();
                    shifted.states.push(dest);
                    if !result.stacks.contains(&shifted) {
                        result.stacks.push(shifted);
                    }
                }
                ActionKind::Accept => result.accepted = true,
                ActionKind::Reduce(_) | ActionKind::Error | ActionKind::Overflow(_) => {}
            }
        }
    }
    result
}

fn fails_merge(tables: &ParseTables, rule: RuleId, present: &HashSet<RuleId>) -> bool {
    let merge = tables.merge(rule);
    !merge.is_none() && should_discard(merge.policy(), present.contains(&merge.sibling()))
}

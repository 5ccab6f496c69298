//! GLR stepper
//!
//! One round per lookahead terminal:
//!
//! 1. **Reductions.** Every reduction path rooted at a frontier node is put
//!    in a [`PathQueue`] and applied in queue order. A reduction either
//!    creates a new frontier node, adds a link to an existing one, or folds
//!    its derivation into an existing link's ambiguity chain. Afterwards,
//!    merge policies prune the nodes created during the round.
//! 2. **Accepts.** If any frontier node accepts, the parse is over.
//! 3. **Shifts.** Every frontier node that can shift the lookahead does so,
//!    and nodes reaching the same state share one successor.

use crate::error::{Level, ParseError, TableError};
use crate::glr::disambiguation::filter_failed_merges;
use crate::glr::forest::ActionId;
use crate::glr::parser::Engine;
use crate::glr::queue::{PathQueue, PathQueueEntry};
use crate::glr::stack::{Frontier, LinkId, NodeId};
use crate::tables::{ActionKind, RuleId};
use crate::token::Terminal;
use hashbrown::HashSet;
use smallvec::SmallVec;

/// Outcome of a GLR round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step {
    /// The lookahead was accepted; root actions of every surviving derivation
    Accepted(Vec<ActionId>),
    /// At least one node shifted the lookahead
    Shifted,
    /// Nothing could shift; the frontier is as it was before the round
    Stuck,
}

/// Bookkeeping for one reduction round.
#[derive(Default)]
struct Round {
    queue: PathQueue,
    present: HashSet<RuleId>,
    created: Vec<NodeId>,
}

impl<V> Engine<'_, V> {
    pub(crate) fn glr_step(&mut self, lookahead: &Terminal) -> Result<Step, ParseError> {
        self.metrics.glr_rounds += 1;
        let before = self.frontier.clone();
        self.emit(Level::Debug, || {
            format!(
                "GLR round on {lookahead} with {} active states",
                before.len()
            )
        });

        self.do_reductions(lookahead)?;
        if let Some(roots) = self.do_accepts(lookahead) {
            return Ok(Step::Accepted(roots));
        }
        if self.do_shifts(lookahead) {
            Ok(Step::Shifted)
        } else {
            self.frontier = before;
            Ok(Step::Stuck)
        }
    }

    /// Apply every reduction enabled by `lookahead`, then prune by merge policy.
    fn do_reductions(&mut self, lookahead: &Terminal) -> Result<(), ParseError> {
        let mut round = Round::default();
        let roots: Vec<NodeId> = self.frontier.nodes().to_vec();
        for node in roots {
            self.enqueue_reductions(&mut round.queue, node, lookahead, None);
        }

        while let Some(entry) = round.queue.pop() {
            self.metrics.glr_reductions += 1;
            round.present.insert(entry.rule);
            self.reduce_via_path(&mut round, entry, lookahead)?;
        }
        self.note_frontier_size();

        let discarded = filter_failed_merges(
            self.tables,
            &self.gss,
            &mut self.frontier,
            &round.created,
            &round.present,
        );
        if !discarded.is_empty() {
            self.metrics.merge_discards += discarded.len();
            let count = discarded.len();
            self.emit(Level::Note, || {
                format!("merge policy discarded {count} derivation(s) at {lookahead}")
            });
        }
        Ok(())
    }

    /// Queue the reductions of `node` on `lookahead`. With `through`, only
    /// paths that traverse that link are queued.
    fn enqueue_reductions(
        &self,
        queue: &mut PathQueue,
        node: NodeId,
        lookahead: &Terminal,
        through: Option<LinkId>,
    ) {
        let state = self.gss.state(node);
        for kind in self.tables.actions(state, lookahead.symbol) {
            let ActionKind::Reduce(rule) = kind else {
                continue;
            };
            let len = self.tables.rule(rule).rhs_len();
            let paths = match through {
                None => self.gss.paths(node, len),
                Some(link) => self.gss.paths_through(node, len, link),
            };
            for path in paths {
                queue.push(path, rule);
            }
        }
    }

    /// Paths through a new link may start at any frontier node.
    fn enqueue_limited_reductions(&self, round: &mut Round, link: LinkId, lookahead: &Terminal) {
        for &node in self.frontier.nodes() {
            self.enqueue_reductions(&mut round.queue, node, lookahead, Some(link));
        }
    }

    fn reduce_via_path(
        &mut self,
        round: &mut Round,
        entry: PathQueueEntry,
        lookahead: &Terminal,
    ) -> Result<(), ParseError> {
        let PathQueueEntry { path, rule, .. } = entry;
        let info = self.tables.rule(rule);
        let bottom_state = self.gss.state(path.bottom);
        let dest = self
            .tables
            .goto(bottom_state, info.lhs())
            .ok_or(TableError::MissingGoto {
                state: bottom_state as usize,
                nonterminal: info.lhs() as usize,
            })?;

        let children: SmallVec<[ActionId; 4]> = path
            .links
            .iter()
            .rev()
            .map(|&l| self.gss.link(l).action())
            .collect();

        match self.frontier.find(dest) {
            // An empty reduction back onto its own node adds nothing
            Some(top) if top == path.bottom => {}
            Some(top) => {
                let action = self.forest.reduction(rule, children);
                if let Some(existing) = self.gss.find_link(top, path.bottom) {
                    let primary = self.gss.link(existing).action();
                    if self.forest.add_alternative(primary, action) {
                        self.metrics.ambiguities += 1;
                        self.emit(Level::Debug, || {
                            format!("rule {rule} joins an ambiguous derivation in state {dest}")
                        });
                    }
                } else {
                    let (link, branched) = self.gss.add_link(path.bottom, top, action, path.span);
                    if branched {
                        self.gss.recompute_depths(self.frontier.nodes());
                    }
                    self.emit(Level::Trace, || {
                        format!("reduce by rule {rule} links into state {dest}")
                    });
                    self.enqueue_limited_reductions(round, link, lookahead);
                }
            }
            None => {
                let action = self.forest.reduction(rule, children);
                let top = self.gss.add_node(dest, Some(rule));
                self.frontier.insert(&self.gss, top);
                self.gss.add_link(path.bottom, top, action, path.span);
                round.created.push(top);
                self.emit(Level::Trace, || format!("reduce by rule {rule} to state {dest}"));
                self.enqueue_reductions(&mut round.queue, top, lookahead, None);
            }
        }
        Ok(())
    }

    /// If any frontier node accepts `lookahead`, keep only those nodes and
    /// return the root actions of their derivations.
    fn do_accepts(&mut self, lookahead: &Terminal) -> Option<Vec<ActionId>> {
        let tables = self.tables;
        let gss = &self.gss;
        let accepting: Vec<NodeId> = self
            .frontier
            .nodes()
            .iter()
            .copied()
            .filter(|&n| {
                tables
                    .actions(gss.state(n), lookahead.symbol)
                    .contains(&ActionKind::Accept)
            })
            .collect();
        if accepting.is_empty() {
            return None;
        }

        self.frontier.retain(&self.gss, |n| accepting.contains(&n));
        let roots = accepting
            .iter()
            .flat_map(|&n| self.gss.node(n).links())
            .map(|&l| self.gss.link(l).action())
            .collect();
        Some(roots)
    }

    /// Shift `lookahead` from every frontier node that can. Returns false,
    /// leaving the frontier untouched, if none can.
    fn do_shifts(&mut self, lookahead: &Terminal) -> bool {
        let mut next = Frontier::new();
        let mut action = None;

        for &node in self.frontier.nodes() {
            let state = self.gss.state(node);
            for kind in self.tables.actions(state, lookahead.symbol) {
                let ActionKind::Shift(dest) = kind else {
                    continue;
                };
                let action =
                    *action.get_or_insert_with(|| self.forest.terminal(lookahead.clone()));
                let (top, _) = next.find_or_create(&mut self.gss, dest, None);
                if self.gss.find_link(top, node).is_none() {
                    self.gss.add_link(node, top, action, 1);
                }
            }
        }

        if next.is_empty() {
            return false;
        }
        let count = next.len();
        self.emit(Level::Trace, || {
            format!("shift {lookahead} into {count} state(s)")
        });
        self.frontier = next;
        self.metrics.tokens_shifted += 1;
        self.note_frontier_size();
        true
    }
}

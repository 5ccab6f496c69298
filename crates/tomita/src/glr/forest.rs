//! Lazy action forest
//!
//! Every GSS link carries an [`ActionId`] naming either a shifted terminal or
//! a rule reduction over child actions. Reductions are evaluated on demand,
//! at most once, through the caller's [`SemanticActions`]. Competing
//! derivations of the same span between the same two nodes are chained
//! through the `ambiguous` field of the first reduction; evaluation expands
//! those chains wherever they occur, so ambiguity below the root is kept.

use crate::tables::RuleId;
use crate::token::Terminal;
use hashbrown::HashSet;
use smallvec::SmallVec;

/// Index of an action in a [`Forest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(u32);

impl ActionId {
    /// Action id from its arena index
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Evaluation state of a reduction.
#[derive(Debug, Clone)]
pub enum Evaluation<V> {
    /// Not evaluated yet; children in rule order
    Pending(SmallVec<[ActionId; 4]>),
    /// Evaluated; children have been released
    Done(Derivations<V>),
}

/// One node of the forest.
#[derive(Debug, Clone)]
pub enum Action<V> {
    /// A shifted terminal
    Terminal(Terminal),
    /// A reduction by `rule`
    Reduction {
        rule: RuleId,
        eval: Evaluation<V>,
        /// Next competing derivation of the same span
        ambiguous: Option<ActionId>,
    },
}

/// Semantic action callbacks supplied by the grammar implementer.
///
/// `reduce` is called at most once per reduction in the forest, with the
/// children's values in left-to-right rule order.
pub trait SemanticActions {
    type Value: Clone;

    /// Value of a shifted terminal
    fn terminal(&mut self, terminal: &Terminal) -> Self::Value;

    /// Value of a reduction by `rule`
    fn reduce(&mut self, rule: RuleId, children: Vec<Self::Value>) -> Self::Value;
}

impl<A: SemanticActions + ?Sized> SemanticActions for &mut A {
    type Value = A::Value;

    fn terminal(&mut self, terminal: &Terminal) -> Self::Value {
        (**self).terminal(terminal)
    }

    fn reduce(&mut self, rule: RuleId, children: Vec<Self::Value>) -> Self::Value {
        (**self).reduce(rule, children)
    }
}

/// Arena of actions for one parse.
#[derive(Debug, Clone)]
pub struct Forest<V> {
    actions: Vec<Action<V>>,
}

impl<V> Default for Forest<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Forest<V> {
    /// Create an empty forest
    #[must_use]
    pub const fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    fn push(&mut self, action: Action<V>) -> ActionId {
        let id = ActionId(u32::try_from(self.actions.len()).unwrap_or(u32::MAX));
        self.actions.push(action);
        id
    }

    /// Add a shifted terminal
    pub fn terminal(&mut self, terminal: Terminal) -> ActionId {
        self.push(Action::Terminal(terminal))
    }

    /// Add a pending reduction. `children` must be in rule order.
    pub fn reduction(&mut self, rule: RuleId, children: SmallVec<[ActionId; 4]>) -> ActionId {
        self.push(Action::Reduction {
            rule,
            eval: Evaluation::Pending(children),
            ambiguous: None,
        })
    }

    /// The action stored at `id`
    #[must_use]
    pub fn get(&self, id: ActionId) -> &Action<V> {
        &self.actions[id.index()]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Append `alternative` to the end of `primary`'s ambiguity chain.
    ///
    /// A terminal cannot carry alternatives; `false` is returned in that case
    /// and the forest is left unchanged.
    pub fn add_alternative(&mut self, primary: ActionId, alternative: ActionId) -> bool {
        let mut at = primary;
        loop {
            match &mut self.actions[at.index()] {
                Action::Terminal(_) => return false,
                Action::Reduction {
                    ambiguous: Some(next),
                    ..
                } => at = *next,
                Action::Reduction { ambiguous, .. } => {
                    *ambiguous = Some(alternative);
                    return true;
                }
            }
        }
    }

    /// `id` followed by every member of its ambiguity chain.
    #[must_use]
    pub fn alternatives(&self, id: ActionId) -> Vec<ActionId> {
        let mut out = vec![id];
        let mut at = id;
        while let Action::Reduction {
            ambiguous: Some(next),
            ..
        } = &self.actions[at.index()]
        {
            out.push(*next);
            at = *next;
        }
        out
    }

    /// True once the reduction has been evaluated. Terminals are always
    /// considered evaluated.
    #[must_use]
    pub fn is_evaluated(&self, id: ActionId) -> bool {
        !matches!(
            self.actions[id.index()],
            Action::Reduction {
                eval: Evaluation::Pending(_),
                ..
            }
        )
    }
}

impl<V: Clone> Forest<V> {
    /// Evaluate every derivation of `root` and of the members of its
    /// ambiguity chain.
    ///
    /// A reduction whose children are themselves ambiguous yields one value
    /// per combination of child derivations, leftmost child varying slowest.
    /// Each reduction keeps at most `limit` values. The reported count is
    /// exact (saturating) even when values were dropped. A pending reduction
    /// reached again through a cycle of unit rules contributes nothing, so
    /// cyclic derivations are cut at their first repetition.
    ///
    /// Evaluation uses an explicit work stack so deep derivations do not grow
    /// the call stack. `reduce` runs once per kept derivation of each
    /// reduction; repeated calls reuse the cached values.
    pub fn run<A>(&mut self, root: ActionId, actions: &mut A, limit: usize) -> Derivations<V>
    where
        A: SemanticActions<Value = V> + ?Sized,
    {
        enum Work {
            Visit(ActionId),
            Finish(ActionId),
        }

        let limit = limit.max(1);
        let mut scheduled: HashSet<ActionId> = HashSet::new();
        let mut work: Vec<Work> = self
            .alternatives(root)
            .into_iter()
            .rev()
            .map(Work::Visit)
            .collect();

        while let Some(item) = work.pop() {
            match item {
                Work::Visit(id) => {
                    let Action::Reduction {
                        eval: Evaluation::Pending(children),
                        ..
                    } = &self.actions[id.index()]
                    else {
                        continue;
                    };
                    if !scheduled.insert(id) {
                        continue;
                    }
                    work.push(Work::Finish(id));
                    for &child in children.iter().rev() {
                        work.extend(self.alternatives(child).into_iter().rev().map(Work::Visit));
                    }
                }
                Work::Finish(id) => {
                    let Action::Reduction {
                        rule,
                        eval: Evaluation::Pending(children),
                        ..
                    } = &self.actions[id.index()]
                    else {
                        continue;
                    };
                    let rule = *rule;
                    let children = children.clone();
                    let mut operands: Vec<Derivations<V>> = Vec::with_capacity(children.len());
                    for child in children {
                        operands.push(self.collect(child, actions, limit));
                    }
                    let derived = combine(rule, &operands, actions, limit);
                    if let Action::Reduction { eval, .. } = &mut self.actions[id.index()] {
                        *eval = Evaluation::Done(derived);
                    }
                }
            }
        }

        self.collect(root, actions, limit)
    }

    /// Evaluated derivations of `id` and its ambiguity chain. Members still
    /// pending are skipped.
    fn collect<A>(&self, id: ActionId, actions: &mut A, limit: usize) -> Derivations<V>
    where
        A: SemanticActions<Value = V> + ?Sized,
    {
        let mut out = Derivations::empty();
        for member in self.alternatives(id) {
            match &self.actions[member.index()] {
                Action::Terminal(terminal) => out.push(actions.terminal(terminal), limit),
                Action::Reduction {
                    eval: Evaluation::Done(derived),
                    ..
                } => out.extend(derived, limit),
                Action::Reduction { .. } => {}
            }
        }
        out
    }
}

/// Apply `rule` to every combination of operand derivations.
fn combine<A>(
    rule: RuleId,
    operands: &[Derivations<A::Value>],
    actions: &mut A,
    limit: usize,
) -> Derivations<A::Value>
where
    A: SemanticActions + ?Sized,
{
    let count = operands
        .iter()
        .fold(1usize, |acc, d| acc.saturating_mul(d.count));
    let mut values = Vec::new();
    if operands.iter().all(|d| !d.values.is_empty()) {
        // Odometer over the kept values, rightmost operand fastest
        let mut at = vec![0usize; operands.len()];
        loop {
            let children = operands
                .iter()
                .zip(&at)
                .map(|(d, &i)| d.values[i].clone())
                .collect();
            values.push(actions.reduce(rule, children));
            if values.len() >= limit || !advance(&mut at, operands) {
                break;
            }
        }
    }
    Derivations { values, count }
}

fn advance<V>(at: &mut [usize], operands: &[Derivations<V>]) -> bool {
    for (i, d) in at.iter_mut().zip(operands).rev() {
        *i += 1;
        if *i < d.values.len() {
            return true;
        }
        *i = 0;
    }
    false
}

/// Values of the derivations of one action.
///
/// `count` is the number of derivations in the forest; `values` holds the
/// first of them, up to the evaluation limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derivations<V> {
    values: Vec<V>,
    count: usize,
}

impl<V> Derivations<V> {
    const fn empty() -> Self {
        Self {
            values: Vec::new(),
            count: 0,
        }
    }

    fn push(&mut self, value: V, limit: usize) {
        if self.values.len() < limit {
            self.values.push(value);
        }
        self.count = self.count.saturating_add(1);
    }

    fn extend(&mut self, other: &Self, limit: usize)
    where
        V: Clone,
    {
        let room = limit.saturating_sub(self.values.len());
        self.values.extend(other.values.iter().take(room).cloned());
        self.count = self.count.saturating_add(other.count);
    }

    /// Derivations in the forest, including any that were not evaluated
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Values of the evaluated derivations
    #[must_use]
    pub fn values(&self) -> &[V] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<V> {
        self.values
    }

    /// More than one derivation exists
    #[must_use]
    pub const fn is_ambiguous(&self) -> bool {
        self.count > 1
    }

    /// Some derivations were counted but not evaluated
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.values.len() < self.count
    }
}

//! Graph-structured stack
//!
//! All parse states of every live interpretation share one graph. A [`Node`]
//! is an automaton state reached at some input position; each [`Link`] is one
//! way of having reached it and points down to a predecessor node. Nodes and
//! links live in a parse-scoped arena and are addressed by index, so sharing a
//! predecessor is just copying a [`NodeId`]. Nothing is freed before the parse
//! ends.

use crate::glr::forest::ActionId;
use crate::tables::{RuleId, StateId};
use hashbrown::HashMap;
use smallvec::SmallVec;

/// Index of a node in the [`Gss`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

/// Index of a link in the [`Gss`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(u32);

impl NodeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl LinkId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A parser state at an input position.
#[derive(Debug, Clone)]
pub struct Node {
    state: StateId,
    /// Number of links that can be walked down without meeting a branch,
    /// plus one if that chain ends at a node without links. Zero for a node
    /// with more than one link.
    depth: usize,
    in_degree: u32,
    rule: Option<RuleId>,
    links: SmallVec<[LinkId; 2]>,
}

impl Node {
    /// Automaton state of the node
    #[must_use]
    pub const fn state(&self) -> StateId {
        self.state
    }

    /// Length of the unbranched chain below the node, see the field docs
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Number of links pointing at this node
    #[must_use]
    pub const fn in_degree(&self) -> u32 {
        self.in_degree
    }

    /// The rule whose reduction created this node; `None` for shifted nodes
    #[must_use]
    pub const fn rule(&self) -> Option<RuleId> {
        self.rule
    }

    /// Links down to predecessors, in creation order
    #[must_use]
    pub fn links(&self) -> &[LinkId] {
        &self.links
    }
}

/// An edge from a node down to one of its predecessors.
#[derive(Debug, Clone, Copy)]
pub struct Link {
    bottom: NodeId,
    action: ActionId,
    span: usize,
}

impl Link {
    /// The predecessor node
    #[must_use]
    pub const fn bottom(&self) -> NodeId {
        self.bottom
    }

    /// Forest action for the symbol between the two nodes
    #[must_use]
    pub const fn action(&self) -> ActionId {
        self.action
    }

    /// Number of terminals consumed between the two nodes
    #[must_use]
    pub const fn span(&self) -> usize {
        self.span
    }
}

/// A sequence of links walked down from `top`.
///
/// `links[0]` leaves `top`; the last link ends at `bottom`. `states` lists the
/// states of the visited nodes from `top` down to `bottom`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub top: NodeId,
    pub bottom: NodeId,
    pub links: SmallVec<[LinkId; 4]>,
    pub states: SmallVec<[StateId; 5]>,
    pub span: usize,
}

impl Path {
    /// True if the path walks `link`
    #[must_use]
    pub fn contains(&self, link: LinkId) -> bool {
        self.links.contains(&link)
    }
}

/// The node and link arena.
#[derive(Debug, Clone, Default)]
pub struct Gss {
    nodes: Vec<Node>,
    links: Vec<Link>,
}

impl Gss {
    /// Create an empty stack
    #[must_use]
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Allocate a node without links.
    pub fn add_node(&mut self, state: StateId, rule: Option<RuleId>) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(Node {
            state,
            depth: 1,
            in_degree: 0,
            rule,
            links: SmallVec::new(),
        });
        id
    }

    /// Attach a link from `top` down to `bottom`.
    ///
    /// The first link of a node extends its predecessor's deterministic
    /// depth. A second link turns the node into a branch point: its depth
    /// drops to zero and the caller must run [`Gss::recompute_depths`] over
    /// the frontier so the nodes above it are corrected too.
    ///
    /// Returns the link id and whether depths need recomputing.
    pub fn add_link(
        &mut self,
        bottom: NodeId,
        top: NodeId,
        action: ActionId,
        span: usize,
    ) -> (LinkId, bool) {
        let id = LinkId(u32::try_from(self.links.len()).unwrap_or(u32::MAX));
        self.links.push(Link {
            bottom,
            action,
            span,
        });
        self.nodes[bottom.index()].in_degree += 1;

        let bottom_depth = self.nodes[bottom.index()].depth;
        let node = &mut self.nodes[top.index()];
        let branched = !node.links.is_empty();
        node.depth = if branched { 0 } else { bottom_depth + 1 };
        node.links.push(id);
        (id, branched)
    }

    /// The node at `id`
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// The link at `id`
    #[must_use]
    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.index()]
    }

    /// Automaton state of node `id`
    #[must_use]
    pub fn state(&self, id: NodeId) -> StateId {
        self.nodes[id.index()].state
    }

    /// Nodes allocated so far
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Links allocated so far
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Nodes referenced by more than one link
    #[must_use]
    pub fn shared_node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.in_degree > 1).count()
    }

    /// The link from `top` to `bottom`, if one exists.
    #[must_use]
    pub fn find_link(&self, top: NodeId, bottom: NodeId) -> Option<LinkId> {
        self.nodes[top.index()]
            .links
            .iter()
            .copied()
            .find(|&l| self.links[l.index()].bottom == bottom)
    }

    /// The only link of `node`, if it has exactly one.
    #[must_use]
    pub fn sole_link(&self, node: NodeId) -> Option<LinkId> {
        match self.nodes[node.index()].links.as_slice() {
            [link] => Some(*link),
            _ => None,
        }
    }

    /// Recompute deterministic depths of every frontier node.
    ///
    /// Only frontier nodes can gain links, so nodes below the frontier keep
    /// their stored depth.
    pub fn recompute_depths(&mut self, frontier: &[NodeId]) {
        let mut memo: HashMap<NodeId, usize> = HashMap::with_capacity(frontier.len());
        for &node in frontier {
            let depth = self.depth_walk(node, frontier, &mut memo);
            self.nodes[node.index()].depth = depth;
        }
    }

    fn depth_walk(
        &self,
        node: NodeId,
        frontier: &[NodeId],
        memo: &mut HashMap<NodeId, usize>,
    ) -> usize {
        if let Some(&depth) = memo.get(&node) {
            return depth;
        }
        if !frontier.contains(&node) {
            return self.nodes[node.index()].depth;
        }
        let depth = match self.nodes[node.index()].links.as_slice() {
            [] => 1,
            [link] => self.depth_walk(self.links[link.index()].bottom, frontier, memo) + 1,
            _ => 0,
        };
        memo.insert(node, depth);
        depth
    }

    /// Every path of exactly `len` links starting at `top`, depth first.
    #[must_use]
    pub fn paths(&self, top: NodeId, len: usize) -> Vec<Path> {
        let mut out = Vec::new();
        let mut path = Path {
            top,
            bottom: top,
            links: SmallVec::new(),
            states: smallvec::smallvec![self.state(top)],
            span: 0,
        };
        self.walk(&mut path, len, None, &mut out);
        out
    }

    /// Paths of `len` links from `top` that traverse `through`.
    #[must_use]
    pub fn paths_through(&self, top: NodeId, len: usize, through: LinkId) -> Vec<Path> {
        let mut out = Vec::new();
        let mut path = Path {
            top,
            bottom: top,
            links: SmallVec::new(),
            states: smallvec::smallvec![self.state(top)],
            span: 0,
        };
        self.walk(&mut path, len, Some(through), &mut out);
        out
    }

    fn walk(&self, path: &mut Path, remaining: usize, through: Option<LinkId>, out: &mut Vec<Path>) {
        if remaining == 0 {
            if through.is_none_or(|l| path.contains(l)) {
                out.push(path.clone());
            }
            return;
        }
        let at = path.bottom;
        for &link_id in &self.nodes[at.index()].links {
            let link = self.links[link_id.index()];
            path.links.push(link_id);
            path.states.push(self.state(link.bottom));
            path.span += link.span;
            path.bottom = link.bottom;

            self.walk(path, remaining - 1, through, out);

            path.bottom = at;
            path.span -= link.span;
            path.states.pop();
            path.links.pop();
        }
    }
}

/// The topmost set: all nodes at the current input position.
///
/// Iteration order is insertion order, which keeps every round
/// deterministic.
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    nodes: Vec<NodeId>,
    by_state: HashMap<StateId, NodeId, ahash::RandomState>,
}

impl Frontier {
    /// Create an empty topmost set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A topmost set holding only `node`
    #[must_use]
    pub fn single(gss: &Gss, node: NodeId) -> Self {
        let mut frontier = Self::new();
        frontier.insert(gss, node);
        frontier
    }

    /// The frontier node in `state`, if any.
    #[must_use]
    pub fn find(&self, state: StateId) -> Option<NodeId> {
        self.by_state.get(&state).copied()
    }

    /// Add `node`. A frontier holds at most one node per state.
    pub fn insert(&mut self, gss: &Gss, node: NodeId) {
        let previous = self.by_state.insert(gss.state(node), node);
        debug_assert!(previous.is_none(), "two frontier nodes share a state");
        self.nodes.push(node);
    }

    /// Return the frontier node in `state`, creating it if needed.
    ///
    /// The boolean is true when a new node was allocated.
    pub fn find_or_create(
        &mut self,
        gss: &mut Gss,
        state: StateId,
        rule: Option<RuleId>,
    ) -> (NodeId, bool) {
        if let Some(node) = self.find(state) {
            return (node, false);
        }
        let node = gss.add_node(state, rule);
        self.insert(gss, node);
        (node, true)
    }

    /// Keep only nodes for which `keep` returns true.
    pub fn retain(&mut self, gss: &Gss, mut keep: impl FnMut(NodeId) -> bool) {
        self.nodes.retain(|&n| keep(n));
        self.by_state.clear();
        for &node in &self.nodes {
            self.by_state.insert(gss.state(node), node);
        }
    }

    /// Members in insertion order
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node, if the frontier holds exactly one.
    #[must_use]
    pub fn sole(&self) -> Option<NodeId> {
        match self.nodes.as_slice() {
            [node] => Some(*node),
            _ => None,
        }
    }
}

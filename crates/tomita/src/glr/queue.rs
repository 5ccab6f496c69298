//! Reduction ordering
//!
//! A GLR round pops pending reductions in a fixed total order:
//!
//! 1. fewer terminals spanned first
//! 2. lower rule index first (rule tables number a rule whose left-hand
//!    side derives another rule's left-hand side before that rule)
//! 3. the visited states, compared lexicographically
//! 4. enqueue order
//!
//! The last key makes the order total, so two runs over the same input and
//! tables reduce in exactly the same sequence.

use crate::glr::stack::Path;
use crate::tables::RuleId;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// A path paired with the rule it will be reduced by.
#[derive(Debug, Clone)]
pub struct PathQueueEntry {
    pub path: Path,
    pub rule: RuleId,
    seq: u64,
}

impl PathQueueEntry {
    fn key(&self) -> (usize, RuleId, &[u32], u64) {
        (self.path.span, self.rule, self.path.states.as_slice(), self.seq)
    }
}

impl PartialEq for PathQueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for PathQueueEntry {}

impl PartialOrd for PathQueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PathQueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Min-priority queue of pending reductions.
#[derive(Debug, Default)]
pub struct PathQueue {
    heap: BinaryHeap<Reverse<PathQueueEntry>>,
    next_seq: u64,
}

impl PathQueue {
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `path` for reduction by `rule`
    pub fn push(&mut self, path: Path, rule: RuleId) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(PathQueueEntry { path, rule, seq }));
    }

    /// Remove the entry that must be reduced next
    pub fn pop(&mut self) -> Option<PathQueueEntry> {
        self.heap.pop().map(|Reverse(entry)| entry)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

//! # Parse Tables
//!
//! Decoded action, goto, rule and merge tables plus the overflow table used
//! for multi-way conflicts.
//!
//! ## Overview
//!
//! The tables are produced offline by a table generator and handed to the
//! parser as encoded blobs (see [`EncodedTables`]). Decoding happens once;
//! afterwards the tables are immutable and may be shared across any number
//! of parses.
//!
//! Every cell of the action table is a [`ParseTableEntry`]: a tag packed into
//! the low bits of a `u32` with its payload (destination state, rule index or
//! overflow offset) in the remaining bits. A conflict is encoded as
//! `OVERFLOW(offset)`, where `overflow[offset]` holds a count followed by that
//! many shift/reduce entries.

mod encode;

pub use encode::{EncodedTables, TableBuilder};

use crate::error::{TableBlob, TableError};
use crate::token::SymbolId;
use compact_str::{CompactString, format_compact};
use smallvec::SmallVec;

/// Parser automaton state.
pub type StateId = u32;
/// Index into the rule table.
pub type RuleId = u32;
/// Nonterminal symbol index.
pub type NonterminalId = u32;

/// Goto cell value meaning "no transition".
pub const NO_GOTO: StateId = u32::MAX;

const TAG_BITS: u32 = 3;
const TAG_MASK: u32 = (1 << TAG_BITS) - 1;

const TAG_ERROR: u32 = 0;
const TAG_SHIFT: u32 = 1;
const TAG_REDUCE: u32 = 2;
const TAG_ACCEPT: u32 = 3;
const TAG_OVERFLOW: u32 = 4;

/// Largest payload that fits next to the tag.
pub const MAX_PAYLOAD: u32 = u32::MAX >> TAG_BITS;

/// One packed action-table cell.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct ParseTableEntry(u32);

/// Unpacked view of a [`ParseTableEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Error,
    Shift(StateId),
    Reduce(RuleId),
    Accept,
    Overflow(usize),
}

impl ParseTableEntry {
    pub const ERROR: Self = Self(TAG_ERROR);
    pub const ACCEPT: Self = Self(TAG_ACCEPT);

    /// A shift to `dest`
    #[must_use]
    pub const fn shift(dest: StateId) -> Self {
        Self::pack(TAG_SHIFT, dest)
    }

    /// A reduction by `rule`
    #[must_use]
    pub const fn reduce(rule: RuleId) -> Self {
        Self::pack(TAG_REDUCE, rule)
    }

    /// A conflict whose actions start at `offset` in the overflow list
    #[must_use]
    pub const fn overflow(offset: u32) -> Self {
        Self::pack(TAG_OVERFLOW, offset)
    }

    const fn pack(tag: u32, payload: u32) -> Self {
        debug_assert!(payload <= MAX_PAYLOAD);
        Self((payload << TAG_BITS) | tag)
    }

    /// Reinterpret a raw table word. Fails on unknown tags.
    pub(crate) const fn from_raw(raw: u32) -> Option<Self> {
        if raw & TAG_MASK > TAG_OVERFLOW {
            None
        } else {
            Some(Self(raw))
        }
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Entry tag in the low bits
    #[must_use]
    pub const fn tag(self) -> u32 {
        self.0 & TAG_MASK
    }

    /// State, rule or overflow offset, depending on the tag
    #[must_use]
    pub const fn payload(self) -> u32 {
        self.0 >> TAG_BITS
    }

    /// Decoded form of the entry
    #[must_use]
    pub const fn kind(self) -> ActionKind {
        match self.tag() {
            TAG_SHIFT => ActionKind::Shift(self.payload()),
            TAG_REDUCE => ActionKind::Reduce(self.payload()),
            TAG_ACCEPT => ActionKind::Accept,
            TAG_OVERFLOW => ActionKind::Overflow(self.payload() as usize),
            _ => ActionKind::Error,
        }
    }

    /// True for an empty cell
    #[must_use]
    pub const fn is_error(self) -> bool {
        self.tag() == TAG_ERROR
    }
}

impl std::fmt::Debug for ParseTableEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind() {
            ActionKind::Error => f.write_str("ERROR"),
            ActionKind::Shift(s) => write!(f, "SHIFT({s})"),
            ActionKind::Reduce(r) => write!(f, "REDUCE({r})"),
            ActionKind::Accept => f.write_str("ACCEPT"),
            ActionKind::Overflow(o) => write!(f, "OVERFLOW({o})"),
        }
    }
}

/// Packed rule: left-hand side nonterminal in the high half, right-hand side
/// length in the low half.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Rule(u32);

impl Rule {
    /// Create a rule with `rhs_len` right-hand side symbols
    #[must_use]
    pub const fn new(lhs: NonterminalId, rhs_len: u16) -> Self {
        Self((lhs << 16) | rhs_len as u32)
    }

    /// Left-hand side nonterminal
    #[must_use]
    pub const fn lhs(self) -> NonterminalId {
        self.0 >> 16
    }

    /// Number of right-hand side symbols
    #[must_use]
    pub const fn rhs_len(self) -> usize {
        (self.0 & 0xffff) as usize
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rule(lhs: {}, len: {})", self.lhs(), self.rhs_len())
    }
}

/// How a rule's derivations are reconciled with one sibling rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum MergePolicy {
    NoMerge,
    /// Derivations of this rule are always discarded after the round
    ForbiddenIfSiblingPresent,
    /// Keep only when the sibling did not fire in the same round
    AllowedOnlyIfSiblingAbsent,
    /// Keep only when the sibling also fired in the same round
    AllowedOnlyIfSiblingPresent,
}

impl MergePolicy {
    const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            1 => Self::ForbiddenIfSiblingPresent,
            2 => Self::AllowedOnlyIfSiblingAbsent,
            3 => Self::AllowedOnlyIfSiblingPresent,
            _ => Self::NoMerge,
        }
    }

    const fn bits(self) -> u32 {
        match self {
            Self::NoMerge => 0,
            Self::ForbiddenIfSiblingPresent => 1,
            Self::AllowedOnlyIfSiblingAbsent => 2,
            Self::AllowedOnlyIfSiblingPresent => 3,
        }
    }
}

/// Packed merge entry: sibling rule index above a 2-bit policy.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct MergeEntry(u32);

impl MergeEntry {
    pub const NONE: Self = Self(0);

    /// Create a merge entry against `sibling`
    #[must_use]
    pub const fn new(sibling: RuleId, policy: MergePolicy) -> Self {
        Self((sibling << 2) | policy.bits())
    }

    /// How the sibling's presence is judged
    #[must_use]
    pub const fn policy(self) -> MergePolicy {
        MergePolicy::from_bits(self.0)
    }

    /// The rule this entry is judged against
    #[must_use]
    pub const fn sibling(self) -> RuleId {
        self.0 >> 2
    }

    /// True if the rule has no merge policy
    #[must_use]
    pub const fn is_none(self) -> bool {
        matches!(self.policy(), MergePolicy::NoMerge)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Debug for MergeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            f.write_str("MergeEntry::NONE")
        } else {
            write!(f, "MergeEntry({:?} vs rule {})", self.policy(), self.sibling())
        }
    }
}

/// Decoded parse tables.
#[derive(Debug, Clone)]
pub struct ParseTables {
    num_states: usize,
    num_terminals: usize,
    num_nonterminals: usize,
    eof: SymbolId,
    action: Box<[ParseTableEntry]>,
    goto: Box<[StateId]>,
    rules: Box<[Rule]>,
    merges: Box<[MergeEntry]>,
    overflow: Box<[u32]>,
    /// Dense per-state list of terminals with a non-error action
    valid_terminals: Box<[Box<[SymbolId]>]>,
    terminal_names: Vec<CompactString>,
}

impl ParseTables {
    /// Decode tables from their encoded blobs.
    ///
    /// # Errors
    ///
    /// Returns a [`TableError`] if any blob is truncated or inconsistent.
    pub fn decode(encoded: &EncodedTables) -> Result<Self, TableError> {
        encode::decode(encoded)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        num_states: usize,
        num_terminals: usize,
        num_nonterminals: usize,
        eof: SymbolId,
        action: Box<[ParseTableEntry]>,
        goto: Box<[StateId]>,
        rules: Box<[Rule]>,
        merges: Box<[MergeEntry]>,
        overflow: Box<[u32]>,
    ) -> Result<Self, TableError> {
        let mut tables = Self {
            num_states,
            num_terminals,
            num_nonterminals,
            eof,
            action,
            goto,
            rules,
            merges,
            overflow,
            valid_terminals: Box::default(),
            terminal_names: Vec::new(),
        };
        tables.validate()?;
        tables.valid_terminals = (0..num_states)
            .map(|state| {
                (0..num_terminals)
                    .filter(|&t| !tables.action[state * num_terminals + t].is_error())
                    .map(|t| t as SymbolId)
                    .collect()
            })
            .collect();
        Ok(tables)
    }

    fn validate(&self) -> Result<(), TableError> {
        if self.eof as usize >= self.num_terminals {
            return Err(TableError::EofOutOfRange {
                eof: self.eof as usize,
                num_terminals: self.num_terminals,
            });
        }
        for (r, rule) in self.rules.iter().enumerate() {
            if rule.lhs() as usize >= self.num_nonterminals {
                return Err(TableError::NonterminalOutOfRange {
                    rule: r,
                    lhs: rule.lhs() as usize,
                    num_nonterminals: self.num_nonterminals,
                });
            }
        }
        for merge in self.merges.iter().filter(|m| !m.is_none()) {
            self.check_rule(TableBlob::Merge, merge.sibling())?;
        }
        for &dest in self.goto.iter().filter(|&&g| g != NO_GOTO) {
            self.check_state(TableBlob::Goto, dest)?;
        }
        for &entry in &self.action {
            match entry.kind() {
                ActionKind::Shift(dest) => self.check_state(TableBlob::Action, dest)?,
                ActionKind::Reduce(rule) => self.check_rule(TableBlob::Action, rule)?,
                ActionKind::Overflow(offset) => {
                    for alt in self.overflow_entries(offset)? {
                        match ParseTableEntry::from_raw(*alt).map(ParseTableEntry::kind) {
                            Some(ActionKind::Shift(dest)) => {
                                self.check_state(TableBlob::Overflow, dest)?;
                            }
                            Some(ActionKind::Reduce(rule)) => {
                                self.check_rule(TableBlob::Overflow, rule)?;
                            }
                            Some(ActionKind::Accept) => {}
                            _ => return Err(TableError::BadOverflow { offset }),
                        }
                    }
                }
                ActionKind::Accept | ActionKind::Error => {}
            }
        }
        Ok(())
    }

    fn check_state(&self, blob: TableBlob, state: StateId) -> Result<(), TableError> {
        if (state as usize) < self.num_states {
            Ok(())
        } else {
            Err(TableError::StateOutOfRange {
                blob,
                state: state as usize,
                num_states: self.num_states,
            })
        }
    }

    fn check_rule(&self, blob: TableBlob, rule: RuleId) -> Result<(), TableError> {
        if (rule as usize) < self.rules.len() {
            Ok(())
        } else {
            Err(TableError::RuleOutOfRange {
                blob,
                rule: rule as usize,
                num_rules: self.rules.len(),
            })
        }
    }

    fn overflow_entries(&self, offset: usize) -> Result<&[u32], TableError> {
        let count = *self
            .overflow
            .get(offset)
            .ok_or(TableError::BadOverflow { offset })? as usize;
        self.overflow
            .get(offset + 1..offset + 1 + count)
            .filter(|entries| !entries.is_empty())
            .ok_or(TableError::BadOverflow { offset })
    }

    /// Attach display names for terminals, used in diagnostics.
    #[must_use]
    pub fn with_terminal_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        self.terminal_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Rows of the action and goto tables
    #[must_use]
    pub const fn num_states(&self) -> usize {
        self.num_states
    }

    /// Columns of the action table, end of stream included
    #[must_use]
    pub const fn num_terminals(&self) -> usize {
        self.num_terminals
    }

    /// Columns of the goto table
    #[must_use]
    pub const fn num_nonterminals(&self) -> usize {
        self.num_nonterminals
    }

    /// Number of grammar rules
    #[must_use]
    pub fn num_rules(&self) -> usize {
        self.rules.len()
    }

    /// The end-of-stream terminal
    #[must_use]
    pub const fn eof(&self) -> SymbolId {
        self.eof
    }

    /// Action-table cell. Unknown terminals map to `ERROR`.
    #[must_use]
    pub fn action(&self, state: StateId, symbol: SymbolId) -> ParseTableEntry {
        if symbol as usize >= self.num_terminals {
            return ParseTableEntry::ERROR;
        }
        self.action
            .get(state as usize * self.num_terminals + symbol as usize)
            .copied()
            .unwrap_or(ParseTableEntry::ERROR)
    }

    /// Expand a cell into its individual actions, resolving `OVERFLOW`.
    #[must_use]
    pub fn expand(&self, entry: ParseTableEntry) -> SmallVec<[ActionKind; 2]> {
        match entry.kind() {
            ActionKind::Error => SmallVec::new(),
            ActionKind::Overflow(offset) => self
                .overflow_entries(offset)
                .unwrap_or_default()
                .iter()
                .filter_map(|&raw| ParseTableEntry::from_raw(raw))
                .map(ParseTableEntry::kind)
                .collect(),
            kind => smallvec::smallvec![kind],
        }
    }

    /// All actions for `(state, symbol)`.
    #[must_use]
    pub fn actions(&self, state: StateId, symbol: SymbolId) -> SmallVec<[ActionKind; 2]> {
        self.expand(self.action(state, symbol))
    }

    /// Goto target, or `None` for an empty cell
    #[must_use]
    pub fn goto(&self, state: StateId, nonterminal: NonterminalId) -> Option<StateId> {
        if nonterminal as usize >= self.num_nonterminals {
            return None;
        }
        self.goto
            .get(state as usize * self.num_nonterminals + nonterminal as usize)
            .copied()
            .filter(|&dest| dest != NO_GOTO)
    }

    /// # Panics
    ///
    /// Panics if `rule` is out of range; rule ids come from validated tables.
    #[must_use]
    pub fn rule(&self, rule: RuleId) -> Rule {
        self.rules[rule as usize]
    }

    /// Merge entry of `rule`; the empty entry if out of range
    #[must_use]
    pub fn merge(&self, rule: RuleId) -> MergeEntry {
        self.merges.get(rule as usize).copied().unwrap_or_default()
    }

    /// Terminals with a non-error action in `state`, ascending.
    #[must_use]
    pub fn valid_terminals(&self, state: StateId) -> &[SymbolId] {
        self.valid_terminals
            .get(state as usize)
            .map_or(&[][..], |terminals| &terminals[..])
    }

    /// True if `state` accepts on end of input.
    #[must_use]
    pub fn can_accept(&self, state: StateId) -> bool {
        self.actions(state, self.eof).contains(&ActionKind::Accept)
    }

    /// Display name of a terminal, for diagnostics.
    #[must_use]
    pub fn terminal_name(&self, symbol: SymbolId) -> CompactString {
        match self.terminal_names.get(symbol as usize) {
            Some(name) => name.clone(),
            None if symbol == self.eof => CompactString::const_new("$"),
            None => format_compact!("#{symbol}"),
        }
    }
}

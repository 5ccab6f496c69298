//! Blob format for parse tables.
//!
//! Each blob is a sequence of little-endian `u32` words:
//!
//! | blob       | header                                  | body                         |
//! |------------|-----------------------------------------|------------------------------|
//! | `action`   | `num_states, num_terminals, eof`        | row-major `ParseTableEntry`  |
//! | `goto`     | `num_states, num_nonterminals`          | row-major state, `NO_GOTO`   |
//! | `rule`     | `count`                                 | packed `Rule`                |
//! | `merge`    | `count` (equal to the rule count)       | packed `MergeEntry`          |
//! | `overflow` | none                                    | `count, entry * count` lists |

use super::{
    MergeEntry, MergePolicy, NO_GOTO, NonterminalId, ParseTableEntry, ParseTables, Rule, RuleId,
    StateId,
};
use crate::error::{TableBlob, TableError};
use crate::token::SymbolId;
use compact_str::CompactString;
use std::collections::BTreeMap;

/// The five encoded table blobs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct EncodedTables {
    pub action: Vec<u8>,
    pub goto: Vec<u8>,
    pub rule: Vec<u8>,
    pub merge: Vec<u8>,
    pub overflow: Vec<u8>,
}

fn words(blob: TableBlob, bytes: &[u8]) -> Result<Vec<u32>, TableError> {
    if bytes.len() % 4 != 0 {
        return Err(TableError::Misaligned {
            blob,
            len: bytes.len(),
        });
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

fn split_header(
    blob: TableBlob,
    words: &[u32],
    header_len: usize,
) -> Result<(Vec<usize>, &[u32]), TableError> {
    if words.len() < header_len {
        return Err(TableError::Truncated {
            blob,
            expected: header_len * 4,
            found: words.len() * 4,
        });
    }
    let (header, body) = words.split_at(header_len);
    Ok((header.iter().map(|&w| w as usize).collect(), body))
}

fn expect_len(blob: TableBlob, body: &[u32], len: usize) -> Result<(), TableError> {
    if body.len() == len {
        Ok(())
    } else {
        Err(TableError::Truncated {
            blob,
            expected: len * 4,
            found: body.len() * 4,
        })
    }
}

pub(super) fn decode(encoded: &EncodedTables) -> Result<ParseTables, TableError> {
    let action_words = words(TableBlob::Action, &encoded.action)?;
    let (header, body) = split_header(TableBlob::Action, &action_words, 3)?;
    let (num_states, num_terminals, eof) = (header[0], header[1], header[2]);
    expect_len(TableBlob::Action, body, num_states * num_terminals)?;
    let action = body
        .iter()
        .enumerate()
        .map(|(i, &raw)| {
            ParseTableEntry::from_raw(raw).ok_or(TableError::InvalidTag {
                state: i / num_terminals,
                terminal: i % num_terminals,
                tag: raw & super::TAG_MASK,
            })
        })
        .collect::<Result<Box<[_]>, _>>()?;

    let goto_words = words(TableBlob::Goto, &encoded.goto)?;
    let (header, body) = split_header(TableBlob::Goto, &goto_words, 2)?;
    let (goto_states, num_nonterminals) = (header[0], header[1]);
    if goto_states != num_states {
        return Err(TableError::DimensionMismatch {
            expected: num_states,
            found: goto_states,
        });
    }
    expect_len(TableBlob::Goto, body, num_states * num_nonterminals)?;
    let goto: Box<[StateId]> = body.into();

    let rule_words = words(TableBlob::Rule, &encoded.rule)?;
    let (header, body) = split_header(TableBlob::Rule, &rule_words, 1)?;
    expect_len(TableBlob::Rule, body, header[0])?;
    let rules: Box<[Rule]> = body.iter().map(|&raw| Rule(raw)).collect();

    let merge_words = words(TableBlob::Merge, &encoded.merge)?;
    let (header, body) = split_header(TableBlob::Merge, &merge_words, 1)?;
    if header[0] != rules.len() {
        return Err(TableError::MergeCountMismatch {
            expected: rules.len(),
            found: header[0],
        });
    }
    expect_len(TableBlob::Merge, body, header[0])?;
    let merges: Box<[MergeEntry]> = body.iter().map(|&raw| MergeEntry(raw)).collect();

    let overflow: Box<[u32]> = words(TableBlob::Overflow, &encoded.overflow)?.into();

    ParseTables::from_parts(
        num_states,
        num_terminals,
        num_nonterminals,
        eof as SymbolId,
        action,
        goto,
        rules,
        merges,
        overflow,
    )
}

fn encode_words(words: impl IntoIterator<Item = u32>) -> Vec<u8> {
    words.into_iter().flat_map(u32::to_le_bytes).collect()
}

/// Encoder for hand-written or generated tables.
///
/// Dimensions are inferred from the registered entries. Registering several
/// actions for one cell produces an `OVERFLOW` entry.
///
/// ```rust
/// use tomita::tables::{ActionKind, TableBuilder};
///
/// // S -> x
/// let tables = TableBuilder::new(1)
///     .shift(0, 0, 2)
///     .reduce(2, 1, 0)
///     .goto(0, 0, 1)
///     .accept(1)
///     .rule(0, 1)
///     .build()
///     .unwrap();
/// assert_eq!(tables.action(0, 0).kind(), ActionKind::Shift(2));
/// assert_eq!(tables.goto(0, 0), Some(1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableBuilder {
    eof: SymbolId,
    cells: BTreeMap<(StateId, SymbolId), Vec<ParseTableEntry>>,
    gotos: BTreeMap<(StateId, NonterminalId), StateId>,
    rules: Vec<Rule>,
    merges: BTreeMap<RuleId, MergeEntry>,
    terminal_names: Vec<CompactString>,
    num_terminals: usize,
    num_states: usize,
}

impl TableBuilder {
    /// Start a table whose end-of-stream terminal is `eof`.
    #[must_use]
    pub fn new(eof: SymbolId) -> Self {
        Self {
            eof,
            num_terminals: eof as usize + 1,
            ..Self::default()
        }
    }

    fn note_state(&mut self, state: StateId) {
        self.num_states = self.num_states.max(state as usize + 1);
    }

    fn push(mut self, state: StateId, terminal: SymbolId, entry: ParseTableEntry) -> Self {
        self.note_state(state);
        self.num_terminals = self.num_terminals.max(terminal as usize + 1);
        let cell = self.cells.entry((state, terminal)).or_default();
        if !cell.contains(&entry) {
            cell.push(entry);
        }
        self
    }

    /// Shift to `dest` on `terminal` in `state`
    #[must_use]
    pub fn shift(mut self, state: StateId, terminal: SymbolId, dest: StateId) -> Self {
        self.note_state(dest);
        self.push(state, terminal, ParseTableEntry::shift(dest))
    }

    /// Reduce by `rule` on `terminal` in `state`
    #[must_use]
    pub fn reduce(self, state: StateId, terminal: SymbolId, rule: RuleId) -> Self {
        self.push(state, terminal, ParseTableEntry::reduce(rule))
    }

    /// Accept in `state` on the end-of-stream terminal.
    #[must_use]
    pub fn accept(self, state: StateId) -> Self {
        let eof = self.eof;
        self.push(state, eof, ParseTableEntry::ACCEPT)
    }

    /// Go to `dest` on `nonterminal` from `state`
    #[must_use]
    pub fn goto(mut self, state: StateId, nonterminal: NonterminalId, dest: StateId) -> Self {
        self.note_state(state);
        self.note_state(dest);
        self.gotos.insert((state, nonterminal), dest);
        self
    }

    /// Append a rule; its index is the number of rules added before it.
    #[must_use]
    pub fn rule(mut self, lhs: NonterminalId, rhs_len: u16) -> Self {
        self.rules.push(Rule::new(lhs, rhs_len));
        self
    }

    /// Give `rule` a merge policy against `sibling`
    #[must_use]
    pub fn merge(mut self, rule: RuleId, sibling: RuleId, policy: MergePolicy) -> Self {
        self.merges.insert(rule, MergeEntry::new(sibling, policy));
        self
    }

    /// Display names for terminals, indexed by symbol
    #[must_use]
    pub fn terminal_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        self.terminal_names = names.into_iter().map(Into::into).collect();
        self
    }

    fn num_nonterminals(&self) -> usize {
        let from_rules = self.rules.iter().map(|r| r.lhs() as usize + 1);
        let from_gotos = self.gotos.keys().map(|&(_, nt)| nt as usize + 1);
        from_rules.chain(from_gotos).max().unwrap_or(0)
    }

    /// Produce the encoded blobs.
    #[must_use]
    pub fn encode(&self) -> EncodedTables {
        let num_states = self.num_states;
        let num_terminals = self.num_terminals;
        let num_nonterminals = self.num_nonterminals();

        let mut overflow: Vec<u32> = Vec::new();
        let mut action = vec![ParseTableEntry::ERROR.raw(); num_states * num_terminals];
        for (&(state, terminal), entries) in &self.cells {
            let index = state as usize * num_terminals + terminal as usize;
            action[index] = match entries.as_slice() {
                [single] => single.raw(),
                many => {
                    let offset = overflow.len() as u32;
                    overflow.push(many.len() as u32);
                    overflow.extend(many.iter().map(|e| e.raw()));
                    ParseTableEntry::overflow(offset).raw()
                }
            };
        }

        let mut goto = vec![NO_GOTO; num_states * num_nonterminals];
        for (&(state, nonterminal), &dest) in &self.gotos {
            goto[state as usize * num_nonterminals + nonterminal as usize] = dest;
        }

        let merges = (0..self.rules.len()).map(|r| {
            self.merges
                .get(&(r as RuleId))
                .copied()
                .unwrap_or_default()
                .raw()
        });

        EncodedTables {
            action: encode_words(
                [num_states as u32, num_terminals as u32, self.eof]
                    .into_iter()
                    .chain(action),
            ),
            goto: encode_words(
                [num_states as u32, num_nonterminals as u32]
                    .into_iter()
                    .chain(goto),
            ),
            rule: encode_words(
                std::iter::once(self.rules.len() as u32).chain(self.rules.iter().map(|r| r.raw())),
            ),
            merge: encode_words(std::iter::once(self.rules.len() as u32).chain(merges)),
            overflow: encode_words(overflow),
        }
    }

    /// Encode, then decode through [`ParseTables::decode`].
    ///
    /// # Errors
    ///
    /// Returns a [`TableError`] if the registered entries are inconsistent
    /// (e.g. a reduction by a rule that was never added).
    pub fn build(&self) -> Result<ParseTables, TableError> {
        let tables = ParseTables::decode(&self.encode())?;
        Ok(if self.terminal_names.is_empty() {
            tables
        } else {
            tables.with_terminal_names(self.terminal_names.iter().cloned())
        })
    }
}

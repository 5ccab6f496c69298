//! Minimum-distance error repair
//!
//! When no frontier node can act on the lookahead, the parser buffers up to
//! [`ParserConfig::error_lookahead`](crate::glr::ParserConfig::error_lookahead)
//! real terminals and searches for a continuation that the grammar accepts
//! from the current frontier. Candidates are built one valid terminal at a
//! time and checked by simulation, never touching the real stack. A
//! candidate is scored when it reaches the length bound or ends in an
//! accepted end of stream, against every prefix ("window") of the buffer it
//! could replace. The cheapest (distance, candidate, window) found first in
//! search order wins and is spliced into the input in place of its window.

use crate::error::{Level, ParseError};
use crate::glr::distance::{Edit, edit_distance, edit_script};
use crate::glr::parser::Session;
use crate::glr::simulate::{SimStack, simulate};
use crate::glr::stack::Gss;
use crate::tables::ParseTables;
use crate::token::{SymbolId, Terminal, TerminalSource};

/// The winning repair
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Repair {
    pub distance: usize,
    pub candidate: Vec<SymbolId>,
    /// Number of buffered terminals the candidate replaces
    pub window: usize,
}

/// Depth-first search over candidate continuations.
pub(crate) struct RepairSearch<'r> {
    tables: &'r ParseTables,
    gss: &'r Gss,
    /// Symbols of the buffered input
    input: &'r [SymbolId],
    max_len: usize,
    /// Windows for candidates that do not end the input; never covers the
    /// end-of-stream terminal
    max_window: usize,
    budget: usize,
    explored: usize,
    best: Option<Repair>,
}

impl<'r> RepairSearch<'r> {
    pub(crate) fn new(
        tables: &'r ParseTables,
        gss: &'r Gss,
        input: &'r [SymbolId],
        max_len: usize,
        budget: usize,
    ) -> Self {
        let eof = tables.eof();
        let before_eof = input.iter().position(|&s| s == eof).unwrap_or(input.len());
        Self {
            tables,
            gss,
            input,
            max_len,
            max_window: before_eof,
            budget,
            explored: 0,
            best: None,
        }
    }

    /// Run the search from `stacks` and return the best repair, if any.
    pub(crate) fn run(mut self, stacks: &[SimStack]) -> Option<Repair> {
        if self.max_len > 0 {
            let mut candidate = Vec::with_capacity(self.max_len);
            self.extend(stacks, &mut candidate);
        }
        self.best
    }

    fn extend(&mut self, stacks: &[SimStack], candidate: &mut Vec<SymbolId>) {
        let mut symbols: Vec<SymbolId> = stacks
            .iter()
            .flat_map(|s| self.tables.valid_terminals(s.top(self.gss)).iter().copied())
            .collect();
        symbols.sort_unstable();
        symbols.dedup();

        for symbol in symbols {
            if self.explored >= self.budget {
                return;
            }
            self.explored += 1;

            let sim = simulate(self.tables, self.gss, stacks, symbol);
            candidate.push(symbol);
            if symbol == self.tables.eof() {
                if sim.accepted {
                    self.score_complete(candidate);
                }
            } else if !sim.stacks.is_empty() {
                if candidate.len() >= self.max_len {
                    self.score_partial(candidate);
                } else {
                    self.extend(&sim.stacks, candidate);
                }
            }
            candidate.pop();
        }
    }

    /// A candidate ending in an accepted end of stream replaces the whole
    /// buffer, provided the buffer itself reaches the end of input.
    fn score_complete(&mut self, candidate: &[SymbolId]) {
        if self.max_window < self.input.len() {
            let window = self.input.len();
            self.offer(candidate, window);
        }
    }

    fn score_partial(&mut self, candidate: &[SymbolId]) {
        for window in 1..=self.max_window {
            self.offer(candidate, window);
        }
    }

    fn offer(&mut self, candidate: &[SymbolId], window: usize) {
        let distance = edit_distance(candidate, &self.input[..window]);
        if self.best.as_ref().is_none_or(|best| distance < best.distance) {
            self.best = Some(Repair {
                distance,
                candidate: candidate.to_vec(),
                window,
            });
        }
    }
}

/// Replace `window` by `candidate`, reusing real terminals wherever the
/// alignment keeps them. Returns the new terminals and a description of the
/// change.
pub(crate) fn splice(
    tables: &ParseTables,
    candidate: &[SymbolId],
    window: &[Terminal],
) -> (Vec<Terminal>, String) {
    let symbols: Vec<SymbolId> = window.iter().map(|t| t.symbol).collect();
    let script = edit_script(candidate, &symbols);

    let mut reusable: Vec<Option<&Terminal>> = script
        .iter()
        .filter_map(|edit| match edit {
            Edit::Delete(j) => Some(Some(&window[*j])),
            _ => None,
        })
        .collect();

    let mut out = Vec::with_capacity(candidate.len());
    let mut changes = Changes::default();
    let mut next_input = 0;
    for edit in &script {
        match *edit {
            Edit::Keep { input, .. } => {
                changes.flush();
                out.push(window[input].clone());
                next_input = input + 1;
            }
            Edit::Delete(j) => {
                changes.deleted.push(window[j].to_string());
                next_input = j + 1;
            }
            Edit::Insert(i) => {
                let symbol = candidate[i];
                let reused = reusable
                    .iter_mut()
                    .find(|slot| slot.is_some_and(|t| t.symbol == symbol))
                    .and_then(Option::take);
                let terminal = if let Some(terminal) = reused {
                    terminal.clone()
                } else {
                    let position = window
                        .get(next_input)
                        .or_else(|| window.last())
                        .map_or(0, |t| t.position);
                    Terminal::synthetic(symbol, tables.terminal_name(symbol), position)
                };
                changes.inserted.push(format!("`{}`", tables.terminal_name(symbol)));
                out.push(terminal);
            }
        }
    }
    (out, changes.into_description())
}

/// Accumulates adjacent deletions and insertions so a deletion followed by
/// an insertion reads as a replacement.
#[derive(Default)]
struct Changes {
    deleted: Vec<String>,
    inserted: Vec<String>,
    phrases: Vec<String>,
}

impl Changes {
    fn flush(&mut self) {
        let deleted = self.deleted.join(" ");
        let inserted = self.inserted.join(" ");
        let phrase = match (deleted.is_empty(), inserted.is_empty()) {
            (true, true) => return,
            (false, true) => format!("deleted {deleted}"),
            (true, false) => format!("inserted {inserted}"),
            (false, false) => format!("replaced {deleted} with {inserted}"),
        };
        self.deleted.clear();
        self.inserted.clear();
        self.phrases.push(phrase);
    }

    fn into_description(mut self) -> String {
        self.flush();
        if self.phrases.is_empty() {
            "no change".to_string()
        } else {
            self.phrases.join(", ")
        }
    }
}

impl<S: TerminalSource, V: Clone> Session<'_, S, V> {
    /// Repair the input at `lookahead`, which no frontier node can act on.
    ///
    /// On success the repaired terminals are queued as the next input. A
    /// syntax error among those terminals is fatal rather than skipped:
    /// repairing the repair could loop forever, and since the search
    /// simulates merge policies too, such an error means the tables reject
    /// what their own simulation accepted.
    pub(crate) fn recover(&mut self, lookahead: &Terminal) -> Result<(), ParseError> {
        let config = self.engine.config;
        let in_progress = self.taken <= self.repair_end;
        if !config.error_recovery || in_progress {
            return Err(self.engine.syntax_error(lookahead));
        }
        if self.engine.metrics.repairs >= config.max_repairs {
            return Err(ParseError::TooManyRepairs {
                limit: config.max_repairs,
            });
        }

        let eof = self.engine.tables.eof();
        let mut buffer = vec![lookahead.clone()];
        while buffer.len() < config.error_lookahead() && lookahead.symbol != eof {
            let terminal = self.pull()?;
            let at_end = terminal.symbol == eof;
            buffer.push(terminal);
            if at_end {
                break;
            }
        }

        let symbols: Vec<SymbolId> = buffer.iter().map(|t| t.symbol).collect();
        let stacks: Vec<SimStack> = self
            .engine
            .frontier
            .nodes()
            .iter()
            .map(|&n| SimStack::at(n))
            .collect();
        let best = RepairSearch::new(
            self.engine.tables,
            &self.engine.gss,
            &symbols,
            config.repair_string_length,
            config.max_repair_candidates,
        )
        .run(&stacks);

        let Some(repair) = best else {
            return Err(self.engine.syntax_error(lookahead));
        };

        let rest = buffer.split_off(repair.window);
        let (mut repaired, description) = splice(self.engine.tables, &repair.candidate, &buffer);
        let distance = repair.distance;
        let position = lookahead.position;
        self.engine.emit(Level::Error, || {
            format!("syntax error at {position}: {description} (distance {distance})")
        });

        self.engine.metrics.repairs += 1;
        self.repair_end = self.taken + repaired.len();
        repaired.extend(rest);
        self.unread(repaired);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::TableBuilder;

    fn names() -> ParseTables {
        TableBuilder::new(2)
            .shift(0, 0, 1)
            .shift(0, 1, 1)
            .rule(0, 1)
            .terminal_names(["a", "b", "$"])
            .build()
            .unwrap()
    }

    fn window(symbols: &[SymbolId]) -> Vec<Terminal> {
        let text = ["a", "b", "$"];
        symbols
            .iter()
            .enumerate()
            .map(|(i, &s)| Terminal::new(s, text[s as usize], 10 + i))
            .collect()
    }

    #[test]
    fn test_splice_insertion_reuses_window() {
        let tables = names();
        let (out, description) = splice(&tables, &[1, 2], &window(&[2]));
        assert_eq!(description, "inserted `b`");
        assert_eq!(out.len(), 2);
        assert!(out[0].synthetic);
        assert_eq!(out[0].position, 10);
        assert!(!out[1].synthetic);
        assert_eq!(out[1].symbol, 2);
    }

    #[test]
    fn test_splice_deletion() {
        let tables = names();
        let (out, description) = splice(&tables, &[2], &window(&[1, 2]));
        assert_eq!(description, "deleted `b`");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].position, 11);
    }

    #[test]
    fn test_splice_replacement() {
        let tables = names();
        let (out, description) = splice(&tables, &[0], &window(&[1]));
        assert_eq!(description, "replaced `b` with `a`");
        assert_eq!(out[0].symbol, 0);
        assert!(out[0].synthetic);
    }

    #[test]
    fn test_splice_reuses_deleted_token_out_of_order() {
        let tables = names();
        let (out, _) = splice(&tables, &[1, 0], &window(&[0, 1]));
        assert_eq!(out.iter().map(|t| t.symbol).collect::<Vec<_>>(), vec![1, 0]);
        assert!(out.iter().all(|t| !t.synthetic));
    }

    #[test]
    fn test_search_prefers_first_minimum() {
        let tables = TableBuilder::new(2)
            .shift(0, 0, 1)
            .shift(0, 1, 1)
            .accept(1)
            .rule(0, 1)
            .build()
            .unwrap();
        let mut gss = Gss::new();
        let start = gss.add_node(0, None);
        let input = [2];
        let best = RepairSearch::new(&tables, &gss, &input, 4, 1000)
            .run(&[SimStack::at(start)])
            .unwrap();
        assert_eq!(best.candidate, vec![0, 2]);
        assert_eq!(best.distance, 1);
        assert_eq!(best.window, 1);
    }

    #[test]
    fn test_search_without_candidates() {
        let tables = names();
        let mut gss = Gss::new();
        let start = gss.add_node(1, None);
        let input = [0, 1, 2];
        let best = RepairSearch::new(&tables, &gss, &input, 4, 1000).run(&[SimStack::at(start)]);
        assert_eq!(best, None);
    }
}

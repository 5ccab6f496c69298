//! Hand-built tables and helpers shared by the integration tests.

#![allow(dead_code)]

use tomita::glr::SemanticActions;
use tomita::tables::{MergePolicy, ParseTables, RuleId, TableBuilder};
use tomita::token::{Terminal, VecSource};

/// `S -> a S b | a b`
///
/// Terminals a=0, b=1, $=2; rules r0 `S -> a S b`, r1 `S -> a b`.
pub fn nested_pairs() -> ParseTables {
    TableBuilder::new(2)
        .shift(0, 0, 2)
        .goto(0, 0, 1)
        .accept(1)
        .shift(2, 0, 2)
        .shift(2, 1, 4)
        .goto(2, 0, 3)
        .shift(3, 1, 5)
        .reduce(4, 1, 1)
        .reduce(4, 2, 1)
        .reduce(5, 1, 0)
        .reduce(5, 2, 0)
        .rule(0, 3)
        .rule(0, 2)
        .terminal_names(["a", "b", "$"])
        .build()
        .expect("nested pair tables")
}

/// `S -> A | B`, `A -> x`, `B -> x`
///
/// Terminals x=0, $=1; nonterminals S=0, A=1, B=2.
pub fn either() -> ParseTables {
    TableBuilder::new(1)
        .shift(0, 0, 4)
        .goto(0, 0, 1)
        .goto(0, 1, 2)
        .goto(0, 2, 3)
        .accept(1)
        .reduce(2, 1, 0)
        .reduce(3, 1, 1)
        .reduce(4, 1, 2)
        .reduce(4, 1, 3)
        .rule(0, 1)
        .rule(0, 1)
        .rule(1, 1)
        .rule(2, 1)
        .terminal_names(["x", "$"])
        .build()
        .expect("either tables")
}

/// `S -> T`, `T -> A | B`, `A -> x`, `B -> x`
///
/// Terminals x=0, $=1; nonterminals S=0, T=1, A=2, B=3. The two derivations
/// differ below the root, inside the single `T` link.
pub fn layered() -> ParseTables {
    TableBuilder::new(1)
        .shift(0, 0, 5)
        .goto(0, 0, 1)
        .goto(0, 1, 2)
        .goto(0, 2, 3)
        .goto(0, 3, 4)
        .accept(1)
        .reduce(2, 1, 0)
        .reduce(3, 1, 1)
        .reduce(4, 1, 2)
        .reduce(5, 1, 3)
        .reduce(5, 1, 4)
        .rule(0, 1)
        .rule(1, 1)
        .rule(1, 1)
        .rule(2, 1)
        .rule(3, 1)
        .terminal_names(["x", "$"])
        .build()
        .expect("layered tables")
}

/// `S -> A A x`, `A -> | y`
///
/// Terminals x=0, y=1, $=2; nonterminals S=0, A=1; rules r0 `S -> A A x`,
/// r1 `A ->` (empty), r2 `A -> y`. State 0 has a shift/reduce conflict on
/// `y`, so a single `y` may fill either `A`.
pub fn optional_pair() -> ParseTables {
    TableBuilder::new(2)
        .shift(0, 1, 3)
        .reduce(0, 1, 1)
        .reduce(0, 0, 1)
        .goto(0, 0, 1)
        .goto(0, 1, 2)
        .accept(1)
        .shift(2, 1, 3)
        .reduce(2, 0, 1)
        .goto(2, 1, 4)
        .reduce(3, 0, 2)
        .reduce(3, 1, 2)
        .shift(4, 0, 5)
        .reduce(5, 2, 0)
        .rule(0, 3)
        .rule(1, 0)
        .rule(1, 1)
        .terminal_names(["x", "y", "$"])
        .build()
        .expect("optional pair tables")
}

/// `S -> A y | B y`, `A -> x`, `B -> x`
///
/// Terminals x=0, y=1, $=2. With `policies`, r2 (`A -> x`) is allowed only
/// if r3 fired and r3 (`B -> x`) only if r2 did not.
pub fn siblings(policies: bool) -> ParseTables {
    let builder = TableBuilder::new(2)
        .shift(0, 0, 4)
        .goto(0, 0, 1)
        .goto(0, 1, 2)
        .goto(0, 2, 3)
        .accept(1)
        .shift(2, 1, 5)
        .shift(3, 1, 6)
        .reduce(4, 1, 2)
        .reduce(4, 1, 3)
        .reduce(5, 2, 0)
        .reduce(6, 2, 1)
        .rule(0, 2)
        .rule(0, 2)
        .rule(1, 1)
        .rule(2, 1)
        .terminal_names(["x", "y", "$"]);
    let builder = if policies {
        builder
            .merge(2, 3, MergePolicy::AllowedOnlyIfSiblingPresent)
            .merge(3, 2, MergePolicy::AllowedOnlyIfSiblingAbsent)
    } else {
        builder
    };
    builder.build().expect("sibling tables")
}

/// `E -> E + n | n`
///
/// Terminals n=0, +=1, $=2; rules r0 `E -> E + n`, r1 `E -> n`.
pub fn sums() -> ParseTables {
    TableBuilder::new(2)
        .shift(0, 0, 2)
        .goto(0, 0, 1)
        .shift(1, 1, 3)
        .accept(1)
        .reduce(2, 1, 1)
        .reduce(2, 2, 1)
        .shift(3, 0, 4)
        .reduce(4, 1, 0)
        .reduce(4, 2, 0)
        .rule(0, 3)
        .rule(0, 1)
        .terminal_names(["n", "+", "$"])
        .build()
        .expect("sum tables")
}

/// `S -> S S | x`, every bracketing of `x...x` is a derivation
///
/// Terminals x=0, $=1; rules r0 `S -> S S`, r1 `S -> x`.
pub fn catalan() -> ParseTables {
    TableBuilder::new(1)
        .shift(0, 0, 2)
        .goto(0, 0, 1)
        .shift(1, 0, 2)
        .accept(1)
        .goto(1, 0, 3)
        .reduce(2, 0, 1)
        .reduce(2, 1, 1)
        .reduce(3, 0, 0)
        .shift(3, 0, 2)
        .reduce(3, 1, 0)
        .goto(3, 0, 3)
        .rule(0, 2)
        .rule(0, 1)
        .terminal_names(["x", "$"])
        .build()
        .expect("catalan tables")
}

/// Terminals for a space-separated list of terminal names.
pub fn tokens(tables: &ParseTables, input: &str) -> VecSource {
    VecSource::new(input.split_whitespace().enumerate().map(|(position, name)| {
        let symbol = (0..tables.num_terminals() as u32)
            .find(|&s| tables.terminal_name(s).as_str() == name)
            .unwrap_or_else(|| panic!("unknown terminal {name}"));
        Terminal::new(symbol, name, position)
    }))
}

/// `n + n + ...` for [`sums`], each `n` carrying its value as text.
pub fn summands(values: &[i64]) -> VecSource {
    let mut terminals = Vec::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            terminals.push(Terminal::new(1, "+", terminals.len()));
        }
        terminals.push(Terminal::new(0, value.to_string(), terminals.len()));
    }
    VecSource::new(terminals)
}

/// Renders derivations as s-expressions such as `(r0 a (r1 a b) b)`.
#[derive(Debug, Default)]
pub struct Sexpr {
    pub reductions: usize,
}

impl SemanticActions for Sexpr {
    type Value = String;

    fn terminal(&mut self, terminal: &Terminal) -> String {
        terminal.text.to_string()
    }

    fn reduce(&mut self, rule: RuleId, children: Vec<String>) -> String {
        self.reductions += 1;
        format!("(r{rule} {})", children.join(" "))
    }
}

/// Evaluates `E -> E + n | n` over numeric terminal texts.
#[derive(Debug, Default)]
pub struct Sum;

impl SemanticActions for Sum {
    type Value = i64;

    fn terminal(&mut self, terminal: &Terminal) -> i64 {
        terminal.text.parse().unwrap_or(0)
    }

    fn reduce(&mut self, rule: RuleId, children: Vec<i64>) -> i64 {
        match rule {
            0 => children[0] + children[2],
            _ => children[0],
        }
    }
}

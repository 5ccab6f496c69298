#![no_main]
use libfuzzer_sys::fuzz_target;
use tomita::error::NullSink;
use tomita::glr::{Parser, ParserConfig, SemanticActions};
use tomita::tables::{ParseTables, RuleId, TableBuilder};
use tomita::token::{Terminal, VecSource};

struct Count;

impl SemanticActions for Count {
    type Value = usize;

    fn terminal(&mut self, _: &Terminal) -> usize {
        0
    }

    fn reduce(&mut self, _: RuleId, children: Vec<usize>) -> usize {
        children.iter().sum::<usize>() + 1
    }
}

/// `S -> a S b | a b`; a=0, b=1, $=2
fn nested_pairs() -> ParseTables {
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
        .build()
        .expect("nested pair tables")
}

/// `S -> S S | x`; x=0, $=1
fn catalan() -> ParseTables {
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
        .build()
        .expect("catalan tables")
}

fuzz_target!(|data: &[u8]| {
    let Some((&flags, rest)) = data.split_first() else {
        return;
    };
    let config = ParserConfig::default()
        .with_fast_path(flags & 1 == 0)
        .with_error_recovery(flags & 2 == 0)
        .with_max_repair_candidates(10_000);

    // Malformed input must end in a result or an error, never a panic
    let symbols: Vec<u32> = rest.iter().take(64).map(|b| u32::from(b % 2)).collect();
    let parser = Parser::new(nested_pairs(), config.clone());
    let _ = parser.parse_with_sink(VecSource::from_symbols(&symbols), &mut Count, &mut NullSink);

    // Ambiguity grows quickly; keep the input short
    let xs = vec![0; rest.len().min(12)];
    let parser = Parser::new(catalan(), config);
    let _ = parser.parse_with_sink(VecSource::from_symbols(&xs), &mut Count, &mut NullSink);
});

//! Tests for the GLR driver

mod common;

use common::{
    Sexpr, Sum, catalan, either, layered, nested_pairs, optional_pair, siblings, summands, sums,
    tokens,
};
use tomita::error::{BufferedSink, Level, ParseError};
use tomita::glr::{Accepted, Parser, ParserConfig};
use tomita::token::{IterSource, Terminal};

fn parse(
    parser: &Parser,
    input: &str,
) -> (Result<tomita::glr::Parsed<String>, ParseError>, BufferedSink) {
    let mut sink = BufferedSink::new();
    let source = tokens(parser.tables(), input);
    let result = parser.parse_with_sink(source, &mut Sexpr::default(), &mut sink);
    (result, sink)
}

#[test]
fn test_deterministic_input_stays_on_fast_path() {
    let parser = Parser::new(nested_pairs(), ParserConfig::default());
    let (result, sink) = parse(&parser, "a a b b");
    let parsed = result.unwrap();

    assert_eq!(parsed.result, Accepted::Unique("(r0 a (r1 a b) b)".to_string()));
    assert_eq!(parsed.metrics.max_topmost, 1);
    assert_eq!(parsed.metrics.glr_reductions, 0);
    assert_eq!(parsed.metrics.fast_path_reductions, 2);
    assert_eq!(parsed.metrics.tokens_shifted, 4);
    assert!(sink.diagnostics().is_empty());
}

#[test]
fn test_forced_glr_matches_fast_path() {
    let fast = Parser::new(nested_pairs(), ParserConfig::default());
    let slow = Parser::new(nested_pairs(), ParserConfig::default().with_fast_path(false));

    for input in ["a b", "a a b b", "a a a a b b b b"] {
        let expected = parse(&fast, input).0.unwrap();
        let forced = parse(&slow, input).0.unwrap();
        assert_eq!(forced.result, expected.result, "input {input}");
        assert_eq!(forced.metrics.fast_path_reductions, 0);
        assert!(forced.metrics.glr_reductions > 0);
    }
}

#[test]
fn test_left_recursive_sums() {
    let parser = Parser::new(sums(), ParserConfig::default());
    let parsed = parser.parse(summands(&[1, 2, 3, 4]), &mut Sum).unwrap();
    assert_eq!(parsed.result, Accepted::Unique(10));
    assert_eq!(parsed.metrics.max_topmost, 1);
}

#[test]
fn test_unresolved_ambiguity_is_reported() {
    let parser = Parser::new(either(), ParserConfig::default());
    let (result, sink) = parse(&parser, "x");
    let parsed = result.unwrap();

    assert!(parsed.result.is_ambiguous());
    assert_eq!(
        parsed.result.values(),
        &["(r0 (r2 x))".to_string(), "(r1 (r3 x))".to_string()]
    );
    assert_eq!(parsed.metrics.ambiguities, 1);

    let warnings: Vec<_> = sink.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("unresolved ambiguity"));
}

#[test]
fn test_reconverging_derivations_share_nodes() {
    let parser = Parser::new(catalan(), ParserConfig::default());
    let (result, _) = parse(&parser, "x x x");
    let parsed = result.unwrap();

    assert_eq!(
        parsed.result,
        Accepted::Ambiguous(vec![
            "(r0 (r0 (r1 x) (r1 x)) (r1 x))".to_string(),
            "(r0 (r1 x) (r0 (r1 x) (r1 x)))".to_string(),
        ])
    );
    assert_eq!(parsed.metrics.ambiguities, 1);
    assert_eq!(parsed.metrics.nodes_created, 9);
    assert!(parsed.metrics.shared_nodes > 0);
}

#[test]
fn test_each_reduction_runs_once() {
    let parser = Parser::new(catalan(), ParserConfig::default());
    let mut actions = Sexpr::default();
    let parsed = parser
        .parse(tokens(parser.tables(), "x x x"), &mut actions)
        .unwrap();
    assert_eq!(parsed.result.values().len(), 2);
    // The last x is reduced once per stack it sits on; nothing is evaluated twice
    assert_eq!(actions.reductions, 8);
}

#[test]
fn test_ambiguity_below_the_root_is_reported() {
    let parser = Parser::new(layered(), ParserConfig::default());
    let (result, sink) = parse(&parser, "x");
    let parsed = result.unwrap();

    assert_eq!(
        parsed.result,
        Accepted::Ambiguous(vec![
            "(r0 (r1 (r3 x)))".to_string(),
            "(r0 (r2 (r4 x)))".to_string(),
        ])
    );
    assert_eq!(parsed.metrics.ambiguities, 1);
    assert_eq!(parsed.metrics.derivations, 2);

    let warnings: Vec<_> = sink.warnings().map(|d| d.message.as_str()).collect();
    assert_eq!(warnings, ["unresolved ambiguity: 2 derivations accepted"]);
}

#[test]
fn test_every_bracketing_is_accepted() {
    let parser = Parser::new(catalan(), ParserConfig::default());
    let (result, sink) = parse(&parser, "x x x x");
    let parsed = result.unwrap();

    let mut values = parsed.result.into_values();
    values.sort();
    let x = "(r1 x)";
    let mut expected = vec![
        format!("(r0 (r0 (r0 {x} {x}) {x}) {x})"),
        format!("(r0 (r0 {x} (r0 {x} {x})) {x})"),
        format!("(r0 (r0 {x} {x}) (r0 {x} {x}))"),
        format!("(r0 {x} (r0 (r0 {x} {x}) {x}))"),
        format!("(r0 {x} (r0 {x} (r0 {x} {x})))"),
    ];
    expected.sort();
    assert_eq!(values, expected);
    assert_eq!(parsed.metrics.derivations, 5);
    assert_eq!(
        sink.warnings().next().map(|d| d.message.as_str()),
        Some("unresolved ambiguity: 5 derivations accepted")
    );
}

#[test]
fn test_derivation_limit_still_counts_everything() {
    let config = ParserConfig::default().with_max_derivations(2);
    let parser = Parser::new(catalan(), config);
    let (result, sink) = parse(&parser, "x x x x");
    let parsed = result.unwrap();

    assert_eq!(parsed.result.values().len(), 2);
    assert_eq!(parsed.metrics.derivations, 5);
    assert_eq!(
        sink.warnings().next().map(|d| d.message.as_str()),
        Some("unresolved ambiguity: 5 derivations accepted, 2 evaluated")
    );
}

#[test]
fn test_empty_rules_agree_between_fast_path_and_forced_glr() {
    let fast = Parser::new(optional_pair(), ParserConfig::default());
    let slow = Parser::new(optional_pair(), ParserConfig::default().with_fast_path(false));

    let cases = [
        ("x", Accepted::Unique("(r0 (r1 ) (r1 ) x)".to_string())),
        (
            "y x",
            Accepted::Ambiguous(vec![
                "(r0 (r2 y) (r1 ) x)".to_string(),
                "(r0 (r1 ) (r2 y) x)".to_string(),
            ]),
        ),
        ("y y x", Accepted::Unique("(r0 (r2 y) (r2 y) x)".to_string())),
    ];
    for (input, expected) in cases {
        let (quick, quick_sink) = parse(&fast, input);
        let (forced, forced_sink) = parse(&slow, input);
        assert_eq!(quick.unwrap().result, expected, "input {input}");
        assert_eq!(forced.unwrap().result, expected, "input {input}");
        assert!(quick_sink.errors().next().is_none(), "input {input}");
        assert!(forced_sink.errors().next().is_none(), "input {input}");
    }
}

#[test]
fn test_merge_policy_keeps_preferred_sibling() {
    let parser = Parser::new(siblings(true), ParserConfig::default());
    let (result, sink) = parse(&parser, "x y");
    let parsed = result.unwrap();

    assert_eq!(parsed.result, Accepted::Unique("(r0 (r2 x) y)".to_string()));
    assert_eq!(parsed.metrics.merge_discards, 1);
    assert!(sink.warnings().next().is_none());
}

#[test]
fn test_without_merge_policy_both_survive() {
    let parser = Parser::new(siblings(false), ParserConfig::default());
    let (result, _) = parse(&parser, "x y");
    let parsed = result.unwrap();

    assert_eq!(
        parsed.result.into_values(),
        vec!["(r0 (r2 x) y)".to_string(), "(r1 (r3 x) y)".to_string()]
    );
    assert_eq!(parsed.metrics.merge_discards, 0);
    assert_eq!(parsed.metrics.max_topmost, 3);
}

#[test]
fn test_repair_inserts_missing_terminal() {
    let parser = Parser::new(nested_pairs(), ParserConfig::default());
    let (result, sink) = parse(&parser, "a a b");
    let parsed = result.unwrap();

    assert_eq!(parsed.result, Accepted::Unique("(r0 a (r1 a b) b)".to_string()));
    assert_eq!(parsed.metrics.repairs, 1);

    let errors: Vec<_> = sink.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].message,
        "syntax error at 3: inserted `b` (distance 1)"
    );
}

#[test]
fn test_repair_under_merge_policies() {
    let parser = Parser::new(siblings(true), ParserConfig::default());
    let (result, sink) = parse(&parser, "x");

    assert_eq!(result.unwrap().result, Accepted::Unique("(r0 (r2 x) y)".to_string()));
    assert_eq!(
        sink.errors().next().map(|d| d.message.as_str()),
        Some("syntax error at 1: inserted `y` (distance 1)")
    );
}

#[test]
fn test_repair_deletes_extra_terminal() {
    let parser = Parser::new(nested_pairs(), ParserConfig::default());
    let (result, sink) = parse(&parser, "a b b");

    assert_eq!(result.unwrap().result, Accepted::Unique("(r1 a b)".to_string()));
    assert_eq!(
        sink.errors().next().map(|d| d.message.as_str()),
        Some("syntax error at 2: deleted `b` (distance 1)")
    );
}

#[test]
fn test_repair_of_empty_input() {
    let parser = Parser::new(nested_pairs(), ParserConfig::default());
    let (result, sink) = parse(&parser, "");

    assert_eq!(result.unwrap().result, Accepted::Unique("(r1 a b)".to_string()));
    assert_eq!(
        sink.errors().next().map(|d| d.message.as_str()),
        Some("syntax error at 0: inserted `a` `b` (distance 2)")
    );
}

#[test]
fn test_repaired_stream_parses_cleanly() {
    let parser = Parser::new(nested_pairs(), ParserConfig::default());
    let (result, _) = parse(&parser, "a a b");
    let repaired = result.unwrap().result;

    let (again, sink) = parse(&parser, "a a b b");
    assert_eq!(again.unwrap().result, repaired);
    assert!(sink.errors().next().is_none());
}

#[test]
fn test_error_without_recovery_is_fatal() {
    let config = ParserConfig::default().with_error_recovery(false);
    let parser = Parser::new(nested_pairs(), config);
    let (result, sink) = parse(&parser, "a b b");

    let error = result.unwrap_err();
    assert!(error.is_syntax());
    assert_eq!(error.position(), Some(2));
    assert_eq!(
        error.to_string(),
        "syntax error at 2: unexpected `b`, expected `$`"
    );
    assert_eq!(sink.errors().count(), 1);
}

#[test]
fn test_no_repair_within_bounds_is_fatal() {
    let config = ParserConfig::default().with_repair_string_length(0);
    let parser = Parser::new(nested_pairs(), config);
    let (result, _) = parse(&parser, "a a b");

    match result {
        Err(ParseError::Syntax {
            position,
            found,
            expected,
        }) => {
            assert_eq!(position, 3);
            assert_eq!(found, "`$`");
            assert_eq!(expected, vec!["`b`".to_string()]);
        }
        other => panic!("expected a syntax error, got {other:?}"),
    }
}

#[test]
fn test_repair_budget() {
    let config = ParserConfig::default().with_max_repairs(0);
    let parser = Parser::new(nested_pairs(), config);
    let (result, _) = parse(&parser, "a a b");
    assert!(matches!(result, Err(ParseError::TooManyRepairs { limit: 0 })));
}

#[test]
fn test_io_failure_aborts() {
    let parser = Parser::new(nested_pairs(), ParserConfig::default());
    let items = vec![
        Ok(Terminal::new(0, "a", 0)),
        Err(std::io::Error::other("connection reset")),
    ];
    let result = parser.parse(IterSource::new(items.into_iter()), &mut Sexpr::default());
    assert!(matches!(result, Err(ParseError::Io(_))));
}

#[test]
fn test_repairs_are_deterministic() {
    let parser = Parser::new(nested_pairs(), ParserConfig::default());
    for input in ["a a b", "b a", "a b a b", "a a a b a"] {
        let (first, first_sink) = parse(&parser, input);
        let (second, second_sink) = parse(&parser, input);
        assert_eq!(format!("{first:?}"), format!("{second:?}"), "input {input}");
        assert_eq!(first_sink.render(), second_sink.render(), "input {input}");
    }
}

#[test]
fn test_trace_level_reports_steps() {
    let config = ParserConfig::default().with_log_level(Level::Trace);
    let parser = Parser::new(nested_pairs(), config);
    let (result, sink) = parse(&parser, "a b");
    assert!(result.is_ok());

    let traces: Vec<_> = sink.at_level(Level::Trace).map(|d| d.message.clone()).collect();
    assert_eq!(traces[0], "shift `a` to state 2");
    assert!(traces.iter().any(|m| m == "reduce by rule 1 to state 1"));
}

#[test]
fn test_parser_is_shareable_across_threads() {
    let parser = Parser::new(sums(), ParserConfig::default());
    let handles: Vec<_> = (1..=4)
        .map(|n| {
            let parser = parser.clone();
            std::thread::spawn(move || {
                let values: Vec<i64> = (1..=n).collect();
                parser
                    .parse(summands(&values), &mut Sum)
                    .map(|parsed| parsed.result.into_unique())
            })
        })
        .collect();

    let totals: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();
    assert_eq!(totals, vec![Some(1), Some(3), Some(6), Some(10)]);
}

use rill::error::Reporter;
use rill::parser::{Parser, Stmt};
use rill::resolver::{Locals, Resolver};
use rill::scanner::Scanner;
use rill::token::Token;

fn parse(source: &str) -> (Vec<Token<'_>>, Reporter) {
    let mut reporter = Reporter::new();
    let tokens = Scanner::new(source.as_bytes()).scan_tokens(&mut reporter);

    (tokens, reporter)
}

fn resolve(source: &str) -> (Locals, Reporter) {
    let (tokens, mut reporter) = parse(source);
    let statements: Vec<Stmt<'_>> = Parser::new(&tokens).parse(&mut reporter);

    assert!(
        !reporter.had_errors(),
        "static errors before resolution: {:?}",
        reporter.errors()
    );

    let locals = Resolver::new(&mut reporter).resolve(&statements);

    (locals, reporter)
}

#[test]
fn test_top_level_names_stay_global() {
    let (locals, reporter) = resolve("var x := 1; print x;");

    assert!(!reporter.had_errors());
    assert!(locals.is_empty());
}

#[test]
fn test_block_local_is_mapped() {
    let (locals, reporter) = resolve("loop var x := 1; print x; end;");

    assert!(!reporter.had_errors());

    // exactly one occurrence resolves locally: the `x` inside `print`
    assert_eq!(locals.len(), 1);
}

#[test]
fn test_self_reference_in_initializer_is_reported() {
    let (_locals, reporter) = resolve("loop var x := x; end;");

    assert_eq!(reporter.errors().len(), 1);
    assert!(reporter.errors()[0]
        .to_string()
        .contains("own initializer"));
}

#[test]
fn test_top_level_self_reference_is_not_a_static_error() {
    // with no enclosing scope the initializer read resolves through
    // globals; it fails at run time instead
    let (_locals, reporter) = resolve("var x := x;");

    assert!(!reporter.had_errors());
}

#[test]
fn test_duplicate_declaration_in_one_scope_is_reported() {
    let (_locals, reporter) = resolve("loop var x := 1; var x := 2; end;");

    assert_eq!(reporter.errors().len(), 1);
    assert!(reporter.errors()[0]
        .to_string()
        .contains("already declared"));
}

#[test]
fn test_shadowing_across_scopes_is_legal() {
    let (_locals, reporter) = resolve("loop var x := 1; loop var x := 2; print x; end; end;");

    assert!(!reporter.had_errors());
}

#[test]
fn test_resolution_continues_after_an_error() {
    // both blocks are walked: the duplicate is reported and the later
    // local reference still lands in the map
    let (locals, reporter) = resolve("loop var x := 1; var x := 2; end; loop var y := 3; print y; end;");

    assert_eq!(reporter.errors().len(), 1);
    assert!(locals.len() >= 1);
}

#[test]
fn test_function_parameters_open_a_scope() {
    let (locals, reporter) = resolve("var f := func (n) => return n;");

    assert!(!reporter.had_errors());

    // the body's `n` resolves into the parameter scope
    assert_eq!(locals.len(), 1);
}

//! Whole-pipeline tests: scan → parse → resolve → interpret, with injected
//! console streams.

use std::io::Cursor;

use rill::error::Reporter;
use rill::interpreter::Interpreter;
use rill::parser::Parser;
use rill::resolver::Resolver;
use rill::scanner::Scanner;

fn run_with_input(source: &str, input: &str) -> (String, rill::error::Result<()>) {
    let mut reporter = Reporter::new();

    let tokens = Scanner::new(source.as_bytes()).scan_tokens(&mut reporter);
    let statements = Parser::new(&tokens).parse(&mut reporter);
    let locals = Resolver::new(&mut reporter).resolve(&statements);

    assert!(
        !reporter.had_errors(),
        "static errors: {:?}",
        reporter.errors()
    );

    let mut out: Vec<u8> = Vec::new();
    let result = {
        let mut interpreter =
            Interpreter::with_io(locals, Cursor::new(input.as_bytes()), &mut out);
        interpreter.interpret(&statements)
    };

    (String::from_utf8(out).expect("utf-8 output"), result)
}

fn run(source: &str) -> (String, rill::error::Result<()>) {
    run_with_input(source, "")
}

fn run_ok(source: &str) -> String {
    let (output, result) = run(source);
    result.expect("program failed");

    output
}

fn run_err(source: &str) -> String {
    let (_output, result) = run(source);

    result.expect_err("program unexpectedly succeeded").to_string()
}

// ───────────────────────── arithmetic and precedence ─────────────────────

#[test]
fn test_arithmetic_follows_the_precedence_ladder() {
    assert_eq!(run_ok("print 1 + 2 * 3;"), "7\n");
    assert_eq!(run_ok("print (1 + 2) * 3;"), "9\n");
}

#[test]
fn test_additive_operators_are_left_associative() {
    assert_eq!(run_ok("print 10 - 2 - 3;"), "5\n");
}

#[test]
fn test_division_keeps_fractions() {
    assert_eq!(run_ok("print 7 / 2;"), "3.5\n");
}

#[test]
fn test_integral_values_print_without_trailing_zero() {
    assert_eq!(run_ok("var x := 3; print x + 4;"), "7\n");
}

#[test]
fn test_unary_operators() {
    assert_eq!(run_ok("print -5;"), "-5\n");
    assert_eq!(run_ok("print +3;"), "3\n");
    assert_eq!(run_ok("print not false;"), "true\n");
}

#[test]
fn test_logical_negation_requires_a_boolean() {
    let message = run_err("print not 1;");
    assert!(message.contains("boolean"));
}

// ───────────────────────── logic and relations ───────────────────────────

#[test]
fn test_xor_truth_table() {
    assert_eq!(run_ok("print true xor false;"), "true\n");
    assert_eq!(run_ok("print true xor true;"), "false\n");
}

#[test]
fn test_logical_operators_do_not_short_circuit() {
    // the right-hand call runs even though the left side already decides
    let output = run_ok(
        "var flag := false;\n\
         var set := func (x) is flag := x; return true; end;\n\
         var r := false and set(true);\n\
         print flag;\n\
         print r;",
    );

    assert_eq!(output, "true\nfalse\n");
}

#[test]
fn test_equality_spans_types() {
    assert_eq!(run_ok("print 1 = \"a\";"), "false\n");
    assert_eq!(run_ok("print \"a\" = \"a\";"), "true\n");
    assert_eq!(run_ok("print 1 /= 2;"), "true\n");
    assert_eq!(run_ok("print [1, 2] = [1, 2];"), "true\n");
}

#[test]
fn test_ordering_requires_numbers() {
    let message = run_err("print \"a\" < \"b\";");
    assert!(message.contains("numbers"));
}

// ───────────────────────── strings and arrays ────────────────────────────

#[test]
fn test_plus_concatenates_strings_and_arrays() {
    assert_eq!(run_ok("print \"foo\" + \"bar\";"), "foobar\n");
    assert_eq!(run_ok("print [1, 2] + [3];"), "[1, 2, 3]\n");
}

#[test]
fn test_mixed_plus_is_a_type_error() {
    let message = run_err("print 1 + \"a\";");
    assert!(message.contains("Operands"));
}

#[test]
fn test_array_indexing_is_one_based() {
    let output = run_ok("var a := [1, 2, 3]; a[2] := 9; print a[2]; print a[1];");
    assert_eq!(output, "9\n1\n");
}

#[test]
fn test_array_index_out_of_range() {
    assert!(run_err("var a := [1, 2, 3]; print a[0];").contains("out of range"));
    assert!(run_err("var a := [1, 2, 3]; print a[4];").contains("out of range"));
}

#[test]
fn test_array_index_must_be_integral() {
    assert!(run_err("var a := [1, 2, 3]; print a[1.5];").contains("integer"));
    assert!(run_err("var a := [1, 2, 3]; print a[\"x\"];").contains("number"));
}

#[test]
fn test_element_assignment_never_aliases() {
    let output = run_ok(
        "var a := [1, 2, 3];\n\
         var b := a;\n\
         a[2] := 9;\n\
         print a[2];\n\
         print b[2];",
    );

    assert_eq!(output, "9\n2\n");
}

// ───────────────────────── control flow ──────────────────────────────────

#[test]
fn test_if_executes_exactly_one_branch() {
    assert_eq!(
        run_ok("if 1 < 2 then print \"yes\"; else print \"no\"; end;"),
        "yes\n"
    );
    assert_eq!(
        run_ok("if 2 < 1 then print \"yes\"; else print \"no\"; end;"),
        "no\n"
    );
}

#[test]
fn test_while_reevaluates_its_condition() {
    assert_eq!(run_ok("var i := 0; while i < 3 i := i + 1; end; print i;"), "3\n");
}

#[test]
fn test_loop_executes_once_as_a_block() {
    assert_eq!(run_ok("loop print \"x\"; end;"), "x\n");
}

#[test]
fn test_for_range_counts_up_to_the_exclusive_bound() {
    assert_eq!(run_ok("for i := 1..4 print i; end;"), "1\n2\n3\n");
    assert_eq!(run_ok("for i in 1..4 print i; end;"), "1\n2\n3\n");
}

#[test]
fn test_nested_for_ranges() {
    assert_eq!(
        run_ok("for i := 1..3 for j := 1..3 print i * 10 + j; end; end;"),
        "11\n12\n21\n22\n"
    );
}

// ───────────────────────── scoping ───────────────────────────────────────

#[test]
fn test_inner_shadow_leaves_outer_binding_alone() {
    let output = run_ok("var x := 1; loop var x := 2; print x; end; print x;");
    assert_eq!(output, "2\n1\n");
}

#[test]
fn test_block_locals_are_invisible_after_the_block() {
    let message = run_err("loop var t := 5; end; print t;");
    assert!(message.contains("Undefined variable 't'"));
}

#[test]
fn test_declaration_group_carries_the_running_value() {
    // an uninitialized name inherits the previous declaration's value
    assert_eq!(run_ok("var a := 1, b; print b;"), "1\n");
    assert_eq!(run_ok("var a; print a;"), "empty\n");
}

// ───────────────────────── functions ─────────────────────────────────────

#[test]
fn test_lambda_body_call() {
    assert_eq!(run_ok("var f := func (n) => print n; f(5);"), "5\n");
}

#[test]
fn test_calls_are_reentrant() {
    let output = run_ok(
        "var f := func (n) is var m := n * 2; return m; end;\n\
         print f(1);\n\
         print f(2);",
    );

    assert_eq!(output, "2\n4\n");
}

#[test]
fn test_function_without_return_yields_empty() {
    assert_eq!(
        run_ok("var f := func (n) is print n; end; print f(7);"),
        "7\nempty\n"
    );
    assert_eq!(
        run_ok("var f := func (n) is return; end; print f(1);"),
        "empty\n"
    );
}

#[test]
fn test_arity_mismatch_is_a_runtime_error() {
    let message = run_err("var f := func (n) => return n; f(1, 2);");
    assert!(message.contains("Expected 1 arguments but got 2"));
}

#[test]
fn test_calling_a_non_function() {
    assert!(run_err("var x := 3; x();").contains("not callable"));
    assert!(run_err("var x; x();").contains("Undefined function"));
}

#[test]
fn test_call_frames_chain_to_the_call_site() {
    // the body's free variable binds through the environment active at the
    // call, not the one where the literal was written
    let output = run_ok(
        "loop\n\
           var tag := \"def\";\n\
           var show := func (x) => return tag + x;\n\
           loop\n\
             var tag := \"call\";\n\
             print show(\"!\");\n\
           end;\n\
         end;",
    );

    assert_eq!(output, "call!\n");
}

#[test]
fn test_returned_function_does_not_capture_its_definition_frame() {
    // consequence of call-site chaining: the escaped literal loses `a`
    let message = run_err(
        "var make := func (a) is return func (b) => return a + b; end;\n\
         print make(1)(2);",
    );

    assert!(message.contains("Undefined variable 'a'"));
}

#[test]
fn test_return_outside_any_call_is_a_runtime_error() {
    assert!(run_err("return 5;").contains("outside"));
}

// ───────────────────────── type predicates ───────────────────────────────

#[test]
fn test_is_checks_inspect_the_runtime_representation() {
    let output = run_ok(
        "print 5 is int;\n\
         print 5 is real;\n\
         print \"s\" is string;\n\
         print true is bool;\n\
         print [1] is [];\n\
         var f := func (n) => return n;\n\
         print f is func;\n\
         var e;\n\
         print e is empty;",
    );

    assert_eq!(
        output,
        "false\ntrue\ntrue\ntrue\ntrue\ntrue\ntrue\n"
    );
}

// ───────────────────────── console reads ─────────────────────────────────

#[test]
fn test_typed_reads_consume_whitespace_delimited_tokens() {
    let (output, result) = run_with_input("print readInt; print readReal; print readString;", "4 2.5 hi");
    result.expect("program failed");

    assert_eq!(output, "4\n2.5\nhi\n");
}

#[test]
fn test_read_is_memoized_per_syntactic_occurrence() {
    // the single readInt node prompts once; later iterations reuse it
    let (output, result) = run_with_input(
        "var i := 0; while i < 3 i := i + readInt; end; print i;",
        "1 99 99",
    );
    result.expect("program failed");

    assert_eq!(output, "3\n");
}

#[test]
fn test_read_input_mismatch_is_a_runtime_error() {
    let (_output, result) = run_with_input("print readInt;", "abc");

    let message = result.expect_err("expected mismatch").to_string();
    assert!(message.contains("input mismatch"));
}

#[test]
fn test_read_at_end_of_input_is_a_runtime_error() {
    let (_output, result) = run_with_input("print readInt;", "");

    assert!(result.is_err());
}

// ───────────────────────── output behavior ───────────────────────────────

#[test]
fn test_reprinting_the_same_expression_is_idempotent() {
    assert_eq!(run_ok("var x := 2; print x + 1; print x + 1;"), "3\n3\n");
}

use rill::error::Reporter;
use rill::parser::{Expr, LiteralValue, Parser, Stmt};
use rill::scanner::Scanner;
use rill::token::Token;

fn tokens_of(source: &str) -> Vec<Token<'_>> {
    let mut reporter = Reporter::new();
    let tokens = Scanner::new(source.as_bytes()).scan_tokens(&mut reporter);

    assert!(
        !reporter.had_errors(),
        "lexical errors in test source: {:?}",
        reporter.errors()
    );

    tokens
}

#[test]
fn test_var_declaration_group() {
    let tokens = tokens_of("var a := 1, b;");
    let mut reporter = Reporter::new();
    let statements = Parser::new(&tokens).parse(&mut reporter);

    assert!(!reporter.had_errors());
    assert_eq!(statements.len(), 1);

    match &statements[0] {
        Stmt::Var { declarations } => {
            assert_eq!(declarations.len(), 2);
            assert_eq!(declarations[0].name.lexeme, "a");
            assert!(declarations[0].initializer.is_some());
            assert_eq!(declarations[1].name.lexeme, "b");
            assert!(declarations[1].initializer.is_none());
        }
        other => panic!("expected Var, got {:?}", other),
    }
}

#[test]
fn test_if_with_else_branch() {
    let tokens = tokens_of("if 1 < 2 then print 1; else print 2; end;");
    let mut reporter = Reporter::new();
    let statements = Parser::new(&tokens).parse(&mut reporter);

    assert!(!reporter.had_errors());
    assert_eq!(statements.len(), 1);

    match &statements[0] {
        Stmt::If {
            then_branch,
            else_branch,
            ..
        } => {
            assert!(matches!(**then_branch, Stmt::Body(_)));
            assert!(matches!(else_branch.as_deref(), Some(Stmt::Print(_))));
        }
        other => panic!("expected If, got {:?}", other),
    }
}

#[test]
fn test_while_wraps_body_in_block() {
    let tokens = tokens_of("while i < 3 i := i + 1; end;");
    let mut reporter = Reporter::new();
    let statements = Parser::new(&tokens).parse(&mut reporter);

    assert!(!reporter.had_errors());

    match &statements[0] {
        Stmt::While { body, .. } => match body.as_ref() {
            Stmt::Body(inner) => {
                assert_eq!(inner.len(), 1);
                assert!(matches!(inner[0], Stmt::Assignment { .. }));
            }
            other => panic!("expected Body, got {:?}", other),
        },
        other => panic!("expected While, got {:?}", other),
    }
}

#[test]
fn test_loop_is_a_plain_block() {
    let tokens = tokens_of("loop print 1; end;");
    let mut reporter = Reporter::new();
    let statements = Parser::new(&tokens).parse(&mut reporter);

    assert!(!reporter.had_errors());
    assert!(matches!(&statements[0], Stmt::Body(inner) if inner.len() == 1));
}

#[test]
fn test_for_desugars_to_init_plus_while() {
    // the lexer already rewrote `..`; the parser lowers the rest
    let tokens = tokens_of("for i := 1..5 print i; end;");
    let mut reporter = Reporter::new();
    let statements = Parser::new(&tokens).parse(&mut reporter);

    assert!(!reporter.had_errors());
    assert_eq!(statements.len(), 1);

    let Stmt::Body(outer) = &statements[0] else {
        panic!("expected outer Body, got {:?}", statements[0]);
    };

    assert_eq!(outer.len(), 2);
    assert!(matches!(outer[0], Stmt::Var { .. }));

    let Stmt::While { body, .. } = &outer[1] else {
        panic!("expected While, got {:?}", outer[1]);
    };

    // loop body carries the source statements plus the appended increment
    let Stmt::Body(inner) = body.as_ref() else {
        panic!("expected inner Body");
    };

    assert_eq!(inner.len(), 2);
    assert!(matches!(inner[0], Stmt::Print(_)));
    assert!(matches!(inner[1], Stmt::Assignment { .. }));
}

#[test]
fn test_function_literal_block_form() {
    let tokens = tokens_of("var f := func (a, b) is return a + b; end;");
    let mut reporter = Reporter::new();
    let statements = Parser::new(&tokens).parse(&mut reporter);

    assert!(!reporter.had_errors());

    let Stmt::Var { declarations } = &statements[0] else {
        panic!("expected Var");
    };

    let Some(Expr::Unary { operand, .. }) = &declarations[0].initializer else {
        panic!("expected initializer");
    };

    match operand.as_ref() {
        Expr::FunctionLiteral { params, body } => {
            assert_eq!(params.len(), 2);
            assert_eq!(body.len(), 1);
            assert!(matches!(body[0], Stmt::Return { .. }));
        }
        other => panic!("expected FunctionLiteral, got {:?}", other),
    }
}

#[test]
fn test_function_literal_lambda_form_shares_terminator() {
    // the lambda body's ';' also closes the enclosing declaration
    let tokens = tokens_of("var f := func (n) => print n; f(5);");
    let mut reporter = Reporter::new();
    let statements = Parser::new(&tokens).parse(&mut reporter);

    assert!(!reporter.had_errors(), "errors: {:?}", reporter.errors());
    assert_eq!(statements.len(), 2);
    assert!(matches!(statements[0], Stmt::Var { .. }));
    assert!(matches!(statements[1], Stmt::Reference(_)));
}

#[test]
fn test_function_literal_requires_parameters() {
    let tokens = tokens_of("var f := func () is return 1; end;");
    let mut reporter = Reporter::new();
    let _ = Parser::new(&tokens).parse(&mut reporter);

    assert!(reporter.had_errors());
    assert!(reporter.errors()[0]
        .to_string()
        .contains("at least one parameter"));
}

#[test]
fn test_array_literal_and_nesting() {
    let tokens = tokens_of("var a := [[1, 2], [3]];");
    let mut reporter = Reporter::new();
    let statements = Parser::new(&tokens).parse(&mut reporter);

    assert!(!reporter.had_errors());

    let Stmt::Var { declarations } = &statements[0] else {
        panic!("expected Var");
    };

    match &declarations[0].initializer {
        Some(Expr::Literal(LiteralValue::Array(rows))) => assert_eq!(rows.len(), 2),
        other => panic!("expected array literal, got {:?}", other),
    }
}

#[test]
fn test_empty_array_literal_is_an_error() {
    let tokens = tokens_of("var a := [];");
    let mut reporter = Reporter::new();
    let _ = Parser::new(&tokens).parse(&mut reporter);

    assert!(reporter.had_errors());
}

#[test]
fn test_call_chain_composes() {
    let tokens = tokens_of("make(1)(2);");
    let mut reporter = Reporter::new();
    let statements = Parser::new(&tokens).parse(&mut reporter);

    assert!(!reporter.had_errors());

    let Stmt::Reference(expr) = &statements[0] else {
        panic!("expected Reference statement");
    };

    // outer call's callee is itself a call
    match expr {
        Expr::Reference { callee, .. } => {
            assert!(matches!(callee.as_ref(), Expr::Reference { .. }));
        }
        other => panic!("expected call chain, got {:?}", other),
    }
}

#[test]
fn test_relation_is_non_associative() {
    let tokens = tokens_of("print 1 < 2 < 3;");
    let mut reporter = Reporter::new();
    let _ = Parser::new(&tokens).parse(&mut reporter);

    // the second '<' cannot be consumed; the statement is malformed
    assert!(reporter.had_errors());
}

#[test]
fn test_synchronization_recovers_at_statement_boundary() {
    let tokens = tokens_of("var := 3; print 1;");
    let mut reporter = Reporter::new();
    let statements = Parser::new(&tokens).parse(&mut reporter);

    assert_eq!(reporter.errors().len(), 1);
    assert_eq!(statements.len(), 1);
    assert!(matches!(statements[0], Stmt::Print(_)));
}

#[test]
fn test_reserved_dot_access_yields_no_node() {
    let tokens = tokens_of("a.b;");
    let mut reporter = Reporter::new();
    let statements = Parser::new(&tokens).parse(&mut reporter);

    assert!(reporter.had_errors());
    assert!(statements.is_empty());
}

#[test]
fn test_call_is_not_an_assignment_target() {
    let tokens = tokens_of("f() := 3;");
    let mut reporter = Reporter::new();
    let _ = Parser::new(&tokens).parse(&mut reporter);

    assert!(reporter.had_errors());
    assert!(reporter.errors()[0]
        .to_string()
        .contains("Invalid assignment target"));
}

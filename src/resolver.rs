//! Static resolver pass for the **Rill** interpreter.
//!
//! One top-down AST walk that does three things:
//! 1. Build lexical scopes (stack of `HashMap<&str, bool>` tracking
//!    declared/defined).
//! 2. Report static errors (redeclaration in one scope, reading a name in
//!    its own initializer).  Errors land in the [`Reporter`]; the walk always
//!    completes.
//! 3. Record, for each `Variable` occurrence, how many frames up its
//!    declaring scope sits at run time.  Occurrences found in no scope stay
//!    unmapped and resolve through the global frame directly.
//!
//! `Body` blocks and function-literal parameter lists each push one scope.
//! Array-element and call nodes propagate into their index/argument
//! sub-expressions but introduce no scope of their own, and an
//! `ArrayElement` never maps itself: indexed names always go through the
//! global frame.

use crate::error::{Reporter, RillError};
use crate::parser::{Expr, NodeId, Stmt};
use crate::token::Token;
use log::{debug, info};
use std::collections::HashMap;

/// Read-only lexical distance map, keyed by node identity.
///
/// Built once before execution and never invalidated; absent entries mean
/// "resolve through globals directly".
#[derive(Debug, Default)]
pub struct Locals {
    depths: HashMap<NodeId, usize>,
}

impl Locals {
    pub fn depth(&self, id: NodeId) -> Option<usize> {
        self.depths.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.depths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    fn note(&mut self, id: NodeId, depth: usize) {
        self.depths.insert(id, depth);
    }
}

/// Resolver: tracks scopes, enforces static rules, and records binding
/// distances into an owned [`Locals`] map handed to the interpreter.
pub struct Resolver<'a, 'r> {
    scopes: Vec<HashMap<&'a str, bool>>, // false=declared, true=defined
    locals: Locals,
    reporter: &'r mut Reporter,
}

impl<'a, 'r> Resolver<'a, 'r> {
    pub fn new(reporter: &'r mut Reporter) -> Self {
        info!("Resolver instantiated");

        Resolver {
            scopes: Vec::new(),
            locals: Locals::default(),
            reporter,
        }
    }

    /// Walk all top-level statements and return the finished distance map.
    pub fn resolve(mut self, statements: &[Stmt<'a>]) -> Locals {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }

        self.locals
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt<'a>) {
        match stmt {
            Stmt::Body(statements) => {
                self.begin_scope();
                for s in statements {
                    self.resolve_stmt(s);
                }
                self.end_scope();
            }

            Stmt::Assignment { target, value } => {
                self.resolve_expr(target);
                self.resolve_expr(value);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::Print(expr) | Stmt::Reference(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::Return { value, .. } => {
                if let Some(expr) = value {
                    self.resolve_expr(expr);
                }
            }

            Stmt::Var { declarations } => {
                // declare → resolve initializer → define, so a name read in
                // its own initializer is still marked "declared only"
                for decl in declarations {
                    self.declare(decl.name);
                    if let Some(expr) = &decl.initializer {
                        self.resolve_expr(expr);
                    }
                    self.define(decl.name);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr<'a>) {
        match expr {
            // Array literal elements evaluate at run time through the
            // global frame; scalar literals bind nothing.
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary { operand, .. } => {
                self.resolve_expr(operand);
            }

            Expr::Logical { left, right, .. }
            | Expr::Relation { left, right, .. }
            | Expr::Factor { left, right, .. }
            | Expr::Term { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Reference {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::FunctionLiteral { params, body } => {
                self.begin_scope();
                for param in params {
                    self.declare(param);
                    self.define(param);
                }
                for stmt in body {
                    self.resolve_stmt(stmt);
                }
                self.end_scope();
            }

            Expr::Variable { id, name } => {
                // Cannot read a name in its own initializer.
                if let Some(scope) = self.scopes.last() {
                    if scope.get(name.lexeme) == Some(&false) {
                        self.reporter.report(RillError::resolve(
                            name.line,
                            "Cannot read local variable in its own initializer.",
                        ));
                    }
                }

                self.resolve_local(*id, name);
            }

            Expr::ArrayElement { index, .. } => {
                self.resolve_expr(index);
            }

            Expr::Read { .. } => {}
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token<'a>) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(name.lexeme) {
                self.reporter.report(RillError::resolve(
                    name.line,
                    "Variable with this name already declared in this scope.",
                ));
            }

            scope.insert(name.lexeme, false);
        }
    }

    fn define(&mut self, name: &Token<'a>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme, true);
        }
    }

    /// Record this variable occurrence as either a local at depth `d` or,
    /// when no scope declares the name, a global (no entry).
    fn resolve_local(&mut self, id: NodeId, name: &Token<'a>) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);

                self.locals.note(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}

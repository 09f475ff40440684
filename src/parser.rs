/*!
Recursive-descent parser for Rill.

Grammar (EBNF — condensed)
--------------------------

```
program        → statement* EOF ;
statement      → varDecl | forStmt | ifStmt | printStmt | returnStmt
               | whileStmt | loopStmt | assignOrRef ;
varDecl        → "var" decl ( "," decl )* ";" ;
decl           → IDENT ( ":=" ( array | expression ) )? ;
forStmt        → "for" varDeclBody assignOrRef expression body "end" ";" ;
ifStmt         → "if" expression "then" body ( "else" statement )? "end" ";" ;
whileStmt      → "while" expression body "end" ";" ;
loopStmt       → "loop" body "end" ";" ;
printStmt      → "print" expression ";" ;
returnStmt     → "return" expression? ";" ;
assignOrRef    → reference ( ":=" ( array | expression ) )? ";" ;
body           → statement*            // until "end" | "else" | EOF
expression     → relation ( ( "or" | "xor" | "and" ) relation )* ;
relation       → factor ( ( "<" | "<=" | ">" | ">=" | "=" | "/=" ) factor )? ;
factor         → term ( ( "+" | "-" ) term )* ;
term           → unary ( ( "*" | "/" ) unary )* ;
unary          → reference ( "is" typeTag )?
               | ( "+" | "-" | "not" ) primary
               | primary ( "is" typeTag )? ;
reference      → IDENT "[" expression "]"
               | IDENT ( "(" arguments? ")" )* ( "." )? ;
typeTag        → "int" | "real" | "bool" | "string" | "empty"
               | "[" "]" | "{" "}" | "func" ;
primary        → NUMBER | STRING | "true" | "false" | IDENT
               | funcLiteral | readExpr | "(" expression ")" | array ;
funcLiteral    → "func" "(" parameters ")" ( "is" body "end" | "=>" statement ) ;
array          → "[" expression ( "," expression )* "]" ;
readExpr       → "readInt" | "readReal" | "readString" ;
```

Notes pinned by the grammar:
- The relational rule is non-associative: at most one relational operator per
  expression.
- All three logical keywords sit on one precedence level, left-associative.
- Indexing applies to bare identifiers only and terminates the chain; call
  suffixes compose (`f(1)(2)`).
- `.` after a reference is consumed but materializes no node (reserved
  surface); in statement position this surfaces as a syntax error.
- A `for` header never carries the `var` keyword: the lexer's range desugar
  already shaped `for i := lo..hi` into declaration + increment + condition.

Error policy: a malformed statement is reported through the [`Reporter`],
`synchronize` discards tokens up to the next statement boundary, and the
failed slot is omitted from the output so one bad statement never hides the
rest of the program.
*/

use crate::error::{Reporter, Result, RillError};
use crate::token::{Token, TokenType};

use log::{debug, info};

/// Identity of a resolvable AST node.
///
/// The parser hands out one `NodeId` per `Variable`, `ArrayElement`, and
/// `Read` occurrence.  The resolver keys its distance map, and the
/// interpreter its read-memoization state, on this identity rather than on
/// names, so two occurrences of the same name never alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Declared type tags usable on the right of `is`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeIndicator {
    Int,
    Real,
    Bool,
    Str,
    Empty,
    Array,
    Tuple,
    Func,
}

impl std::fmt::Display for TypeIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TypeIndicator::Int => "int",
            TypeIndicator::Real => "real",
            TypeIndicator::Bool => "bool",
            TypeIndicator::Str => "string",
            TypeIndicator::Empty => "empty",
            TypeIndicator::Array => "[]",
            TypeIndicator::Tuple => "{}",
            TypeIndicator::Func => "func",
        };

        write!(f, "{}", name)
    }
}

/// A **literal constant** that appears directly in the source code.
///
/// Scalar variants carry their decoded value; `Array` keeps its *element
/// expressions*, which the interpreter evaluates eagerly each time the
/// literal itself is evaluated (never at parse time).
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue<'a> {
    /// Numeric literal — stored as IEEE-754 `f64`.
    /// Integral lexemes such as `"3"` are still parsed as `3.0`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    /// The boolean constants `true` / `false`.
    Bool(bool),

    /// Array literal: a non-empty, ordered list of element expressions.
    Array(Vec<Expr<'a>>),
}

/// **Abstract-syntax-tree node** representing every kind of *expression*
/// in Rill.  Lifetime `'a` ties nodes that contain token references back
/// to the borrowed token slice held by the [`Parser`].
#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'a> {
    /// `or` / `xor` / `and` — both operands always evaluate (no
    /// short-circuit).
    Logical {
        left: Box<Expr<'a>>,
        operator: &'a Token<'a>,
        right: Box<Expr<'a>>,
    },

    /// Single relational operator: `< <= > >= = /=`.
    Relation {
        left: Box<Expr<'a>>,
        operator: &'a Token<'a>,
        right: Box<Expr<'a>>,
    },

    /// Additive operator `+` / `-` (left-associative).
    Factor {
        left: Box<Expr<'a>>,
        operator: &'a Token<'a>,
        right: Box<Expr<'a>>,
    },

    /// Multiplicative operator `*` / `/` (left-associative).
    Term {
        left: Box<Expr<'a>>,
        operator: &'a Token<'a>,
        right: Box<Expr<'a>>,
    },

    /// Covers plain pass-through, prefix `+`/`-`/`not`, and `is <Type>`
    /// checks.  `operator` is absent for the pass-through form; `type_tag`
    /// is present exactly when `operator` is the `is` keyword.
    Unary {
        operand: Box<Expr<'a>>,
        operator: Option<&'a Token<'a>>,
        type_tag: Option<TypeIndicator>,
    },

    /// Call suffix in a reference chain.
    /// *Example:* `f(1)` or `makeAdder(2)(3)`
    Reference {
        /// Expression that evaluates to a callable.
        callee: Box<Expr<'a>>,
        /// The `(` token — retained for error reporting.
        paren: &'a Token<'a>,
        /// Argument list (may be empty).
        arguments: Vec<Expr<'a>>,
    },

    /// Parenthesised sub-expression: `"(" expression ")"`.
    Grouping(Box<Expr<'a>>),

    /// A literal constant: number, string, boolean, or array literal.
    Literal(LiteralValue<'a>),

    /// First-class function literal: `func (p, …) is … end` or
    /// `func (p, …) => stmt`.
    FunctionLiteral {
        /// Parameter name tokens (never empty).
        params: Vec<&'a Token<'a>>,

        /// Body executed when the function is called.
        body: Vec<Stmt<'a>>,
    },

    /// Variable access — resolves through the distance map at runtime.
    Variable {
        id: NodeId,
        name: &'a Token<'a>,
    },

    /// 1-based element access on a named array: `a[i]`.
    ArrayElement {
        id: NodeId,
        name: &'a Token<'a>,
        index: Box<Expr<'a>>,
    },

    /// Typed console read (`readInt` / `readReal` / `readString`).  The
    /// consumed value is memoized against this node's identity: one prompt
    /// per syntactic occurrence, ever.
    Read {
        id: NodeId,
        source: &'a Token<'a>,
    },
}

/// One `name [:= initializer]` inside a `var` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl<'a> {
    pub name: &'a Token<'a>,
    pub initializer: Option<Expr<'a>>,
}

/// **Abstract-syntax-tree node** for *statements*.  A program is a sequence
/// of these nodes returned by [`Parser::parse`].
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt<'a> {
    /// A lexical block — the sole scope-introducing construct besides
    /// function bodies.  `loop … end;` and every control-flow body parse to
    /// this.
    Body(Vec<Stmt<'a>>),

    /// `target := value ;` where target is a variable or array element.
    Assignment {
        target: Expr<'a>,
        value: Expr<'a>,
    },

    /// `if expr then body (else stmt)? end ;`
    If {
        condition: Expr<'a>,
        then_branch: Box<Stmt<'a>>,
        else_branch: Option<Box<Stmt<'a>>>,
    },

    /// `print expr ;`
    Print(Expr<'a>),

    /// `return [expr] ;` — unwinds to the nearest call boundary.
    Return {
        /// The `return` keyword token (for runtime error locations).
        keyword: &'a Token<'a>,
        value: Option<Expr<'a>>,
    },

    /// `var name [:= expr] (, name…)? ;`
    Var {
        declarations: Vec<VarDecl<'a>>,
    },

    /// `while expr body end ;`
    While {
        condition: Expr<'a>,
        body: Box<Stmt<'a>>,
    },

    /// Expression-statement: a bare reference such as `f(5);`.
    Reference(Expr<'a>),
}

/// Top-level parser over an immutable slice of tokens.
pub struct Parser<'a> {
    tokens: &'a [Token<'a>],
    current: usize,
    next_id: usize,
}

impl<'a> Parser<'a> {
    /// Construct a new parser.
    pub fn new(tokens: &'a [Token<'a>]) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        Self {
            tokens,
            current: 0,
            next_id: 0,
        }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program and return its statement list.
    ///
    /// Syntax errors land in `reporter`; the offending statement is dropped
    /// and parsing resumes at the next statement boundary.
    pub fn parse(&mut self, reporter: &mut Reporter) -> Vec<Stmt<'a>> {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt<'a>> = Vec::new();

        while !self.is_at_end() {
            match self.statement() {
                Ok(stmt) => statements.push(stmt),
                Err(e) => {
                    reporter.report(e);
                    self.synchronize();
                }
            }
        }

        statements
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<Stmt<'a>> {
        debug!("Entering statement");

        if self.matches(TokenType::VAR) {
            self.var_declaration()
        } else if self.matches(TokenType::FOR) {
            self.for_statement()
        } else if self.matches(TokenType::IF) {
            self.if_statement()
        } else if self.matches(TokenType::PRINT) {
            self.print_statement()
        } else if self.matches(TokenType::RETURN) {
            self.return_statement()
        } else if self.matches(TokenType::WHILE) {
            self.while_statement()
        } else if self.matches(TokenType::LOOP) {
            self.loop_statement()
        } else {
            self.assignment()
        }
    }

    fn var_declaration(&mut self) -> Result<Stmt<'a>> {
        let mut declarations: Vec<VarDecl<'a>> = Vec::new();

        loop {
            let name: &Token<'_> = self.consume(TokenType::IDENTIFIER, "Expect variable name.")?;

            let initializer: Option<Expr<'a>> = if self.matches(TokenType::ASSIGN) {
                if self.matches(TokenType::LEFT_BRACKET) {
                    Some(self.array()?)
                } else {
                    Some(self.expression()?)
                }
            } else {
                None
            };

            declarations.push(VarDecl { name, initializer });

            if !self.matches(TokenType::COMMA) {
                break;
            }
        }

        self.consume_terminator("Expected ';' at the end of variable declaration.")?;

        Ok(Stmt::Var { declarations })
    }

    /// `for` headers arrive pre-shaped by the lexer's range desugar:
    /// declaration, increment assignment, terminal condition, body.  The
    /// whole construct lowers to
    /// `Body[ initializer, While(cond, Body[ body…, increment ]) ]`.
    fn for_statement(&mut self) -> Result<Stmt<'a>> {
        let initializer: Stmt<'a> = self.var_declaration()?;

        if let Stmt::Var { declarations } = &initializer {
            if declarations.len() != 1 {
                return Err(RillError::parse(
                    self.peek().line,
                    "Wrong number of declarations in a loop header.",
                ));
            }
        }

        let increment: Stmt<'a> = self.assignment()?;
        let condition: Expr<'a> = self.expression()?;

        let mut loop_body: Vec<Stmt<'a>> = self.body()?;
        loop_body.push(increment);

        let body = Stmt::While {
            condition,
            body: Box::new(Stmt::Body(loop_body)),
        };

        self.consume(TokenType::END, "Expected 'end' in the end of for.")?;
        self.consume(TokenType::SEMICOLON, "Expect ';' after loop end.")?;

        Ok(Stmt::Body(vec![initializer, body]))
    }

    fn if_statement(&mut self) -> Result<Stmt<'a>> {
        let condition: Expr<'a> = self.expression()?;
        self.consume(TokenType::THEN, "Expect 'then' after if condition.")?;

        let then_branch: Box<Stmt<'a>> = Box::new(Stmt::Body(self.body()?));
        let else_branch: Option<Box<Stmt<'a>>> = if self.matches(TokenType::ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        self.consume(TokenType::END, "Expect 'end' after if branches.")?;
        self.consume(TokenType::SEMICOLON, "Expect ';' after if end.")?;

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn print_statement(&mut self) -> Result<Stmt<'a>> {
        let value: Expr<'a> = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expect ';' after value.")?;

        Ok(Stmt::Print(value))
    }

    fn return_statement(&mut self) -> Result<Stmt<'a>> {
        let keyword: &Token<'_> = self.previous();
        let value: Option<Expr<'a>> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expect ';' after return value.")?;

        Ok(Stmt::Return { keyword, value })
    }

    fn while_statement(&mut self) -> Result<Stmt<'a>> {
        let condition: Expr<'a> = self.expression()?;
        let body: Box<Stmt<'a>> = Box::new(Stmt::Body(self.body()?));

        self.consume(TokenType::END, "Expected 'end' in the end of while.")?;
        self.consume(TokenType::SEMICOLON, "Expect ';' after while end.")?;

        Ok(Stmt::While { condition, body })
    }

    /// `loop body end ;` — a body with no looping, executed once as a block.
    fn loop_statement(&mut self) -> Result<Stmt<'a>> {
        let statements: Vec<Stmt<'a>> = self.body()?;

        self.consume(TokenType::END, "Expected 'end' in the end of loop.")?;
        self.consume(TokenType::SEMICOLON, "Expect ';' after loop end.")?;

        Ok(Stmt::Body(statements))
    }

    /// Statements of a block: everything up to `end`, `else`, or EOF.
    fn body(&mut self) -> Result<Vec<Stmt<'a>>> {
        let mut statements: Vec<Stmt<'a>> = Vec::new();

        while !self.check(TokenType::END) && !self.check(TokenType::ELSE) && !self.is_at_end() {
            statements.push(self.statement()?);
        }

        Ok(statements)
    }

    /// `ref := value ;` or a bare `ref ;`.
    fn assignment(&mut self) -> Result<Stmt<'a>> {
        let target: Expr<'a> = match self.reference(None)? {
            Some(expr) => expr,
            None => {
                return Err(RillError::parse(
                    self.peek().line,
                    "Invalid assignment target.",
                ));
            }
        };

        if self.matches(TokenType::ASSIGN) {
            if !matches!(target, Expr::Variable { .. } | Expr::ArrayElement { .. }) {
                return Err(RillError::parse(
                    self.previous().line,
                    "Invalid assignment target.",
                ));
            }

            let value: Expr<'a> = if self.matches(TokenType::LEFT_BRACKET) {
                self.array()?
            } else {
                self.expression()?
            };

            self.consume_terminator("Expected ';' after assignment.")?;

            Ok(Stmt::Assignment { target, value })
        } else {
            self.consume(TokenType::SEMICOLON, "Expected ';' after reference.")?;

            Ok(Stmt::Reference(target))
        }
    }

    // ───────────────────────── expression rules ───────────────────

    fn expression(&mut self) -> Result<Expr<'a>> {
        let mut expr: Expr<'a> = self.relation()?;

        while self.matches(TokenType::OR)
            || self.matches(TokenType::XOR)
            || self.matches(TokenType::AND)
        {
            let operator: &Token<'_> = self.previous();
            let right: Expr<'a> = self.relation()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// Non-associative: at most one relational operator per expression.
    fn relation(&mut self) -> Result<Expr<'a>> {
        let expr: Expr<'a> = self.factor()?;

        if self.matches(TokenType::LESS)
            || self.matches(TokenType::LESS_EQUAL)
            || self.matches(TokenType::GREATER)
            || self.matches(TokenType::GREATER_EQUAL)
            || self.matches(TokenType::EQUAL)
            || self.matches(TokenType::NOT_EQUAL)
        {
            let operator: &Token<'_> = self.previous();
            let right: Expr<'a> = self.factor()?;

            return Ok(Expr::Relation {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            });
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr<'a>> {
        let mut expr: Expr<'a> = self.term()?;

        while self.matches(TokenType::PLUS) || self.matches(TokenType::MINUS) {
            let operator: &Token<'_> = self.previous();
            let right: Expr<'a> = self.term()?;

            expr = Expr::Factor {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr<'a>> {
        let mut expr: Expr<'a> = self.unary()?;

        while self.matches(TokenType::STAR) || self.matches(TokenType::SLASH) {
            let operator: &Token<'_> = self.previous();
            let right: Expr<'a> = self.unary()?;

            expr = Expr::Term {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr<'a>> {
        if let Some(reference) = self.reference(None)? {
            return self.finish_unary(reference);
        }

        if self.matches(TokenType::PLUS)
            || self.matches(TokenType::MINUS)
            || self.matches(TokenType::NOT)
        {
            let operator: &Token<'_> = self.previous();
            let right: Expr<'a> = self.primary()?;

            return Ok(Expr::Unary {
                operand: Box::new(right),
                operator: Some(operator),
                type_tag: None,
            });
        }

        let right: Expr<'a> = self.primary()?;
        self.finish_unary(right)
    }

    /// Wrap an operand, attaching an `is <Type>` check when one follows.
    fn finish_unary(&mut self, operand: Expr<'a>) -> Result<Expr<'a>> {
        if self.matches(TokenType::IS) {
            let operator: &Token<'_> = self.previous();
            let type_tag: TypeIndicator = self.type_indicator()?;

            return Ok(Expr::Unary {
                operand: Box::new(operand),
                operator: Some(operator),
                type_tag: Some(type_tag),
            });
        }

        Ok(Expr::Unary {
            operand: Box::new(operand),
            operator: None,
            type_tag: None,
        })
    }

    fn type_indicator(&mut self) -> Result<TypeIndicator> {
        if self.matches(TokenType::INT) {
            return Ok(TypeIndicator::Int);
        }
        if self.matches(TokenType::REAL) {
            return Ok(TypeIndicator::Real);
        }
        if self.matches(TokenType::STRING) {
            return Ok(TypeIndicator::Str);
        }
        if self.matches(TokenType::BOOL) {
            return Ok(TypeIndicator::Bool);
        }
        if self.matches(TokenType::EMPTY) {
            return Ok(TypeIndicator::Empty);
        }
        if self.matches(TokenType::LEFT_BRACKET) {
            self.consume(TokenType::RIGHT_BRACKET, "Expected ']'.")?;
            return Ok(TypeIndicator::Array);
        }
        if self.matches(TokenType::LEFT_BRACE) {
            self.consume(TokenType::RIGHT_BRACE, "Expected '}'.")?;
            return Ok(TypeIndicator::Tuple);
        }
        if self.matches(TokenType::FUNC) {
            return Ok(TypeIndicator::Func);
        }

        Err(RillError::parse(self.peek().line, "Unknown type indicator."))
    }

    /// Parse a reference chain, or `None` when the stream does not start one.
    ///
    /// `base` is the chain built so far (`None` for the leading identifier).
    /// Returns `Ok(None)` without consuming anything when the next token is
    /// not an identifier, and after a reserved `.` suffix (consumed, no
    /// node).
    fn reference(&mut self, base: Option<Expr<'a>>) -> Result<Option<Expr<'a>>> {
        let seed: Expr<'a> = match base {
            Some(expr) => expr,
            None => {
                if !self.matches(TokenType::IDENTIFIER) {
                    return Ok(None);
                }

                let name: &Token<'_> = self.previous();

                // Indexing applies to the bare identifier only and
                // terminates the chain.
                if self.matches(TokenType::LEFT_BRACKET) {
                    let index: Expr<'a> = self.expression()?;
                    self.consume(TokenType::RIGHT_BRACKET, "Expected ']' after index.")?;

                    return Ok(Some(Expr::ArrayElement {
                        id: self.node_id(),
                        name,
                        index: Box::new(index),
                    }));
                }

                Expr::Variable {
                    id: self.node_id(),
                    name,
                }
            }
        };

        // Reserved surface: field access is consumed but yields no node.
        if self.matches(TokenType::DOT) {
            debug!("Reserved '.' suffix consumed at line {}", self.previous().line);

            return Ok(None);
        }

        if self.matches(TokenType::LEFT_PAREN) {
            let paren: &Token<'_> = self.previous();

            let mut arguments: Vec<Expr<'a>> = Vec::new();
            if !self.check(TokenType::RIGHT_PAREN) {
                loop {
                    arguments.push(self.expression()?);

                    if !self.matches(TokenType::COMMA) {
                        break;
                    }
                }
            }

            self.consume(TokenType::RIGHT_PAREN, "Expected ')' after arguments.")?;

            return self.reference(Some(Expr::Reference {
                callee: Box::new(seed),
                paren,
                arguments,
            }));
        }

        Ok(Some(seed))
    }

    fn primary(&mut self) -> Result<Expr<'a>> {
        if self.matches(TokenType::TRUE) {
            return Ok(Expr::Literal(LiteralValue::Bool(true)));
        }
        if self.matches(TokenType::FALSE) {
            return Ok(Expr::Literal(LiteralValue::Bool(false)));
        }

        if self.matches(TokenType::NUMBER(0.0)) {
            if let TokenType::NUMBER(n) = &self.previous().token_type {
                return Ok(Expr::Literal(LiteralValue::Number(*n)));
            }
        }

        if let TokenType::STRING_LITERAL(ref s) = self.peek().token_type {
            self.advance();
            return Ok(Expr::Literal(LiteralValue::Str(s.clone())));
        }

        if self.matches(TokenType::IDENTIFIER) {
            return Ok(Expr::Variable {
                id: self.node_id(),
                name: self.previous(),
            });
        }

        if self.matches(TokenType::FUNC) {
            return self.function_literal();
        }

        if self.matches(TokenType::READ_INT)
            || self.matches(TokenType::READ_REAL)
            || self.matches(TokenType::READ_STRING)
        {
            return Ok(Expr::Read {
                id: self.node_id(),
                source: self.previous(),
            });
        }

        if self.matches(TokenType::LEFT_PAREN) {
            let expr: Expr<'a> = self.expression()?;

            self.consume(TokenType::RIGHT_PAREN, "Expect ')' after expression.")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        if self.matches(TokenType::LEFT_BRACKET) {
            return self.array();
        }

        Err(RillError::parse(self.peek().line, "Expected expression."))
    }

    /// `[ expr (, expr)* ]` — the opening bracket is already consumed.
    /// An empty list is a syntax error.
    fn array(&mut self) -> Result<Expr<'a>> {
        let mut values: Vec<Expr<'a>> = Vec::new();

        loop {
            values.push(self.expression()?);

            if !self.matches(TokenType::COMMA) {
                break;
            }
        }

        self.consume(
            TokenType::RIGHT_BRACKET,
            "Expected ']' at the end of array.",
        )?;

        Ok(Expr::Literal(LiteralValue::Array(values)))
    }

    /// `func (p, …) is body end` or `func (p, …) => stmt`.  The parameter
    /// list is mandatory and non-empty.
    fn function_literal(&mut self) -> Result<Expr<'a>> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'func'.")?;

        let mut params: Vec<&'a Token<'a>> = Vec::new();
        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                params.push(self.consume(TokenType::IDENTIFIER, "Expected parameter name.")?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after parameters.")?;

        if params.is_empty() {
            return Err(RillError::parse(
                self.peek().line,
                "Expected at least one parameter.",
            ));
        }

        if self.matches(TokenType::IS) {
            let body: Vec<Stmt<'a>> = self.body()?;
            self.consume(TokenType::END, "Expected 'end' after function body.")?;

            return Ok(Expr::FunctionLiteral { params, body });
        }

        if self.matches(TokenType::LAMBDA) {
            let stmt: Stmt<'a> = self.statement()?;

            return Ok(Expr::FunctionLiteral {
                params,
                body: vec![stmt],
            });
        }

        Err(RillError::parse(
            self.peek().line,
            "Expected 'is' or '=>' after parameters.",
        ))
    }

    // ────────────────────── utility helpers ───────────────────────

    fn node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Consume the `;` closing a declaration or assignment.  A
    /// single-statement lambda body (`func (n) => print n;`) has already
    /// consumed its own terminator; that semicolon also closes the enclosing
    /// statement.
    fn consume_terminator(&mut self, message: &str) -> Result<()> {
        if self.current > 0
            && matches!(self.previous().token_type, TokenType::SEMICOLON)
            && !self.check(TokenType::SEMICOLON)
        {
            return Ok(());
        }

        self.consume(TokenType::SEMICOLON, message)?;

        Ok(())
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<&'a Token<'a>> {
        if self.check(ttype) {
            return Ok(self.advance());
        }

        Err(RillError::parse(self.peek().line, message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    #[inline(always)]
    fn advance(&mut self) -> &'a Token<'a> {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    #[inline(always)]
    fn peek(&self) -> &'a Token<'a> {
        &self.tokens[self.current]
    }

    #[inline(always)]
    fn previous(&self) -> &'a Token<'a> {
        &self.tokens[self.current - 1]
    }

    /// Discards tokens until it thinks it is at a statement boundary.
    fn synchronize(&mut self) {
        self.advance(); // skip the token that caused the error

        while !self.is_at_end() {
            if matches!(self.previous().token_type, TokenType::SEMICOLON) {
                return;
            }

            match self.peek().token_type {
                TokenType::VAR
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::PRINT
                | TokenType::RETURN => return,
                _ => {}
            }

            self.advance();
        }
    }
}

//! Tree-walking evaluator for the **Rill** interpreter.
//!
//! Walks the parsed statement sequence, consuming the resolver's distance
//! map, executing statements for effect and evaluating expressions for
//! value.  Owns the live [`Environment`] chain and all runtime values.
//!
//! Invariants the walker maintains:
//! - The current-environment pointer is pushed around every block and call
//!   and restored on *every* exit path, early `return` and propagated error
//!   included.
//! - `return` unwinds through the explicit [`Flow`] control value, never
//!   through the error channel, so the call boundary pattern-matches and
//!   unwinds deterministically.
//! - A call frame chains to the environment active at the **call site**, not
//!   at the literal's definition site.
//! - Statements execute in source order; operands evaluate left-to-right
//!   everywhere order is observable (side-effecting reads, call arguments).
//!
//! The first runtime error aborts interpretation of the whole program; the
//! static passes have their own accumulate-and-continue channel.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::environment::Environment;
use crate::error::{Result, RillError};
use crate::parser::{Expr, LiteralValue, NodeId, Stmt, TypeIndicator};
use crate::resolver::Locals;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Result of executing one statement: fall through to the next, or unwind
/// to the nearest enclosing call boundary carrying the `return` value.
#[derive(Debug)]
pub enum Flow<'a> {
    Normal,
    Return { value: Value<'a>, line: usize },
}

/// The evaluator.  All interpretation state is owned here — two
/// interpreters never share environments, memoized reads, or I/O, so
/// independent runs cannot contaminate each other.
pub struct Interpreter<'a> {
    globals: Rc<RefCell<Environment<'a>>>,
    environment: Rc<RefCell<Environment<'a>>>,
    locals: Locals,

    /// Memoized `read*` results, keyed by the node's identity: one prompt
    /// per syntactic occurrence, ever.
    read_cache: HashMap<NodeId, Value<'a>>,

    input: Box<dyn BufRead + 'a>,
    output: Box<dyn Write + 'a>,
    pending_input: VecDeque<String>,
}

impl<'a> Interpreter<'a> {
    /// Interpreter wired to the process console.
    pub fn new(locals: Locals) -> Self {
        Self::with_io(
            locals,
            io::BufReader::new(io::stdin()),
            io::stdout(),
        )
    }

    /// Interpreter with injected console streams (tests drive the full
    /// pipeline hermetically through this).
    pub fn with_io(
        locals: Locals,
        input: impl BufRead + 'a,
        output: impl Write + 'a,
    ) -> Self {
        info!("Initializing interpreter ({} resolved locals)", locals.len());

        let globals = Rc::new(RefCell::new(Environment::new()));

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals,
            read_cache: HashMap::new(),
            input: Box::new(input),
            output: Box::new(output),
            pending_input: VecDeque::new(),
        }
    }

    /// Interprets a list of statements (a "program").
    pub fn interpret(&mut self, statements: &'a [Stmt<'a>]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            if let Flow::Return { line, .. } = self.execute(stmt)? {
                return Err(RillError::runtime(line, "'return' outside of any call."));
            }
        }

        info!("Interpretation completed successfully");

        Ok(())
    }

    // ───────────────────────── statements ─────────────────────────

    fn execute(&mut self, stmt: &'a Stmt<'a>) -> Result<Flow<'a>> {
        match stmt {
            Stmt::Body(statements) => {
                debug!("Entering block with {} statements", statements.len());

                let frame = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &self.environment,
                ))));

                self.execute_body(statements, frame)
            }

            Stmt::Assignment { target, value } => {
                self.execute_assignment(target, value)?;

                Ok(Flow::Normal)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let cond = self.evaluate(condition)?;

                if is_truthy(&cond) {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;

                writeln!(self.output, "{}", value)?;

                Ok(Flow::Normal)
            }

            Stmt::Return { keyword, value } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Empty,
                };

                debug!("Returning value: {}", value);

                Ok(Flow::Return {
                    value,
                    line: keyword.line,
                })
            }

            Stmt::Var { declarations } => {
                // The running value carries into later uninitialized names
                // in the same declaration group.
                let mut value = Value::Empty;

                for decl in declarations {
                    if let Some(expr) = &decl.initializer {
                        value = self.evaluate(expr)?;
                    }

                    debug!("Defining variable '{}' = {}", decl.name.lexeme, value);

                    self.environment
                        .borrow_mut()
                        .define(decl.name.lexeme, value.clone());
                }

                Ok(Flow::Normal)
            }

            Stmt::While { condition, body } => {
                loop {
                    let cond = self.evaluate(condition)?;

                    if !is_truthy(&cond) {
                        break;
                    }

                    if let flow @ Flow::Return { .. } = self.execute(body)? {
                        return Ok(flow);
                    }
                }

                Ok(Flow::Normal)
            }

            Stmt::Reference(expr) => {
                self.evaluate(expr)?;

                Ok(Flow::Normal)
            }
        }
    }

    /// Run `statements` inside `frame`, restoring the previous environment
    /// on every exit path.
    fn execute_body(
        &mut self,
        statements: &'a [Stmt<'a>],
        frame: Rc<RefCell<Environment<'a>>>,
    ) -> Result<Flow<'a>> {
        let previous = std::mem::replace(&mut self.environment, frame);
        let result = self.run_sequence(statements);
        self.environment = previous;

        result
    }

    fn run_sequence(&mut self, statements: &'a [Stmt<'a>]) -> Result<Flow<'a>> {
        for stmt in statements {
            match self.execute(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }

        Ok(Flow::Normal)
    }

    /// `target := value` for both storage shapes.  Array element stores go
    /// through a cloned copy of the sequence, so backing storage is never
    /// aliased across variables.
    fn execute_assignment(&mut self, target: &'a Expr<'a>, value: &'a Expr<'a>) -> Result<()> {
        let value = self.evaluate(value)?;

        match target {
            Expr::Variable { id, name } => match self.locals.depth(*id) {
                Some(distance) => {
                    Environment::assign_at(&self.environment, distance, name.lexeme, value);
                    Ok(())
                }
                None => self.globals.borrow_mut().assign(name.lexeme, value, name.line),
            },

            Expr::ArrayElement { id, name, index } => {
                let idx = self.index_value(name, index)?;

                match self.locals.depth(*id) {
                    Some(distance) => {
                        let current =
                            Environment::get_at(&self.environment, distance, name.lexeme, name.line)?;
                        let updated = store_element(name, current, idx, value)?;
                        Environment::assign_at(&self.environment, distance, name.lexeme, updated);
                        Ok(())
                    }
                    None => {
                        let current = self.globals.borrow().get(name.lexeme, name.line)?;
                        let updated = store_element(name, current, idx, value)?;
                        self.globals.borrow_mut().assign(name.lexeme, updated, name.line)
                    }
                }
            }

            // The parser rejects every other target shape.
            _ => Err(RillError::runtime(0, "Invalid assignment target.")),
        }
    }

    // ───────────────────────── expressions ────────────────────────

    pub fn evaluate(&mut self, expr: &'a Expr<'a>) -> Result<Value<'a>> {
        match expr {
            Expr::Literal(lit) => self.evaluate_literal(lit),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Logical {
                left,
                operator,
                right,
            } => self.evaluate_logical(left, operator, right),

            Expr::Relation {
                left,
                operator,
                right,
            } => self.evaluate_relation(left, operator, right),

            Expr::Factor {
                left,
                operator,
                right,
            } => self.evaluate_factor(left, operator, right),

            Expr::Term {
                left,
                operator,
                right,
            } => self.evaluate_term(left, operator, right),

            Expr::Unary {
                operand,
                operator,
                type_tag,
            } => self.evaluate_unary(operand, *operator, *type_tag),

            Expr::Reference {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments),

            Expr::FunctionLiteral { params, body } => Ok(Value::Function {
                params: params.as_slice(),
                body: body.as_slice(),
            }),

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::ArrayElement { id, name, index } => self.look_up_element(*id, name, index),

            Expr::Read { id, source } => self.evaluate_read(*id, source),
        }
    }

    /// Array literals evaluate each element eagerly into a fresh sequence,
    /// at evaluation time — never at parse time.
    fn evaluate_literal(&mut self, literal: &'a LiteralValue<'a>) -> Result<Value<'a>> {
        match literal {
            LiteralValue::Number(n) => Ok(Value::Number(*n)),
            LiteralValue::Str(s) => Ok(Value::Str(s.clone())),
            LiteralValue::Bool(b) => Ok(Value::Bool(*b)),
            LiteralValue::Array(elements) => {
                let mut values = Vec::with_capacity(elements.len());

                for element in elements {
                    values.push(self.evaluate(element)?);
                }

                Ok(Value::Array(values))
            }
        }
    }

    /// `or` / `xor` / `and`: both operands are fully evaluated before
    /// combination — no short-circuit.
    fn evaluate_logical(
        &mut self,
        left: &'a Expr<'a>,
        operator: &'a Token<'a>,
        right: &'a Expr<'a>,
    ) -> Result<Value<'a>> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        let (l, r) = (is_truthy(&left), is_truthy(&right));

        let result = match operator.token_type {
            TokenType::OR => l || r,
            TokenType::AND => l && r,
            TokenType::XOR => l ^ r,
            _ => {
                return Err(RillError::runtime(
                    operator.line,
                    "Invalid logical operator.",
                ));
            }
        };

        Ok(Value::Bool(result))
    }

    fn evaluate_relation(
        &mut self,
        left: &'a Expr<'a>,
        operator: &'a Token<'a>,
        right: &'a Expr<'a>,
    ) -> Result<Value<'a>> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        match operator.token_type {
            TokenType::EQUAL => Ok(Value::Bool(is_equal(&left, &right))),
            TokenType::NOT_EQUAL => Ok(Value::Bool(!is_equal(&left, &right))),

            TokenType::GREATER => {
                let (a, b) = check_number_operands(operator, &left, &right)?;
                Ok(Value::Bool(a > b))
            }
            TokenType::GREATER_EQUAL => {
                let (a, b) = check_number_operands(operator, &left, &right)?;
                Ok(Value::Bool(a >= b))
            }
            TokenType::LESS => {
                let (a, b) = check_number_operands(operator, &left, &right)?;
                Ok(Value::Bool(a < b))
            }
            TokenType::LESS_EQUAL => {
                let (a, b) = check_number_operands(operator, &left, &right)?;
                Ok(Value::Bool(a <= b))
            }

            _ => Err(RillError::runtime(
                operator.line,
                "Invalid relational operator.",
            )),
        }
    }

    /// Additive layer: `-` is numeric-only; `+` also concatenates strings
    /// and arrays.
    fn evaluate_factor(
        &mut self,
        left: &'a Expr<'a>,
        operator: &'a Token<'a>,
        right: &'a Expr<'a>,
    ) -> Result<Value<'a>> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => {
                let (a, b) = check_number_operands(operator, &left, &right)?;
                Ok(Value::Number(a - b))
            }

            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
                (Value::Array(mut a), Value::Array(b)) => {
                    a.extend(b);
                    Ok(Value::Array(a))
                }
                _ => Err(RillError::runtime(
                    operator.line,
                    "Operands must be two numbers, two strings, or two arrays.",
                )),
            },

            _ => Err(RillError::runtime(
                operator.line,
                "Invalid additive operator.",
            )),
        }
    }

    /// Multiplicative layer.  Division follows IEEE-754: dividing by zero
    /// yields an infinity, not an error.
    fn evaluate_term(
        &mut self,
        left: &'a Expr<'a>,
        operator: &'a Token<'a>,
        right: &'a Expr<'a>,
    ) -> Result<Value<'a>> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        let (a, b) = check_number_operands(operator, &left, &right)?;

        match operator.token_type {
            TokenType::STAR => Ok(Value::Number(a * b)),
            TokenType::SLASH => Ok(Value::Number(a / b)),
            _ => Err(RillError::runtime(
                operator.line,
                "Invalid multiplicative operator.",
            )),
        }
    }

    fn evaluate_unary(
        &mut self,
        operand: &'a Expr<'a>,
        operator: Option<&'a Token<'a>>,
        type_tag: Option<TypeIndicator>,
    ) -> Result<Value<'a>> {
        let value = self.evaluate(operand)?;

        let Some(op) = operator else {
            // bare pass-through
            return Ok(value);
        };

        if op.token_type == TokenType::IS {
            let Some(tag) = type_tag else {
                return Err(RillError::runtime(op.line, "Missing type indicator."));
            };

            return Ok(Value::Bool(type_matches(&value, tag)));
        }

        match op.token_type {
            TokenType::PLUS => {
                if let Value::Number(_) = value {
                    Ok(value)
                } else {
                    Err(RillError::runtime(op.line, "Operand must be a number."))
                }
            }

            TokenType::MINUS => {
                if let Value::Number(n) = value {
                    Ok(Value::Number(-n))
                } else {
                    Err(RillError::runtime(op.line, "Operand must be a number."))
                }
            }

            TokenType::NOT => {
                if let Value::Bool(b) = value {
                    Ok(Value::Bool(!b))
                } else {
                    Err(RillError::runtime(op.line, "Operand must be a boolean."))
                }
            }

            _ => Ok(value),
        }
    }

    /// Call a function value: arity-checked, arguments evaluated
    /// left-to-right in the caller's environment, parameters bound as fresh
    /// locals in a new frame chained to the environment active *here*, at
    /// the call site.
    fn evaluate_call(
        &mut self,
        callee: &'a Expr<'a>,
        paren: &'a Token<'a>,
        arguments: &'a [Expr<'a>],
    ) -> Result<Value<'a>> {
        let callee = self.evaluate(callee)?;

        match callee {
            Value::Empty => Err(RillError::runtime(paren.line, "Undefined function.")),

            Value::Function { params, body } => {
                if arguments.len() != params.len() {
                    return Err(RillError::runtime(
                        paren.line,
                        format!(
                            "Expected {} arguments but got {}.",
                            params.len(),
                            arguments.len()
                        ),
                    ));
                }

                let mut bound = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    bound.push(self.evaluate(argument)?);
                }

                let frame = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &self.environment,
                ))));

                for (param, value) in params.iter().zip(bound) {
                    debug!("Binding parameter '{}' = {}", param.lexeme, value);

                    frame.borrow_mut().define(param.lexeme, value);
                }

                match self.execute_body(body, frame)? {
                    Flow::Return { value, .. } => Ok(value),
                    Flow::Normal => Ok(Value::Empty),
                }
            }

            _ => Err(RillError::runtime(paren.line, "Object not callable.")),
        }
    }

    fn look_up_variable(&mut self, id: NodeId, name: &'a Token<'a>) -> Result<Value<'a>> {
        match self.locals.depth(id) {
            Some(distance) => {
                Environment::get_at(&self.environment, distance, name.lexeme, name.line)
            }
            None => self.globals.borrow().get(name.lexeme, name.line),
        }
    }

    /// 1-based element read: `a[1]` is the first element.
    fn look_up_element(
        &mut self,
        id: NodeId,
        name: &'a Token<'a>,
        index: &'a Expr<'a>,
    ) -> Result<Value<'a>> {
        let idx = self.index_value(name, index)?;

        let array = match self.locals.depth(id) {
            Some(distance) => {
                Environment::get_at(&self.environment, distance, name.lexeme, name.line)?
            }
            None => self.globals.borrow().get(name.lexeme, name.line)?,
        };

        let Value::Array(elements) = array else {
            return Err(RillError::runtime(
                name.line,
                format!("'{}' is not an array.", name.lexeme),
            ));
        };

        match elements.into_iter().nth(idx - 1) {
            Some(element) => Ok(element),
            None => Err(RillError::runtime(
                name.line,
                format!("Index {} out of range for '{}'.", idx, name.lexeme),
            )),
        }
    }

    /// Evaluate an index expression down to a 1-based position.  Non-numeric
    /// and fractional indices are runtime errors.
    fn index_value(&mut self, name: &'a Token<'a>, index: &'a Expr<'a>) -> Result<usize> {
        let value = self.evaluate(index)?;

        let Value::Number(n) = value else {
            return Err(RillError::runtime(name.line, "Index must be a number."));
        };

        if n.fract() != 0.0 {
            return Err(RillError::runtime(name.line, "Index must be an integer."));
        }

        if n < 1.0 {
            return Err(RillError::runtime(
                name.line,
                format!("Index {} out of range for '{}'.", n, name.lexeme),
            ));
        }

        Ok(n as usize)
    }

    /// Typed console read, memoized against the node's identity.
    fn evaluate_read(&mut self, id: NodeId, source: &'a Token<'a>) -> Result<Value<'a>> {
        if let Some(value) = self.read_cache.get(&id) {
            debug!("Read node satisfied from cache: {}", value);

            return Ok(value.clone());
        }

        let token = self.next_input_token(source)?;

        let value = match source.token_type {
            TokenType::READ_INT | TokenType::READ_REAL => {
                let n: f64 = token.parse().map_err(|_| {
                    RillError::runtime(
                        source.line,
                        format!("{} input mismatch.", source.lexeme),
                    )
                })?;

                Value::Number(n)
            }

            TokenType::READ_STRING => Value::Str(token),

            _ => {
                return Err(RillError::runtime(source.line, "Invalid read expression."));
            }
        };

        self.read_cache.insert(id, value.clone());

        Ok(value)
    }

    /// Block for the next whitespace-delimited input token.
    fn next_input_token(&mut self, source: &Token<'_>) -> Result<String> {
        loop {
            if let Some(token) = self.pending_input.pop_front() {
                return Ok(token);
            }

            let mut line = String::new();
            let read = self.input.read_line(&mut line)?;

            if read == 0 {
                return Err(RillError::runtime(
                    source.line,
                    format!("{}: unexpected end of input.", source.lexeme),
                ));
            }

            self.pending_input
                .extend(line.split_whitespace().map(str::to_owned));
        }
    }
}

// ───────────────────────── value helpers ──────────────────────────

/// Replace one element of a sequence read from a storage location.  The
/// caller re-stores the returned copy, so no aliasing survives the write.
fn store_element<'a>(
    name: &Token<'_>,
    current: Value<'a>,
    idx: usize,
    value: Value<'a>,
) -> Result<Value<'a>> {
    let Value::Array(mut elements) = current else {
        return Err(RillError::runtime(
            name.line,
            format!("'{}' is not an array.", name.lexeme),
        ));
    };

    if idx > elements.len() {
        return Err(RillError::runtime(
            name.line,
            format!("Index {} out of range for '{}'.", idx, name.lexeme),
        ));
    }

    elements[idx - 1] = value;

    Ok(Value::Array(elements))
}

/// Truthiness: `empty` is false, booleans are themselves, everything else
/// is true.
fn is_truthy(value: &Value<'_>) -> bool {
    match value {
        Value::Empty => false,
        Value::Bool(b) => *b,
        _ => true,
    }
}

/// Value equality for any pairing; mismatched types are simply unequal.
fn is_equal(left: &Value<'_>, right: &Value<'_>) -> bool {
    match (left, right) {
        (Value::Empty, Value::Empty) => true,
        (Value::Empty, _) | (_, Value::Empty) => false,
        _ => left == right,
    }
}

fn check_number_operands(
    operator: &Token<'_>,
    left: &Value<'_>,
    right: &Value<'_>,
) -> Result<(f64, f64)> {
    if let (Value::Number(a), Value::Number(b)) = (left, right) {
        return Ok((*a, *b));
    }

    Err(RillError::runtime(
        operator.line,
        "Operands must be numbers.",
    ))
}

/// Dynamic type predicate behind `is <Type>`, evaluated against the runtime
/// representation of the operand.
fn type_matches(value: &Value<'_>, tag: TypeIndicator) -> bool {
    match tag {
        // numbers always carry one floating representation
        TypeIndicator::Int => false,
        TypeIndicator::Real => matches!(value, Value::Number(_)),
        TypeIndicator::Bool => matches!(value, Value::Bool(_)),
        TypeIndicator::Str => matches!(value, Value::Str(_)),
        TypeIndicator::Empty => matches!(value, Value::Empty),
        TypeIndicator::Array => matches!(value, Value::Array(_)),
        // no tuple runtime representation exists
        TypeIndicator::Tuple => false,
        TypeIndicator::Func => matches!(value, Value::Function { .. }),
    }
}

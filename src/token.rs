use log::debug;
use serde::Serialize;
use std::fmt;
use std::mem;

/// The different kinds of tokens recognized by the Rill scanner.
///
/// Variants without data represent punctuation, operators, or keywords.
/// `STRING_LITERAL(String)` and `NUMBER(f64)` carry their decoded values.
/// `IDENTIFIER` is used for user-defined names. `EOF` marks the end of input.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Serialize)]
pub enum TokenType {
    /// '('
    LEFT_PAREN,

    /// ')'
    RIGHT_PAREN,

    /// '{'
    LEFT_BRACE,

    /// '}'
    RIGHT_BRACE,

    /// '['
    LEFT_BRACKET,

    /// ']'
    RIGHT_BRACKET,

    /// ','
    COMMA,

    /// '.'
    DOT,

    /// '..' with no preceding identifier (reserved; the grammar never
    /// consumes it)
    DOUBLE_DOT,

    /// '-'
    MINUS,

    /// '+'
    PLUS,

    /// ';'
    SEMICOLON,

    /// '/'
    SLASH,

    /// '*'
    STAR,

    /// ':='
    ASSIGN,

    /// '=>'
    LAMBDA,

    /// '='
    EQUAL,

    /// '/='
    NOT_EQUAL,

    /// '>'
    GREATER,

    /// '>='
    GREATER_EQUAL,

    /// '<'
    LESS,

    /// '<='
    LESS_EQUAL,

    /// A user-defined identifier
    IDENTIFIER,

    /// A string literal (contents without quotes)
    STRING_LITERAL(String),

    /// A numeric literal, stored as a 64-bit float
    #[serde(rename = "NUMBER")]
    NUMBER(f64),

    /// 'and'
    AND,

    /// 'or'
    OR,

    /// 'xor'
    XOR,

    /// 'not'
    NOT,

    /// 'var'
    VAR,

    /// 'for'
    FOR,

    /// 'if'
    IF,

    /// 'else'
    ELSE,

    /// 'then'
    THEN,

    /// 'end'
    END,

    /// 'while'
    WHILE,

    /// 'loop'
    LOOP,

    /// 'func'
    FUNC,

    /// 'is'
    IS,

    /// 'in' (keyword-table marker; the scanner rewrites it to ':=' and never
    /// emits this variant)
    IN,

    /// 'empty' type tag
    EMPTY,

    /// 'int' type tag
    INT,

    /// 'real' type tag
    REAL,

    /// 'bool' type tag
    BOOL,

    /// 'string' type tag
    STRING,

    /// 'true'
    TRUE,

    /// 'false'
    FALSE,

    /// 'print'
    PRINT,

    /// 'return'
    RETURN,

    /// 'readInt'
    READ_INT,

    /// 'readReal'
    READ_REAL,

    /// 'readString'
    READ_STRING,

    /// End-of-file marker
    EOF,
}

impl PartialEq for TokenType {
    /// Two TokenTypes are equal if they share the same variant
    /// (ignoring any inner data). Uses `mem::discriminant` to compare.
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

/// A scanned token, including its type, the original lexeme,
/// and the line number where it was found.
///
/// The lifetime `'a` ties `lexeme` back to the source buffer, except for
/// tokens synthesized by the range desugar, whose lexemes are `'static`
/// punctuation.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token<'a> {
    /// The category of this token.
    pub token_type: TokenType,

    /// The exact substring from the source that produced this token.
    pub lexeme: &'a str,

    /// 1-based line number in the source.
    pub line: usize,
}

impl<'a> Token<'a> {
    /// Create a new Token with the given type, lexeme, and line.
    pub fn new(token_type: TokenType, lexeme: &'a str, line: usize) -> Self {
        debug!(
            "Creating token: type={:?}, lexeme={}, line={}",
            token_type, lexeme, line
        );

        Self {
            token_type,
            lexeme,
            line,
        }
    }
}

impl<'a> fmt::Display for Token<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ── 1. variant name without payloads ───────────────────────────────
        let variant: &'static str = match self.token_type {
            TokenType::STRING_LITERAL(_) => "STRING_LITERAL",
            TokenType::NUMBER(_) => "NUMBER",
            TokenType::LEFT_PAREN => "LEFT_PAREN",
            TokenType::RIGHT_PAREN => "RIGHT_PAREN",
            TokenType::LEFT_BRACE => "LEFT_BRACE",
            TokenType::RIGHT_BRACE => "RIGHT_BRACE",
            TokenType::LEFT_BRACKET => "LEFT_BRACKET",
            TokenType::RIGHT_BRACKET => "RIGHT_BRACKET",
            TokenType::COMMA => "COMMA",
            TokenType::DOT => "DOT",
            TokenType::DOUBLE_DOT => "DOUBLE_DOT",
            TokenType::MINUS => "MINUS",
            TokenType::PLUS => "PLUS",
            TokenType::SEMICOLON => "SEMICOLON",
            TokenType::SLASH => "SLASH",
            TokenType::STAR => "STAR",
            TokenType::ASSIGN => "ASSIGN",
            TokenType::LAMBDA => "LAMBDA",
            TokenType::EQUAL => "EQUAL",
            TokenType::NOT_EQUAL => "NOT_EQUAL",
            TokenType::GREATER => "GREATER",
            TokenType::GREATER_EQUAL => "GREATER_EQUAL",
            TokenType::LESS => "LESS",
            TokenType::LESS_EQUAL => "LESS_EQUAL",
            TokenType::IDENTIFIER => "IDENTIFIER",
            TokenType::AND => "AND",
            TokenType::OR => "OR",
            TokenType::XOR => "XOR",
            TokenType::NOT => "NOT",
            TokenType::VAR => "VAR",
            TokenType::FOR => "FOR",
            TokenType::IF => "IF",
            TokenType::ELSE => "ELSE",
            TokenType::THEN => "THEN",
            TokenType::END => "END",
            TokenType::WHILE => "WHILE",
            TokenType::LOOP => "LOOP",
            TokenType::FUNC => "FUNC",
            TokenType::IS => "IS",
            TokenType::IN => "IN",
            TokenType::EMPTY => "EMPTY",
            TokenType::INT => "INT",
            TokenType::REAL => "REAL",
            TokenType::BOOL => "BOOL",
            TokenType::STRING => "STRING",
            TokenType::TRUE => "TRUE",
            TokenType::FALSE => "FALSE",
            TokenType::PRINT => "PRINT",
            TokenType::RETURN => "RETURN",
            TokenType::READ_INT => "READ_INT",
            TokenType::READ_REAL => "READ_REAL",
            TokenType::READ_STRING => "READ_STRING",
            TokenType::EOF => "EOF",
        };

        // ── 2. literal payload, or "null" for payload-free tokens ──────────
        match &self.token_type {
            TokenType::STRING_LITERAL(s) => write!(f, "{} {} {}", variant, self.lexeme, s),

            TokenType::NUMBER(n) => {
                // 3 → "3.0", 3.14 → "3.14"
                if n.fract() == 0.0 {
                    let mut buf: itoa::Buffer = itoa::Buffer::new();
                    write!(f, "{} {} {}.0", variant, self.lexeme, buf.format(*n as i64))
                } else {
                    write!(f, "{} {} {}", variant, self.lexeme, n)
                }
            }

            _ => write!(f, "{} {} null", variant, self.lexeme),
        }
    }
}

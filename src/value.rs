use crate::parser::Stmt;
use crate::token::Token;

/// A runtime value.
///
/// Arrays own their elements; element assignment clones the sequence and
/// re-stores it, so two variables never alias one backing store.  Function
/// values borrow the parameter and body slices of the literal they were
/// evaluated from, chained to whatever environment is active when they are
/// eventually called.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Number(f64),
    Str(String),
    Bool(bool),
    Array(Vec<Value<'a>>),
    Function {
        params: &'a [&'a Token<'a>],
        body: &'a [Stmt<'a>],
    },
    Empty,
}

impl<'a> std::fmt::Display for Value<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => {
                // 7.0 prints as "7", 3.14 as "3.14"
                if n.fract() == 0.0 {
                    let mut buf: itoa::Buffer = itoa::Buffer::new();
                    write!(f, "{}", buf.format(*n as i64))
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::Str(s) => write!(f, "{}", s),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Array(elements) => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }

            Value::Function { params, .. } => write!(f, "<func/{}>", params.len()),

            Value::Empty => write!(f, "empty"),
        }
    }
}

//! Centralised error hierarchy for the **Rill** interpreter.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) must convert their
//! internal failure modes into one of the variants defined here.  This enables
//! a uniform `Result<T>` alias throughout the crate and ergonomic
//! inter-operation with `anyhow`, while still preserving rich diagnostic
//! detail.
//!
//! The module **does not** print diagnostics itself.  Static diagnostics
//! (lexical, syntax, resolution) are accumulated in a [`Reporter`]: each stage
//! keeps going after reporting, and the driver refuses to execute a program
//! once any diagnostic has been recorded.  Runtime errors are not collected;
//! they propagate as `Err` and abort interpretation on first occurrence.

use std::io;
use thiserror::Error;

use log::info;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RillError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human-readable description.
        message: String,

        /// 1-based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error: {message}")]
    Parse { message: String, line: usize },

    /// Static-analysis or resolution failure (e.g. early-binding errors).
    #[error("[line {line}] Error: {message}")]
    Resolve { message: String, line: usize },

    /// Runtime evaluation error.
    #[error("Runtime error: [line {line}] {message}")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF-8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl RillError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        RillError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        RillError::Parse { message, line }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", line, message);

        RillError::Resolve { message, line }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", line, message);

        RillError::Runtime { message, line }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, RillError>;

/// Accumulator for static diagnostics.
///
/// The scanner, parser, and resolver all push into the same `Reporter` so a
/// single pass over a bad program surfaces every error it can.  Ownership is
/// explicit: there is no process-global error flag, and two interpretations
/// never share a reporter.
#[derive(Debug, Default)]
pub struct Reporter {
    errors: Vec<RillError>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one diagnostic.  The stage that reported it keeps going.
    pub fn report(&mut self, error: RillError) {
        info!("Diagnostic recorded: {}", error);

        self.errors.push(error);
    }

    /// True once any diagnostic has been recorded; execution must not start.
    pub fn had_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[RillError] {
        &self.errors
    }
}

//! Diagnostics collector shared by every pipeline stage.
//!
//! Instead of a process‑wide `had_error` flag, each of scanner, parser and
//! resolver receives a `&mut Diagnostics` and pushes errors into it while
//! continuing its own recovery strategy.  The driver inspects the collector
//! once per stage to decide whether the next stage may run, which also lets
//! several interpreter instances coexist in tests.

use crate::error::LoxError;
use crate::token::{Token, TokenType};

use log::debug;

/// Accumulates pipeline errors in the order they were reported.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<LoxError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Record an already‑constructed error.
    pub fn report(&mut self, err: LoxError) {
        debug!("Diagnostic reported: {}", err);

        self.errors.push(err);
    }

    /// Record a parser error anchored to a token, with the classic
    /// `at end` / `at '<lexeme>'` framing.
    pub fn report_at_token(&mut self, token: &Token, message: &str) {
        let framed: String = if matches!(token.token_type, TokenType::EOF) {
            format!("at end: {}", message)
        } else {
            format!("at '{}': {}", token.lexeme, message)
        };

        self.report(LoxError::parse(token.line, framed));
    }

    /// Has any error been collected so far?
    pub fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterate over collected errors in report order.
    pub fn iter(&self) -> impl Iterator<Item = &LoxError> {
        self.errors.iter()
    }

    /// Drain the collector, e.g. between REPL lines.
    pub fn take(&mut self) -> Vec<LoxError> {
        std::mem::take(&mut self.errors)
    }
}

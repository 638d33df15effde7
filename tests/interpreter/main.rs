//! Integration tests for the interpreter, organized by feature area.
//!
//! These tests exercise the interpreter through the public API.

mod api;
mod basics;
mod control_flow;
mod destructuring;
mod error;
mod function;
mod gc;
mod global;
mod json;
mod object;
mod regexp;
mod scopes;
mod string;

use scriptling::{ErrorKind, Interpreter, ScriptError};

/// Evaluate source and return the stringified result.
pub fn eval(source: &str) -> String {
    let mut interp = Interpreter::new();
    interp
        .evaluate(source)
        .unwrap_or_else(|e| panic!("evaluate failed for {:?}: {}", source, e))
}

/// Evaluate source expecting a host-level error; returns its kind.
pub fn eval_err(source: &str) -> ErrorKind {
    let mut interp = Interpreter::new();
    match interp.evaluate(source) {
        Ok(result) => panic!("expected error for {:?}, got {:?}", source, result),
        Err(ScriptError::Thrown) => panic!("unexpected thrown marker for {:?}", source),
        Err(err) => err.kind().unwrap_or(ErrorKind::Error),
    }
}

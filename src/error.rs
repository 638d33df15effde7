//! Error types for the interpreter.

use std::fmt;

use thiserror::Error;

/// Source location information for error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    /// 0-based line.
    pub line: u32,
    /// 0-based column.
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line:{} Column:{}", self.line + 1, self.column + 1)?;
        if !self.file.is_empty() {
            write!(f, " in {}", self.file)?;
        }
        Ok(())
    }
}

/// The category of a script error. The ordering matches the prototype
/// bootstrap: every kind except `Error` inherits from `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Error,
    EvalError,
    RangeError,
    ReferenceError,
    SyntaxError,
    TypeError,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 6] = [
        ErrorKind::Error,
        ErrorKind::EvalError,
        ErrorKind::RangeError,
        ErrorKind::ReferenceError,
        ErrorKind::SyntaxError,
        ErrorKind::TypeError,
    ];

    /// The standard `name` property of this error kind.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::EvalError => "EvalError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::TypeError => "TypeError",
        }
    }

    pub fn index(self) -> usize {
        match self {
            ErrorKind::Error => 0,
            ErrorKind::EvalError => 1,
            ErrorKind::RangeError => 2,
            ErrorKind::ReferenceError => 3,
            ErrorKind::SyntaxError => 4,
            ErrorKind::TypeError => 5,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Main error type of the crate.
///
/// Compile-time problems (lexer/tokenizer) and unhandled runtime problems are
/// reported through this type; exceptions thrown by script code travel as the
/// interpreter's exception slot plus the `Thrown` marker.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("{kind}: {message} at {location}")]
    Script {
        kind: ErrorKind,
        message: String,
        location: SourceLocation,
    },

    /// Marker error indicating a script value was thrown and not caught; the
    /// actual value is stored in the interpreter.
    #[error("uncaught exception")]
    Thrown,
}

impl ScriptError {
    pub fn new(
        kind: ErrorKind,
        message: impl Into<String>,
        file: impl Into<String>,
        line: u32,
        column: u32,
    ) -> Self {
        ScriptError::Script {
            kind,
            message: message.into(),
            location: SourceLocation::new(file, line, column),
        }
    }

    pub fn syntax(
        message: impl Into<String>,
        file: impl Into<String>,
        line: u32,
        column: u32,
    ) -> Self {
        Self::new(ErrorKind::SyntaxError, message, file, line, column)
    }

    /// The error kind, if this is a located script error.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ScriptError::Script { kind, .. } => Some(*kind),
            ScriptError::Thrown => None,
        }
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            ScriptError::Script { location, .. } => Some(location),
            ScriptError::Thrown => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ScriptError::Script { message, .. } => message,
            ScriptError::Thrown => "uncaught exception",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_position() {
        let err = ScriptError::syntax("unterminated string literal", "test.js", 2, 7);
        let text = err.to_string();
        assert!(text.starts_with("SyntaxError: unterminated string literal"));
        assert!(text.contains("Line:3"));
        assert!(text.contains("Column:8"));
        assert!(text.contains("test.js"));
    }

    #[test]
    fn test_kind_accessor() {
        let err = ScriptError::new(ErrorKind::TypeError, "x", "", 0, 0);
        assert_eq!(err.kind(), Some(ErrorKind::TypeError));
        assert_eq!(ScriptError::Thrown.kind(), None);
    }
}

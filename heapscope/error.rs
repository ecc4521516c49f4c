//! Error types
//!
//! Parse and execution errors come from the engine. Graph errors are violations of the
//! engine's event contract detected by the tracker and are reported as internal errors.

use thiserror::Error;

/// The engine could not parse the program. Raised before any stepping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at {line}:{column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> ParseError {
        ParseError {
            message: message.into(),
            line,
            column,
        }
    }
}

/// The engine failed while advancing the program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("execution error: {message}")]
pub struct ExecutionError {
    pub message: String,

    /// Diagnostic context from the engine's interpreter stack, if available
    pub stack_info: Option<String>,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> ExecutionError {
        ExecutionError {
            message: message.into(),
            stack_info: None,
        }
    }
}

/// Violations of the push/pop contract detected while applying engine events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("stack underflow: pop with no frame on the stack")]
    StackUnderflow,
}

/// Errors returned by the engine from `construct` and `advance`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Terminal error of a stepping session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    /// An invariant of the tracker was violated by the engine's event stream
    #[error("internal error: {0}")]
    Internal(#[from] GraphError),
}

impl SessionError {
    pub fn is_internal(&self) -> bool {
        matches!(self, SessionError::Internal(_))
    }
}

impl From<EngineError> for SessionError {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::Execution(error) => SessionError::Execution(error),
            EngineError::Graph(error) => SessionError::Internal(error),
        }
    }
}

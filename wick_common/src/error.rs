//! Error taxonomy for the wick interpreter (specification §7).

use crate::Span;
use thiserror::Error;

/// The fatal error taxonomy from the language specification. Every variant
/// carries the source span where the interpreter was standing when the
/// condition was detected. There is no recovery: the first error raised
/// terminates execution (see `wick_cli`).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WickError {
    #[error("SyntaxError: {message} at {span}")]
    SyntaxError { message: String, span: Span },

    #[error("NameError: {message} at {span}")]
    NameError { message: String, span: Span },

    #[error("TypeError: {message} at {span}")]
    TypeError { message: String, span: Span },

    #[error("ValueError: {message} at {span}")]
    ValueError { message: String, span: Span },

    #[error("IndexError: {message} at {span}")]
    IndexError { message: String, span: Span },

    #[error("ZeroDivisionError: {message} at {span}")]
    ZeroDivisionError { message: String, span: Span },

    #[error("OutOfMemoryError: {message} at {span}")]
    OutOfMemoryError { message: String, span: Span },

    #[error("SystemError: {message} at {span}")]
    SystemError { message: String, span: Span },
}

/// Result type alias used throughout the interpreter.
pub type WickResult<T> = Result<T, WickError>;

impl WickError {
    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::SyntaxError { message: message.into(), span }
    }

    pub fn name(message: impl Into<String>, span: Span) -> Self {
        Self::NameError { message: message.into(), span }
    }

    pub fn ty(message: impl Into<String>, span: Span) -> Self {
        Self::TypeError { message: message.into(), span }
    }

    pub fn value(message: impl Into<String>, span: Span) -> Self {
        Self::ValueError { message: message.into(), span }
    }

    pub fn index(message: impl Into<String>, span: Span) -> Self {
        Self::IndexError { message: message.into(), span }
    }

    pub fn zero_division(message: impl Into<String>, span: Span) -> Self {
        Self::ZeroDivisionError { message: message.into(), span }
    }

    pub fn out_of_memory(message: impl Into<String>, span: Span) -> Self {
        Self::OutOfMemoryError { message: message.into(), span }
    }

    pub fn system(message: impl Into<String>, span: Span) -> Self {
        Self::SystemError { message: message.into(), span }
    }

    /// The span this error was raised at, for CLI reporting.
    pub fn span(&self) -> Span {
        match self {
            Self::SyntaxError { span, .. }
            | Self::NameError { span, .. }
            | Self::TypeError { span, .. }
            | Self::ValueError { span, .. }
            | Self::IndexError { span, .. }
            | Self::ZeroDivisionError { span, .. }
            | Self::OutOfMemoryError { span, .. }
            | Self::SystemError { span, .. } => *span,
        }
    }
}

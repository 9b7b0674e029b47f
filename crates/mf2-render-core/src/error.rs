use thiserror::Error;

use crate::parser::Span;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at line {}, column {}", span.line, span.column)]
pub struct SyntaxError {
    pub message: String,
    pub span: Span,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("unknown function ':{0}'")]
    UnknownFunction(String),
    #[error("bad operand for ':{function}': {message}")]
    BadOperand { function: String, message: String },
    #[error("bad option '{option}' for ':{function}': {message}")]
    BadOption {
        function: String,
        option: String,
        message: String,
    },
    #[error("function ':{function}' failed: {message}")]
    Function { function: String, message: String },
}

impl FormatError {
    pub fn bad_operand(function: &str, message: impl Into<String>) -> Self {
        FormatError::BadOperand {
            function: function.to_string(),
            message: message.into(),
        }
    }

    pub fn bad_option(function: &str, option: &str, message: impl Into<String>) -> Self {
        FormatError::BadOption {
            function: function.to_string(),
            option: option.to_string(),
            message: message.into(),
        }
    }
}

pub type FormatResult<T> = Result<T, FormatError>;

#[cfg(test)]
mod tests {
    use super::{FormatError, SyntaxError};
    use crate::parser::Span;

    #[test]
    fn display_formats_syntax_error() {
        let err = SyntaxError::new(
            "unclosed placeholder",
            Span {
                start: 6,
                end: 7,
                line: 1,
                column: 7,
            },
        );
        assert_eq!(err.to_string(), "unclosed placeholder at line 1, column 7");
    }

    #[test]
    fn display_formats_unknown_function() {
        let err = FormatError::UnknownFunction("shout".to_string());
        assert_eq!(err.to_string(), "unknown function ':shout'");
    }

    #[test]
    fn display_formats_bad_option() {
        let err = FormatError::bad_option("number", "maximumFractionDigits", "expected integer");
        assert_eq!(
            err.to_string(),
            "bad option 'maximumFractionDigits' for ':number': expected integer"
        );
    }
}

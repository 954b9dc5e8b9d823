use crate::parser::ParseError;
use crate::types::JsValue;
use std::fmt;

/// The native error constructors a runtime violation maps to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Error,
    TypeError,
    ReferenceError,
    SyntaxError,
    RangeError,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 5] = [
        ErrorKind::Error,
        ErrorKind::TypeError,
        ErrorKind::ReferenceError,
        ErrorKind::SyntaxError,
        ErrorKind::RangeError,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::RangeError => "RangeError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A violation detected by an environment record.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("Identifier '{0}' has already been declared")]
    AlreadyDeclared(String),
    #[error("Assignment to immutable binding '{0}'")]
    Immutable(String),
    #[error("Cannot assign to read only property '{0}'")]
    ReadOnly(String),
    #[error("{0} is not defined")]
    NotDefined(String),
    #[error("Cannot access '{0}' before initialization")]
    Uninitialized(String),
}

impl BindingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BindingError::AlreadyDeclared(_)
            | BindingError::Immutable(_)
            | BindingError::ReadOnly(_) => ErrorKind::TypeError,
            BindingError::NotDefined(_) | BindingError::Uninitialized(_) => {
                ErrorKind::ReferenceError
            }
        }
    }
}

/// One active invocation, innermost last in a snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallFrame {
    pub function_name: String,
}

impl fmt::Display for CallFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.function_name.is_empty() {
            f.write_str("<anonymous>")
        } else {
            f.write_str(&self.function_name)
        }
    }
}

/// A Throw completion that crossed the eval or host boundary.
#[derive(Clone, Debug, thiserror::Error)]
#[error("uncaught exception: {value}")]
pub struct JavaScriptException {
    pub value: JsValue,
    pub call_stack: Vec<CallFrame>,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("SyntaxError: {0}")]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Exception(#[from] JavaScriptException),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_errors_map_to_error_kinds() {
        assert_eq!(BindingError::Immutable("x".into()).kind(), ErrorKind::TypeError);
        assert_eq!(BindingError::ReadOnly("x".into()).kind(), ErrorKind::TypeError);
        assert_eq!(BindingError::NotDefined("x".into()).kind(), ErrorKind::ReferenceError);
        assert_eq!(
            BindingError::Uninitialized("x".into()).kind(),
            ErrorKind::ReferenceError
        );
    }

    #[test]
    fn messages() {
        assert_eq!(BindingError::NotDefined("foo".into()).to_string(), "foo is not defined");
        assert_eq!(
            CallFrame {
                function_name: String::new()
            }
            .to_string(),
            "<anonymous>"
        );
    }
}

//! Deprecated error shapes, kept as views over [`LoadError`] and
//! [`LoadErrors`] for callers written against them.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::error::{Cause, LoadError, LoadErrors, NAMESPACE};

/// A kind of error that can be extracted from load errors.
///
/// Each target kind decides on its own which error shapes it can be built
/// from; the default is no match.
pub trait ErrorView: Sized {
    fn from_load_error(_err: &LoadError) -> Option<Self> {
        None
    }

    fn from_load_errors(_errs: &LoadErrors) -> Option<Self> {
        None
    }
}

impl ErrorView for LoadError {
    fn from_load_error(err: &LoadError) -> Option<Self> {
        Some(err.clone())
    }

    fn from_load_errors(errs: &LoadErrors) -> Option<Self> {
        errs.first().cloned()
    }
}

/// A single non-fatal construction fault with its line and column.
///
/// Deprecated: use [`LoadError`] instead.
#[derive(Debug, Clone)]
pub struct ConstructError {
    cause: Option<Cause>,
    message: String,
    line: usize,
    column: usize,
}

impl ConstructError {
    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }
}

impl From<&LoadError> for ConstructError {
    fn from(err: &LoadError) -> Self {
        let mark = err.mark();
        Self {
            cause: err.cause().cloned(),
            message: err.message().to_string(),
            line: mark.line,
            column: mark.column,
        }
    }
}

impl ErrorView for ConstructError {
    fn from_load_error(err: &LoadError) -> Option<Self> {
        Some(Self::from(err))
    }

    fn from_load_errors(errs: &LoadErrors) -> Option<Self> {
        errs.first().map(Self::from)
    }
}

impl fmt::Display for ConstructError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "line {}: {}", self.line, cause),
            None => write!(f, "line {}: {}", self.line, self.message),
        }
    }
}

impl StdError for ConstructError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

/// Fields that could not be decoded into the requested types, one message
/// per field.
///
/// Deprecated: use [`LoadErrors`] instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}: unmarshal errors:\n  {}", NAMESPACE, .messages.join("\n  "))]
pub struct TypeError {
    messages: Vec<String>,
}

impl TypeError {
    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl From<&LoadErrors> for TypeError {
    fn from(errs: &LoadErrors) -> Self {
        Self {
            messages: errs.iter().map(LoadError::simple_format).collect(),
        }
    }
}

impl ErrorView for TypeError {
    fn from_load_errors(errs: &LoadErrors) -> Option<Self> {
        Some(Self::from(errs))
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::{ConstructError, TypeError};
    use crate::error::{LoadError, LoadErrors};
    use crate::mark::Mark;
    use crate::stage::Stage;

    fn field_error(line: usize, message: &str) -> LoadError {
        LoadError::new(Stage::Constructor, message, Mark::new(line, 0, 0))
            .with_cause(message.to_string())
    }

    #[test]
    fn construct_error_copies_cause_and_position() {
        let err = LoadError::new(Stage::Constructor, "bad value", Mark::new(7, 3, 51))
            .with_cause("X");
        let view = ConstructError::from(&err);
        assert_eq!(view.line(), 7);
        assert_eq!(view.column(), 3);
        assert_eq!(view.cause().unwrap().to_string(), "X");
        assert_eq!(view.source().unwrap().to_string(), "X");
        assert_eq!(view.to_string(), "line 7: X");
    }

    #[test]
    fn construct_error_without_cause_uses_message() {
        let err = LoadError::new(Stage::Constructor, "bad value", Mark::new(2, 0, 0));
        let view = ConstructError::from(&err);
        assert!(view.cause().is_none());
        assert_eq!(view.to_string(), "line 2: bad value");
    }

    #[test]
    fn type_error_lists_simple_messages() {
        let errs: LoadErrors = vec![field_error(1, "missing field"), field_error(3, "wrong type")]
            .into_iter()
            .collect();
        let view = TypeError::from(&errs);
        assert_eq!(view.messages(), ["line 1: missing field", "line 3: wrong type"]);
        assert_eq!(
            view.to_string(),
            "yaml: unmarshal errors:\n  line 1: missing field\n  line 3: wrong type"
        );
    }

    #[test]
    fn empty_type_error_keeps_header() {
        let view = TypeError::from(&LoadErrors::new());
        assert!(view.messages().is_empty());
        assert_eq!(view.to_string().trim(), "yaml: unmarshal errors:");
    }
}

//! Error definitions for all load and emit stages.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::legacy::ErrorView;
use crate::mark::Mark;
use crate::stage::Stage;

/// Prefix shared by every rendered error.
pub const NAMESPACE: &str = "yaml";

/// Underlying error attached to a [`LoadError`].
pub type Cause = Arc<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, Error)]
/// Top-level error type returned by public APIs.
pub enum Error {
    /// A single positioned fault that stopped the load.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// Per-field faults collected while constructing the value.
    #[error(transparent)]
    Construct(#[from] LoadErrors),
    /// The value could not be represented in the output.
    #[error(transparent)]
    Emitter(#[from] EmitterError),
    /// The output sink failed.
    #[error(transparent)]
    Writer(#[from] WriterError),
}

impl Error {
    /// Returns the stage of the first load fault, if this is a load-side error.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Load(err) => Some(err.stage()),
            Error::Construct(errs) => errs.first().map(LoadError::stage),
            Error::Emitter(_) | Error::Writer(_) => None,
        }
    }

    /// Extracts a view of kind `T`, see [`LoadErrors::view_as`].
    pub fn view_as<T: ErrorView>(&self) -> Option<T> {
        match self {
            Error::Load(err) => err.view_as(),
            Error::Construct(errs) => errs.view_as(),
            Error::Emitter(_) | Error::Writer(_) => None,
        }
    }

    /// Returns `true` when `target` appears among the causes of this error.
    pub fn matches(&self, target: &(dyn StdError + 'static)) -> bool {
        match self {
            Error::Load(err) => err.matches(target),
            Error::Construct(errs) => errs.matches(target),
            Error::Emitter(_) => false,
            Error::Writer(err) => chain_matches(&err.source, target),
        }
    }
}

/// Construct that was being processed when a fault was detected, for example
/// the start of the enclosing mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    pub message: String,
    pub mark: Mark,
}

/// A fault detected by one stage while loading a document.
///
/// Carries the stage, a message, the position of the fault and optionally the
/// construct being processed and an underlying cause.
#[derive(Debug, Clone)]
pub struct LoadError {
    stage: Stage,
    message: String,
    mark: Mark,
    context: Option<ErrorContext>,
    cause: Option<Cause>,
}

impl LoadError {
    pub fn new(stage: Stage, message: impl Into<String>, mark: Mark) -> Self {
        Self {
            stage,
            message: message.into(),
            mark,
            context: None,
            cause: None,
        }
    }

    /// Attaches the construct being processed and where it started.
    pub fn with_context(mut self, message: impl Into<String>, mark: Mark) -> Self {
        self.context = Some(ErrorContext {
            message: message.into(),
            mark,
        });
        self
    }

    pub fn with_cause(
        mut self,
        cause: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
    ) -> Self {
        self.cause = Some(Arc::from(cause.into()));
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn mark(&self) -> Mark {
        self.mark
    }

    pub fn context(&self) -> Option<&ErrorContext> {
        self.context.as_ref()
    }

    /// The underlying error exactly as it was attached.
    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }

    /// Renders the error without the namespace and stage, as used for each
    /// line of an aggregate.
    ///
    /// Only the line number is reported, the message is kept verbatim.
    pub fn simple_format(&self) -> String {
        let mut out = String::new();
        if let Some(context) = &self.context {
            out.push_str(&format!("{} at {}: ", context.message, context.mark));
        }
        let same_as_context = self
            .context
            .as_ref()
            .is_some_and(|context| context.mark == self.mark);
        if !same_as_context {
            if self.mark.is_known() {
                out.push_str(&format!("line {}: ", self.mark.line));
            } else {
                out.push_str("<unknown position>: ");
            }
        }
        out.push_str(&self.message);
        out
    }

    pub fn view_as<T: ErrorView>(&self) -> Option<T> {
        T::from_load_error(self)
    }

    /// Returns `true` when `target` is the cause of this error or appears in
    /// the cause's own source chain.
    pub fn matches(&self, target: &(dyn StdError + 'static)) -> bool {
        self.cause
            .as_deref()
            .is_some_and(|cause| chain_matches(cause, target))
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{NAMESPACE} load error: {}\n  in {}",
            self.message, self.stage
        )?;
        match &self.context {
            Some(context) => write!(
                f,
                " ({}) at {}",
                context.message,
                context.mark.range_string(&self.mark)
            ),
            None => write!(f, " at {}", self.mark.short_string()),
        }
    }
}

impl StdError for LoadError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

/// Faults collected by one load call that kept going after per-field errors.
///
/// Elements stay in detection order.
#[derive(Debug, Clone, Default)]
pub struct LoadErrors {
    errors: Vec<LoadError>,
}

impl LoadErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: LoadError) {
        self.errors.push(err);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn first(&self) -> Option<&LoadError> {
        self.errors.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LoadError> {
        self.errors.iter()
    }

    /// `Ok(())` when nothing was collected, otherwise the aggregate itself.
    pub fn into_result(self) -> Result<(), LoadErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Extracts a view of kind `T`.
    ///
    /// [`LoadError`] and [`ConstructError`](crate::ConstructError) views
    /// describe the first element and need a non-empty aggregate.
    /// [`TypeError`](crate::TypeError) views always succeed.
    pub fn view_as<T: ErrorView>(&self) -> Option<T> {
        T::from_load_errors(self)
    }

    /// Returns `true` when `target` matches the cause of any element.
    pub fn matches(&self, target: &(dyn StdError + 'static)) -> bool {
        self.errors.iter().any(|err| err.matches(target))
    }
}

impl fmt::Display for LoadErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{NAMESPACE}: construct errors:")?;
        for err in &self.errors {
            write!(f, "\n  {}", err.simple_format())?;
        }
        Ok(())
    }
}

impl StdError for LoadErrors {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.errors
            .first()
            .map(|err| err as &(dyn StdError + 'static))
    }
}

impl FromIterator<LoadError> for LoadErrors {
    fn from_iter<I: IntoIterator<Item = LoadError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for LoadErrors {
    type Item = LoadError;
    type IntoIter = std::vec::IntoIter<LoadError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a LoadErrors {
    type Item = &'a LoadError;
    type IntoIter = std::slice::Iter<'a, LoadError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {message}", NAMESPACE)]
/// A value that cannot be represented in the emitted document.
pub struct EmitterError {
    pub message: String,
}

impl EmitterError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
#[error("{}: {source}", NAMESPACE)]
/// The output sink rejected emitted bytes.
pub struct WriterError {
    #[from]
    pub source: io::Error,
}

fn chain_matches(cause: &(dyn StdError + 'static), target: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(cause);
    while let Some(err) = current {
        if same_error(err, target) {
            return true;
        }
        current = err.source();
    }
    false
}

fn same_error(a: &(dyn StdError + 'static), b: &(dyn StdError + 'static)) -> bool {
    std::ptr::addr_eq(a as *const dyn StdError, b as *const dyn StdError)
        || a.to_string() == b.to_string()
}

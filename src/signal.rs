//! Abrupt exit for faults detected deep inside a stage.
//!
//! Stage code that has no convenient return path calls [`raise`]; the public
//! entry point that started the call runs its body under [`guard`], which
//! turns the unwind back into an ordinary `Err`. Both live on the same thread's
//! stack, so a guard only ever observes signals raised by its own call.
//!
//! Builds with `panic = "abort"` are rejected at compile time: an abort
//! strategy would turn every raised fault into a process exit.

#[cfg(not(panic = "unwind"))]
compile_error!("yaml_errors requires panic = \"unwind\"");

use std::panic::{self, AssertUnwindSafe};

use crate::error::Error;

/// Unwind payload carrying the error that stopped the pipeline.
pub(crate) struct Signal(Error);

/// Aborts the current pipeline call with `err`.
///
/// Must only be called beneath a [`guard`]. Uses `resume_unwind`, so the panic
/// hook does not run.
pub(crate) fn raise(err: impl Into<Error>) -> ! {
    panic::resume_unwind(Box::new(Signal(err.into())))
}

/// Runs a public entry point body, converting a raised [`Signal`] into its
/// payload. Any other panic is resumed unchanged.
pub(crate) fn guard<T, F>(entry: &'static str, body: F) -> Result<T, Error>
where
    F: FnOnce() -> Result<T, Error>,
{
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(result) => result,
        Err(payload) => match payload.downcast::<Signal>() {
            Ok(signal) => {
                let Signal(err) = *signal;
                tracing::debug!(entry, error = %err, "recovered raised load error");
                Err(err)
            }
            Err(other) => panic::resume_unwind(other),
        },
    }
}

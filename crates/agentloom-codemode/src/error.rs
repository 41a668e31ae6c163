//! Codemode errors.

use thiserror::Error;

/// Errors raised while substituting or evaluating a codemode program.
#[derive(Debug, Error)]
pub enum CodemodeError {
    /// The sandbox failed to initialize (e.g. the runtime could not be
    /// constructed).
    #[error("failed to initialize codemode sandbox: {0}")]
    SandboxInit(String),

    /// The generated program raised a script-level error during evaluation.
    #[error("codemode evaluation failed: {0}")]
    EvalFailed(String),

    /// A function the generated program called is not in the function
    /// table built for this call.
    #[error("codemode function not found: {0}")]
    FunctionNotFound(String),
}

/// Result type for codemode operations.
pub type CodemodeResult<T> = Result<T, CodemodeError>;

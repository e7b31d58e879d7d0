use thiserror::Error;

/// Failures that indicate a bug in the compiler itself.
///
/// Problems with user-supplied source are never reported through this type:
/// they become [`crate::diagnostics::Diagnostic`] values and compilation
/// continues. A `CompilerError` means an internal invariant was violated.
#[derive(Debug, Error)]
pub enum CompilerError {
    #[error("internal compiler error: {0}")]
    Internal(String),

    #[error("formatting error: {0}")]
    Format(#[from] std::fmt::Error),
}

pub type Result<T> = std::result::Result<T, CompilerError>;

#[macro_export]
macro_rules! bail_internal {
    ($($arg:tt)*) => {
        return Err($crate::error::CompilerError::Internal(format!($($arg)*)))
    };
}

//! Core error types for quarry.

use thiserror::Error;

/// Result type alias using `QuarryError`.
pub type QuarryResult<T> = std::result::Result<T, QuarryError>;

/// Generic boxed error for failures raised by host code.
pub type GenericError = Box<dyn std::error::Error + Send + Sync>;

/// Core error type for quarry operations.
///
/// The variants fall into three classes:
///
/// - **Recoverable evaluation failures**: the expected outcomes of running
///   host code on constant inputs (see [`QuarryError::is_recoverable`]).
///   The partial evaluator captures any error raised while executing a
///   folded subtree as a diagnostic node, whatever its class.
/// - **Configuration errors** in the host's setup: duplicate transformer
///   declarations, factories yielding no rule, unsupported rewrite shapes.
/// - **Extension contract violations** raised by a defective extension node.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuarryError {
    /// Operand types do not support the operation.
    #[error("TypeError: {0}")]
    TypeError(String),

    /// A member or method was read through a null receiver.
    #[error("NullReference: {0}")]
    NullReference(String),

    /// Integer division or remainder by zero.
    #[error("DivideByZero: {0}")]
    DivideByZero(String),

    /// Checked arithmetic overflowed.
    #[error("Overflow: {0}")]
    Overflow(String),

    /// A conversion between types failed at runtime.
    #[error("InvalidCast: {0}")]
    InvalidCast(String),

    /// Failure reported by host code (method bodies, getters, constructors).
    #[error("EvaluationError: {0}")]
    EvaluationError(String),

    /// Host code panicked while a subtree was being executed.
    #[error("HostPanic: {0}")]
    HostPanic(String),

    /// External error raised by host code.
    #[error("ExternalError: {0}")]
    ExternalError(GenericError),

    /// Host configuration error (rule providers, transformer declarations).
    #[error("ConfigurationError: {0}")]
    ConfigurationError(String),

    /// A tree shape that a rewrite rule does not support.
    #[error("NotSupported: {0}")]
    NotSupported(String),

    /// An extension node violated its reduction or visiting contract.
    #[error("ExtensionContract: {0}")]
    ExtensionContract(String),

    /// Internal error (bug in quarry).
    #[error("InternalError: {0}")]
    InternalError(String),
}

impl QuarryError {
    /// Create a new `TypeError`.
    pub fn type_error<S: Into<String>>(msg: S) -> Self {
        Self::TypeError(msg.into())
    }

    /// Create a new `NullReference` error.
    pub fn null_reference<S: Into<String>>(msg: S) -> Self {
        Self::NullReference(msg.into())
    }

    /// Create a new `DivideByZero` error.
    pub fn divide_by_zero<S: Into<String>>(msg: S) -> Self {
        Self::DivideByZero(msg.into())
    }

    /// Create a new `Overflow` error.
    pub fn overflow<S: Into<String>>(msg: S) -> Self {
        Self::Overflow(msg.into())
    }

    /// Create a new `InvalidCast` error.
    pub fn invalid_cast<S: Into<String>>(msg: S) -> Self {
        Self::InvalidCast(msg.into())
    }

    /// Create a new `EvaluationError`.
    pub fn evaluation<S: Into<String>>(msg: S) -> Self {
        Self::EvaluationError(msg.into())
    }

    /// Create a new `HostPanic` error.
    pub fn host_panic<S: Into<String>>(msg: S) -> Self {
        Self::HostPanic(msg.into())
    }

    /// Wrap an arbitrary error raised by host code.
    pub fn external<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ExternalError(Box::new(err))
    }

    /// Create a new `ConfigurationError`.
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::ConfigurationError(msg.into())
    }

    /// Create a new `NotSupported` error.
    pub fn not_supported<S: Into<String>>(msg: S) -> Self {
        Self::NotSupported(msg.into())
    }

    /// Create a new `ExtensionContract` error.
    pub fn extension_contract<S: Into<String>>(msg: S) -> Self {
        Self::ExtensionContract(msg.into())
    }

    /// Create a new `InternalError`.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::InternalError(msg.into())
    }

    /// Whether this error is an ordinary evaluation failure rather than a
    /// defect in host setup or host code.
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TypeError(_)
                | Self::NullReference(_)
                | Self::DivideByZero(_)
                | Self::Overflow(_)
                | Self::InvalidCast(_)
                | Self::EvaluationError(_)
                | Self::HostPanic(_)
                | Self::ExternalError(_)
        )
    }
}

/// Ensure a condition holds, returning an error if not.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $msg:expr) => {
        if !$cond {
            return Err($crate::QuarryError::InternalError($msg.to_string()));
        }
    };
    ($cond:expr, $variant:ident: $($msg:tt)*) => {
        if !$cond {
            return Err($crate::QuarryError::$variant(format!($($msg)*)));
        }
    };
}

/// Return early with a `TypeError`.
#[macro_export]
macro_rules! type_err {
    ($($arg:tt)*) => {
        return Err($crate::QuarryError::TypeError(format!($($arg)*)))
    };
}

/// Return early with a `ConfigurationError`.
#[macro_export]
macro_rules! config_err {
    ($($arg:tt)*) => {
        return Err($crate::QuarryError::ConfigurationError(format!($($arg)*)))
    };
}

//! Error types for conversion, binding, dispatch and registration.
//!
//! Only [`RegistrationError`] ever reaches the host program: every other
//! failure is contained by the dispatcher and turned into a diagnostic line
//! followed by command help.

use thiserror::Error;

/// Errors produced by type converters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// No converter is registered under this type name.
    ///
    /// This is a registration bug, not bad user input.
    #[error("unknown argument type: {0}")]
    UnknownType(String),

    /// The converter rejected the raw value.
    #[error("{0}")]
    Invalid(String),
}

impl ConvertError {
    /// Creates an [`ConvertError::Invalid`] error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// A command-local failure that stops the current invocation.
///
/// The dispatcher catches every variant at its boundary; the `Display` output
/// is what ends up after the `[E]` marker.
#[derive(Debug, Error)]
pub enum CommandAbort {
    /// An argument marked `fail_on_error` could not be converted.
    #[error("{0}")]
    InvalidArgument(String),

    /// The command's validator rejected the invocation.
    #[error("{0:#}")]
    Validation(anyhow::Error),

    /// The handler returned an error.
    #[error("{0:#}")]
    Handler(anyhow::Error),

    /// Binding, the validator or the handler panicked.
    #[error("{0}")]
    Panic(String),

    /// A nested dispatcher already reported its own abort.
    #[error("sub-command aborted")]
    Nested,
}

/// Handler error standing for an abort that a nested dispatcher has already
/// printed. Produced by [`Outcome::into_result`](crate::Outcome::into_result).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("sub-command aborted")]
pub struct NestedAbort;

/// Errors returned by [`Dispatcher::register`](crate::Dispatcher::register).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The descriptor has no name.
    #[error("command name must not be empty")]
    EmptyName,

    /// A declared argument uses a type with no registered converter.
    #[error("command '{command}' declares --{argument} with unknown type '{type_name}'")]
    UnknownType {
        command: String,
        argument: String,
        type_name: String,
    },
}

/// Errors from typed option access on an [`Invocation`](crate::Invocation).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypedOptError {
    /// No argument with this name is declared on the command.
    #[error("argument '{0}' is not declared")]
    NotDeclared(String),

    /// The argument is declared but no value was given.
    #[error("argument '{0}' was not provided")]
    NotSet(String),

    /// The given value failed conversion.
    #[error("argument '{name}' is invalid: {source}")]
    Invalid {
        name: String,
        #[source]
        source: ConvertError,
    },

    /// The resolved value has a different shape than requested.
    #[error("argument '{name}' holds {actual}, not {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_display_uses_message_only() {
        let abort = CommandAbort::InvalidArgument("Invalid argument: --n=x [bad]".into());
        assert_eq!(abort.to_string(), "Invalid argument: --n=x [bad]");
    }

    #[test]
    fn test_abort_display_includes_context_chain() {
        let err = anyhow::anyhow!("disk full").context("could not save");
        let abort = CommandAbort::Handler(err);
        assert_eq!(abort.to_string(), "could not save: disk full");
    }

    #[test]
    fn test_nested_abort_survives_context() {
        let err = anyhow::Error::new(NestedAbort).context("while running remote");
        assert!(err.is::<NestedAbort>());
    }

    #[test]
    fn test_registration_error_display() {
        let err = RegistrationError::UnknownType {
            command: "copy".into(),
            argument: "size".into(),
            type_name: "Bytes".into(),
        };
        assert_eq!(
            err.to_string(),
            "command 'copy' declares --size with unknown type 'Bytes'"
        );
    }
}

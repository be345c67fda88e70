//! Typed named arguments.
//!
//! An [`Argument`] declares a `--name=value` option a command understands,
//! together with the converter type used to resolve its value. The dispatcher
//! binds every declared argument against the parsed options once per
//! invocation.

use serde::Serialize;

use crate::convert::{ConverterRegistry, Value};
use crate::error::ConvertError;

/// A declared, typed `--name=value` option and its resolved state.
#[derive(Debug, Clone)]
pub struct Argument {
    name: String,
    type_name: String,
    fail_on_error: bool,
    raw_value: String,
    value: Option<Value>,
    error: Option<ConvertError>,
}

impl Argument {
    /// Declares an argument whose conversion failures only produce a warning.
    pub fn optional(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            fail_on_error: false,
            raw_value: String::new(),
            value: None,
            error: None,
        }
    }

    /// Declares an argument whose conversion failures abort the command.
    pub fn required(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            fail_on_error: true,
            ..Self::optional(name, type_name)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fail_on_error(&self) -> bool {
        self.fail_on_error
    }

    /// The raw string given on the command line (empty when unset).
    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    /// The resolved value. Always `None` while a conversion error is stored.
    pub fn value(&self) -> Option<&Value> {
        match self.error {
            Some(_) => None,
            None => self.value.as_ref(),
        }
    }

    pub fn error(&self) -> Option<&ConvertError> {
        self.error.as_ref()
    }

    /// Stores `raw` and converts it, replacing any previous state.
    pub fn set_value(&mut self, raw: &str, registry: &ConverterRegistry) -> Result<(), ConvertError> {
        self.raw_value = raw.to_string();
        match registry.convert(&self.type_name, raw) {
            Ok(value) => {
                self.value = Some(value);
                self.error = None;
                Ok(())
            }
            Err(e) => {
                self.value = None;
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Forgets the state of the previous invocation.
    pub fn reset(&mut self) {
        self.raw_value.clear();
        self.value = None;
        self.error = None;
    }

    /// Help metadata for this argument.
    pub fn help(&self) -> ArgumentHelp {
        ArgumentHelp {
            name: self.name.clone(),
            type_name: self.type_name.clone(),
            required: self.fail_on_error,
        }
    }
}

/// Serializable description of an argument for help output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgumentHelp {
    pub name: String,
    pub type_name: String,
    pub required: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_value_stores_converted() {
        let registry = ConverterRegistry::new();
        let mut arg = Argument::optional("count", "Int64");
        assert!(arg.set_value("42", &registry).is_ok());
        assert_eq!(arg.raw_value(), "42");
        assert_eq!(arg.value(), Some(&Value::Int(42)));
        assert!(arg.error().is_none());
    }

    #[test]
    fn test_set_value_failure_hides_value() {
        let registry = ConverterRegistry::new();
        let mut arg = Argument::optional("count", "Uint64");
        assert!(arg.set_value("-42", &registry).is_err());
        assert_eq!(arg.raw_value(), "-42");
        assert!(arg.value().is_none());
        assert!(arg.error().is_some());
    }

    #[test]
    fn test_set_value_twice_keeps_latest() {
        let registry = ConverterRegistry::new();
        let mut arg = Argument::optional("count", "Int64");
        arg.set_value("nope", &registry).unwrap_err();
        arg.set_value("7", &registry).unwrap();
        assert_eq!(arg.value(), Some(&Value::Int(7)));
        assert!(arg.error().is_none());
    }

    #[test]
    fn test_unknown_type_is_reported() {
        let registry = ConverterRegistry::new();
        let mut arg = Argument::optional("when", "Date");
        assert_eq!(
            arg.set_value("today", &registry).unwrap_err(),
            ConvertError::UnknownType("Date".into())
        );
    }

    #[test]
    fn test_reset() {
        let registry = ConverterRegistry::new();
        let mut arg = Argument::required("name", "String");
        arg.set_value("bob", &registry).unwrap();
        arg.reset();
        assert_eq!(arg.raw_value(), "");
        assert!(arg.value().is_none());
        assert!(arg.fail_on_error());
    }

    #[test]
    fn test_help() {
        let help = Argument::required("file", "FilePath").help();
        assert_eq!(help.name, "file");
        assert_eq!(help.type_name, "FilePath");
        assert!(help.required);
    }
}

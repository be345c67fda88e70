//! Argument tokenizing and the per-invocation context passed to handlers.
//!
//! # Token rules
//!
//! The first token is the command name and is skipped. For the rest:
//!
//! | Token | Result |
//! |-------|--------|
//! | `--key=value` | option `key` = `value` (split on the first `=`) |
//! | `--key` | flag `key` |
//! | `-abc` | flags `a`, `b` and `c` |
//! | anything else | positional argument, order preserved |
//!
//! `-d` and `-v` additionally switch on [`Invocation::debug_mode`] and
//! [`Invocation::verbose_mode`].
//!
//! The grammar is deliberately permissive: there is no `--` terminator and
//! option values are never taken from the following token.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use crate::argument::Argument;
use crate::convert::{ConverterRegistry, FromValue, Value};
use crate::error::{CommandAbort, TypedOptError};
use crate::output::{resolve_executable_name, LineSink, StdoutSink};

/// Flags, options and positional arguments of one command invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    flags: BTreeSet<String>,
    options: HashMap<String, String>,
    positional: Vec<String>,
}

impl ParsedArgs {
    /// Tokenizes `tokens`, skipping the leading command name.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Self {
        let mut parsed = Self::default();

        for token in tokens.iter().skip(1).map(AsRef::as_ref) {
            if let Some(long) = token.strip_prefix("--") {
                match long.split_once('=') {
                    Some((key, value)) => {
                        parsed.options.insert(key.to_string(), value.to_string());
                    }
                    None => {
                        parsed.flags.insert(long.to_string());
                    }
                }
            } else if let Some(cluster) = token.strip_prefix('-') {
                for c in cluster.chars() {
                    parsed.flags.insert(c.to_string());
                }
            } else {
                parsed.positional.push(token.to_string());
            }
        }

        parsed
    }

    /// Positional argument at `index`, or `""`.
    pub fn arg(&self, index: usize) -> &str {
        self.positional.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn flag(&self, key: &str) -> bool {
        self.flags.contains(key)
    }

    /// Raw option value, or `""` when absent.
    pub fn opt(&self, key: &str) -> &str {
        self.opt_value(key).unwrap_or("")
    }

    /// Raw option value, `None` when the option was not given at all.
    pub fn opt_value(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(String::as_str)
    }

    pub fn options(&self) -> &HashMap<String, String> {
        &self.options
    }

    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    /// Binds declared arguments against the parsed options.
    ///
    /// Every argument is reset first. Options with an empty value are
    /// skipped. A conversion failure on an argument with `fail_on_error`
    /// stops binding and returns the abort; any other failure is printed
    /// through `sink` and binding carries on.
    pub fn bind(
        &self,
        arguments: &mut [Argument],
        converters: &ConverterRegistry,
        sink: &dyn LineSink,
    ) -> Result<(), CommandAbort> {
        for argument in arguments.iter_mut() {
            argument.reset();

            let raw = self.opt(argument.name());
            if raw.is_empty() {
                continue;
            }

            if let Err(e) = argument.set_value(raw, converters) {
                let message = format!("Invalid argument: --{}={} [{}]", argument.name(), raw, e);

                if argument.fail_on_error() {
                    return Err(CommandAbort::InvalidArgument(message));
                }

                tracing::warn!(argument = argument.name(), error = %e, "ignoring invalid argument");
                sink.print(&format!("{}\n", message));
            }
        }

        Ok(())
    }
}

/// Dispatch state shared between a dispatcher, its invocations and any
/// nested dispatcher a handler creates.
#[derive(Clone)]
pub(crate) struct Session {
    pub(crate) args: Rc<[String]>,
    pub(crate) sink: Rc<dyn LineSink>,
    pub(crate) executable: Rc<str>,
    pub(crate) converters: Rc<ConverterRegistry>,
}

impl Session {
    pub(crate) fn standalone() -> Self {
        Self {
            args: Rc::from(Vec::new()),
            sink: Rc::new(StdoutSink),
            executable: Rc::from(resolve_executable_name()),
            converters: Rc::new(ConverterRegistry::new()),
        }
    }
}

/// Context passed to validators and handlers.
///
/// Created fresh for every dispatch and dropped when the handler returns.
pub struct Invocation<'a> {
    /// Set by `-d`.
    pub debug_mode: bool,
    /// Set by `-v`.
    pub verbose_mode: bool,
    parsed: ParsedArgs,
    arguments: &'a [Argument],
    depth: usize,
    session: Session,
}

impl<'a> Invocation<'a> {
    /// Wraps already parsed (and bound) arguments outside of a dispatcher.
    ///
    /// Output from [`log`](Self::log) goes to standard output.
    pub fn new(parsed: ParsedArgs, arguments: &'a [Argument]) -> Self {
        Self::with_session(parsed, arguments, 0, Session::standalone())
    }

    pub(crate) fn with_session(
        parsed: ParsedArgs,
        arguments: &'a [Argument],
        depth: usize,
        session: Session,
    ) -> Self {
        Self {
            debug_mode: parsed.flag("d"),
            verbose_mode: parsed.flag("v"),
            parsed,
            arguments,
            depth,
            session,
        }
    }

    /// Positional argument at `index`, or `""`.
    pub fn arg(&self, index: usize) -> &str {
        self.parsed.arg(index)
    }

    pub fn flag(&self, key: &str) -> bool {
        self.parsed.flag(key)
    }

    /// Raw option value, or `""`. Use [`opt_value`](Self::opt_value) to tell
    /// an absent option from `--key=`.
    pub fn opt(&self, key: &str) -> &str {
        self.parsed.opt(key)
    }

    pub fn opt_value(&self, key: &str) -> Option<&str> {
        self.parsed.opt_value(key)
    }

    pub fn parsed(&self) -> &ParsedArgs {
        &self.parsed
    }

    /// Declared arguments, bound for this invocation.
    pub fn arguments(&self) -> &[Argument] {
        self.arguments
    }

    /// Resolved value of a declared argument.
    ///
    /// `None` if the argument is not declared, was not given, or failed
    /// conversion.
    pub fn typed_opt(&self, name: &str) -> Option<&Value> {
        self.argument(name).and_then(Argument::value)
    }

    /// Resolved value of a declared argument as a concrete type.
    ///
    /// ```rust
    /// use commandeer::{Argument, ConverterRegistry, CaptureSink, Invocation, ParsedArgs};
    ///
    /// let mut arguments = vec![Argument::optional("list", "StringList")];
    /// let parsed = ParsedArgs::parse(&["my-command", "--list=one,two,three"]);
    /// parsed.bind(&mut arguments, &ConverterRegistry::new(), &CaptureSink::new()).unwrap();
    ///
    /// let ctx = Invocation::new(parsed, &arguments);
    /// let list: Vec<String> = ctx.get("list").unwrap();
    /// assert_eq!(list, ["one", "two", "three"]);
    /// assert!(ctx.get::<i64>("list").is_err());
    /// ```
    pub fn get<T: FromValue>(&self, name: &str) -> Result<T, TypedOptError> {
        let value = self.resolved(name)?;
        T::from_value(value).ok_or_else(|| TypedOptError::TypeMismatch {
            name: name.to_string(),
            expected: T::KIND,
            actual: value.kind(),
        })
    }

    /// Resolved value of a declared argument produced by a custom converter.
    pub fn get_custom<T: 'static>(&self, name: &str) -> Result<Rc<T>, TypedOptError> {
        let value = self.resolved(name)?;
        value
            .downcast::<T>()
            .ok_or_else(|| TypedOptError::TypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
                actual: value.kind(),
            })
    }

    /// The conversion error stored for a declared argument.
    ///
    /// Returns [`TypedOptError::NotDeclared`] for unknown names and `None`
    /// when the argument is fine (or simply not given).
    pub fn error_for_typed_opt(&self, name: &str) -> Option<TypedOptError> {
        match self.argument(name) {
            None => Some(TypedOptError::NotDeclared(name.to_string())),
            Some(argument) => argument.error().map(|e| TypedOptError::Invalid {
                name: name.to_string(),
                source: e.clone(),
            }),
        }
    }

    /// Prints a `[Debug]` line when `-d` was given.
    pub fn log(&self, message: impl fmt::Display) {
        if self.debug_mode {
            self.session.sink.print(&format!("[Debug] {}\n", message));
        }
    }

    /// Prints through the dispatcher's output sink.
    pub fn print(&self, text: &str) {
        self.session.sink.print(text);
    }

    /// The complete raw argument list shared by all nesting levels.
    pub fn args(&self) -> &[String] {
        &self.session.args
    }

    /// Index of this command's name in [`args`](Self::args).
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn executable_name(&self) -> &str {
        &self.session.executable
    }

    pub(crate) fn session(&self) -> &Session {
        &self.session
    }

    fn argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.iter().find(|a| a.name() == name)
    }

    fn resolved(&self, name: &str) -> Result<&Value, TypedOptError> {
        let argument = self
            .argument(name)
            .ok_or_else(|| TypedOptError::NotDeclared(name.to_string()))?;

        if let Some(e) = argument.error() {
            return Err(TypedOptError::Invalid {
                name: name.to_string(),
                source: e.clone(),
            });
        }

        argument
            .value()
            .ok_or_else(|| TypedOptError::NotSet(name.to_string()))
    }
}

impl fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("debug_mode", &self.debug_mode)
            .field("verbose_mode", &self.verbose_mode)
            .field("parsed", &self.parsed)
            .field("arguments", &self.arguments)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

//! Command declarations: help metadata, handlers and the wrapper that binds
//! them together for registration.

use std::fmt;

use serde::Serialize;

use crate::argument::Argument;
use crate::invocation::Invocation;

/// Static help metadata for a command.
///
/// Only `name` is required. `arguments` is free text shown after the name in
/// usage lines; by convention `<required> [optional]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandDescriptor {
    pub name: String,
    pub arguments: String,
    pub short_description: String,
    pub long_description: String,
    pub examples: Vec<String>,
}

impl CommandDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn arguments(mut self, usage: impl Into<String>) -> Self {
        self.arguments = usage.into();
        self
    }

    /// One-liner shown in the general help listing.
    pub fn short_description(mut self, text: impl Into<String>) -> Self {
        self.short_description = text.into();
        self
    }

    /// Shown in command specific help.
    pub fn long_description(mut self, text: impl Into<String>) -> Self {
        self.long_description = text.into();
        self
    }

    /// Adds an example line (everything after the command name).
    pub fn example(mut self, line: impl Into<String>) -> Self {
        self.examples.push(line.into());
        self
    }

    /// `"name usage"`, the first column of the general help listing.
    pub fn usage_line(&self) -> String {
        format!("{} {}", self.name, self.arguments)
    }
}

/// The result type for handlers and validators.
pub type HandlerResult = Result<(), anyhow::Error>;

/// Trait for command handlers.
///
/// Handlers take `&mut self`, so they may keep state between invocations.
///
/// # Example
///
/// ```rust
/// use commandeer::{Handler, HandlerResult, Invocation};
///
/// struct Counter { runs: u32 }
///
/// impl Handler for Counter {
///     fn execute(&mut self, ctx: &Invocation<'_>) -> HandlerResult {
///         self.runs += 1;
///         ctx.log(format!("run #{}", self.runs));
///         Ok(())
///     }
/// }
/// ```
pub trait Handler {
    fn execute(&mut self, ctx: &Invocation<'_>) -> HandlerResult;
}

/// Adapts an `FnMut` closure into a [`Handler`].
pub struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F>
where
    F: FnMut(&Invocation<'_>) -> HandlerResult,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Handler for FnHandler<F>
where
    F: FnMut(&Invocation<'_>) -> HandlerResult,
{
    fn execute(&mut self, ctx: &Invocation<'_>) -> HandlerResult {
        (self.f)(ctx)
    }
}

/// Pre-execution check. An error is treated like a fatal argument failure.
pub type Validator = Box<dyn Fn(&Invocation<'_>) -> HandlerResult>;

/// A registered command: metadata, handler, declared arguments and an
/// optional validator.
pub struct CommandWrapper {
    pub(crate) descriptor: CommandDescriptor,
    pub(crate) handler: Box<dyn Handler>,
    pub(crate) arguments: Vec<Argument>,
    pub(crate) validator: Option<Validator>,
}

impl CommandWrapper {
    pub fn new<H: Handler + 'static>(descriptor: CommandDescriptor, handler: H) -> Self {
        Self {
            descriptor,
            handler: Box::new(handler),
            arguments: Vec::new(),
            validator: None,
        }
    }

    /// Creates a wrapper around a closure handler.
    pub fn from_fn<F>(descriptor: CommandDescriptor, f: F) -> Self
    where
        F: FnMut(&Invocation<'_>) -> HandlerResult + 'static,
    {
        Self::new(descriptor, FnHandler::new(f))
    }

    /// Declares a typed `--name=value` argument.
    pub fn argument(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn validator<F>(mut self, f: F) -> Self
    where
        F: Fn(&Invocation<'_>) -> HandlerResult + 'static,
    {
        self.validator = Some(Box::new(f));
        self
    }

    pub fn describe(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn has_validator(&self) -> bool {
        self.validator.is_some()
    }
}

impl fmt::Debug for CommandWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandWrapper")
            .field("descriptor", &self.descriptor)
            .field("arguments", &self.arguments)
            .field("has_validator", &self.validator.is_some())
            .finish_non_exhaustive()
    }
}

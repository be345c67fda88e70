//! Command lookup, execution and help.
//!
//! A [`Dispatcher`] reads the command name at position `depth` of the shared
//! raw argument list, binds the command's declared arguments, runs the
//! optional validator and finally the handler.
//!
//! ```text
//! lookup ── miss ──→ "Command not found" + general help
//!   │
//!   hit
//!   ↓
//! bind arguments ── fatal ──┐
//!   ↓                       │
//! validator ─────── error ──┤
//!   ↓                       ├─→ "[E] message" + command help
//! handler ── error/panic ───┘
//! ```
//!
//! Nothing that happens inside a command escapes [`Dispatcher::execute`],
//! panics included.
//!
//! # Nesting
//!
//! A handler can route sub-commands by building a nested dispatcher, which
//! shares the argument list and output sink and starts one token later.
//! Returning [`Outcome::into_result`] from the handler makes an aborted
//! sub-command abort the outer command too, without printing it twice:
//!
//! ```rust
//! use commandeer::{CaptureSink, CommandDescriptor, CommandWrapper, Dispatcher, Outcome};
//!
//! let sink = CaptureSink::new();
//! let mut app = Dispatcher::builder()
//!     .args(["remote", "add", "origin"])
//!     .executable_name("git")
//!     .sink(sink.clone())
//!     .build();
//!
//! app.register(|_exe| {
//!     CommandWrapper::from_fn(CommandDescriptor::new("remote").arguments("<action>"), |ctx| {
//!         let mut remote = Dispatcher::nested(ctx);
//!         remote.register(|_exe| {
//!             CommandWrapper::from_fn(CommandDescriptor::new("add").arguments("<name>"), |ctx| {
//!                 ctx.print(&format!("added {}\n", ctx.arg(0)));
//!                 Ok(())
//!             })
//!         })?;
//!         remote.execute().into_result()
//!     })
//! })
//! .unwrap();
//!
//! assert_eq!(app.execute(), Outcome::Handled);
//! assert_eq!(sink.contents(), "added origin\n");
//! ```

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use tracing::debug;

use crate::command::{CommandWrapper, HandlerResult};
use crate::convert::{ConverterRegistry, Value};
use crate::error::{CommandAbort, ConvertError, NestedAbort, RegistrationError};
use crate::help::{render_command_help, render_help, CommandHelpData, HelpData, HelpEntry};
use crate::invocation::{Invocation, ParsedArgs, Session};
use crate::output::{resolve_executable_name, LineSink, StdoutSink};

/// What [`Dispatcher::execute`] ended up doing.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The handler ran and returned normally.
    Handled,
    /// No command matched; general or command help was printed.
    Help,
    /// The command failed; a diagnostic and command help were printed.
    Aborted,
}

impl Outcome {
    pub fn is_aborted(&self) -> bool {
        matches!(self, Outcome::Aborted)
    }

    /// Handler result for a nested dispatch.
    ///
    /// `Aborted` becomes a [`NestedAbort`] error, which the outer dispatcher
    /// reports as `Aborted` without printing a second diagnostic.
    pub fn into_result(self) -> HandlerResult {
        if self.is_aborted() {
            Err(NestedAbort.into())
        } else {
            Ok(())
        }
    }
}

/// Builder for a top-level [`Dispatcher`].
#[derive(Default)]
pub struct DispatcherBuilder {
    args: Option<Vec<String>>,
    depth: usize,
    sink: Option<Rc<dyn LineSink>>,
    executable: Option<String>,
    converters: Option<ConverterRegistry>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw argument list, without the program name.
    ///
    /// Defaults to the process arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Index of the command name in the argument list. Defaults to 0.
    pub fn depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Where help and diagnostics are printed. Defaults to [`StdoutSink`].
    pub fn sink<S: LineSink + 'static>(mut self, sink: S) -> Self {
        self.sink = Some(Rc::new(sink));
        self
    }

    /// Program name used in usage lines. Defaults to the running
    /// executable's file name.
    pub fn executable_name(mut self, name: impl Into<String>) -> Self {
        self.executable = Some(name.into());
        self
    }

    /// Replaces the converter registry (built-ins by default).
    pub fn converters(mut self, registry: ConverterRegistry) -> Self {
        self.converters = Some(registry);
        self
    }

    /// Adds a converter to the registry.
    pub fn converter<F>(mut self, name: impl Into<String>, converter: F) -> Self
    where
        F: Fn(&str) -> Result<Value, ConvertError> + 'static,
    {
        self.converters
            .get_or_insert_with(ConverterRegistry::new)
            .register(name, converter);
        self
    }

    pub fn build(self) -> Dispatcher {
        let args = self
            .args
            .unwrap_or_else(|| std::env::args().skip(1).collect());
        let session = Session {
            args: Rc::from(args),
            sink: self.sink.unwrap_or_else(|| Rc::new(StdoutSink)),
            executable: Rc::from(self.executable.unwrap_or_else(resolve_executable_name)),
            converters: Rc::new(self.converters.unwrap_or_default()),
        };
        Dispatcher::from_session(session, self.depth)
    }
}

/// Name-indexed command registry for one nesting level.
pub struct Dispatcher {
    commands: BTreeMap<String, CommandWrapper>,
    depth: usize,
    max_usage_width: usize,
    session: Session,
}

impl Dispatcher {
    /// A top-level dispatcher over the process arguments.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// A dispatcher for the sub-commands of the command being invoked.
    ///
    /// It shares the argument list, sink, executable name and converters
    /// of `ctx`, and reads its command name one token after `ctx`'s.
    pub fn nested(ctx: &Invocation<'_>) -> Self {
        Self::from_session(ctx.session().clone(), ctx.depth() + 1)
    }

    fn from_session(session: Session, depth: usize) -> Self {
        Self {
            commands: BTreeMap::new(),
            depth,
            max_usage_width: 0,
            session,
        }
    }

    /// Registers the command produced by `build`.
    ///
    /// `build` receives the executable name. A command with the same name as
    /// an existing one replaces it.
    pub fn register<F>(&mut self, build: F) -> Result<(), RegistrationError>
    where
        F: FnOnce(&str) -> CommandWrapper,
    {
        let wrapper = build(&self.session.executable);
        let name = wrapper.name().to_string();

        if name.is_empty() {
            return Err(RegistrationError::EmptyName);
        }

        if let Some(argument) = wrapper
            .arguments()
            .iter()
            .find(|a| !self.session.converters.contains(a.type_name()))
        {
            return Err(RegistrationError::UnknownType {
                command: name,
                argument: argument.name().to_string(),
                type_name: argument.type_name().to_string(),
            });
        }

        debug!(command = %name, depth = self.depth, "registered command");
        self.commands.insert(name, wrapper);
        self.max_usage_width = self
            .commands
            .values()
            .map(|c| c.describe().usage_line().chars().count())
            .max()
            .unwrap_or(0);

        Ok(())
    }

    /// Runs the command named at `depth`, or prints help.
    pub fn execute(&mut self) -> Outcome {
        let args = Rc::clone(&self.session.args);
        let name = token(&args, self.depth);

        let Some(wrapper) = self.commands.get_mut(name) else {
            debug!(command = name, depth = self.depth, "no matching command");
            if name != "help" && !name.is_empty() {
                self.session
                    .sink
                    .print(&format!("Command not found: {}\n", name));
            }
            self.help();
            return Outcome::Help;
        };

        debug!(command = name, depth = self.depth, "dispatching command");
        match invoke(wrapper, &self.session, self.depth) {
            Ok(()) => Outcome::Handled,
            Err(CommandAbort::Nested) => {
                debug!(command = name, depth = self.depth, "sub-command aborted");
                Outcome::Aborted
            }
            Err(abort) => {
                tracing::warn!(command = name, error = %abort, "command aborted");
                self.session.sink.print(&format!("[E] {}\n\n", abort));
                self.command_help(name);
                Outcome::Aborted
            }
        }
    }

    /// Prints the general listing, or command help for `help <name>`.
    pub fn help(&self) {
        let args = &self.session.args;
        let topic = token(args, self.depth + 1);
        if token(args, self.depth) == "help" && !topic.is_empty() {
            self.command_help(topic);
            return;
        }
        self.session.sink.print(&render_help(&self.help_data()));
    }

    /// Prints help for one command. Unknown names fall back to the listing.
    pub fn command_help(&self, name: &str) {
        match self.command_help_data(name) {
            Some(data) => self.session.sink.print(&render_command_help(&data)),
            None => {
                self.session
                    .sink
                    .print(&format!("Command not found: {}\n", name));
                self.session.sink.print(&render_help(&self.help_data()));
            }
        }
    }

    /// The general listing model, sorted by command name.
    pub fn help_data(&self) -> HelpData {
        HelpData {
            width: self.max_usage_width,
            entries: self
                .commands
                .values()
                .map(|c| HelpEntry {
                    usage: c.describe().usage_line(),
                    description: c.describe().short_description.clone(),
                })
                .collect(),
        }
    }

    pub fn command_help_data(&self, name: &str) -> Option<CommandHelpData> {
        let command = self.commands.get(name)?;
        let descriptor = command.describe();
        let prefix = self.invocation_prefix(name);

        Some(CommandHelpData {
            usage: format!("{} {}", prefix, descriptor.arguments),
            long_description: descriptor.long_description.clone(),
            arguments: command.arguments().iter().map(|a| a.help()).collect(),
            examples: descriptor
                .examples
                .iter()
                .map(|line| format!("{} {}", prefix, line))
                .collect(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&CommandWrapper> {
        self.commands.get(name)
    }

    /// Registered command names, sorted.
    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn max_usage_width(&self) -> usize {
        self.max_usage_width
    }

    pub fn executable_name(&self) -> &str {
        &self.session.executable
    }

    /// `"<exe> [<outer tokens> ]<name>"`
    fn invocation_prefix(&self, name: &str) -> String {
        let args = &self.session.args;
        let outer = &args[..self.depth.min(args.len())];
        if outer.is_empty() {
            format!("{} {}", self.session.executable, name)
        } else {
            format!("{} {} {}", self.session.executable, outer.join(" "), name)
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .field("depth", &self.depth)
            .field("max_usage_width", &self.max_usage_width)
            .field("executable", &self.session.executable)
            .finish_non_exhaustive()
    }
}

fn token(args: &[String], index: usize) -> &str {
    args.get(index).map(String::as_str).unwrap_or("")
}

/// Binding, validation and handler execution for one command.
///
/// A panic anywhere in the three steps (a custom converter, the validator or
/// the handler) becomes [`CommandAbort::Panic`].
fn invoke(wrapper: &mut CommandWrapper, session: &Session, depth: usize) -> Result<(), CommandAbort> {
    let tokens = &session.args[depth.min(session.args.len())..];

    let CommandWrapper {
        handler,
        arguments,
        validator,
        ..
    } = wrapper;

    let run = || -> Result<(), CommandAbort> {
        let parsed = ParsedArgs::parse(tokens);
        parsed.bind(arguments, &session.converters, session.sink.as_ref())?;
        let ctx = Invocation::with_session(parsed, arguments.as_slice(), depth, session.clone());

        if let Some(validator) = validator.as_deref() {
            validator(&ctx).map_err(CommandAbort::Validation)?;
        }

        handler.execute(&ctx).map_err(|e| {
            if e.is::<NestedAbort>() {
                CommandAbort::Nested
            } else {
                CommandAbort::Handler(e)
            }
        })
    };

    panic::catch_unwind(AssertUnwindSafe(run))
        .unwrap_or_else(|payload| Err(CommandAbort::Panic(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "command panicked".to_string()
    }
}

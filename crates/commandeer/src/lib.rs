//! Name-based command dispatch with typed options and generated help.
//!
//! `commandeer` routes a flat argument list to a registered handler by name,
//! tokenizes the remaining arguments into flags, options and positional
//! values, converts declared options to typed values and renders usage help
//! from declarative metadata.
//!
//! # Features
//!
//! - **Command routing**: map command names to handlers, nest dispatchers for
//!   sub-commands over the same argument list
//! - **Permissive tokenizer**: `--key=value`, `--flag`, `-abc` clusters and
//!   positional arguments in any order
//! - **Typed arguments**: pluggable converters (`String`, `Int64`, `Uint64`,
//!   `StringList`, `FilePath` built in)
//! - **Failure containment**: invalid required arguments, validator errors,
//!   handler errors and panics all end in a diagnostic plus command help,
//!   never in a crashed process
//! - **Generated help**: aligned command listing and per-command usage
//!
//! # Example
//!
//! ```rust
//! use commandeer::{Argument, CaptureSink, CommandDescriptor, CommandWrapper, Dispatcher, Outcome};
//!
//! let sink = CaptureSink::new();
//! let mut app = Dispatcher::builder()
//!     .args(["greet", "--times=2", "world"])
//!     .executable_name("hello")
//!     .sink(sink.clone())
//!     .build();
//!
//! app.register(|_exe| {
//!     let descriptor = CommandDescriptor::new("greet")
//!         .arguments("<name>")
//!         .short_description("Say hello");
//!
//!     CommandWrapper::from_fn(descriptor, |ctx| {
//!         let times: u64 = ctx.get("times").unwrap_or(1);
//!         for _ in 0..times {
//!             ctx.print(&format!("Hello, {}!\n", ctx.arg(0)));
//!         }
//!         Ok(())
//!     })
//!     .argument(Argument::optional("times", "Uint64"))
//! })
//! .unwrap();
//!
//! assert_eq!(app.execute(), Outcome::Handled);
//! assert_eq!(sink.contents(), "Hello, world!\nHello, world!\n");
//! ```

mod argument;
mod command;
mod convert;
mod dispatch;
mod error;
pub mod help;
mod invocation;
mod output;

pub use argument::{Argument, ArgumentHelp};

pub use command::{CommandDescriptor, CommandWrapper, FnHandler, Handler, HandlerResult, Validator};

pub use convert::{ConverterFn, ConverterRegistry, FromValue, Value};

pub use dispatch::{Dispatcher, DispatcherBuilder, Outcome};

pub use error::{CommandAbort, ConvertError, NestedAbort, RegistrationError, TypedOptError};

pub use invocation::{Invocation, ParsedArgs};

pub use output::{resolve_executable_name, CaptureSink, LineSink, StdoutSink};

use std::cell::Cell;
use std::rc::Rc;

use anyhow::anyhow;
use commandeer::{
    Argument, CaptureSink, CommandDescriptor, CommandWrapper, Dispatcher, Handler, HandlerResult,
    Invocation, Outcome,
};

// Simple command: records verbose mode, fails on --fail-me, panics on --panic-me.
struct MyCommand {
    called: Rc<Cell<bool>>,
}

impl Handler for MyCommand {
    fn execute(&mut self, ctx: &Invocation<'_>) -> HandlerResult {
        self.called.set(ctx.verbose_mode);

        if ctx.flag("panic-me") {
            panic!("PANIC!!! PANIC!!! PANIC!!! Calm down, please!");
        }
        if ctx.flag("fail-me") {
            return Err(anyhow!("PANIC!!! PANIC!!! PANIC!!! Calm down, please!"));
        }
        Ok(())
    }
}

// Main command that routes to its own sub-commands.
struct MyMainCommand {
    called: Rc<Cell<bool>>,
}

impl Handler for MyMainCommand {
    fn execute(&mut self, ctx: &Invocation<'_>) -> HandlerResult {
        let mut registry = Dispatcher::nested(ctx);
        let called = self.called.clone();
        registry.register(move |_exe| {
            CommandWrapper::new(
                CommandDescriptor::new("my-subcommand").short_description("This is my own SubCommand"),
                MyCommand { called },
            )
            .argument(Argument::required("level", "Uint64"))
        })?;
        registry.execute().into_result()
    }
}

struct Harness {
    sink: CaptureSink,
    called: Rc<Cell<bool>>,
    registry: Dispatcher,
}

impl Harness {
    fn new(args: &[&str]) -> Self {
        let sink = CaptureSink::new();
        let registry = Dispatcher::builder()
            .args(args.iter().copied())
            .executable_name("my-executable")
            .sink(sink.clone())
            .build();
        Self {
            sink,
            called: Rc::new(Cell::new(false)),
            registry,
        }
    }

    fn with_my_command(mut self) -> Self {
        let called = self.called.clone();
        self.registry
            .register(move |_exe| {
                CommandWrapper::new(
                    CommandDescriptor::new("my-command")
                        .short_description("This is my own command")
                        .long_description("This is a very long\ndescription about this command.")
                        .arguments("<filename> [optional-argument]")
                        .example("test.txt")
                        .example("test.txt copy")
                        .example("test.txt move"),
                    MyCommand { called },
                )
            })
            .unwrap();
        self
    }

    fn with_main_command(mut self) -> Self {
        let called = self.called.clone();
        self.registry
            .register(move |_exe| {
                CommandWrapper::new(
                    CommandDescriptor::new("my-command")
                        .short_description("This is my own MainCommand")
                        .arguments("<subcommand>"),
                    MyMainCommand { called },
                )
            })
            .unwrap();
        self
    }

    fn run(mut self) -> (Outcome, String, bool) {
        let outcome = self.registry.execute();
        (outcome, self.sink.contents(), self.called.get())
    }
}

#[test]
fn test_no_command_prints_help() {
    let (outcome, output, _) = Harness::new(&[]).run();
    assert_eq!(outcome, Outcome::Help);
    assert_eq!(
        output,
        "help [command]   Display this help or a command specific help\n"
    );
}

#[test]
fn test_help_command_prints_help() {
    let (outcome, output, _) = Harness::new(&["help"]).run();
    assert_eq!(outcome, Outcome::Help);
    assert_eq!(
        output,
        "help [command]   Display this help or a command specific help\n"
    );
}

#[test]
fn test_unknown_command() {
    let (outcome, output, _) = Harness::new(&["nope"]).run();
    assert_eq!(outcome, Outcome::Help);
    assert_eq!(
        output,
        "Command not found: nope\nhelp [command]   Display this help or a command specific help\n"
    );
}

#[test]
fn test_listing_with_registered_command() {
    let (_, output, called) = Harness::new(&[]).with_my_command().run();
    let expected = "\
my-command <filename> [optional-argument]   This is my own command
help [command]                              Display this help or a command specific help
";
    assert_eq!(output, expected);
    assert!(!called);
}

#[test]
fn test_listing_is_sorted_and_aligned() {
    let sink = CaptureSink::new();
    let mut registry = Dispatcher::builder()
        .args(Vec::<String>::new())
        .executable_name("app")
        .sink(sink.clone())
        .build();
    for (name, usage, about) in [
        ("zip", "<dir>", "Compress a directory"),
        ("add", "<file>...", "Add files"),
        ("ls", "", "List"),
    ] {
        registry
            .register(|_| {
                CommandWrapper::from_fn(
                    CommandDescriptor::new(name)
                        .arguments(usage)
                        .short_description(about),
                    |_| Ok(()),
                )
            })
            .unwrap();
    }

    assert_eq!(registry.execute(), Outcome::Help);
    let expected = "\
add <file>...   Add files
ls              List
zip <dir>       Compress a directory
help [command]   Display this help or a command specific help
";
    assert_eq!(sink.contents(), expected);
}

#[test]
fn test_help_for_command() {
    let (outcome, output, called) = Harness::new(&["help", "my-command"])
        .with_my_command()
        .run();
    let expected = "\
Usage: my-executable my-command <filename> [optional-argument]

This is a very long
description about this command.

Examples:
  my-executable my-command test.txt
  my-executable my-command test.txt copy
  my-executable my-command test.txt move
";
    assert_eq!(outcome, Outcome::Help);
    assert_eq!(output, expected);
    assert!(!called);
}

#[test]
fn test_help_for_unknown_command_falls_back_to_listing() {
    let (_, output, _) = Harness::new(&["help", "missing"]).with_my_command().run();
    assert!(output.starts_with("Command not found: missing\n"));
    assert!(output.contains("my-command <filename> [optional-argument]"));
}

#[test]
fn test_call_command() {
    let (outcome, output, called) = Harness::new(&["my-command", "-v"]).with_my_command().run();
    assert_eq!(outcome, Outcome::Handled);
    assert!(called, "command should be called with verbose mode");
    assert_eq!(output, "");
}

#[test]
fn test_main_and_subcommand_listing_has_no_subcommands() {
    let (_, output, _) = Harness::new(&[]).with_main_command().run();
    assert!(output.contains("my-command <subcommand>"));
    assert!(!output.contains("my-subcommand"));
}

#[test]
fn test_main_and_subcommand_help_for_main() {
    let (_, output, _) = Harness::new(&["help", "my-command"])
        .with_main_command()
        .run();
    assert_eq!(output, "Usage: my-executable my-command <subcommand>\n");
}

#[test]
fn test_main_without_subcommand_lists_subcommands() {
    let (outcome, output, _) = Harness::new(&["my-command"]).with_main_command().run();
    let expected = "\
my-subcommand    This is my own SubCommand
help [command]   Display this help or a command specific help
";
    assert_eq!(outcome, Outcome::Handled);
    assert_eq!(output, expected);
}

#[test]
fn test_main_help_lists_subcommands() {
    let (_, output, _) = Harness::new(&["my-command", "help"])
        .with_main_command()
        .run();
    assert!(output.contains("my-subcommand"));
    assert!(!output.contains("my-command"));
}

#[test]
fn test_main_help_for_subcommand_includes_outer_prefix() {
    let (_, output, _) = Harness::new(&["my-command", "help", "my-subcommand"])
        .with_main_command()
        .run();
    assert_eq!(
        output,
        "Usage: my-executable my-command my-subcommand \n  --level=Uint64 <required>\n"
    );
}

#[test]
fn test_subcommand_runs_with_own_flags() {
    let (outcome, output, called) = Harness::new(&["my-command", "my-subcommand", "-v"])
        .with_main_command()
        .run();
    assert_eq!(outcome, Outcome::Handled);
    assert!(called);
    assert_eq!(output, "");
}

#[test]
fn test_subcommand_failure_is_contained_at_its_level() {
    let (outcome, output, called) =
        Harness::new(&["my-command", "my-subcommand", "--level=-1"])
            .with_main_command()
            .run();
    let expected = "\
[E] Invalid argument: --level=-1 [invalid digit found in string]

Usage: my-executable my-command my-subcommand \n  --level=Uint64 <required>
";
    // Reported once, by the inner dispatcher; the outer one only aborts.
    assert_eq!(outcome, Outcome::Aborted);
    assert_eq!(output, expected);
    assert!(!called);
}

#[test]
fn test_handler_error_prints_diagnostic_and_help() {
    let (outcome, output, called) = Harness::new(&["my-command", "-v", "--fail-me"])
        .with_my_command()
        .run();
    assert_eq!(outcome, Outcome::Aborted);
    assert!(output.starts_with("[E] PANIC!!! PANIC!!! PANIC!!! Calm down, please!\n\n"));
    assert!(output.contains("Usage: my-executable my-command <filename> [optional-argument]"));
    assert!(called, "handler should have run before failing");
}

#[test]
fn test_handler_panic_is_contained() {
    let (outcome, output, called) = Harness::new(&["my-command", "-v", "--panic-me"])
        .with_my_command()
        .run();
    assert_eq!(outcome, Outcome::Aborted);
    assert!(output.contains("[E] PANIC!!! PANIC!!! PANIC!!! Calm down, please!"));
    assert!(output.contains("Usage: my-executable my-command"));
    assert!(called);
}

fn counting_command(
    ran: Rc<Cell<u32>>,
    argument: Argument,
) -> impl FnOnce(&str) -> CommandWrapper {
    move |_: &str| {
        CommandWrapper::from_fn(
            CommandDescriptor::new("count").arguments("<n>"),
            move |_ctx| {
                ran.set(ran.get() + 1);
                Ok(())
            },
        )
        .argument(argument)
    }
}

#[test]
fn test_fatal_argument_shows_command_help_instead_of_running() {
    let sink = CaptureSink::new();
    let ran = Rc::new(Cell::new(0));
    let mut registry = Dispatcher::builder()
        .args(["count", "--count=abc"])
        .executable_name("my-executable")
        .sink(sink.clone())
        .build();
    registry
        .register(counting_command(ran.clone(), Argument::required("count", "Int64")))
        .unwrap();

    assert_eq!(registry.execute(), Outcome::Aborted);
    assert_eq!(ran.get(), 0);
    assert_eq!(
        sink.contents(),
        "[E] Invalid argument: --count=abc [invalid digit found in string]\n\n\
         Usage: my-executable count <n>\n  --count=Int64 <required>\n"
    );
}

#[test]
fn test_optional_argument_failure_warns_and_runs() {
    let sink = CaptureSink::new();
    let ran = Rc::new(Cell::new(0));
    let mut registry = Dispatcher::builder()
        .args(["count", "--count=abc"])
        .executable_name("my-executable")
        .sink(sink.clone())
        .build();
    registry
        .register(counting_command(ran.clone(), Argument::optional("count", "Int64")))
        .unwrap();

    assert_eq!(registry.execute(), Outcome::Handled);
    assert_eq!(ran.get(), 1);
    assert_eq!(
        sink.contents(),
        "Invalid argument: --count=abc [invalid digit found in string]\n"
    );
}

#[test]
fn test_validator_failure_is_contained() {
    let sink = CaptureSink::new();
    let ran = Rc::new(Cell::new(false));
    let ran_in_handler = ran.clone();
    let mut registry = Dispatcher::builder()
        .args(["open"])
        .executable_name("app")
        .sink(sink.clone())
        .build();
    registry
        .register(move |_| {
            CommandWrapper::from_fn(
                CommandDescriptor::new("open").arguments("<file>"),
                move |_| {
                    ran_in_handler.set(true);
                    Ok(())
                },
            )
            .validator(|ctx| {
                if ctx.arg(0).is_empty() {
                    anyhow::bail!("missing <file>");
                }
                Ok(())
            })
        })
        .unwrap();

    assert_eq!(registry.execute(), Outcome::Aborted);
    assert!(!ran.get());
    assert_eq!(sink.contents(), "[E] missing <file>\n\nUsage: app open <file>\n");
}

#[test]
fn test_validator_success_runs_handler() {
    let sink = CaptureSink::new();
    let mut registry = Dispatcher::builder()
        .args(["open", "notes.txt"])
        .executable_name("app")
        .sink(sink.clone())
        .build();
    registry
        .register(|_| {
            CommandWrapper::from_fn(CommandDescriptor::new("open"), |ctx| {
                ctx.print(&format!("opening {}\n", ctx.arg(0)));
                Ok(())
            })
            .validator(|ctx| {
                anyhow::ensure!(!ctx.arg(0).is_empty(), "missing <file>");
                Ok(())
            })
        })
        .unwrap();

    assert_eq!(registry.execute(), Outcome::Handled);
    assert_eq!(sink.contents(), "opening notes.txt\n");
}

#[test]
fn test_argument_lines_in_command_help() {
    let sink = CaptureSink::new();
    let mut registry = Dispatcher::builder()
        .args(["help", "copy"])
        .executable_name("app")
        .sink(sink.clone())
        .build();
    registry
        .register(|_| {
            CommandWrapper::from_fn(
                CommandDescriptor::new("copy")
                    .arguments("<src> <dst>")
                    .example("a b"),
                |_| Ok(()),
            )
            .argument(Argument::required("mode", "Uint64"))
            .argument(Argument::optional("tags", "StringList"))
        })
        .unwrap();

    assert_eq!(registry.execute(), Outcome::Help);
    let expected = "\
Usage: app copy <src> <dst>
  --mode=Uint64 <required>
  --tags=StringList [optional]

Examples:
  app copy a b
";
    assert_eq!(sink.contents(), expected);
}

#[test]
fn test_typed_values_reach_handler() {
    let sink = CaptureSink::new();
    let mut registry = Dispatcher::builder()
        .args(["tag", "--list=one,two,three", "--limit=2", "-d"])
        .executable_name("app")
        .sink(sink.clone())
        .build();
    registry
        .register(|_| {
            CommandWrapper::from_fn(CommandDescriptor::new("tag"), |ctx| {
                let list: Vec<String> = ctx.get("list")?;
                let limit: u64 = ctx.get("limit")?;
                ctx.log(format!("limit is {}", limit));
                let kept = list.into_iter().take(limit as usize).collect::<Vec<_>>();
                ctx.print(&format!("{}\n", kept.join(" ")));
                Ok(())
            })
            .argument(Argument::optional("list", "StringList"))
            .argument(Argument::required("limit", "Uint64"))
        })
        .unwrap();

    assert_eq!(registry.execute(), Outcome::Handled);
    assert_eq!(sink.contents(), "[Debug] limit is 2\none two\n");
}

#[test]
fn test_help_data_serializes() {
    let registry = Harness::new(&[]).with_my_command().registry;
    let data = registry.command_help_data("my-command").unwrap();
    let json = serde_json::to_value(&data).unwrap();
    assert_eq!(
        json["usage"],
        "my-executable my-command <filename> [optional-argument]"
    );
    assert_eq!(json["examples"][1], "my-executable my-command test.txt copy");

    let listing = serde_json::to_value(registry.help_data()).unwrap();
    assert_eq!(listing["width"], 41);
    assert_eq!(listing["entries"][0]["description"], "This is my own command");
}

//! Commands of the `notes` example.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::{bail, ensure, Context};
use commandeer::{
    Argument, CommandDescriptor, CommandWrapper, Dispatcher, Handler, HandlerResult, Invocation,
    RegistrationError,
};

pub fn register_all(app: &mut Dispatcher) -> Result<(), RegistrationError> {
    app.register(echo)?;
    app.register(sum)?;
    app.register(check)?;
    app.register(|_exe| {
        let descriptor = CommandDescriptor::new("remote")
            .arguments("<add|list|remove>")
            .short_description("Manage remotes for this session")
            .long_description("Remotes live in memory and start with `origin`.");
        CommandWrapper::new(descriptor, Remote::default())
    })?;
    Ok(())
}

fn echo(_exe: &str) -> CommandWrapper {
    let descriptor = CommandDescriptor::new("echo")
        .arguments("<words>...")
        .short_description("Print the given words")
        .long_description("Prints the positional arguments separated by spaces.")
        .example("hello world")
        .example("--upper --repeat=3 hey");

    CommandWrapper::from_fn(descriptor, |ctx| {
        let mut line = ctx.parsed().positional().join(" ");
        if ctx.flag("upper") {
            line = line.to_uppercase();
        }
        let repeat: u64 = ctx.get("repeat").unwrap_or(1);
        ctx.log(format!("repeating {} time(s)", repeat));
        for _ in 0..repeat {
            ctx.print(&format!("{}\n", line));
        }
        Ok(())
    })
    .argument(Argument::optional("repeat", "Uint64"))
}

fn sum(_exe: &str) -> CommandWrapper {
    let descriptor = CommandDescriptor::new("sum")
        .arguments("<number>...")
        .short_description("Add integers")
        .example("1 2 3")
        .example("--start=-10 4");

    CommandWrapper::from_fn(descriptor, |ctx| {
        let mut total: i64 = ctx.get("start").unwrap_or(0);
        for raw in ctx.parsed().positional() {
            let n: i64 = raw
                .parse()
                .with_context(|| format!("not an integer: {}", raw))?;
            total = total.checked_add(n).context("sum overflows")?;
        }
        ctx.print(&format!("{}\n", total));
        Ok(())
    })
    .argument(Argument::required("start", "Int64"))
    .validator(|ctx| {
        ensure!(!ctx.arg(0).is_empty(), "nothing to add");
        Ok(())
    })
}

fn check(_exe: &str) -> CommandWrapper {
    let descriptor = CommandDescriptor::new("check")
        .arguments("--file=<path>")
        .short_description("Check that a file exists")
        .example("--file=Cargo.toml");

    CommandWrapper::from_fn(descriptor, |ctx| {
        let path: String = ctx.get("file")?;
        if ctx.verbose_mode {
            ctx.print(&format!("checked {}\n", path));
        }
        ctx.print("ok\n");
        Ok(())
    })
    .argument(Argument::required("file", "FilePath"))
}

type Remotes = Rc<RefCell<BTreeMap<String, String>>>;

/// `remote` routes to its own sub-commands through a nested dispatcher.
struct Remote {
    remotes: Remotes,
}

impl Default for Remote {
    fn default() -> Self {
        let mut remotes = BTreeMap::new();
        remotes.insert("origin".to_string(), "https://example.com/notes.git".to_string());
        Self {
            remotes: Rc::new(RefCell::new(remotes)),
        }
    }
}

impl Handler for Remote {
    fn execute(&mut self, ctx: &Invocation<'_>) -> HandlerResult {
        let mut sub = Dispatcher::nested(ctx);

        let remotes = Rc::clone(&self.remotes);
        sub.register(move |_exe| {
            let descriptor = CommandDescriptor::new("add")
                .arguments("<name>")
                .short_description("Add a remote")
                .example("upstream --url=https://example.com/upstream.git");
            CommandWrapper::from_fn(descriptor, move |ctx| {
                let name = ctx.arg(0);
                let url: String = ctx.get("url")?;
                if remotes.borrow().contains_key(name) {
                    bail!("remote {} already exists", name);
                }
                remotes.borrow_mut().insert(name.to_string(), url);
                ctx.log(format!("added {}", name));
                Ok(())
            })
            .argument(Argument::required("url", "String"))
            .validator(|ctx| {
                ensure!(!ctx.arg(0).is_empty(), "missing <name>");
                Ok(())
            })
        })?;

        let remotes = Rc::clone(&self.remotes);
        sub.register(move |_exe| {
            CommandWrapper::from_fn(
                CommandDescriptor::new("list").short_description("List remotes"),
                move |ctx| {
                    for (name, url) in remotes.borrow().iter() {
                        if ctx.verbose_mode {
                            ctx.print(&format!("{}\t{}\n", name, url));
                        } else {
                            ctx.print(&format!("{}\n", name));
                        }
                    }
                    Ok(())
                },
            )
        })?;

        let remotes = Rc::clone(&self.remotes);
        sub.register(move |_exe| {
            CommandWrapper::from_fn(
                CommandDescriptor::new("remove")
                    .arguments("<name>")
                    .short_description("Remove a remote"),
                move |ctx| {
                    let name = ctx.arg(0);
                    remotes
                        .borrow_mut()
                        .remove(name)
                        .with_context(|| format!("no such remote: {}", name))?;
                    Ok(())
                },
            )
        })?;

        sub.execute().into_result()
    }
}

//! Example CLI built on `commandeer`.
//!
//! clap handles the program's own `--log` and `--version` options and hands
//! everything from the first command token on to the dispatcher untouched.
//!
//! ```text
//! notes echo --upper hello world
//! notes sum --start=10 1 2 3
//! notes remote add upstream --url=https://example.com/repo.git
//! notes help remote
//! ```

mod commands;

use std::process::ExitCode;

use clap::Parser;
use commandeer::{Dispatcher, Outcome};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "notes", version)]
#[command(about = "Example CLI for commandeer dispatch")]
#[command(disable_help_flag = true, disable_help_subcommand = true)]
struct Cli {
    /// Log filter directive, for example `debug` or `commandeer=trace`
    #[arg(long, env = "NOTES_LOG", default_value = "warn")]
    log: String,

    /// Command and its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn init_logging(directive: &str) {
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(&cli.log);
    tracing::debug!(args = ?cli.args, "starting");

    let mut app = Dispatcher::builder().args(cli.args).build();
    commands::register_all(&mut app)?;

    Ok(match app.execute() {
        Outcome::Aborted => ExitCode::FAILURE,
        Outcome::Handled | Outcome::Help => ExitCode::SUCCESS,
    })
}

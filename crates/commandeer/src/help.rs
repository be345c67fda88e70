//! Help models and their text layout.
//!
//! The dispatcher extracts a [`HelpData`] or [`CommandHelpData`] from its
//! registered commands; the functions here turn those into the exact text
//! printed to the user. Both models are `Serialize` so hosts can render them
//! differently.

use serde::Serialize;

use crate::argument::ArgumentHelp;

/// First column of the synthetic help row.
pub const HELP_USAGE: &str = "help [command]";

/// Description of the synthetic help row.
pub const HELP_DESCRIPTION: &str = "Display this help or a command specific help";

/// The general command listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HelpData {
    /// Width of the usage column: the longest `"name usage"`.
    pub width: usize,
    pub entries: Vec<HelpEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HelpEntry {
    /// `"name usage"`
    pub usage: String,
    pub description: String,
}

/// Help for a single command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandHelpData {
    /// Everything after `Usage: `.
    pub usage: String,
    pub long_description: String,
    pub arguments: Vec<ArgumentHelp>,
    /// Complete example command lines.
    pub examples: Vec<String>,
}

/// Renders the general listing, followed by the `help [command]` row.
pub fn render_help(data: &HelpData) -> String {
    let width = data.width;
    let mut out = String::new();
    for entry in &data.entries {
        out.push_str(&format!("{:<width$}   {}\n", entry.usage, entry.description));
    }
    out.push_str(&format!("{:<width$}   {}\n", HELP_USAGE, HELP_DESCRIPTION));
    out
}

/// Renders command specific help.
pub fn render_command_help(data: &CommandHelpData) -> String {
    let mut out = format!("Usage: {}\n", data.usage);

    if !data.long_description.is_empty() {
        out.push('\n');
        out.push_str(&data.long_description);
        out.push('\n');
    }

    for argument in &data.arguments {
        let tag = if argument.required {
            "<required>"
        } else {
            "[optional]"
        };
        out.push_str(&format!(
            "  --{}={} {}\n",
            argument.name, argument.type_name, tag
        ));
    }

    if !data.examples.is_empty() {
        out.push_str("\nExamples:\n");
        for line in &data.examples {
            out.push_str(&format!("  {}\n", line));
        }
    }

    out
}

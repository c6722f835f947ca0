//! Help text lookup and the localized clap command tree
//!
//! clap's built-in headings and flag descriptions are replaced by the
//! phrases in [`TRANSLATIONS`] when the command is built.

use clap::{Arg, ArgAction, Command};

/// Replacement strings for the default help phrases
pub const TRANSLATIONS: &[(&str, &str)] = &[
    ("optional arguments", "Optional arguments"),
    ("positional arguments", "Positional arguments"),
    ("show program's version number and exit", "Show this program's version and exit."),
    ("show this help message and exit", "Show this help message and exit."),
    ("usage: ", "Usage: "),
];

/// Look up the replacement for a help phrase, or return it unchanged
pub fn translate(message: &str) -> &str {
    TRANSLATIONS
        .iter()
        .find(|(from, _)| *from == message)
        .map_or(message, |&(_, to)| to)
}

/// Apply the translated headings and flags to a command and all its subcommands.
///
/// Only the root command gets the `-v/--version` flag.
pub fn localize(cmd: Command) -> Command {
    let cmd = cmd.disable_version_flag(true).arg(
        Arg::new("version")
            .short('v')
            .long("version")
            .action(ArgAction::Version)
            .help(translate("show program's version number and exit")),
    );
    localize_tree(cmd)
}

fn localize_tree(mut cmd: Command) -> Command {
    let subcommands: Vec<String> = cmd
        .get_subcommands()
        .map(|sub| sub.get_name().to_string())
        .collect();
    for name in subcommands {
        cmd = cmd.mut_subcommand(name, localize_tree);
    }

    cmd = cmd
        .disable_help_flag(true)
        .disable_help_subcommand(true)
        .help_template(template())
        .arg(
            Arg::new("help")
                .short('h')
                .long("help")
                .action(ArgAction::Help)
                .help(translate("show this help message and exit")),
        );

    let args: Vec<(String, bool)> = cmd
        .get_arguments()
        .map(|arg| (arg.get_id().to_string(), arg.is_positional()))
        .collect();
    for (id, positional) in args {
        let heading = if positional {
            translate("positional arguments")
        } else {
            translate("optional arguments")
        };
        cmd = cmd.mut_arg(id, |arg| arg.help_heading(heading));
    }
    cmd
}

fn template() -> String {
    format!(
        "{{about-with-newline}}\n{}{{usage}}\n\n{{all-args}}{{after-help}}",
        translate("usage: ")
    )
}

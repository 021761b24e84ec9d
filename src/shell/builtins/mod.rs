//! Psh builtins
//!
//! This module includes the implementations of the shell builtin commands.
//! Where possible the commands conform to their standard Bash counterparts.

use self::prelude::*;

use self::dirs::Cd;
use self::env::{Echo, Export, List, Printenv, Set, Unset};
use self::exit::Exit;
use self::help::Help;
use self::history::History;
use self::jobs::Jobs;
use self::kill::Kill;

pub mod prelude {
    pub use std::io::Write;

    pub use crate::errors::{Error, ErrorKind, Result, ResultExt};
    pub use crate::shell::Shell;
}

mod dirs;
mod env;
mod exit;
mod help;
mod history;
mod jobs;
mod kill;

const CD_NAME: &str = "cd";
const ECHO_NAME: &str = "echo";
const EXIT_NAME: &str = "exit";
const EXPORT_NAME: &str = "export";
const HELP_NAME: &str = "help";
const HISTORY_NAME: &str = "history";
const JOBS_NAME: &str = "jobs";
const KILL_NAME: &str = "kill";
const LIST_NAME: &str = "list";
const PRINTENV_NAME: &str = "printenv";
const SET_NAME: &str = "set";
const UNSET_NAME: &str = "unset";

/// Represents a Psh builtin command such as cd or help.
pub trait BuiltinCommand {
    /// The NAME of the command.
    const NAME: &'static str;
    /// The help string to display to the user.
    const HELP: &'static str;
    /// The usage string to display to the user.
    fn usage() -> String {
        Self::HELP.lines().next().unwrap_or_default().to_owned()
    }
    /// Runs the command with the given arguments in the `shell` environment.
    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], stdout: &mut dyn Write) -> Result<()>;
}

pub fn is_builtin<T: AsRef<str>>(program: T) -> bool {
    [
        CD_NAME,
        ECHO_NAME,
        EXIT_NAME,
        EXPORT_NAME,
        HELP_NAME,
        HISTORY_NAME,
        JOBS_NAME,
        KILL_NAME,
        LIST_NAME,
        PRINTENV_NAME,
        SET_NAME,
        UNSET_NAME,
    ]
    .contains(&program.as_ref())
}

/// precondition: command is a builtin.
pub fn run<S1, S2>(
    shell: &mut Shell,
    program: S1,
    args: &[S2],
    stdout: &mut dyn Write,
) -> Result<()>
where
    S1: AsRef<str>,
    S2: AsRef<str>,
{
    debug_assert!(is_builtin(&program));

    match program.as_ref() {
        CD_NAME => Cd::run(shell, args, stdout),
        ECHO_NAME => Echo::run(shell, args, stdout),
        EXIT_NAME => Exit::run(shell, args, stdout),
        EXPORT_NAME => Export::run(shell, args, stdout),
        HELP_NAME => Help::run(shell, args, stdout),
        HISTORY_NAME => History::run(shell, args, stdout),
        JOBS_NAME => Jobs::run(shell, args, stdout),
        KILL_NAME => Kill::run(shell, args, stdout),
        LIST_NAME => List::run(shell, args, stdout),
        PRINTENV_NAME => Printenv::run(shell, args, stdout),
        SET_NAME => Set::run(shell, args, stdout),
        UNSET_NAME => Unset::run(shell, args, stdout),
        other => Err(ErrorKind::CommandNotFound(other.to_string()).into()),
    }
}

/// Usage lines of every builtin, in the order `help` lists them.
fn all_usage_strings() -> Vec<String> {
    vec![
        Cd::usage(),
        Echo::usage(),
        Exit::usage(),
        Export::usage(),
        Help::usage(),
        History::usage(),
        Jobs::usage(),
        Kill::usage(),
        List::usage(),
        Printenv::usage(),
        Set::usage(),
        Unset::usage(),
    ]
}

/// Detailed help for the builtin `name`.
fn help_for(name: &str) -> Option<&'static str> {
    let help = match name {
        CD_NAME => Cd::HELP,
        ECHO_NAME => Echo::HELP,
        EXIT_NAME => Exit::HELP,
        EXPORT_NAME => Export::HELP,
        HELP_NAME => Help::HELP,
        HISTORY_NAME => History::HELP,
        JOBS_NAME => Jobs::HELP,
        KILL_NAME => Kill::HELP,
        LIST_NAME => List::HELP,
        PRINTENV_NAME => Printenv::HELP,
        SET_NAME => Set::HELP,
        UNSET_NAME => Unset::HELP,
        _ => return None,
    };
    Some(help)
}

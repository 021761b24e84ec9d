use crate::shell::builtins::{self, prelude::*};

pub struct Help;

impl builtins::BuiltinCommand for Help {
    const NAME: &'static str = builtins::HELP_NAME;

    const HELP: &'static str = "\
help: help [command ...]
    Display helpful information about builtin commands. If COMMAND is specified,
    gives detailed help on all commands matching COMMAND, otherwise a list of the
    builtins is printed.";

    fn run<T: AsRef<str>>(_shell: &mut Shell, args: &[T], stdout: &mut dyn Write) -> Result<()> {
        if args.is_empty() {
            for usage in builtins::all_usage_strings() {
                writeln!(stdout, "{}", usage)?;
            }
            return Ok(());
        }

        let mut all_invalid = true;
        for arg in args.iter().map(AsRef::as_ref) {
            if let Some(msg) = builtins::help_for(arg) {
                writeln!(stdout, "{}", msg)?;
                all_invalid = false;
            }
        }

        if all_invalid {
            let cmd = args.last().map(AsRef::as_ref).unwrap_or_default();
            return Err(Error::builtin_command(
                format!("help: no help topics match `{}'", cmd),
                1,
            ));
        }
        Ok(())
    }
}

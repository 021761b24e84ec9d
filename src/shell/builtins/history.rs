use crate::shell::builtins::{self, prelude::*};

pub struct History;

impl builtins::BuiltinCommand for History {
    const NAME: &'static str = builtins::HISTORY_NAME;

    const HELP: &'static str = "\
history: history [-c] [n]
    Display the history list with line numbers. Argument of N
    says to list only the last N lines. The `-c' option causes
    the history list to be cleared by deleting all of the entries.
    Line numbers keep counting after the list is cleared.";

    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], stdout: &mut dyn Write) -> Result<()> {
        match args.first().map(AsRef::as_ref) {
            None => write!(stdout, "{}", shell.history)?,
            Some("-c") => shell.history.clear(),
            Some(s) => match s.parse::<usize>() {
                Ok(n) => write!(stdout, "{}", shell.history.display(n))?,
                Err(_) => {
                    let msg = format!("history: {}: nonnegative numeric argument required", s);
                    return Err(Error::builtin_command(msg, 1));
                }
            },
        }
        Ok(())
    }
}

use crate::shell::builtins::{self, prelude::*};

pub struct Exit;

impl builtins::BuiltinCommand for Exit {
    const NAME: &'static str = builtins::EXIT_NAME;

    const HELP: &'static str = "\
exit: exit [n]
    Exit the shell with a status of N. If N is omitted, the exit status
    is 0.";

    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], _stdout: &mut dyn Write) -> Result<()> {
        match args.first().map(AsRef::as_ref) {
            None => {
                shell.exit(0);
                Ok(())
            }
            Some(arg) => match arg.parse::<i32>() {
                Ok(code) => {
                    shell.exit(code);
                    Ok(())
                }
                Err(_) => {
                    shell.exit(2);
                    Err(Error::builtin_command(
                        format!("exit: {}: numeric argument required", arg),
                        2,
                    ))
                }
            },
        }
    }
}

use crate::core::variables::Scope;
use crate::shell::builtins::{self, prelude::*};

pub struct Set;

impl builtins::BuiltinCommand for Set {
    const NAME: &'static str = builtins::SET_NAME;

    const HELP: &'static str = "\
set: set name=value
    Assign VALUE to the shell variable NAME. Everything after the first
    `=' is the value, spaces included. The variable is not exported.";

    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], _stdout: &mut dyn Write) -> Result<()> {
        let assignment = args
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<&str>>()
            .join(" ");
        match split_assignment(&assignment) {
            Some((name, value)) => shell.variables.set(name, value, Scope::Local),
            None => Err(Error::builtin_command(
                "set: invalid syntax, use 'set name=value'",
                2,
            )),
        }
    }
}

pub struct Export;

impl builtins::BuiltinCommand for Export {
    const NAME: &'static str = builtins::EXPORT_NAME;

    const HELP: &'static str = "\
export: export name[=value] ...
    Mark each NAME for export to the environment of subsequently executed
    commands. If VALUE is supplied, assign VALUE before exporting.";

    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], _stdout: &mut dyn Write) -> Result<()> {
        if args.is_empty() {
            return Err(Error::builtin_command(Self::usage(), 2));
        }

        let mut bad_args = Vec::new();
        for arg in args.iter().map(AsRef::as_ref) {
            if arg.contains('=') {
                match split_assignment(arg) {
                    Some((name, value)) => shell.variables.set(name, value, Scope::Exported)?,
                    None => bad_args.push(arg),
                }
            } else if arg.is_empty() {
                bad_args.push(arg);
            } else {
                shell.variables.export(arg)?;
            }
        }

        invalid_identifiers(Self::NAME, &bad_args)
    }
}

pub struct Unset;

impl builtins::BuiltinCommand for Unset {
    const NAME: &'static str = builtins::UNSET_NAME;

    const HELP: &'static str = "\
unset: unset [name ...]
    For each name, remove the corresponding variable.";

    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], _stdout: &mut dyn Write) -> Result<()> {
        let mut bad_args = Vec::new();
        for arg in args.iter().map(AsRef::as_ref) {
            if arg.is_empty() || arg.contains('=') {
                bad_args.push(arg);
            } else {
                shell.variables.remove(arg);
            }
        }

        invalid_identifiers(Self::NAME, &bad_args)
    }
}

pub struct Printenv;

impl builtins::BuiltinCommand for Printenv {
    const NAME: &'static str = builtins::PRINTENV_NAME;

    const HELP: &'static str = "\
printenv: printenv [name ...]
    Print the value of each exported variable NAME, or every exported
    variable as name=value if no NAME is given.

    Exit Status:
    Returns success unless a NAME is not an exported variable.";

    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], stdout: &mut dyn Write) -> Result<()> {
        if args.is_empty() {
            for (name, value) in shell.variables.exported() {
                writeln!(stdout, "{}={}", name, value)?;
            }
            return Ok(());
        }

        let mut all_defined = true;
        for name in args.iter().map(AsRef::as_ref) {
            match shell.variables.exported().find(|&(n, _)| n == name) {
                Some((_, value)) => writeln!(stdout, "{}", value)?,
                None => all_defined = false,
            }
        }

        if all_defined {
            Ok(())
        } else {
            // like printenv(1), a missing name only changes the status
            Err(Error::builtin_command("", 1))
        }
    }
}

pub struct List;

impl builtins::BuiltinCommand for List {
    const NAME: &'static str = builtins::LIST_NAME;

    const HELP: &'static str = "\
list: list
    Display user-defined (local) variables followed by environment
    (exported) variables.";

    fn run<T: AsRef<str>>(shell: &mut Shell, _args: &[T], stdout: &mut dyn Write) -> Result<()> {
        let (local, exported) = shell.variables.list_by_scope();

        writeln!(stdout, "User-defined variables:")?;
        for var in local {
            writeln!(stdout, "  {}", var)?;
        }
        writeln!(stdout, "\nEnvironment variables:")?;
        for var in exported {
            writeln!(stdout, "  {}", var)?;
        }
        Ok(())
    }
}

pub struct Echo;

impl builtins::BuiltinCommand for Echo {
    const NAME: &'static str = builtins::ECHO_NAME;

    const HELP: &'static str = "\
echo: echo [arg ...]
    Write the arguments, separated by single spaces, to the standard
    output. Variables have already been substituted.";

    fn run<T: AsRef<str>>(_shell: &mut Shell, args: &[T], stdout: &mut dyn Write) -> Result<()> {
        let line = args
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<&str>>()
            .join(" ");
        writeln!(stdout, "{}", line)?;
        Ok(())
    }
}

/// Splits `name=value` at the first `=`. The name must not be empty.
fn split_assignment(assignment: &str) -> Option<(&str, &str)> {
    let mut key_value = assignment.splitn(2, '=');
    match (key_value.next(), key_value.next()) {
        (Some(name), Some(value)) if !name.is_empty() => Some((name, value)),
        _ => None,
    }
}

fn invalid_identifiers(program: &str, bad_args: &[&str]) -> Result<()> {
    if bad_args.is_empty() {
        return Ok(());
    }

    let msg = bad_args
        .iter()
        .map(|arg| format!("{}: `{}': not a valid identifier", program, arg))
        .collect::<Vec<String>>()
        .join("\n");
    Err(Error::builtin_command(msg, 1))
}

use std::env;
use std::path::PathBuf;

use crate::shell::builtins::{self, prelude::*};

pub struct Cd;

impl builtins::BuiltinCommand for Cd {
    const NAME: &'static str = builtins::CD_NAME;

    const HELP: &'static str = "\
cd: cd [dir]
    Change the current directory to DIR. The home directory is the
    default DIR.";

    fn run<T: AsRef<str>>(_shell: &mut Shell, args: &[T], _stdout: &mut dyn Write) -> Result<()> {
        let dir = match args.first().map(AsRef::as_ref) {
            Some("~") | None => ::dirs::home_dir()
                .ok_or_else(|| Error::builtin_command("cd: HOME not set", 1))?,
            Some(dir) => PathBuf::from(dir),
        };

        env::set_current_dir(&dir).map_err(|e| {
            Error::builtin_command(format!("cd: {}: {}", dir.display(), e), 1)
        })?;
        Ok(())
    }
}

use log::debug;

use crate::core::job::JobId;
use crate::shell::builtins::{self, prelude::*};

pub struct Kill;

impl builtins::BuiltinCommand for Kill {
    const NAME: &'static str = builtins::KILL_NAME;

    const HELP: &'static str = "\
kill: kill <job>
    Terminate a background job.

    Send SIGKILL to the job numbered JOB, as listed by `jobs'. The
    number may be written as `%N'.

    Exit Status:
    Returns success unless JOB does not exist or cannot be killed.";

    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], stdout: &mut dyn Write) -> Result<()> {
        let arg = match args.first() {
            Some(arg) => arg.as_ref(),
            None => return Err(Error::builtin_command(Self::usage(), 2)),
        };

        let job_id = arg
            .trim_start_matches('%')
            .parse::<u32>()
            .map(JobId)
            .map_err(|_| {
                Error::builtin_command(format!("kill: {}: arguments must be job IDs", arg), 1)
            })?;

        // finished jobs must not be mistaken for live ones
        shell.check_jobs();
        match shell.job_table.terminate(job_id) {
            Ok(job) => {
                debug!("terminated {}", job);
                writeln!(stdout, "Job {} terminated.", job_id)?;
                Ok(())
            }
            Err(e) => match *e.kind() {
                ErrorKind::NoSuchJob(_) => Err(Error::builtin_command(
                    format!("kill: {}: no such job", arg),
                    1,
                )),
                _ => Err(Error::builtin_command(format!("kill: {}", e), 1)),
            },
        }
    }
}

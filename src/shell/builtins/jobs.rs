use crate::shell::builtins::{self, prelude::*};

pub struct Jobs;

impl builtins::BuiltinCommand for Jobs {
    const NAME: &'static str = builtins::JOBS_NAME;

    const HELP: &'static str = "\
jobs: jobs [-p]
    Display status of jobs.

    Lists the active background jobs as `[id] pid command'. Jobs that
    have finished are reported and removed first.

    Options:
        -p      lists process IDs only

    Exit Status:
    Returns success unless an invalid option is given.";

    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], stdout: &mut dyn Write) -> Result<()> {
        let pids_only = match args.first().map(AsRef::as_ref) {
            None => false,
            Some("-p") if args.len() == 1 => true,
            Some(_) => return Err(Error::builtin_command(Self::usage(), 2)),
        };

        shell.check_jobs();
        for job in shell.job_table.list() {
            if pids_only {
                writeln!(stdout, "{}", job.pid())?;
            } else {
                writeln!(stdout, "{}", job)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io;

    use crate::shell::builtins::BuiltinCommand;
    use crate::shell::ShellConfig;

    #[test]
    fn jobs_lists_registered_jobs() {
        let mut shell = Shell::new(ShellConfig::noninteractive()).unwrap();
        let mut stdout = Vec::new();
        Jobs::run::<&str>(&mut shell, &[], &mut stdout).unwrap();
        assert!(stdout.is_empty());

        let status = shell.execute_command_string("sleep 30 &");
        assert!(status.success());
        let pid = shell.job_table.list()[0].pid();

        let mut stdout = Vec::new();
        Jobs::run::<&str>(&mut shell, &[], &mut stdout).unwrap();
        assert_eq!(
            String::from_utf8(stdout).unwrap(),
            format!("[1] {} sleep 30\n", pid)
        );

        let mut stdout = Vec::new();
        Jobs::run(&mut shell, &["-p"], &mut stdout).unwrap();
        assert_eq!(String::from_utf8(stdout).unwrap(), format!("{}\n", pid));

        let job_id = shell.job_table.list()[0].id();
        shell.job_table.terminate(job_id).unwrap();
    }

    #[test]
    fn jobs_invalid_option() {
        let mut shell = Shell::new(ShellConfig::noninteractive()).unwrap();
        assert!(Jobs::run(&mut shell, &["-x"], &mut io::sink()).is_err());
    }
}

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::io::FromRawFd;
use std::os::unix::process::CommandExt;
use std::process::{self, Child, ExitStatus, Stdio};

use log::{debug, warn};
use nix::fcntl::OFlag;
use nix::libc;
use nix::sys::signal::{self, SigHandler, Signal};
use nix::unistd::{self, Pid};

use crate::core::job::JobId;
use crate::core::parser::Command;
use crate::errors::{Error, ErrorKind, Result, ResultExt};
use crate::shell::{builtins, Shell};
use crate::util::PshExitStatusExt;

#[derive(Debug)]
enum Stdin {
    Inherit,
    File(File),
}

#[derive(Debug)]
enum Output {
    Inherit,
    File(File),
}

impl Stdin {
    /// File redirects take precedence over the pipe.
    fn new(redirect: Option<&str>, pipe: Option<File>) -> Result<Self> {
        match (redirect, pipe) {
            (Some(path), _) => Ok(Stdin::File(
                File::open(path).chain_err(|| ErrorKind::Redirect(path.to_string()))?,
            )),
            (None, Some(pipe)) => Ok(Stdin::File(pipe)),
            (None, None) => Ok(Stdin::Inherit),
        }
    }
}

impl Output {
    /// File redirects take precedence over the pipe.
    fn new(redirect: Option<&str>, pipe: Option<File>) -> Result<Self> {
        match (redirect, pipe) {
            (Some(path), _) => Ok(Output::File(open_output(path)?)),
            (None, Some(pipe)) => Ok(Output::File(pipe)),
            (None, None) => Ok(Output::Inherit),
        }
    }
}

impl From<Stdin> for Stdio {
    fn from(stdin: Stdin) -> Self {
        match stdin {
            Stdin::Inherit => Self::inherit(),
            Stdin::File(file) => file.into(),
        }
    }
}

impl From<Output> for Stdio {
    fn from(stdout: Output) -> Self {
        match stdout {
            Output::Inherit => Self::inherit(),
            Output::File(file) => file.into(),
        }
    }
}

/// Runs `command` to completion, or launches it as a background job.
///
/// Returns the exit status of a foreground command and `None` for a background
/// one. Builtins run inside the shell unless they are part of a pipeline.
pub fn execute_command(shell: &mut Shell, command: &Command) -> Result<Option<ExitStatus>> {
    match command.pipeline {
        Some(ref second) => {
            if command.background {
                bail!(ErrorKind::PipelineInBackground);
            }
            run_pipeline(shell, command, second).map(Some)
        }
        None if builtins::is_builtin(command.program()) => {
            run_builtin_command(shell, command).map(Some)
        }
        None if command.background => run_background_command(shell, command).map(|_| None),
        None => run_foreground_command(shell, command).map(Some),
    }
}

fn run_builtin_command(shell: &mut Shell, command: &Command) -> Result<ExitStatus> {
    if command.background {
        debug!("running builtin {} in the foreground", command.program());
    }

    match command.outfile {
        Some(ref path) => {
            let mut file = open_output(path)?;
            builtins::run(shell, command.program(), command.args(), &mut file)?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            builtins::run(shell, command.program(), command.args(), &mut handle)?;
            handle.flush()?;
        }
    }
    Ok(ExitStatus::from_success())
}

fn run_foreground_command(shell: &Shell, command: &Command) -> Result<ExitStatus> {
    let stdin = Stdin::new(command.infile.as_deref(), None)?;
    let stdout = Output::new(command.outfile.as_deref(), None)?;
    let mut child = spawn(
        command.program(),
        build_process(shell, command, stdin, stdout, false),
    )?;

    let status = child.wait()?;
    debug!("{} exited with {}", command.program(), status);
    Ok(status)
}

fn run_background_command(shell: &mut Shell, command: &Command) -> Result<JobId> {
    // refuse before anything is started
    shell.job_table.ensure_capacity()?;

    let stdin = Stdin::new(command.infile.as_deref(), None)?;
    let stdout = Output::new(command.outfile.as_deref(), None)?;
    let child = spawn(
        command.program(),
        build_process(shell, command, stdin, stdout, true),
    )?;

    let pid = Pid::from_raw(child.id() as libc::pid_t);
    let job_id = shell.job_table.register(pid, &command.input)?;
    if shell.config.display_messages {
        println!("[{}] {}", job_id, pid);
    }
    Ok(job_id)
}

fn run_pipeline(shell: &Shell, first: &Command, second: &Command) -> Result<ExitStatus> {
    let stdin = Stdin::new(first.infile.as_deref(), None)?;
    let stdout = Output::new(second.outfile.as_deref(), None)?;
    let (read_end_pipe, write_end_pipe) = create_pipe()?;

    // Each process::Command is consumed by `spawn`, which drops the parent's
    // copy of its pipe end as soon as the child exists.
    let mut producer = spawn(
        first.program(),
        build_process(
            shell,
            first,
            stdin,
            Output::new(None, Some(write_end_pipe))?,
            false,
        ),
    )?;
    let consumer = build_process(
        shell,
        second,
        Stdin::new(None, Some(read_end_pipe))?,
        stdout,
        false,
    );
    let mut consumer = match spawn(second.program(), consumer) {
        Ok(consumer) => consumer,
        Err(e) => {
            warn!("second stage failed to start, stopping {}", first.program());
            let temp_result = producer.kill();
            log_if_err!(temp_result, "failed to kill {}", first.program());
            let temp_result = producer.wait();
            log_if_err!(temp_result, "failed to reap {}", first.program());
            return Err(e);
        }
    };

    let producer_status = producer.wait()?;
    let consumer_status = consumer.wait()?;
    debug!(
        "pipeline exited with {} | {}",
        producer_status, consumer_status
    );
    Ok(consumer_status)
}

fn build_process(
    shell: &Shell,
    command: &Command,
    stdin: Stdin,
    stdout: Output,
    background: bool,
) -> process::Command {
    let mut process = process::Command::new(command.program());
    process
        .args(command.args())
        .envs(shell.variables.exported())
        .stdin(stdin)
        .stdout(stdout);

    if shell.config.enable_job_control {
        if background {
            // keep terminal signals away from background jobs
            process.process_group(0);
        }
        unsafe {
            process.pre_exec(restore_default_signals);
        }
    }
    process
}

/// Undoes the signal dispositions the interactive shell sets for itself. Runs
/// in the child between fork and exec.
fn restore_default_signals() -> io::Result<()> {
    for &sig in &[Signal::SIGINT, Signal::SIGQUIT] {
        unsafe { signal::signal(sig, SigHandler::SigDfl) }.map_err(io::Error::from)?;
    }
    Ok(())
}

fn spawn(program: &str, mut process: process::Command) -> Result<Child> {
    match process.spawn() {
        Ok(child) => {
            debug!("spawned {} (pid {})", program, child.id());
            Ok(child)
        }
        Err(ref e) if e.kind() == io::ErrorKind::NotFound => {
            Err(ErrorKind::CommandNotFound(program.to_string()).into())
        }
        Err(e) => Err(Error::with_chain(e, ErrorKind::Spawn(program.to_string()))),
    }
}

fn open_output(path: &str) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .chain_err(|| ErrorKind::Redirect(path.to_string()))
}

/// Wraps `unistd::pipe2()` to return RAII structs instead of raw, owning file descriptors
/// Returns (`read_end_pipe`, `write_end_pipe`)
///
/// Both ends are close-on-exec, so each stage only holds the end it was given
/// as stdin or stdout.
fn create_pipe() -> Result<(File, File)> {
    // The RawFds returned by unistd::pipe2() go straight into Files, which
    // become their only owners.
    let (read_end_pipe, write_end_pipe) =
        unistd::pipe2(OFlag::O_CLOEXEC).chain_err(|| ErrorKind::Pipe)?;
    unsafe {
        Ok((
            File::from_raw_fd(read_end_pipe),
            File::from_raw_fd(write_end_pipe),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use tempfile::TempDir;

    use crate::shell::ShellConfig;

    fn shell() -> Shell {
        Shell::new(ShellConfig::noninteractive()).unwrap()
    }

    fn parse(input: &str) -> Command {
        Command::parse(input).unwrap().unwrap()
    }

    fn run(shell: &mut Shell, input: &str) -> Result<Option<ExitStatus>> {
        execute_command(shell, &parse(input))
    }

    #[test]
    fn foreground_exit_status() {
        let mut shell = shell();
        let status = run(&mut shell, "true").unwrap().unwrap();
        assert!(status.success());
        let status = run(&mut shell, "false").unwrap().unwrap();
        assert_eq!(status.code(), Some(1));
    }

    #[test]
    fn command_not_found() {
        let mut shell = shell();
        match *run(&mut shell, "psh-no-such-program").unwrap_err().kind() {
            ErrorKind::CommandNotFound(ref program) => assert_eq!(program, "psh-no-such-program"),
            ref other => panic!("unexpected error kind: {:?}", other),
        }
    }

    #[test]
    fn redirect_input_and_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        fs::write(&input, "hello\nworld\n").unwrap();

        let mut shell = shell();
        let line = format!("cat < {} > {}", input.display(), output.display());
        assert!(run(&mut shell, &line).unwrap().unwrap().success());
        assert_eq!(fs::read_to_string(&output).unwrap(), "hello\nworld\n");

        // output redirection truncates
        let line = format!("echo hi > {}", output.display());
        run(&mut shell, &line).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "hi\n");
    }

    #[test]
    fn missing_input_redirect() {
        let dir = TempDir::new().unwrap();
        let line = format!("cat < {}", dir.path().join("missing").display());
        let mut shell = shell();
        match *run(&mut shell, &line).unwrap_err().kind() {
            ErrorKind::Redirect(_) => (),
            ref other => panic!("unexpected error kind: {:?}", other),
        }
    }

    #[test]
    fn pipeline_is_byte_exact() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("payload");
        let output = dir.path().join("copy");
        let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&input, &payload).unwrap();

        let mut shell = shell();
        let line = format!("cat {} | cat > {}", input.display(), output.display());
        let status = run(&mut shell, &line).unwrap().unwrap();
        assert!(status.success());
        assert_eq!(fs::read(&output).unwrap(), payload);
    }

    #[test]
    fn pipeline_reports_second_stage() {
        let mut shell = shell();
        let status = run(&mut shell, "true | false").unwrap().unwrap();
        assert_eq!(status.code(), Some(1));

        match *run(&mut shell, "true | psh-no-such-program").unwrap_err().kind() {
            ErrorKind::CommandNotFound(_) => (),
            ref other => panic!("unexpected error kind: {:?}", other),
        }
    }

    #[test]
    fn pipeline_ends_when_consumer_exits_early() {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut shell = shell();
            let status = run(&mut shell, "yes | head -n 1 > /dev/null")
                .ok()
                .map(|status| status.map(|s| s.success()));
            let _ = tx.send(status);
        });

        let status = rx
            .recv_timeout(Duration::from_secs(10))
            .expect("`yes | head -n 1` did not finish");
        assert_eq!(status, Some(Some(true)));
    }

    #[test]
    fn pipeline_in_background_is_rejected() {
        let mut shell = shell();
        match *run(&mut shell, "sleep 5 | cat &").unwrap_err().kind() {
            ErrorKind::PipelineInBackground => (),
            ref other => panic!("unexpected error kind: {:?}", other),
        }
        assert!(shell.job_table.is_empty());
    }

    #[test]
    fn background_jobs_beyond_capacity() {
        let config = ShellConfig::noninteractive().with_job_table_capacity(2);
        let mut shell = Shell::new(config).unwrap();

        assert_eq!(run(&mut shell, "sleep 30 &").unwrap(), None);
        assert_eq!(run(&mut shell, "sleep 30 &").unwrap(), None);
        match *run(&mut shell, "sleep 30 &").unwrap_err().kind() {
            ErrorKind::JobTableFull(2) => (),
            ref other => panic!("unexpected error kind: {:?}", other),
        }

        let ids: Vec<JobId> = shell.job_table.list().iter().map(|job| job.id()).collect();
        assert_eq!(ids, vec![JobId(1), JobId(2)]);
        for id in ids {
            shell.job_table.terminate(id).unwrap();
        }
    }

    #[test]
    fn exported_variables_reach_children() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("env");
        let mut shell = shell();
        shell
            .variables
            .set("PSH_TEST_EXPORTED", "yes", crate::core::variables::Scope::Exported)
            .unwrap();
        shell
            .variables
            .set("PSH_TEST_LOCAL", "no", crate::core::variables::Scope::Local)
            .unwrap();

        run(&mut shell, &format!("env > {}", output.display())).unwrap();
        let env = fs::read_to_string(&output).unwrap();
        assert!(env.lines().any(|line| line == "PSH_TEST_EXPORTED=yes"));
        assert!(!env.contains("PSH_TEST_LOCAL"));
    }

    #[test]
    fn builtin_output_redirection() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out");
        let mut shell = shell();
        let status = run(&mut shell, &format!("echo a  b > {}", output.display()))
            .unwrap()
            .unwrap();
        assert!(status.success());
        assert_eq!(fs::read_to_string(&output).unwrap(), "a b\n");
    }
}

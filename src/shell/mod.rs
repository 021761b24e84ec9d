//! Psh - Shell Module
//!
//! The Shell owns the command history, the variables and the background job
//! table, and runs one line at a time through expansion, parsing and
//! execution.

use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::{self, ExitStatus};

use log::{debug, error, info};

use crate::core::history::HistoryBuffer;
use crate::core::job::Job;
use crate::core::parser::Command;
use crate::core::variables::VariableStore;
use crate::errors::{Error, ErrorKind, Result, ResultExt};
use crate::util::{self, PshExitStatusExt};

pub use self::editor::{Editor, LineSource, PlainReader};
pub use self::job_control::{JobTable, SignalReaper};

pub mod builtins;
pub mod editor;
mod execute_command;
pub mod job_control;

const SYNTAX_ERROR_EXIT_STATUS: i32 = 2;
const COMMAND_NOT_FOUND_EXIT_STATUS: i32 = 127;

pub const DEFAULT_COMMAND_HISTORY_CAPACITY: usize = 10;
pub const DEFAULT_JOB_TABLE_CAPACITY: usize = 100;
pub const DEFAULT_VARIABLE_CAPACITY: usize = 100;

/// Psh Shell
#[derive(Debug)]
pub struct Shell {
    history: HistoryBuffer,
    variables: VariableStore,
    job_table: JobTable,
    reaper: SignalReaper,
    /// Exit status of last command executed.
    last_exit_status: ExitStatus,
    /// Set once `exit` has run.
    exit_code: Option<i32>,
    config: ShellConfig,
}

impl Shell {
    /// Constructs a new Shell to manage running jobs, variables and command
    /// history.
    pub fn new(config: ShellConfig) -> Result<Shell> {
        let reaper = if config.enable_job_control {
            job_control::initialize_job_control()?
        } else {
            SignalReaper::disabled()
        };

        let shell = Shell {
            history: HistoryBuffer::with_capacity(config.command_history_capacity),
            variables: VariableStore::with_capacity(config.variable_capacity),
            job_table: JobTable::with_capacity(config.job_table_capacity),
            reaper,
            last_exit_status: ExitStatus::from_success(),
            exit_code: None,
            config,
        };

        info!("psh started up");
        debug!("{:?}", config);
        Ok(shell)
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    /// Background jobs that have not been seen to finish yet.
    pub fn jobs(&self) -> &[Job] {
        self.job_table.list()
    }

    pub fn reaper(&self) -> &SignalReaper {
        &self.reaper
    }

    pub fn last_exit_status(&self) -> ExitStatus {
        self.last_exit_status
    }

    /// The code the shell exits with, once `exit` has run.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Custom prompt to output to the user.
    pub fn prompt(&self) -> String {
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("?"));
        let rel = match dirs::home_dir().and_then(|home| cwd.strip_prefix(home).ok()) {
            Some(rel) if rel.as_os_str().is_empty() => PathBuf::from("~"),
            Some(rel) => Path::new("~").join(rel),
            None => cwd.clone(),
        };

        format!(
            "{}|{}\n$ ",
            self.last_exit_status.code_or_signal(),
            rel.display()
        )
    }

    /// Runs one line of input and returns its exit status.
    ///
    /// Errors are reported on stderr and become the exit status; the shell
    /// stays usable afterwards.
    pub fn execute_command_string(&mut self, input: &str) -> ExitStatus {
        let line = strip_line(input);
        if line.trim_end().is_empty() {
            return self.last_exit_status;
        }

        self.last_exit_status = match self.execute_line(line) {
            Ok(status) => status,
            Err(e) => {
                error!("{}: {}", line, e);
                report_error(&e);
                ExitStatus::from_status(get_exit_status(&e))
            }
        };
        self.last_exit_status
    }

    /// Runs a psh script from a file.
    pub fn execute_commands_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let f = File::open(path).chain_err(|| format!("{}: cannot open script", path.display()))?;
        self.execute_lines(&mut PlainReader::new(BufReader::new(f)))
    }

    /// Runs lines from `source` until end of file or `exit`.
    ///
    /// Finished background jobs are collected before each line is read.
    pub fn execute_lines<S: LineSource>(&mut self, source: &mut S) -> Result<()> {
        while self.exit_code.is_none() {
            self.check_jobs();

            let line = match source.read_line(&self.prompt())? {
                Some(line) => line,
                None => break,
            };
            let line = strip_line(&line);
            if !line.trim_end().is_empty() {
                source.add_history_entry(line);
            }

            self.execute_command_string(line);
        }

        Ok(())
    }

    /// Removes background jobs whose processes have exited, announcing them
    /// if job control is enabled.
    pub fn check_jobs(&mut self) {
        let pending = self.reaper.take_pending();
        if self.job_table.is_empty() || (self.reaper.is_installed() && !pending) {
            return;
        }

        for job in self.job_table.reap() {
            if self.config.enable_job_control {
                println!("{}", job.notification());
            }
        }
    }

    /// Asks the shell to stop after the current line.
    ///
    /// Valid exit codes are between 0 and 255. Like bash and its descendents, it automatically
    /// converts exit codes to a u8 such that positive n becomes n & 256 and negative n becomes
    /// (256 + n) % 256.
    pub fn exit(&mut self, code: i32) {
        self.exit_code = Some(util::code_like_u8(code));
    }

    /// Exit the shell with the code recorded by `exit`, or `default` if there
    /// is none.
    pub fn shutdown(&mut self, default: i32) -> ! {
        if self.config.display_messages {
            println!("exit");
        }

        let code = util::code_like_u8(self.exit_code.unwrap_or(default));
        info!("psh has shut down ({})", code);
        process::exit(code);
    }

    /// Expands, parses and runs a non-empty line.
    fn execute_line(&mut self, line: &str) -> Result<ExitStatus> {
        let mut line = line.to_string();
        if self.config.enable_command_history {
            self.history.record(&line);
            if let Some(expanded) = self.history.expand(&line)? {
                if self.config.display_messages {
                    println!("{}", expanded);
                }
                line = expanded;
            }
        }

        let line = self.variables.substitute(&line);
        let command = match Command::parse(&line)? {
            Some(command) => command,
            None => return Ok(self.last_exit_status),
        };

        let status = execute_command::execute_command(self, &command)?;
        Ok(status.unwrap_or_else(ExitStatus::from_success))
    }
}

/// Drops leading whitespace and the line terminator. Other trailing
/// whitespace is kept so the parser sees whether `&` really ends the line.
fn strip_line(input: &str) -> &str {
    input
        .trim_start()
        .trim_end_matches(|c| c == '\n' || c == '\r')
}

fn report_error(e: &Error) {
    match *e.kind() {
        ErrorKind::BuiltinCommand(ref msg, _) if msg.is_empty() => (),
        _ => eprintln!("psh: {}", e),
    }
}

fn get_exit_status(e: &Error) -> i32 {
    match *e.kind() {
        ErrorKind::Syntax(_) => SYNTAX_ERROR_EXIT_STATUS,
        ErrorKind::CommandNotFound(_) => COMMAND_NOT_FOUND_EXIT_STATUS,
        ErrorKind::BuiltinCommand(_, code) => code,
        _ => 1,
    }
}

/// Policy object to control a Shell's behavior
#[derive(Debug, Copy, Clone)]
pub struct ShellConfig {
    /// Determines if new command entries will be added to the shell's command history.
    ///
    /// Note: This is checked before the other command history config fields.
    enable_command_history: bool,

    /// Number of entries to store in the shell's command history
    command_history_capacity: usize,

    /// Number of background jobs that can be tracked at once.
    job_table_capacity: usize,

    /// Number of variables the shell can hold.
    variable_capacity: usize,

    /// Determines if the SIGCHLD reaper is installed and finished jobs are
    /// announced.
    enable_job_control: bool,

    /// Determines if some messages (e.g. "exit") should be displayed.
    display_messages: bool,
}

impl ShellConfig {
    /// Creates an interactive shell, e.g. command history, job control
    ///
    /// # Complete List
    /// - Command History is enabled
    /// - Job Control is enabled
    /// - Some additional messages are displayed
    pub fn interactive(command_history_capacity: usize) -> Self {
        Self {
            enable_command_history: true,
            command_history_capacity,
            enable_job_control: true,
            display_messages: true,
            ..Default::default()
        }
    }

    /// Creates a noninteractive shell, e.g. no command history, no job control
    ///
    /// # Complete List
    /// - Command History is disabled. Commands are not saved and history expansions are not
    ///   performed. The history builtin command is not affected by this option.
    /// - Job Control is disabled. Background jobs are still tracked, but
    ///   finished ones are removed silently.
    /// - Fewer messages are displayed
    pub fn noninteractive() -> Self {
        Default::default()
    }

    /// Records and expands history with a buffer of `capacity` entries.
    pub fn with_command_history(self, capacity: usize) -> Self {
        Self {
            enable_command_history: true,
            command_history_capacity: capacity,
            ..self
        }
    }

    pub fn with_job_table_capacity(self, job_table_capacity: usize) -> Self {
        Self {
            job_table_capacity,
            ..self
        }
    }

    pub fn with_variable_capacity(self, variable_capacity: usize) -> Self {
        Self {
            variable_capacity,
            ..self
        }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            enable_command_history: false,
            command_history_capacity: DEFAULT_COMMAND_HISTORY_CAPACITY,
            job_table_capacity: DEFAULT_JOB_TABLE_CAPACITY,
            variable_capacity: DEFAULT_VARIABLE_CAPACITY,
            enable_job_control: false,
            display_messages: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use tempfile::TempDir;

    fn shell_with_history() -> Shell {
        let config = ShellConfig::noninteractive().with_command_history(10);
        Shell::new(config).unwrap()
    }

    #[test]
    fn test_exit_statuses() {
        let mut shell = Shell::new(ShellConfig::noninteractive()).unwrap();
        assert_eq!(shell.execute_command_string("false").code(), Some(1));
        assert_eq!(shell.execute_command_string("   ").code(), Some(1));
        assert_eq!(shell.execute_command_string("ls |").code(), Some(2));
        assert_eq!(
            shell.execute_command_string("psh-no-such-program").code(),
            Some(127)
        );
        assert_eq!(shell.execute_command_string("set x").code(), Some(2));
        assert!(shell.execute_command_string("true").success());
        assert_eq!(shell.last_exit_status().code(), Some(0));
    }

    #[test]
    fn test_prompt_shows_last_status() {
        let mut shell = Shell::new(ShellConfig::noninteractive()).unwrap();
        shell.execute_command_string("false");
        let prompt = shell.prompt();
        assert!(prompt.starts_with("1|"));
        assert!(prompt.ends_with("\n$ "));
    }

    #[test]
    fn test_history_expansion() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let mut shell = shell_with_history();

        shell.execute_command_string(&format!("echo first > {}", out.display()));
        shell.execute_command_string("true");
        fs::remove_file(&out).unwrap();

        assert!(shell.execute_command_string("!-2").success());
        assert_eq!(fs::read_to_string(&out).unwrap(), "first\n");
        // references are not recorded
        assert_eq!(shell.history().len(), 2);

        assert_eq!(shell.execute_command_string("!99").code(), Some(1));
    }

    #[test]
    fn test_history_disabled() {
        let mut shell = Shell::new(ShellConfig::noninteractive()).unwrap();
        shell.execute_command_string("true");
        assert!(shell.history().is_empty());
        assert_eq!(shell.execute_command_string("!1").code(), Some(127));
    }

    #[test]
    fn test_variable_substitution() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let mut shell = Shell::new(ShellConfig::noninteractive()).unwrap();

        shell.execute_command_string("set x=5");
        shell.execute_command_string(&format!("echo $x $y > {}", out.display()));
        assert_eq!(fs::read_to_string(&out).unwrap(), "5 $y\n");
    }

    #[test]
    fn test_exit_stops_execute_lines() {
        let mut shell = Shell::new(ShellConfig::noninteractive()).unwrap();
        let mut source = PlainReader::new("set a=1\nexit 3\nset b=2\n".as_bytes());
        shell.execute_lines(&mut source).unwrap();

        assert_eq!(shell.exit_code(), Some(3));
        assert_eq!(shell.variables().get("a"), Some("1"));
        assert_eq!(shell.variables().get("b"), None);
    }

    #[test]
    fn test_background_job_is_collected() {
        let mut shell = Shell::new(ShellConfig::noninteractive()).unwrap();
        assert!(shell.execute_command_string("true &").success());
        assert_eq!(shell.jobs().len(), 1);

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
        while !shell.jobs().is_empty() && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(20));
            shell.check_jobs();
        }
        assert!(shell.jobs().is_empty());
    }
}

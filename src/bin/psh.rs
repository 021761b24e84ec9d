use std::io;
use std::path::PathBuf;
use std::process::{self, ExitStatus};

use docopt::Docopt;
use log::{debug, error, LevelFilter};
use nix::unistd::Pid;
use serde_derive::Deserialize;

use psh_rs::errors::*;
use psh_rs::shell::{Editor, PlainReader};
use psh_rs::{isatty, PshExitStatusExt, Shell, ShellConfig};

const LOG_FILE_NAME: &str = ".psh_log";

const USAGE: &str = "
psh.

Usage:
    psh [options]
    psh [options] -c <command>
    psh [options] <file>
    psh (-h | --help)
    psh --version

Options:
    -h --help              Show this screen.
    --version              Show version.
    -c                     If the -c option is present, then commands are read from the first
                               non-option argument command_string.
    --log=<path>           File to write log to, defaults to ~/.psh_log
    --log-level=<level>    Log filter: off, error, warn, info, debug or trace [default: debug]
    --history-size=<n>     History entries kept when reading standard input [default: 10]
";

/// Docopts input arguments.
#[derive(Debug, Deserialize)]
struct Args {
    arg_command: Option<String>,
    arg_file: Option<String>,
    flag_version: bool,
    flag_c: bool,
    flag_log: Option<String>,
    flag_log_level: String,
    flag_history_size: usize,
}

fn main() {
    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    if let Err(e) = init_logger(&args.flag_log, &args.flag_log_level) {
        eprintln!("psh: failed to initialize logging: {}", e);
    }
    debug!("{:?}", args);

    if args.flag_version {
        println!("psh version {}", env!("CARGO_PKG_VERSION"));
    } else if args.flag_c || args.arg_file.is_some() {
        execute_from_command_string_or_file(&args);
    } else {
        execute_from_stdin(&args);
    }
}

fn init_logger(path: &Option<String>, level: &str) -> Result<()> {
    let level = level
        .parse::<LevelFilter>()
        .chain_err(|| format!("invalid log level: {}", level))?;
    let log_path = match *path {
        Some(ref path) => PathBuf::from(path),
        None => default_log_path()?,
    };

    let pid = Pid::this();
    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                pid,
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(fern::log_file(log_path)?)
        .apply()?;
    Ok(())
}

fn default_log_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(LOG_FILE_NAME))
        .ok_or_else(|| "unable to get home directory".into())
}

fn execute_from_command_string_or_file(args: &Args) -> ! {
    let shell_config = ShellConfig::noninteractive();
    let mut shell = Shell::new(shell_config).unwrap_or_else(|e| display_error_and_exit(&e));

    let result = if let Some(ref command) = args.arg_command {
        shell.execute_command_string(command);
        Ok(())
    } else if let Some(ref file_path) = args.arg_file {
        shell.execute_commands_from_file(file_path)
    } else {
        Err("no command given".into())
    };

    exit(result, &mut shell);
}

fn execute_from_stdin(args: &Args) -> ! {
    let history_size = args.flag_history_size;
    let interactive = isatty();
    let shell_config = if interactive {
        ShellConfig::interactive(history_size)
    } else {
        ShellConfig::noninteractive().with_command_history(history_size)
    };
    let mut shell = Shell::new(shell_config).unwrap_or_else(|e| display_error_and_exit(&e));

    let result = if interactive {
        Editor::new().and_then(|mut editor| shell.execute_lines(&mut editor))
    } else {
        let stdin = io::stdin();
        let mut source = PlainReader::new(stdin.lock());
        shell.execute_lines(&mut source)
    };

    if let Err(e) = result {
        error!("line source failed: {}", e);
        eprintln!("psh: {}", e);
        shell.shutdown(ExitStatus::from_failure().code_or_signal());
    }
    shell.shutdown(0)
}

fn display_error_and_exit(error: &Error) -> ! {
    error!("failed to create shell: {}", error);
    eprintln!("psh: {}", error);
    process::exit(ExitStatus::from_failure().code_or_signal());
}

fn exit(result: Result<()>, shell: &mut Shell) -> ! {
    if let Err(e) = result {
        error!("{}", e);
        eprintln!("psh: {}", e);
        shell.shutdown(ExitStatus::from_failure().code_or_signal());
    } else {
        let code = shell.last_exit_status().code_or_signal();
        shell.shutdown(code);
    }
}

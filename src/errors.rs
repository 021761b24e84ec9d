//! Error module. See the [error-chain](https://crates.io/crates/error-chain) crate for details.

#![allow(missing_docs)]

use std::io;

error_chain! {
    foreign_links {
        Docopt(::docopt::Error);
        Io(io::Error);
        Logger(::log::SetLoggerError);
        Nix(::nix::Error);
        Readline(::rustyline::error::ReadlineError);
    }

    errors {
        Syntax(token: String) {
            description("syntax error")
            display("syntax error near unexpected token `{}'", token)
        }
        Spawn(program: String) {
            description("failed to create process")
            display("{}: failed to create process", program)
        }
        CommandNotFound(program: String) {
            description("command not found")
            display("{}: command not found", program)
        }
        Redirect(path: String) {
            description("cannot open redirection target")
            display("{}: cannot open redirection target", path)
        }
        Pipe {
            description("failed to create pipe")
            display("failed to create pipe")
        }
        PipelineInBackground {
            description("pipelines cannot run in the background")
            display("pipelines cannot run in the background")
        }
        JobTableFull(capacity: usize) {
            description("job table full")
            display("job table full ({} jobs), command not started", capacity)
        }
        NoSuchJob(job: String) {
            description("no such job")
            display("{}: no such job", job)
        }
        KillFailed(job: String) {
            description("failed to kill job")
            display("{}: failed to kill job", job)
        }
        HistoryNotFound(reference: String) {
            description("event not found")
            display("{}: event not found", reference)
        }
        VariableLimit(capacity: usize) {
            description("variable limit reached")
            display("variable limit reached ({} variables)", capacity)
        }
        BuiltinCommand(message: String, code: i32) {
            description("builtin command error")
            display("{}", message)
        }
    }
}

impl Error {
    pub(crate) fn syntax<T: AsRef<str>>(token: T) -> Error {
        ErrorKind::Syntax(token.as_ref().to_string()).into()
    }

    pub(crate) fn builtin_command<T: AsRef<str>>(message: T, code: i32) -> Error {
        ErrorKind::BuiltinCommand(message.as_ref().to_string(), code).into()
    }

    pub(crate) fn no_such_job<T: AsRef<str>>(job: T) -> Error {
        ErrorKind::NoSuchJob(job.as_ref().to_string()).into()
    }

    pub(crate) fn history_not_found<T: AsRef<str>>(reference: T) -> Error {
        ErrorKind::HistoryNotFound(reference.as_ref().to_string()).into()
    }
}

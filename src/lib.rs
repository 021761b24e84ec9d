//! Psh - a minimal command interpreter.
//!
//! Turns lines of text into running processes: redirection, two-stage
//! pipelines, background jobs, `!` history references and `$name` variables.

#![deny(missing_debug_implementations, unused_import_braces)]
#![warn(
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_qualifications
)]

#[macro_use]
extern crate error_chain;

/// Logs the error of a `Result`, if any, and otherwise does nothing.
macro_rules! log_if_err {
    ($result:expr, $fmt:expr) => {{
        if let Err(ref e) = $result {
            log::error!("{}: {}", $fmt, e);
        }
    }};
    ($result:expr, $fmt:expr, $($arg:tt)*) => {{
        if let Err(ref e) = $result {
            log::error!("{}: {}", format_args!($fmt, $($arg)*), e);
        }
    }};
}

pub mod core;
pub mod errors;
pub mod shell;
mod util;

pub use crate::shell::{Shell, ShellConfig};
pub use crate::util::{isatty, PshExitStatusExt};

//! Psh Parser
//!
//! Lines are split on runs of whitespace; there is no quoting or escaping.
//! `<`, `>` and `|` are only operators when they stand alone as a token, and a
//! trailing `&` marks the line for background execution.

use log::debug;

use crate::errors::{Error, Result};

pub use self::ast::{Command, CommandBuilder, RedirectInstruction};

pub mod ast;

const PIPE: &str = "|";
const BACKGROUND: char = '&';
const BACKGROUND_TOKEN: &str = "&";

impl Command {
    /// Parses input string into a Command.
    ///
    /// Returns `None` for lines with nothing to run.
    ///
    /// # Examples
    ///
    /// ```
    /// use psh_rs::core::parser::Command;
    ///
    /// let command = Command::parse("sort < names").unwrap().unwrap();
    /// assert_eq!(command.argv, vec!["sort"]);
    /// assert_eq!(command.infile, Some("names".to_string()));
    /// assert!(!command.background);
    ///
    /// assert!(Command::parse("   ").unwrap().is_none());
    /// ```
    pub fn parse(input: &str) -> Result<Option<Command>> {
        let (line, background) = strip_background(input);
        let line = line.trim();
        if line.is_empty() || line == BACKGROUND_TOKEN {
            return Ok(None);
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let stages: Vec<&[&str]> = tokens.split(|token| *token == PIPE).collect();
        if stages.len() > 2 || stages.iter().any(|stage| stage.is_empty()) {
            return Err(Error::syntax(PIPE));
        }

        let mut command = parse_stage(line, stages[0])?;
        if let Some(second) = stages.get(1) {
            let second = parse_stage(&second.join(" "), second)?;
            if command.has_outfile() {
                return Err(Error::syntax(RedirectInstruction::Output.token()));
            }
            if second.has_infile() {
                return Err(Error::syntax(RedirectInstruction::Input.token()));
            }
            command.pipeline(second.build());
        }
        command.background(background);

        let command = command.build();
        debug!("parsed Command: {:?}", command);
        Ok(Some(command))
    }
}

/// Splits a trailing `&` off the untrimmed line. Only the very last character
/// counts, so `ls & ` is not a background command.
fn strip_background(line: &str) -> (&str, bool) {
    match line.strip_suffix(BACKGROUND) {
        Some(rest) => (rest, true),
        None => (line, false),
    }
}

fn parse_stage(input: &str, tokens: &[&str]) -> Result<CommandBuilder> {
    let mut command = CommandBuilder::new(input);
    let mut first_redirect = None;

    let mut tokens = tokens.iter();
    while let Some(&token) = tokens.next() {
        let instruction = match token {
            "<" => RedirectInstruction::Input,
            ">" => RedirectInstruction::Output,
            word => {
                command.arg(word);
                continue;
            }
        };

        match tokens.next() {
            Some(&target) if !is_operator(target) => {
                command.redirect(&instruction, target);
            }
            _ => return Err(Error::syntax(instruction.token())),
        }
        first_redirect.get_or_insert(instruction);
    }

    if !command.has_args() {
        let token = first_redirect.map_or("newline", |r| r.token());
        return Err(Error::syntax(token));
    }

    Ok(command)
}

fn is_operator(token: &str) -> bool {
    token == "<" || token == ">" || token == PIPE
}

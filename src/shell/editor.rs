//! Line sources for the interpreter loop.

use std::fmt;
use std::io::BufRead;

use rustyline::{
    self,
    completion::{Completer, FilenameCompleter, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::Validator,
    CompletionType, Config, Helper,
};

use crate::errors::Result;

/// Produces raw input lines, one per call.
pub trait LineSource {
    /// Returns `None` when end of file is reached.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;

    /// Called with every non-empty line before it runs.
    fn add_history_entry(&mut self, _line: &str) {}
}

struct EditorHelper(FilenameCompleter);

impl Completer for EditorHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &rustyline::Context<'_>,
    ) -> ::std::result::Result<(usize, Vec<Pair>), ReadlineError> {
        self.0.complete(line, pos, ctx)
    }
}

impl Hinter for EditorHelper {
    type Hint = String;
}

impl Highlighter for EditorHelper {}

impl Helper for EditorHelper {}

impl Validator for EditorHelper {}

/// Terminal line editor with filename completion.
pub struct Editor {
    internal: rustyline::Editor<EditorHelper, DefaultHistory>,
}

impl Editor {
    pub fn new() -> Result<Editor> {
        let config = Config::builder()
            .history_ignore_space(true)
            .completion_type(CompletionType::List)
            .auto_add_history(false)
            .build();

        let mut internal = rustyline::Editor::with_config(config)?;
        internal.set_helper(Some(EditorHelper(FilenameCompleter::new())));
        Ok(Editor { internal })
    }
}

impl LineSource for Editor {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.internal.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Eof) => Ok(None),
            // ^C abandons the line being edited
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(e) => Err(e.into()),
        }
    }

    fn add_history_entry(&mut self, line: &str) {
        let temp_result = self.internal.add_history_entry(line);
        log_if_err!(temp_result, "failed to add editor history entry");
    }
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Editor")
    }
}

/// Reads lines without prompting, e.g. from a script or a pipe.
#[derive(Debug)]
pub struct PlainReader<R> {
    reader: R,
}

impl<R: BufRead> PlainReader<R> {
    pub fn new(reader: R) -> PlainReader<R> {
        PlainReader { reader }
    }
}

impl<R: BufRead> LineSource for PlainReader<R> {
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_reader_lines() {
        let mut source = PlainReader::new("ls -l\n\necho done".as_bytes());
        assert_eq!(source.read_line("$ ").unwrap(), Some("ls -l\n".to_string()));
        assert_eq!(source.read_line("$ ").unwrap(), Some("\n".to_string()));
        assert_eq!(source.read_line("$ ").unwrap(), Some("echo done".to_string()));
        assert_eq!(source.read_line("$ ").unwrap(), None);
    }
}

//! Bounded command history.
//!
//! Every recorded line gets the next 1-based index. Once the buffer is full the
//! oldest entry is evicted, but indices keep counting, so `!N` always refers
//! to the Nth line ever recorded (if it is still retained).

use std::collections::VecDeque;
use std::fmt;

use crate::errors::{Error, Result};

const EXPANSION_CHAR: char = '!';

#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    index: usize,
    line: String,
}

impl HistoryEntry {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn line(&self) -> &str {
        &self.line
    }
}

#[derive(Debug)]
pub struct HistoryBuffer {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
    /// The total number of history items ever saved.
    count: usize,
}

impl HistoryBuffer {
    pub fn with_capacity(capacity: usize) -> HistoryBuffer {
        HistoryBuffer {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            count: 0,
        }
    }

    /// Appends `line`, evicting the oldest entry when full.
    ///
    /// Empty lines and history references are not recorded. Returns `true` if
    /// the line was recorded.
    pub fn record(&mut self, line: &str) -> bool {
        if line.is_empty() || line.starts_with(EXPANSION_CHAR) || self.capacity == 0 {
            return false;
        }

        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.count += 1;
        self.entries.push_back(HistoryEntry {
            index: self.count,
            line: line.to_string(),
        });
        true
    }

    /// Looks up an entry.
    ///
    /// A positive `reference` is an absolute 1-based index, a negative one
    /// counts back from the most recent entry (-1 is the most recent).
    pub fn resolve(&self, reference: isize) -> Result<&str> {
        let position = if reference > 0 {
            let first = self.first_index();
            let index = reference as usize;
            if index < first || index > self.count {
                None
            } else {
                Some(index - first)
            }
        } else if reference < 0 {
            self.entries.len().checked_sub(reference.unsigned_abs())
        } else {
            None
        };

        position
            .and_then(|p| self.entries.get(p))
            .map(HistoryEntry::line)
            .ok_or_else(|| Error::history_not_found(format!("{}{}", EXPANSION_CHAR, reference)))
    }

    /// Most recent entry starting with `prefix`.
    pub fn search(&self, prefix: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.line.starts_with(prefix))
            .map(HistoryEntry::line)
    }

    /// Performs history expansions.
    ///
    /// !n -> repeat command numbered n in the list of commands (starting at 1)
    /// !-n -> repeat last nth command (starting at -1)
    /// !! -> repeat the last command
    /// !string -> repeat the most recent command starting with string
    ///
    /// Anything after the reference is appended to the expanded line. Returns
    /// `None` if `line` is not a history reference.
    pub fn expand(&self, line: &str) -> Result<Option<String>> {
        if !line.starts_with(EXPANSION_CHAR) {
            return Ok(None);
        }

        let mut parts = line.splitn(2, char::is_whitespace);
        let event = parts.next().unwrap_or_default();
        let rest = parts.next().map(str::trim).unwrap_or_default();

        let designator = &event[EXPANSION_CHAR.len_utf8()..];
        let entry = match designator {
            "" => None,
            "!" => self.resolve(-1).ok(),
            d => match d.parse::<isize>() {
                Ok(n) => self.resolve(n).ok(),
                Err(_) => self.search(d),
            },
        };

        let entry = entry.ok_or_else(|| Error::history_not_found(event))?;
        if rest.is_empty() {
            Ok(Some(entry.to_string()))
        } else {
            Ok(Some(format!("{} {}", entry, rest)))
        }
    }

    /// Retained entries as `(index, line)`, oldest first.
    pub fn list(&self) -> impl Iterator<Item = (usize, &str)> {
        self.entries.iter().map(|e| (e.index, e.line.as_str()))
    }

    /// Removes every entry. Indices are not reused afterwards.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Renders the last `n_last_entries` entries, one `\tindex\tline` per row.
    pub fn display(&self, n_last_entries: usize) -> String {
        let skip = self.entries.len().saturating_sub(n_last_entries);
        self.list()
            .skip(skip)
            .map(|(i, line)| format!("\t{}\t{}\n", i, line))
            .collect()
    }

    fn first_index(&self) -> usize {
        self.count + 1 - self.entries.len()
    }
}

impl fmt::Display for HistoryBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display(self.entries.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::errors::ErrorKind;

    fn alloc_history(capacity: usize, full: usize) -> HistoryBuffer {
        let mut history = HistoryBuffer::with_capacity(capacity);
        for i in 0..full {
            history.record(&format!("cmd{}", i));
        }
        history
    }

    fn assert_not_found<T: fmt::Debug>(result: Result<T>) {
        match result {
            Err(e) => match *e.kind() {
                ErrorKind::HistoryNotFound(_) => (),
                ref other => panic!("unexpected error kind: {:?}", other),
            },
            Ok(v) => panic!("expected HistoryNotFound, got {:?}", v),
        }
    }

    #[test]
    fn init_with_capacity() {
        let history = HistoryBuffer::with_capacity(10);
        assert!(history.is_empty());
        assert_eq!(history.count(), 0);
        assert_eq!(history.capacity(), 10);
    }

    #[test]
    fn record_ignores_empty_and_references() {
        let mut history = HistoryBuffer::with_capacity(10);
        assert!(!history.record(""));
        assert!(!history.record("!1"));
        assert!(!history.record("!-2"));
        assert!(history.record("ls"));
        assert_eq!(history.len(), 1);
        assert_eq!(history.count(), 1);
    }

    #[test]
    fn resolve_absolute_and_relative() {
        let mut history = HistoryBuffer::with_capacity(10);
        history.record("a");
        history.record("b");
        history.record("c");

        assert_eq!(history.resolve(-1).unwrap(), "c");
        assert_eq!(history.resolve(-3).unwrap(), "a");
        assert_eq!(history.resolve(1).unwrap(), "a");
        assert_eq!(history.resolve(3).unwrap(), "c");
        assert_not_found(history.resolve(99));
        assert_not_found(history.resolve(-4));
        assert_not_found(history.resolve(0));
    }

    #[test]
    fn eviction_keeps_original_indices() {
        let mut history = alloc_history(10, 10);
        history.record("extra");

        assert_eq!(history.len(), 10);
        assert_eq!(history.count(), 11);
        assert_not_found(history.resolve(1));
        assert_eq!(history.resolve(2).unwrap(), "cmd1");
        assert_eq!(history.resolve(11).unwrap(), "extra");
        assert_eq!(history.resolve(-1).unwrap(), "extra");
        assert_eq!(history.resolve(-10).unwrap(), "cmd1");
        assert_not_found(history.resolve(-11));

        let indices: Vec<usize> = history.list().map(|(i, _)| i).collect();
        assert_eq!(indices, (2..=11).collect::<Vec<usize>>());
    }

    #[test]
    fn clear_does_not_reuse_indices() {
        let mut history = alloc_history(10, 3);
        history.clear();
        assert!(history.is_empty());
        assert_not_found(history.resolve(-1));

        history.record("after");
        assert_eq!(history.list().next(), Some((4, "after")));
        assert_eq!(history.resolve(4).unwrap(), "after");
    }

    #[test]
    fn expand_non_reference() {
        let history = alloc_history(10, 3);
        assert_eq!(history.expand("ls -l").unwrap(), None);
        assert_eq!(history.expand("").unwrap(), None);
    }

    #[test]
    fn expand_empty_history() {
        let history = HistoryBuffer::with_capacity(10);
        assert_not_found(history.expand("!1"));
        assert_not_found(history.expand("!-1"));
        assert_not_found(history.expand("!!"));
    }

    #[test]
    fn expand_positive_nth_command() {
        let (cap, full) = (10, 10);
        let history = alloc_history(cap, full);
        for i in 0..full {
            let line = history.expand(&format!("!{}", i + 1)).unwrap();
            assert_eq!(line, Some(format!("cmd{}", i)));
        }
    }

    #[test]
    fn expand_negative_nth_command() {
        let (cap, full) = (10, 10);
        let history = alloc_history(cap, full);
        for i in 0..full {
            let line = history.expand(&format!("!-{}", i + 1)).unwrap();
            assert_eq!(line, Some(format!("cmd{}", full - i - 1)));
        }
    }

    #[test]
    fn expand_last_and_string() {
        let history = alloc_history(10, 10);
        assert_eq!(history.expand("!!").unwrap(), Some("cmd9".to_string()));
        assert_eq!(history.expand("!c").unwrap(), Some("cmd9".to_string()));
        assert_eq!(history.expand("!cmd1").unwrap(), Some("cmd1".to_string()));
        assert_not_found(history.expand("!nope"));
        assert_not_found(history.expand("!"));
    }

    #[test]
    fn expand_appends_trailing_words() {
        let mut history = HistoryBuffer::with_capacity(10);
        history.record("ls -l");
        assert_eq!(
            history.expand("!1 /tmp").unwrap(),
            Some("ls -l /tmp".to_string())
        );
    }

    #[test]
    fn display_last_entries() {
        let history = alloc_history(10, 3);
        assert_eq!(history.display(2), "\t2\tcmd1\n\t3\tcmd2\n");
        assert_eq!(history.to_string(), "\t1\tcmd0\n\t2\tcmd1\n\t3\tcmd2\n");
    }
}

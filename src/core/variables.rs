//! Shell variables.
//!
//! Names are unique: setting an existing name overwrites its value and scope
//! in place. Exported variables are also handed to spawned programs.

use std::fmt;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::errors::{ErrorKind, Result};

lazy_static! {
    /// `$name` at the start of the line or after a space, up to the next space.
    static ref VARIABLE_REFERENCE: Regex = Regex::new(r"(^| )\$([^ ]+)").unwrap();
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    Local,
    Exported,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    name: String,
    value: String,
    scope: Scope,
}

impl Variable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

#[derive(Debug)]
pub struct VariableStore {
    vars: Vec<Variable>,
    capacity: usize,
}

impl VariableStore {
    pub fn with_capacity(capacity: usize) -> VariableStore {
        VariableStore {
            vars: Vec::new(),
            capacity,
        }
    }

    /// Inserts `name`, or overwrites its value and scope if it already exists.
    pub fn set(&mut self, name: &str, value: &str, scope: Scope) -> Result<()> {
        if let Some(var) = self.find_mut(name) {
            var.value = value.to_string();
            var.scope = scope;
            return Ok(());
        }

        if self.vars.len() >= self.capacity {
            bail!(ErrorKind::VariableLimit(self.capacity));
        }
        self.vars.push(Variable {
            name: name.to_string(),
            value: value.to_string(),
            scope,
        });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|v| v.name == name)
            .map(Variable::value)
    }

    /// Promotes `name` to Exported, creating it with an empty value if absent.
    pub fn export(&mut self, name: &str) -> Result<()> {
        match self.find_mut(name) {
            Some(var) => {
                var.scope = Scope::Exported;
                Ok(())
            }
            None => self.set(name, "", Scope::Exported),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Variable> {
        let position = self.vars.iter().position(|v| v.name == name)?;
        Some(self.vars.remove(position))
    }

    /// Replaces every `$name` token with its value. Undefined names are left
    /// as they are.
    pub fn substitute(&self, line: &str) -> String {
        VARIABLE_REFERENCE
            .replace_all(line, |caps: &Captures<'_>| match self.get(&caps[2]) {
                Some(value) => format!("{}{}", &caps[1], value),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Returns `(local, exported)` variables, each in insertion order.
    pub fn list_by_scope(&self) -> (Vec<&Variable>, Vec<&Variable>) {
        self.vars.iter().partition(|v| v.scope == Scope::Local)
    }

    /// Exported variables as `(name, value)` pairs.
    pub fn exported(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars
            .iter()
            .filter(|v| v.scope == Scope::Exported)
            .map(|v| (v.name.as_str(), v.value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.vars.iter_mut().find(|v| v.name == name)
    }
}

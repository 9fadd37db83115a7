//! Ordered registry of commands and their structural patterns.
//!
//! Order matters: the matcher tries registrations first to last and the
//! first structural match wins.

use std::sync::Arc;

use regex::Regex;

use crate::args;

use super::traits::Command;

/// One registered command with its optional delimiters.
pub struct Registration {
    command: Arc<dyn Command>,
    start: String,
    end: String,
    pattern: Regex,
}

impl Registration {
    /// Compile the structural pattern:
    /// `start`, the name, `(args)`, then `end`, with whitespace allowed
    /// between the parts.
    pub fn new(
        command: Arc<dyn Command>,
        start: &str,
        end: &str,
    ) -> Result<Self, regex::Error> {
        let mut source = String::from(r"(?s)^");
        if !start.is_empty() {
            source.push_str(&regex::escape(start));
            source.push_str(r"\s*");
        }
        source.push_str(&regex::escape(command.name()));
        source.push_str(r"\s*\((.*?)\)");
        if !end.is_empty() {
            source.push_str(r"\s*");
            source.push_str(&regex::escape(end));
        }
        source.push('$');

        Ok(Self {
            pattern: Regex::new(&source)?,
            command,
            start: start.to_string(),
            end: end.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        self.command.name()
    }

    pub fn command(&self) -> &Arc<dyn Command> {
        &self.command
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn end(&self) -> &str {
        &self.end
    }

    /// The text between the parentheses if `input` invokes this command.
    ///
    /// The interior must be bracket-balanced, so `f()\nf()` is not read as
    /// one call with interior `)\nf(`.
    pub fn capture<'t>(&self, input: &'t str) -> Option<&'t str> {
        self.pattern
            .captures(input)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|interior| args::is_balanced(interior))
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name())
            .field("arity", &self.command.arity())
            .field("start", &self.start)
            .field("end", &self.end)
            .finish()
    }
}

/// Registry of available commands, in registration order.
#[derive(Default)]
pub struct CommandRegistry {
    entries: Vec<Registration>,
}

impl CommandRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command. Re-registering a name replaces the earlier entry
    /// but keeps its position.
    pub fn register(
        &mut self,
        command: Arc<dyn Command>,
        start: &str,
        end: &str,
    ) -> Result<(), regex::Error> {
        let registration = Registration::new(command, start, end)?;
        match self
            .entries
            .iter_mut()
            .find(|r| r.name() == registration.name())
        {
            Some(slot) => {
                tracing::debug!(name = registration.name(), "replacing command");
                *slot = registration;
            }
            None => self.entries.push(registration),
        }
        Ok(())
    }

    /// Look up a registration by name.
    pub fn get(&self, name: &str) -> Option<&Registration> {
        self.entries.iter().find(|r| r.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Command names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(Registration::name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.entries.iter()
    }

    /// First registration that structurally matches `input`, with the
    /// captured argument text.
    pub fn find_match<'t>(&self, input: &'t str) -> Option<(&Registration, &'t str)> {
        self.entries
            .iter()
            .find_map(|r| r.capture(input).map(|interior| (r, interior)))
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.names())
            .finish()
    }
}

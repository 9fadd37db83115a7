//! The variable store shared by commands and fallback code.
//!
//! One flat namespace per engine: `var.create` writes into it, fallback
//! assignments write into it, and fallback expressions read from it.

use std::collections::HashMap;

use crate::value::Value;

/// Variable bindings for one engine session.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    vars: HashMap<String, Value>,
}

impl Scope {
    /// Create an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Remove a binding, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.vars.remove(name)
    }

    /// All bindings, sorted by name.
    pub fn all(&self) -> Vec<(String, Value)> {
        let mut pairs: Vec<(String, Value)> = self
            .vars
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs
    }

    /// Variable names, sorted (for introspection).
    pub fn all_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.vars.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn clear(&mut self) {
        self.vars.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_variable() {
        let mut scope = Scope::new();
        scope.set("x", Value::Int(42));
        assert_eq!(scope.get("x"), Some(&Value::Int(42)));
        assert!(scope.contains("x"));
    }

    #[test]
    fn get_nonexistent_returns_none() {
        assert_eq!(Scope::new().get("missing"), None);
    }

    #[test]
    fn set_overwrites() {
        let mut scope = Scope::new();
        scope.set("x", Value::Int(1));
        scope.set("x", Value::Str("two".into()));
        assert_eq!(scope.get("x"), Some(&Value::Str("two".into())));
        assert_eq!(scope.len(), 1);
    }

    #[test]
    fn names_are_sorted() {
        let mut scope = Scope::new();
        scope.set("b", Value::None);
        scope.set("a", Value::None);
        assert_eq!(scope.all_names(), vec!["a", "b"]);
        assert_eq!(scope.all()[0].0, "a");
    }

    #[test]
    fn clear_and_remove() {
        let mut scope = Scope::new();
        scope.set("a", Value::Int(1));
        scope.set("b", Value::Int(2));
        assert_eq!(scope.remove("a"), Some(Value::Int(1)));
        scope.clear();
        assert!(scope.is_empty());
    }
}

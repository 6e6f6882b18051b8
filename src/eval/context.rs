use std::collections::{BTreeMap, HashMap};

use super::value::Value;

/// Read access to variables during evaluation.
pub trait Environment {
    fn lookup(&self, name: &str) -> Option<&Value>;

    /// Undeclared variables read as `0`.
    fn get_variable(&self, name: &str) -> Value {
        self.lookup(name).cloned().unwrap_or(Value::Number(0.0))
    }

    fn has_variable(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}

impl Environment for HashMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl Environment for BTreeMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

/// Story variable store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variables {
    values: HashMap<String, Value>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Value {
        self.get_variable(name)
    }

    /// Returns the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(name.into(), value)
    }

    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Name-ordered copy, for snapshots.
    pub fn to_sorted(&self) -> BTreeMap<String, Value> {
        self.values
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

impl Environment for Variables {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}

/// A variable layered over another environment, for `for` loop bodies.
pub struct Scoped<'a> {
    parent: &'a dyn Environment,
    name: &'a str,
    value: Value,
}

impl<'a> Scoped<'a> {
    pub fn new(parent: &'a dyn Environment, name: &'a str, value: Value) -> Self {
        Self {
            parent,
            name,
            value,
        }
    }
}

impl Environment for Scoped<'_> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        if name == self.name {
            Some(&self.value)
        } else {
            self.parent.lookup(name)
        }
    }
}

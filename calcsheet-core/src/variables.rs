//! Variable bindings for one document pass.
//!
//! A binding maps a name to a [`Variable`] cell holding a [`Value`] and an
//! initialized flag. The value's kind and unit may change between
//! assignments (a `#for` counter can go from real to complex).
//!
//! Change notifications are explicit: callers register a listener with
//! [`Variables::watch`] and it runs after every assignment to that name,
//! including loop counter updates made by the interpreter.

use std::collections::HashMap;
use std::fmt;

use calcsheet_math::Value;

/// Callback fired with the name and the new value.
pub type Listener = Box<dyn FnMut(&str, &Value)>;

/// One variable cell.
#[derive(Debug, Clone, Default)]
pub struct Variable {
    pub value: Value,
    /// `false` until the first assignment.
    pub initialized: bool,
}

/// Name → variable table with per-name change listeners.
#[derive(Default)]
pub struct Variables {
    cells: HashMap<String, Variable>,
    listeners: HashMap<String, Vec<Listener>>,
}

impl fmt::Debug for Variables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variables")
            .field("cells", &self.cells)
            .field("watched", &self.listeners.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Variables {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of an initialized variable.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.cells
            .get(name)
            .filter(|v| v.initialized)
            .map(|v| &v.value)
    }

    #[must_use]
    pub fn is_initialized(&self, name: &str) -> bool {
        self.cells.get(name).is_some_and(|v| v.initialized)
    }

    /// Create an uninitialized cell if the name is unknown.
    pub fn declare(&mut self, name: &str) {
        self.cells.entry(name.to_owned()).or_default();
    }

    /// Assign a value and notify listeners.
    pub fn set(&mut self, name: &str, value: Value) {
        if let Some(listeners) = self.listeners.get_mut(name) {
            for listener in listeners.iter_mut() {
                listener(name, &value);
            }
        }
        let cell = self.cells.entry(name.to_owned()).or_default();
        cell.value = value;
        cell.initialized = true;
    }

    /// Register a change listener for `name`.
    pub fn watch(&mut self, name: &str, listener: impl FnMut(&str, &Value) + 'static) {
        self.listeners
            .entry(name.to_owned())
            .or_default()
            .push(Box::new(listener));
    }

    /// Drop every binding; listeners stay registered.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.values().filter(|v| v.initialized).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of initialized variables, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .cells
            .iter()
            .filter(|(_, v)| v.initialized)
            .map(|(k, _)| k.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn declared_variables_are_not_readable() {
        let mut vars = Variables::new();
        vars.declare("a");
        assert!(vars.get("a").is_none());
        assert!(!vars.is_initialized("a"));
        vars.set("a", Value::from(2.0));
        assert_eq!(vars.get("a"), Some(&Value::from(2.0)));
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn listeners_see_every_assignment() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut vars = Variables::new();
        let sink = Rc::clone(&seen);
        vars.watch("x", move |name, v| sink.borrow_mut().push(format!("{name}={v}")));
        vars.set("x", Value::from(1.0));
        vars.set("y", Value::from(5.0));
        vars.set("x", Value::from(2.0));
        assert_eq!(*seen.borrow(), vec!["x=1".to_owned(), "x=2".to_owned()]);
    }

    #[test]
    fn clear_keeps_listeners() {
        let count = Rc::new(RefCell::new(0));
        let mut vars = Variables::new();
        let c = Rc::clone(&count);
        vars.watch("n", move |_, _| *c.borrow_mut() += 1);
        vars.set("n", Value::from(1.0));
        vars.clear();
        assert!(vars.is_empty());
        vars.set("n", Value::from(1.0));
        assert_eq!(*count.borrow(), 2);
        assert_eq!(vars.names(), vec!["n"]);
    }
}
